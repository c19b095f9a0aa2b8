use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};

use tracing::debug;

use crate::error::TransportError;
use crate::snapshot::{Reply, Request};
use crate::transport::Transport;

/// The default channel URL (spec.md §6): `ipc:///tmp/elastisim.ipc`.
pub const DEFAULT_URL: &str = "ipc:///tmp/elastisim.ipc";

/// Turns an `ipc://<path>` URL into the Unix domain socket path it names.
pub fn socket_path(url: &str) -> Result<&str, TransportError> {
    url.strip_prefix("ipc://").ok_or_else(|| TransportError::InvalidUrl(url.to_string()))
}

/// One connection over a Unix domain socket, framed as newline-delimited
/// JSON — the blocking, single-peer equivalent of the original's ZeroMQ REP
/// socket (`pass_algorithm`), expressed with the standard library instead of
/// a fabricated messaging-library dependency.
pub struct UnixSocketTransport {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
}

impl UnixSocketTransport {
    /// Binds `url`'s socket path, removing a stale socket file left behind
    /// by a prior run, and blocks for exactly one incoming connection —
    /// matching the original's one-scheduler-per-run lifetime.
    pub fn bind_and_accept(url: &str) -> Result<Self, TransportError> {
        let path = socket_path(url)?;
        if std::fs::metadata(path).is_ok() {
            std::fs::remove_file(path)?;
        }
        let listener = UnixListener::bind(path)?;
        debug!(path, "waiting for simulator connection");
        let (stream, _) = listener.accept()?;
        Self::from_stream(stream)
    }

    fn from_stream(stream: UnixStream) -> Result<Self, TransportError> {
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }
}

impl Transport for UnixSocketTransport {
    fn recv_request(&mut self) -> Result<Option<Request>, TransportError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(line.trim_end())?))
    }

    fn send_reply(&mut self, reply: &Reply) -> Result<(), TransportError> {
        let mut frame = serde_json::to_vec(reply)?;
        frame.push(b'\n');
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        Ok(())
    }
}
