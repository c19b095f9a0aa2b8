//! The IPC channel between the simulator and a scheduler (spec.md §6).
//!
//! [`Transport`] is the transport-agnostic seam: [`InMemoryTransport`] drives
//! tests and the CLI's replay mode, [`UnixSocketTransport`] (feature
//! `unix-socket`, on by default) dials the real `ipc://` channel.

mod error;
mod snapshot;
mod transport;

#[cfg(feature = "unix-socket")]
mod unix_socket;

pub use error::TransportError;
pub use snapshot::{Reply, Request, SystemInfo};
pub use transport::{InMemoryTransport, Transport};

#[cfg(feature = "unix-socket")]
pub use unix_socket::{socket_path, UnixSocketTransport, DEFAULT_URL};
