use crate::error::TransportError;
use crate::snapshot::{Reply, Request};

/// One point-to-point scheduling channel: the simulator sends a
/// [`Request`], the scheduler replies once with the mutated [`Reply`]
/// (spec.md §6). `recv_request` returning `Ok(None)` signals a clean
/// disconnect — the caller should exit with status zero, not treat it as a
/// [`TransportError`] (spec.md §6 "exit codes: zero on normal disconnect").
pub trait Transport {
    fn recv_request(&mut self) -> Result<Option<Request>, TransportError>;
    fn send_reply(&mut self, reply: &Reply) -> Result<(), TransportError>;
}

/// Replays a fixed sequence of requests and records every reply, for tests
/// and the CLI's `--replay` debug mode (spec.md §4.0 ambient transport
/// note). Not behind a feature flag since both the test suite and the CLI
/// need it unconditionally.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    requests: std::collections::VecDeque<Request>,
    pub replies: Vec<Reply>,
}

impl InMemoryTransport {
    pub fn new(requests: impl IntoIterator<Item = Request>) -> Self {
        Self {
            requests: requests.into_iter().collect(),
            replies: Vec::new(),
        }
    }
}

impl Transport for InMemoryTransport {
    fn recv_request(&mut self) -> Result<Option<Request>, TransportError> {
        Ok(self.requests.pop_front())
    }

    fn send_reply(&mut self, reply: &Reply) -> Result<(), TransportError> {
        self.replies.push(Reply {
            jobs: reply.jobs.clone(),
            nodes: reply.nodes.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SystemInfo;

    fn request(time: f64) -> Request {
        Request {
            jobs: Vec::new(),
            nodes: Vec::new(),
            system: SystemInfo { time, extra: Default::default() },
        }
    }

    #[test]
    fn in_memory_transport_replays_requests_in_order_then_signals_disconnect() {
        let mut transport = InMemoryTransport::new([request(0.0), request(1.0)]);
        assert_eq!(transport.recv_request().unwrap().unwrap().system.time, 0.0);
        assert_eq!(transport.recv_request().unwrap().unwrap().system.time, 1.0);
        assert!(transport.recv_request().unwrap().is_none());
    }

    #[test]
    fn in_memory_transport_records_every_reply() {
        let mut transport = InMemoryTransport::default();
        transport
            .send_reply(&Reply { jobs: Vec::new(), nodes: Vec::new() })
            .unwrap();
        assert_eq!(transport.replies.len(), 1);
    }
}
