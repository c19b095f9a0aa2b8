use elastisim_core::{Job, Node};
use serde::{Deserialize, Serialize};

/// Simulator-provided clock and any other per-tick metadata. `time` is the
/// only field spec.md §6 guarantees; everything else the host might send is
/// preserved verbatim via `extra` instead of being silently dropped.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemInfo {
    pub time: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One scheduling request: the full job/node snapshot plus the clock, wire
/// format for spec.md §6's `(jobs, nodes, system)` argument triple.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub jobs: Vec<Job>,
    pub nodes: Vec<Node>,
    pub system: SystemInfo,
}

/// The mutated jobs/nodes a tick produced, sent back in place of the
/// original's in-place object mutation (spec.md §4.0 ambient transport
/// note) — there is no shared memory across the wire, so the full mutated
/// records are the reply instead of a diff.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub jobs: Vec<Job>,
    pub nodes: Vec<Node>,
}
