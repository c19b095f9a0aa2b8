use serde::{Deserialize, Serialize};

use crate::ids::{JobId, NodeId};

/// Allocation state of a compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeState {
    Free,
    Allocated,
}

/// A compute node as handed to the scheduler by the simulator. A node is in
/// at most one job's `assigned_nodes` at any time (spec.md §3), so
/// `assigned_job_ids` holds zero or one entries in this implementation even
/// though the host models it as a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub state: NodeState,
    pub assigned_job_ids: Vec<JobId>,
}

impl Node {
    pub fn new_free(id: NodeId) -> Self {
        Self {
            id,
            state: NodeState::Free,
            assigned_job_ids: Vec::new(),
        }
    }

    pub fn is_free(&self) -> bool {
        self.state == NodeState::Free
    }

    /// Hands the node to `job`. Used when a job starts or expands onto it.
    pub fn allocate(&mut self, job: JobId) {
        self.state = NodeState::Allocated;
        self.assigned_job_ids = vec![job];
    }

    /// Releases the node back to the free pool. Used when a job shrinks off
    /// it or finalizes.
    pub fn release(&mut self) {
        self.state = NodeState::Free;
        self.assigned_job_ids.clear();
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.assigned_job_ids.first().copied()
    }
}
