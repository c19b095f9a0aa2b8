use std::collections::HashMap;

use crate::ids::{JobId, NodeId};
use crate::job::{Job, JobState, JobType};
use crate::node::Node;

/// Owns one tick's jobs and nodes, keyed for O(1) lookup while preserving
/// the simulator's original list order for deterministic iteration
/// (spec.md §4.5 "Iteration order is deterministic — the simulator's
/// provided list order").
pub struct Cluster {
    jobs: HashMap<JobId, Job>,
    nodes: HashMap<NodeId, Node>,
    job_order: Vec<JobId>,
    node_order: Vec<NodeId>,
}

impl Cluster {
    pub fn new(jobs: Vec<Job>, nodes: Vec<Node>) -> Self {
        let job_order = jobs.iter().map(|j| j.id).collect();
        let node_order = nodes.iter().map(|n| n.id).collect();
        let jobs = jobs.into_iter().map(|j| (j.id, j)).collect();
        let nodes = nodes.into_iter().map(|n| (n.id, n)).collect();
        Self {
            jobs,
            nodes,
            job_order,
            node_order,
        }
    }

    pub fn job(&self, id: JobId) -> &Job {
        &self.jobs[&id]
    }

    pub fn job_mut(&mut self, id: JobId) -> &mut Job {
        self.jobs.get_mut(&id).expect("job id must exist in cluster")
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[&id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes
            .get_mut(&id)
            .expect("node id must exist in cluster")
    }

    /// All job ids in the simulator's original order.
    pub fn job_ids(&self) -> &[JobId] {
        &self.job_order
    }

    /// All node ids in the simulator's original order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_order
    }

    pub fn pending_job_ids(&self) -> Vec<JobId> {
        self.job_order
            .iter()
            .copied()
            .filter(|id| self.jobs[id].is_pending())
            .collect()
    }

    pub fn running_job_ids(&self) -> Vec<JobId> {
        self.job_order
            .iter()
            .copied()
            .filter(|id| self.jobs[id].is_running())
            .collect()
    }

    pub fn running_malleable_job_ids(&self) -> Vec<JobId> {
        self.job_order
            .iter()
            .copied()
            .filter(|id| {
                let job = &self.jobs[id];
                job.is_running() && job.job_type == JobType::Malleable
            })
            .collect()
    }

    pub fn free_node_ids(&self) -> Vec<NodeId> {
        self.node_order
            .iter()
            .copied()
            .filter(|id| self.nodes[id].is_free())
            .collect()
    }

    /// Starts `job` on exactly `nodes` at `gpus_per_node`, updating both the
    /// job's and every node's bookkeeping together so they can never drift
    /// apart (spec.md §3 "A node is in at most one job's assigned_nodes at
    /// any time").
    pub fn start_job(&mut self, job: JobId, nodes: &[NodeId], gpus_per_node: u32, time: f64) {
        self.job_mut(job).start(nodes, time);
        self.job_mut(job).assign_num_gpus_per_node(gpus_per_node);
        for &n in nodes {
            self.node_mut(n).allocate(job);
        }
    }

    /// Grows a running malleable job by `nodes` (expand planner).
    pub fn expand_job(&mut self, job: JobId, nodes: &[NodeId]) {
        self.job_mut(job).expand(nodes);
        for &n in nodes {
            self.node_mut(n).allocate(job);
        }
    }

    /// Shrinks a running malleable job, freeing `nodes` back to the pool
    /// (shrink planner — the nodes become free, to be reserved by an
    /// agreement or later reused).
    pub fn shrink_job(&mut self, job: JobId, nodes: &[NodeId]) {
        self.job_mut(job).shrink(nodes);
        for &n in nodes {
            self.node_mut(n).release();
        }
    }

    /// Consumes the cluster, returning jobs/nodes in their original order
    /// so the caller can hand the mutated records back to the simulator.
    pub fn into_parts(self) -> (Vec<Job>, Vec<Node>) {
        let Cluster {
            mut jobs,
            mut nodes,
            job_order,
            node_order,
        } = self;
        let jobs = job_order
            .into_iter()
            .map(|id| jobs.remove(&id).expect("job id must exist in cluster"))
            .collect();
        let nodes = node_order
            .into_iter()
            .map(|id| nodes.remove(&id).expect("node id must exist in cluster"))
            .collect();
        (jobs, nodes)
    }

    /// Validates every job's node-count invariant, injecting derived
    /// attributes implicitly via [`crate::JobView`] (spec.md §4.6 step 1).
    pub fn validate(&self) -> Result<(), crate::DomainError> {
        for id in &self.job_order {
            crate::JobView::new(&self.jobs[id]).validate()?;
        }
        Ok(())
    }
}
