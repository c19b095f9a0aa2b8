use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{JobId, NodeId};

/// How much a job's node count may change over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobType {
    /// Fixed node count for its lifetime.
    Rigid,
    /// Size chosen at start, fixed thereafter.
    Moldable,
    /// Size may change at any scheduling tick within `[min, max]`.
    Malleable,
}

impl JobType {
    pub fn is_malleable(self) -> bool {
        matches!(self, JobType::Malleable)
    }
}

/// Lifecycle state of a job as reported by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Application-model parameters the simulator attaches to a job.
///
/// `runtime` is the memoization slot for the estimated-runtime formula
/// (spec.md §3): once the host (or a prior tick) has written it, it is
/// treated as authoritative and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobArguments {
    pub flops: f64,
    pub iterations: Option<f64>,
    pub runtime: Option<f64>,
}

impl JobArguments {
    pub fn new(flops: f64) -> Self {
        Self {
            flops,
            iterations: None,
            runtime: None,
        }
    }
}

/// A job as handed to the scheduler by the simulator for the duration of one
/// invocation. Identity and lifecycle fields are owned by the caller; the
/// scheduler only ever touches them through [`Job::start`], [`Job::expand`],
/// [`Job::shrink`] and [`Job::assign_num_gpus_per_node`], mirroring the
/// `assign` / `assign_num_gpus_per_node` / `remove` operations the host
/// exposes (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub state: JobState,
    pub num_nodes_min: u32,
    pub num_nodes_max: u32,
    /// `None` until imputed by [`JobView::pref_node_count`]; host-provided
    /// otherwise.
    pub num_nodes_pref: Option<u32>,
    pub num_gpus_per_node_max: u32,
    pub submit_time: f64,
    pub start_time: Option<f64>,
    pub assigned_nodes: Vec<NodeId>,
    pub arguments: JobArguments,
}

impl Job {
    pub fn new_rigid(
        id: JobId,
        num_nodes: u32,
        num_gpus_per_node_max: u32,
        submit_time: f64,
        arguments: JobArguments,
    ) -> Self {
        Self {
            id,
            job_type: JobType::Rigid,
            state: JobState::Pending,
            num_nodes_min: num_nodes,
            num_nodes_max: num_nodes,
            num_nodes_pref: Some(num_nodes),
            num_gpus_per_node_max,
            submit_time,
            start_time: None,
            assigned_nodes: Vec::new(),
            arguments,
        }
    }

    pub fn new_elastic(
        id: JobId,
        job_type: JobType,
        num_nodes_min: u32,
        num_nodes_max: u32,
        num_nodes_pref: Option<u32>,
        num_gpus_per_node_max: u32,
        submit_time: f64,
        arguments: JobArguments,
    ) -> Self {
        debug_assert!(!matches!(job_type, JobType::Rigid));
        Self {
            id,
            job_type,
            state: JobState::Pending,
            num_nodes_min,
            num_nodes_max,
            num_nodes_pref,
            num_gpus_per_node_max,
            submit_time,
            start_time: None,
            assigned_nodes: Vec::new(),
            arguments,
        }
    }

    /// Starts the job on exactly `nodes`. Callers pair this with
    /// [`Job::assign_num_gpus_per_node`] set to the job's max, since
    /// admission and agreement resolution always start a job at its maximum
    /// GPUs-per-node (spec.md §4.1 step 3).
    pub fn start(&mut self, nodes: &[NodeId], time: f64) {
        self.assigned_nodes = nodes.to_vec();
        self.state = JobState::Running;
        self.start_time = Some(time);
    }

    /// Grows a running malleable job by `nodes` (expand planner).
    pub fn expand(&mut self, nodes: &[NodeId]) {
        self.assigned_nodes.extend_from_slice(nodes);
    }

    /// Shrinks a running malleable job by removing `nodes` (shrink planner).
    pub fn shrink(&mut self, nodes: &[NodeId]) {
        self.assigned_nodes.retain(|n| !nodes.contains(n));
    }

    pub fn assign_num_gpus_per_node(&mut self, n: u32) {
        self.num_gpus_per_node_max = n;
    }

    pub fn is_pending(&self) -> bool {
        self.state == JobState::Pending
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }
}

/// Read-only view over a [`Job`] computing and caching its derived
/// attributes. Never mutates the underlying record.
pub struct JobView<'a> {
    job: &'a Job,
    estimated_runtime: OnceCell<f64>,
}

impl<'a> JobView<'a> {
    pub fn new(job: &'a Job) -> Self {
        Self {
            job,
            estimated_runtime: OnceCell::new(),
        }
    }

    pub fn job(&self) -> &'a Job {
        self.job
    }

    pub fn id(&self) -> JobId {
        self.job.id
    }

    /// `estimated_runtime = (flops × iterations) / num_nodes_min`, memoized
    /// on first read (spec.md §3). If the host already cached a value in
    /// `arguments.runtime`, that value is authoritative.
    pub fn estimated_runtime(&self) -> f64 {
        *self.estimated_runtime.get_or_init(|| {
            if let Some(cached) = self.job.arguments.runtime {
                return cached;
            }
            let iterations = self.job.arguments.iterations.unwrap_or(1.0);
            (self.job.arguments.flops * iterations) / self.job.num_nodes_min as f64
        })
    }

    /// The per-job target size used by pref- and average-anchored policies.
    /// Imputed as the integer mean of min/max when the host did not supply
    /// one and the job is non-rigid (spec.md §3).
    pub fn pref_node_count(&self) -> u32 {
        match self.job.job_type {
            JobType::Rigid => self.job.num_nodes_min,
            _ => self
                .job
                .num_nodes_pref
                .unwrap_or((self.job.num_nodes_min + self.job.num_nodes_max) / 2),
        }
    }

    /// Asserts `min ≤ pref ≤ max` (and, for rigid jobs, `min == max`).
    /// A fatal invariant violation propagates to the driver (spec.md §7).
    pub fn validate(&self) -> Result<(), DomainError> {
        let job = self.job;
        if job.job_type == JobType::Rigid {
            if job.num_nodes_min != job.num_nodes_max {
                return Err(DomainError::RigidBoundsMismatch {
                    job: job.id,
                    min: job.num_nodes_min,
                    max: job.num_nodes_max,
                });
            }
            return Ok(());
        }
        let pref = self.pref_node_count();
        if job.num_nodes_min > pref {
            return Err(DomainError::MinExceedsPref {
                job: job.id,
                min: job.num_nodes_min,
                pref,
            });
        }
        if pref > job.num_nodes_max {
            return Err(DomainError::PrefExceedsMax {
                job: job.id,
                pref,
                max: job.num_nodes_max,
            });
        }
        Ok(())
    }

    pub fn assigned_node_count(&self) -> u32 {
        self.job.assigned_nodes.len() as u32
    }

    pub fn is_malleable(&self) -> bool {
        self.job.job_type.is_malleable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rigid(id: u64, n: u32) -> Job {
        Job::new_rigid(JobId(id), n, 1, 0.0, JobArguments::new(100.0))
    }

    fn elastic(id: u64, min: u32, max: u32, pref: Option<u32>) -> Job {
        Job::new_elastic(
            JobId(id),
            JobType::Malleable,
            min,
            max,
            pref,
            1,
            0.0,
            JobArguments::new(100.0),
        )
    }

    #[test]
    fn rigid_job_has_equal_bounds_and_validates() {
        let job = rigid(1, 4);
        let view = JobView::new(&job);
        assert_eq!(view.pref_node_count(), 4);
        assert!(view.validate().is_ok());
    }

    #[test]
    fn pref_is_imputed_as_integer_mean_when_absent() {
        let job = elastic(1, 2, 7, None);
        let view = JobView::new(&job);
        assert_eq!(view.pref_node_count(), 4); // (2 + 7) / 2 == 4 (floor)
    }

    #[test]
    fn pref_from_host_is_respected() {
        let job = elastic(1, 2, 7, Some(5));
        let view = JobView::new(&job);
        assert_eq!(view.pref_node_count(), 5);
    }

    #[test]
    fn estimated_runtime_uses_flops_times_iterations_over_min_nodes() {
        let mut job = elastic(1, 2, 7, None);
        job.arguments.iterations = Some(4.0);
        job.arguments.flops = 100.0;
        let view = JobView::new(&job);
        assert_eq!(view.estimated_runtime(), 200.0); // 100*4/2
    }

    #[test]
    fn estimated_runtime_defaults_iterations_to_one() {
        let job = elastic(1, 2, 7, None);
        let view = JobView::new(&job);
        assert_eq!(view.estimated_runtime(), 50.0); // 100*1/2
    }

    #[test]
    fn cached_runtime_is_authoritative() {
        let mut job = elastic(1, 2, 7, None);
        job.arguments.runtime = Some(999.0);
        let view = JobView::new(&job);
        assert_eq!(view.estimated_runtime(), 999.0);
    }

    #[test]
    fn validate_rejects_min_above_pref() {
        let job = elastic(1, 5, 7, Some(3));
        let view = JobView::new(&job);
        assert!(matches!(
            view.validate(),
            Err(DomainError::MinExceedsPref { .. })
        ));
    }

    #[test]
    fn validate_rejects_pref_above_max() {
        let job = elastic(1, 2, 7, Some(9));
        let view = JobView::new(&job);
        assert!(matches!(
            view.validate(),
            Err(DomainError::PrefExceedsMax { .. })
        ));
    }

    #[test]
    fn shrink_removes_exactly_the_given_nodes() {
        let mut job = elastic(1, 2, 7, None);
        job.assigned_nodes = vec![NodeId(0), NodeId(1), NodeId(2)];
        job.shrink(&[NodeId(1)]);
        assert_eq!(job.assigned_nodes, vec![NodeId(0), NodeId(2)]);
    }

    #[test]
    fn expand_appends_nodes() {
        let mut job = elastic(1, 2, 7, None);
        job.assigned_nodes = vec![NodeId(0)];
        job.expand(&[NodeId(1), NodeId(2)]);
        assert_eq!(job.assigned_nodes, vec![NodeId(0), NodeId(1), NodeId(2)]);
    }
}
