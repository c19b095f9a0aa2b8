use elastisim_agreements::AgreementStore;
use elastisim_core::{Cluster, EventSink, JobId, NodeId};
use elastisim_policy::Variant;
use tracing::{debug, instrument};

use crate::error::SchedulerError;

/// Runs one named [`Variant`] against a sequence of ticks, owning the
/// [`AgreementStore`] that must survive between them (spec.md §5: "one
/// instance lives per scheduler variant and survives across ticks").
///
/// A `Scheduler` is the in-process equivalent of one of the original's
/// `schedule()` entry points plus its module-level `agreements` global —
/// the transport layer that feeds it `(jobs, nodes, system)` snapshots and
/// hands the mutated records back lives in `elastisim-transport`.
#[derive(Debug)]
pub struct Scheduler {
    variant: Variant,
    store: AgreementStore,
}

impl Scheduler {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            store: AgreementStore::new(),
        }
    }

    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Runs the full per-tick pipeline against `cluster` in place, emitting
    /// events to `sink` (spec.md §4.6):
    ///
    /// 1. Validate derived attributes on every job.
    /// 2. Partition into pending / running / running-malleable / free.
    /// 3. Resolve outstanding agreements against this tick's free nodes.
    /// 4. Drop agreement-bearing jobs/nodes from the pending/free sets.
    /// 5. Initial allocation (FCFS, optionally EASY-backfilled).
    /// 6. If jobs are still pending and malleable jobs are running, try to
    ///    shrink for them, recording new agreements.
    /// 7. If nodes are still free and malleable jobs are running, expand
    ///    them into the remainder.
    #[instrument(skip(self, cluster, sink), fields(variant = self.variant.name, time))]
    pub fn tick(&mut self, cluster: &mut Cluster, time: f64, sink: &mut dyn EventSink) -> Result<(), SchedulerError> {
        cluster.validate().map_err(|source| SchedulerError::Invariant {
            variant: self.variant.name,
            source,
        })?;

        let mut pending = cluster.pending_job_ids();
        let running = cluster.running_job_ids();
        let malleable = cluster.running_malleable_job_ids();
        let mut free = cluster.free_node_ids();

        if let Some(resolver) = self.variant.resolver {
            resolver.resolve(cluster, &mut self.store, &mut pending, &mut free, time, sink);
        }

        let store = &self.store;
        let mut pending_unreserved: Vec<JobId> = pending.into_iter().filter(|j| !store.has_job(*j)).collect();
        let mut free_unreserved: Vec<NodeId> = free.into_iter().filter(|n| !store.has_node(*n)).collect();

        elastisim_policy::admit_pending_jobs(
            cluster,
            &mut pending_unreserved,
            &running,
            &mut free_unreserved,
            time,
            self.variant.start_target(),
            self.variant.easy_backfill,
            sink,
        );

        if !pending_unreserved.is_empty() && !malleable.is_empty() {
            for &job in &pending_unreserved {
                if let Some(plan) = self.variant.plan_shrink(cluster, &self.store, &malleable, job) {
                    debug!(job = job.0, donors = plan.len(), "shrinking for pending job");
                    elastisim_policy::apply_shrink_plan(cluster, &mut self.store, job, plan, time, sink);
                }
            }
        }

        if !free_unreserved.is_empty() && !malleable.is_empty() {
            self.variant.run_expand(cluster, &malleable, &mut free_unreserved, time, sink);
        }

        Ok(())
    }
}
