use std::collections::{HashMap, HashSet};

use elastisim_agreements::AgreementStore;
use elastisim_core::{Cluster, EventKind, EventSink, EventSubject, Job, JobId, JobView, NodeId};

use crate::priority::{avg_priority, min_priority, pref_priority};

/// Reclaims nodes from running malleable jobs so a pending job can be
/// promised them via an agreement (spec.md §4.2). Each implementation picks
/// donor jobs and the nodes taken from them; if it cannot raise the full
/// amount requested, it must leave the cluster and agreement store
/// untouched (all-or-nothing per job).
pub trait ShrinkPlanner {
    /// Attempts to collect `required_nodes` reclaimable nodes from
    /// `running_malleable`. Returns the plan (donor job -> nodes to take)
    /// or `None` if the full amount could not be raised.
    fn plan(
        &self,
        cluster: &Cluster,
        store: &AgreementStore,
        running_malleable: &[JobId],
        required_nodes: u32,
    ) -> Option<Vec<(JobId, Vec<NodeId>)>>;
}

/// Greedily drains the job furthest above its own floor first, taking
/// whole per-job chunks bounded by `num_nodes_min` (spec.md §4.2
/// min-anchored: `min_common_pool`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MinAnchoredShrink;

impl ShrinkPlanner for MinAnchoredShrink {
    fn plan(
        &self,
        cluster: &Cluster,
        store: &AgreementStore,
        running_malleable: &[JobId],
        required_nodes: u32,
    ) -> Option<Vec<(JobId, Vec<NodeId>)>> {
        let mut donors = running_malleable.to_vec();
        donors.sort_by_key(|&id| std::cmp::Reverse(min_priority(cluster.job(id))));

        let mut remaining = required_nodes;
        let mut plan = Vec::new();
        for job_id in donors {
            let job = cluster.job(job_id);
            let reclaimable = job.assigned_nodes.iter().skip(job.num_nodes_min as usize).copied();
            let nodes = take_unpromised(reclaimable, store, remaining);
            if !nodes.is_empty() {
                remaining -= nodes.len() as u32;
                plan.push((job_id, nodes));
            }
        }
        (remaining == 0).then_some(plan)
    }
}

/// As [`MinAnchoredShrink`], but anchored on `num_nodes_pref` and falling
/// back in three stages (spec.md §4.2 pref-anchored: `pref_common_pool`):
/// first try to raise the pending job's own preferred size while keeping
/// every donor at its preference, then raise only its minimum while still
/// keeping donors at preference, then raise its minimum while letting
/// donors shrink down to their own minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefAnchoredShrink;

impl PrefAnchoredShrink {
    fn try_stage(
        &self,
        cluster: &Cluster,
        store: &AgreementStore,
        running_malleable: &[JobId],
        required_nodes: u32,
        donor_floor: impl Fn(&Job) -> u32,
    ) -> Option<Vec<(JobId, Vec<NodeId>)>> {
        let mut donors = running_malleable.to_vec();
        donors.sort_by_key(|&id| {
            let job = cluster.job(id);
            std::cmp::Reverse(pref_priority(job, JobView::new(job).pref_node_count()))
        });

        let mut remaining = required_nodes;
        let mut plan = Vec::new();
        for job_id in donors {
            let job = cluster.job(job_id);
            let floor = donor_floor(job) as usize;
            if floor >= job.assigned_nodes.len() {
                continue;
            }
            let reclaimable = job.assigned_nodes.iter().skip(floor).copied();
            let nodes = take_unpromised(reclaimable, store, remaining);
            if !nodes.is_empty() {
                remaining -= nodes.len() as u32;
                plan.push((job_id, nodes));
            }
        }
        (remaining == 0 && required_nodes > 0).then_some(plan)
    }
}

impl PrefAnchoredShrink {
    /// Pref-anchored shrink needs both the pending job's preferred and
    /// minimum size, so — unlike the other planners — it does not implement
    /// the plain [`ShrinkPlanner`] trait; this is its entry point instead.
    /// shrink needs the pending job's own preferred size, not just its
    /// minimum, so it does not fit the plain [`ShrinkPlanner::plan`] shape.
    pub fn plan_for_job(
        &self,
        cluster: &Cluster,
        store: &AgreementStore,
        running_malleable: &[JobId],
        pending_job_pref: u32,
        pending_job_min: u32,
    ) -> Option<Vec<(JobId, Vec<NodeId>)>> {
        self.try_stage(cluster, store, running_malleable, pending_job_pref, |j| {
            JobView::new(j).pref_node_count()
        })
        .or_else(|| {
            self.try_stage(cluster, store, running_malleable, pending_job_min, |j| {
                JobView::new(j).pref_node_count()
            })
        })
        .or_else(|| self.try_stage(cluster, store, running_malleable, pending_job_min, |j| j.num_nodes_min))
    }
}

fn take_unpromised(
    candidates: impl Iterator<Item = NodeId>,
    store: &AgreementStore,
    mut remaining: u32,
) -> Vec<NodeId> {
    let mut taken = Vec::new();
    for node in candidates {
        if remaining == 0 {
            break;
        }
        if !store.has_node(node) {
            taken.push(node);
            remaining -= 1;
        }
    }
    taken
}

/// Distributes `required_nodes` one at a time across donors, each time
/// picking the job with the **highest** `avg_priority` (most above its
/// floor) that still has a reclaimable node beyond `num_nodes_min`
/// (spec.md §4.2 average-anchored: `average_steal_agreement`). Abandons the
/// whole plan if any single pick has no eligible donor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageAnchoredShrink;

impl ShrinkPlanner for AverageAnchoredShrink {
    fn plan(
        &self,
        cluster: &Cluster,
        store: &AgreementStore,
        running_malleable: &[JobId],
        required_nodes: u32,
    ) -> Option<Vec<(JobId, Vec<NodeId>)>> {
        let mut collected: HashMap<JobId, Vec<NodeId>> =
            running_malleable.iter().map(|&j| (j, Vec::new())).collect();

        for _ in 0..required_nodes {
            let mut best: Option<(JobId, NodeId, f64)> = None;
            for &job_id in running_malleable {
                let Some(node) = next_reclaimable_node(cluster, store, job_id, &collected) else {
                    continue;
                };
                let job = cluster.job(job_id);
                let priority = avg_priority(job, -(collected[&job_id].len() as i64));
                if best.as_ref().map_or(true, |&(_, _, p)| priority > p) {
                    best = Some((job_id, node, priority));
                }
            }
            let (job_id, node, _) = best?;
            collected.get_mut(&job_id).unwrap().push(node);
        }

        let plan: Vec<(JobId, Vec<NodeId>)> = running_malleable
            .iter()
            .filter_map(|&j| {
                let nodes = collected.remove(&j)?;
                (!nodes.is_empty()).then_some((j, nodes))
            })
            .collect();
        Some(plan)
    }
}

/// The node at index `num_nodes_min` of `job`'s assigned list once nodes
/// already earmarked this round and agreement-bearing nodes are excluded —
/// i.e. the next node that can be taken without dropping the job below its
/// floor. `None` if the job has no slack left.
fn next_reclaimable_node(
    cluster: &Cluster,
    store: &AgreementStore,
    job_id: JobId,
    collected: &HashMap<JobId, Vec<NodeId>>,
) -> Option<NodeId> {
    let job = cluster.job(job_id);
    let already: HashSet<NodeId> = collected.values().flatten().copied().collect();
    let candidates: Vec<NodeId> = job
        .assigned_nodes
        .iter()
        .copied()
        .filter(|n| !already.contains(n) && !store.has_node(*n))
        .collect();
    candidates.get(job.num_nodes_min as usize).copied()
}

/// Applies a shrink plan: adds an agreement for `pending_job`, shrinks every
/// donor job, and emits `AGREEMENT_ADDED`/`SHRINK` events in that order per
/// donor (spec.md §4.2, §6).
pub fn apply_shrink_plan(
    cluster: &mut Cluster,
    store: &mut AgreementStore,
    pending_job: JobId,
    plan: Vec<(JobId, Vec<NodeId>)>,
    time: f64,
    sink: &mut dyn EventSink,
) {
    for (donor, nodes) in plan {
        store.add(pending_job, nodes.iter().copied());
        sink.record(
            time,
            EventKind::AgreementAdded,
            EventSubject::Transfer { donor, pending: pending_job },
            &nodes,
        );
        cluster.shrink_job(donor, &nodes);
        sink.record(time, EventKind::Shrink, EventSubject::Job(donor), &nodes);
    }
}
