use elastisim_core::{Cluster, EventKind, EventSink, EventSubject, JobId, NodeId};

use crate::store::AgreementStore;

/// The three agreement-resolution strategies from spec.md §4.3. All three
/// iterate pending jobs in queue order, consuming and mutating `pending`
/// and `free` in place, emitting `AGREEMENT_FULFILLED` on each start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverPolicy {
    /// Starts a job only once every node promised to it is free.
    Direct,
    /// Lets a job steal free nodes from other pending jobs' agreements when
    /// its own nodes are slow to free.
    Steal,
    /// Starts a job on any free nodes once enough total capacity exists,
    /// preferring agreement-bearing nodes first.
    Pool,
}

impl ResolverPolicy {
    pub fn resolve(
        self,
        cluster: &mut Cluster,
        store: &mut AgreementStore,
        pending: &mut Vec<JobId>,
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
    ) {
        match self {
            ResolverPolicy::Direct => resolve_direct(cluster, store, pending, free, time, sink),
            ResolverPolicy::Steal => resolve_steal(cluster, store, pending, free, time, sink),
            ResolverPolicy::Pool => resolve_pool(cluster, store, pending, free, time, sink),
        }
    }
}

/// Jobs from `pending`, in queue order, that currently have an agreement.
fn jobs_with_agreement(pending: &[JobId], store: &AgreementStore) -> Vec<JobId> {
    pending.iter().copied().filter(|&j| store.has_job(j)).collect()
}

fn apply_start(
    cluster: &mut Cluster,
    pending: &mut Vec<JobId>,
    free: &mut Vec<NodeId>,
    job: JobId,
    nodes: &[NodeId],
    time: f64,
    sink: &mut dyn EventSink,
) {
    let gpus = cluster.job(job).num_gpus_per_node_max;
    cluster.start_job(job, nodes, gpus, time);
    pending.retain(|&j| j != job);
    free.retain(|n| !nodes.contains(n));
    sink.record(time, EventKind::AgreementFulfilled, EventSubject::Job(job), nodes);
}

fn resolve_direct(
    cluster: &mut Cluster,
    store: &mut AgreementStore,
    pending: &mut Vec<JobId>,
    free: &mut Vec<NodeId>,
    time: f64,
    sink: &mut dyn EventSink,
) {
    for job in jobs_with_agreement(pending, store) {
        let promised = store.nodes_for(job).cloned().unwrap_or_default();
        let free_promised: Vec<NodeId> = free.iter().copied().filter(|n| promised.contains(n)).collect();
        if free_promised.len() == promised.len() {
            apply_start(cluster, pending, free, job, &free_promised, time, sink);
            store.remove(job, None);
        }
    }
}

fn resolve_steal(
    cluster: &mut Cluster,
    store: &mut AgreementStore,
    pending: &mut Vec<JobId>,
    free: &mut Vec<NodeId>,
    time: f64,
    sink: &mut dyn EventSink,
) {
    for job in jobs_with_agreement(pending, store) {
        let free_agreement_nodes: Vec<NodeId> =
            free.iter().copied().filter(|n| store.has_node(*n)).collect();
        if free_agreement_nodes.is_empty() {
            // No free agreement-bearing node anywhere: further jobs in the
            // queue cannot be helped by stealing this tick either, so we
            // stop here even though some of them might independently have
            // had agreements. Preserves the original's ordering discipline
            // (spec.md §9 open question).
            break;
        }

        let promised = store.nodes_for(job).cloned().unwrap_or_default();
        if promised.len() <= free_agreement_nodes.len() {
            // Nodes from `promised` that are not yet free: deterministic
            // ascending order is our tie-break for an otherwise
            // unordered set (spec.md §9 open question).
            let mut still_occupied: Vec<NodeId> = promised
                .iter()
                .copied()
                .filter(|n| !free_agreement_nodes.contains(n))
                .collect();
            still_occupied.sort();

            let free_from_others: Vec<NodeId> = free_agreement_nodes
                .iter()
                .copied()
                .filter(|n| !promised.contains(n))
                .collect();

            for (occupied, donated) in still_occupied.iter().zip(free_from_others.iter()) {
                store
                    .swap(*occupied, *donated)
                    .expect("nodes filtered from the store must be tracked by it");
            }

            let nodes_to_assign: Vec<NodeId> = free_agreement_nodes
                .iter()
                .copied()
                .filter(|n| store.nodes_for(job).is_some_and(|s| s.contains(n)))
                .collect();
            apply_start(cluster, pending, free, job, &nodes_to_assign, time, sink);
            store.remove(job, None);
        }
    }
}

fn resolve_pool(
    cluster: &mut Cluster,
    store: &mut AgreementStore,
    pending: &mut Vec<JobId>,
    free: &mut Vec<NodeId>,
    time: f64,
    sink: &mut dyn EventSink,
) {
    for job in jobs_with_agreement(pending, store) {
        if free.is_empty() {
            break;
        }
        let needed = store.nodes_for(job).map_or(0, |s| s.len());
        if needed > free.len() {
            continue;
        }

        let agreement_bearing: Vec<NodeId> =
            free.iter().copied().filter(|n| store.has_node(*n)).collect();
        let mut chosen: Vec<NodeId> = agreement_bearing.iter().take(needed).copied().collect();
        let remaining = needed.saturating_sub(chosen.len());
        if remaining > 0 {
            let plain_free: Vec<NodeId> =
                free.iter().copied().filter(|n| !store.has_node(*n)).collect();
            chosen.extend(plain_free.into_iter().take(remaining));
        }

        store.remove(job, None);
        for &node in &chosen {
            if agreement_bearing.contains(&node) {
                // Already this job's own node (cleared above) or another
                // job's reservation, which we properly detach here.
                store.drop_node(node);
            } else {
                // Surplus: a plain free node with no agreement of its own.
                // The pool is permissive about *whose* outstanding
                // bookkeeping it consumes to make room (spec.md §4.3).
                store.drop_arbitrary();
            }
        }

        apply_start(cluster, pending, free, job, &chosen, time, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastisim_core::{Job, JobArguments, JobType, Node, RecordingEventSink};

    fn elastic_job(id: u64, min: u32, max: u32) -> Job {
        Job::new_elastic(JobId(id), JobType::Malleable, min, max, None, 1, 0.0, JobArguments::new(10.0))
    }

    fn free_node(id: u64) -> Node {
        Node::new_free(NodeId(id))
    }

    #[test]
    fn direct_resolves_only_when_every_promised_node_is_free() {
        let mut cluster = Cluster::new(vec![elastic_job(1, 2, 2)], vec![free_node(0), free_node(1)]);
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0), NodeId(1)]);
        let mut pending = vec![JobId(1)];
        let mut free = vec![NodeId(0), NodeId(1)];
        let mut sink = RecordingEventSink::default();

        ResolverPolicy::Direct.resolve(&mut cluster, &mut store, &mut pending, &mut free, 5.0, &mut sink);

        assert!(pending.is_empty());
        assert!(free.is_empty());
        assert!(store.is_empty());
        assert_eq!(sink.events.len(), 1);
        assert_eq!(sink.events[0].kind, EventKind::AgreementFulfilled);
    }

    #[test]
    fn direct_defers_when_a_promised_node_is_still_occupied() {
        let mut cluster = Cluster::new(vec![elastic_job(1, 2, 2)], vec![free_node(0), free_node(1)]);
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0), NodeId(1)]);
        let mut pending = vec![JobId(1)];
        let mut free = vec![NodeId(0)]; // N1 still busy elsewhere
        let mut sink = RecordingEventSink::default();

        ResolverPolicy::Direct.resolve(&mut cluster, &mut store, &mut pending, &mut free, 5.0, &mut sink);

        assert_eq!(pending, vec![JobId(1)]);
        assert!(store.has_job(JobId(1)));
        assert!(sink.events.is_empty());
    }

    #[test]
    fn steal_lets_one_job_take_anothers_free_agreement_node() {
        // J1 <-> {N0} (busy), J2 <-> {N1} (free). Only N1 is free overall.
        let mut cluster = Cluster::new(
            vec![elastic_job(1, 1, 1), elastic_job(2, 1, 1)],
            vec![free_node(1)],
        );
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0)]);
        store.add(JobId(2), [NodeId(1)]);
        let mut pending = vec![JobId(1), JobId(2)];
        let mut free = vec![NodeId(1)];
        let mut sink = RecordingEventSink::default();

        ResolverPolicy::Steal.resolve(&mut cluster, &mut store, &mut pending, &mut free, 1.0, &mut sink);

        assert_eq!(pending, vec![JobId(2)]);
        assert_eq!(cluster.job(JobId(1)).assigned_nodes, vec![NodeId(1)]);
        assert!(store.has_job(JobId(2)));
        assert!(store.nodes_for(JobId(2)).unwrap().contains(&NodeId(0)));
    }

    #[test]
    fn pool_starts_job_from_mixed_agreement_and_plain_free_nodes() {
        let mut cluster = Cluster::new(vec![elastic_job(1, 2, 2)], vec![free_node(0), free_node(9)]);
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0)]);
        let mut pending = vec![JobId(1)];
        let mut free = vec![NodeId(0), NodeId(9)]; // N9 has no agreement
        let mut sink = RecordingEventSink::default();

        ResolverPolicy::Pool.resolve(&mut cluster, &mut store, &mut pending, &mut free, 2.0, &mut sink);

        assert!(pending.is_empty());
        let mut assigned = cluster.job(JobId(1)).assigned_nodes.clone();
        assigned.sort();
        assert_eq!(assigned, vec![NodeId(0), NodeId(9)]);
        assert!(store.is_empty());
    }

    #[test]
    fn resolving_empty_store_changes_nothing() {
        let mut cluster = Cluster::new(vec![], vec![free_node(0)]);
        let mut store = AgreementStore::new();
        let mut pending = vec![];
        let mut free = vec![NodeId(0)];
        let mut sink = RecordingEventSink::default();
        for policy in [ResolverPolicy::Direct, ResolverPolicy::Steal, ResolverPolicy::Pool] {
            policy.resolve(&mut cluster, &mut store, &mut pending, &mut free, 0.0, &mut sink);
        }
        assert_eq!(free, vec![NodeId(0)]);
        assert!(sink.events.is_empty());
    }
}
