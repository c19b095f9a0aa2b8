use std::collections::HashMap;

use elastisim_core::{Cluster, EventKind, EventSink, EventSubject, JobId, JobView, NodeId};

use crate::priority::{avg_priority, min_priority, pref_priority};

/// Grows running malleable jobs with whatever nodes are still free after
/// admission and shrink-for-pending have run (spec.md §4.2). Mutates
/// `free` in place and emits `EXPAND` per job actually grown.
pub trait ExpandPlanner {
    fn expand(
        &self,
        cluster: &mut Cluster,
        running_malleable: &[JobId],
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
    );
}

/// Expands the job with the fewest nodes above its floor first, each
/// capped at `num_nodes_max` (spec.md §4.2 min-anchored).
#[derive(Debug, Clone, Copy, Default)]
pub struct MinAnchoredExpand;

impl ExpandPlanner for MinAnchoredExpand {
    fn expand(
        &self,
        cluster: &mut Cluster,
        running_malleable: &[JobId],
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
    ) {
        let mut donors = running_malleable.to_vec();
        donors.sort_by_key(|&id| min_priority(cluster.job(id)));

        for job_id in donors {
            if free.is_empty() {
                break;
            }
            let job = cluster.job(job_id);
            let room = job.num_nodes_max.saturating_sub(job.assigned_nodes.len() as u32) as usize;
            if room == 0 {
                continue;
            }
            let take = room.min(free.len());
            let nodes: Vec<NodeId> = free.drain(..take).collect();
            cluster.expand_job(job_id, &nodes);
            sink.record(time, EventKind::Expand, EventSubject::Job(job_id), &nodes);
        }
    }
}

/// Expands toward `num_nodes_pref` first (lowest `pref_priority` first),
/// then makes a second pass toward `num_nodes_max` with whatever free nodes
/// remain (spec.md §4.2 pref-anchored).
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefAnchoredExpand;

impl PrefAnchoredExpand {
    fn pass(
        &self,
        cluster: &mut Cluster,
        running_malleable: &[JobId],
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
        ceiling: impl Fn(&elastisim_core::Job) -> u32,
    ) {
        let mut donors = running_malleable.to_vec();
        donors.sort_by_key(|&id| {
            let job = cluster.job(id);
            pref_priority(job, JobView::new(job).pref_node_count())
        });

        for job_id in donors {
            if free.is_empty() {
                break;
            }
            let job = cluster.job(job_id);
            let target = ceiling(job);
            let room = (target as i64 - job.assigned_nodes.len() as i64).max(0) as usize;
            if room == 0 {
                continue;
            }
            let take = room.min(free.len());
            let nodes: Vec<NodeId> = free.drain(..take).collect();
            cluster.expand_job(job_id, &nodes);
            sink.record(time, EventKind::Expand, EventSubject::Job(job_id), &nodes);
        }
    }
}

impl ExpandPlanner for PrefAnchoredExpand {
    fn expand(
        &self,
        cluster: &mut Cluster,
        running_malleable: &[JobId],
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
    ) {
        self.pass(cluster, running_malleable, free, time, sink, |j| {
            JobView::new(j).pref_node_count()
        });
        self.pass(cluster, running_malleable, free, time, sink, |j| j.num_nodes_max);
    }
}

/// Virtually distributes free nodes one at a time: each step picks the job
/// with the **lowest** `avg_priority` and earmarks it one more node, unless
/// it is already at `num_nodes_max` (in which case distribution stops
/// entirely for this tick, even if nodes remain free). The accumulated
/// per-job counts are then applied in one pass (spec.md §4.2
/// average-anchored).
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageAnchoredExpand;

impl ExpandPlanner for AverageAnchoredExpand {
    fn expand(
        &self,
        cluster: &mut Cluster,
        running_malleable: &[JobId],
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
    ) {
        if running_malleable.is_empty() {
            return;
        }
        let mut earmarked: HashMap<JobId, u32> = running_malleable.iter().map(|&j| (j, 0)).collect();

        for _ in 0..free.len() {
            let job_id = *running_malleable
                .iter()
                .min_by(|&&a, &&b| {
                    let pa = avg_priority(cluster.job(a), earmarked[&a] as i64);
                    let pb = avg_priority(cluster.job(b), earmarked[&b] as i64);
                    pa.total_cmp(&pb)
                })
                .expect("running_malleable is non-empty");

            let job = cluster.job(job_id);
            if job.assigned_nodes.len() as u32 == job.num_nodes_max {
                break;
            }
            *earmarked.get_mut(&job_id).unwrap() += 1;
        }

        for &job_id in running_malleable {
            let amount = earmarked[&job_id];
            if amount == 0 || free.is_empty() {
                continue;
            }
            let job = cluster.job(job_id);
            let room = job.num_nodes_max.saturating_sub(job.assigned_nodes.len() as u32);
            let take = (amount.min(room) as usize).min(free.len());
            if take == 0 {
                continue;
            }
            let nodes: Vec<NodeId> = free.drain(..take).collect();
            cluster.expand_job(job_id, &nodes);
            sink.record(time, EventKind::Expand, EventSubject::Job(job_id), &nodes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastisim_core::{Job, JobArguments, JobState, JobType, Node, RecordingEventSink};

    fn running_malleable(id: u64, min: u32, max: u32, assigned: &[u64]) -> Job {
        let mut job = Job::new_elastic(JobId(id), JobType::Malleable, min, max, None, 1, 0.0, JobArguments::new(10.0));
        job.assigned_nodes = assigned.iter().map(|&n| NodeId(n)).collect();
        job.state = JobState::Running;
        job
    }

    fn free_node(id: u64) -> Node {
        Node::new_free(NodeId(id))
    }

    #[test]
    fn min_anchored_expand_prefers_the_job_closest_to_its_floor() {
        let mut cluster = Cluster::new(
            vec![running_malleable(1, 1, 10, &[10]), running_malleable(2, 1, 10, &[20, 21, 22])],
            vec![free_node(0)],
        );
        let mut free = vec![NodeId(0)];
        let mut sink = RecordingEventSink::default();

        MinAnchoredExpand.expand(&mut cluster, &[JobId(1), JobId(2)], &mut free, 1.0, &mut sink);

        assert_eq!(cluster.job(JobId(1)).assigned_nodes, vec![NodeId(10), NodeId(0)]);
        assert_eq!(cluster.job(JobId(2)).assigned_nodes, vec![NodeId(20), NodeId(21), NodeId(22)]);
    }

    #[test]
    fn average_anchored_expand_never_exceeds_a_jobs_max() {
        let mut cluster = Cluster::new(
            vec![running_malleable(1, 0, 1, &[10])],
            vec![free_node(0), free_node(1)],
        );
        let mut free = vec![NodeId(0), NodeId(1)];
        let mut sink = RecordingEventSink::default();

        AverageAnchoredExpand.expand(&mut cluster, &[JobId(1)], &mut free, 1.0, &mut sink);

        assert_eq!(cluster.job(JobId(1)).assigned_nodes.len(), 1);
        assert_eq!(free.len(), 2); // job was already at max; nothing moves
    }

    #[test]
    fn average_anchored_expand_piles_onto_the_least_full_job_until_its_own_max() {
        // Three jobs at (2, 3, 4) of [2, 6] with 3 free nodes: every pick
        // keeps favoring the currently-least-utilized job over the others
        // (its virtual priority only drops further), so it takes all three
        // nodes rather than the group settling on an equal split.
        let mut cluster = Cluster::new(
            vec![
                running_malleable(1, 2, 6, &[0, 1]),
                running_malleable(2, 2, 6, &[2, 3, 4]),
                running_malleable(3, 2, 6, &[5, 6, 7, 8]),
            ],
            vec![free_node(9), free_node(10), free_node(11)],
        );
        let mut free = vec![NodeId(9), NodeId(10), NodeId(11)];
        let mut sink = RecordingEventSink::default();

        AverageAnchoredExpand.expand(&mut cluster, &[JobId(1), JobId(2), JobId(3)], &mut free, 1.0, &mut sink);

        let counts: Vec<usize> = [1, 2, 3]
            .into_iter()
            .map(|id| cluster.job(JobId(id)).assigned_nodes.len())
            .collect();
        assert_eq!(counts, vec![5, 3, 4]);
        assert!(free.is_empty());
    }
}
