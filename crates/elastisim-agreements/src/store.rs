use std::collections::{HashMap, HashSet};

use elastisim_core::{JobId, NodeId};

use crate::error::AgreementError;

/// Bi-directional mapping between a pending job and the nodes promised to
/// it once a running malleable job frees them (spec.md §3, §4.2).
///
/// `by_job` and `by_node` are kept as exact inverses on every mutation: no
/// operation leaves a dangling half-edge. One instance lives per scheduler
/// variant and survives across ticks (spec.md §5).
#[derive(Debug, Default)]
pub struct AgreementStore {
    by_job: HashMap<JobId, HashSet<NodeId>>,
    by_node: HashMap<NodeId, JobId>,
}

impl AgreementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promises `nodes` to `job`, unioning with any prior reservation for
    /// the same job.
    pub fn add(&mut self, job: JobId, nodes: impl IntoIterator<Item = NodeId>) {
        let entry = self.by_job.entry(job).or_default();
        for node in nodes {
            entry.insert(node);
            self.by_node.insert(node, job);
        }
    }

    /// Drops `job`'s reservation. If `node_ids` is `Some`, only those nodes
    /// are released (and must belong to the job); otherwise every node
    /// promised to the job is released. Returns the nodes that were
    /// released.
    pub fn remove(&mut self, job: JobId, node_ids: Option<&[NodeId]>) -> HashSet<NodeId> {
        let Some(mut owned) = self.by_job.remove(&job) else {
            return HashSet::new();
        };
        let to_release: HashSet<NodeId> = match node_ids {
            None => owned.clone(),
            Some(ids) => ids.iter().copied().filter(|n| owned.contains(n)).collect(),
        };
        for node in &to_release {
            owned.remove(node);
            self.by_node.remove(node);
        }
        if !owned.is_empty() {
            // Partial removal: put the remaining reservation back.
            self.by_job.insert(job, owned);
        }
        to_release
    }

    /// Removes a single node's reservation regardless of which job it
    /// belongs to, keeping both maps consistent. Returns the job it was
    /// released from, if any.
    pub fn drop_node(&mut self, node: NodeId) -> Option<JobId> {
        let job = self.by_node.remove(&node)?;
        if let Some(set) = self.by_job.get_mut(&job) {
            set.remove(&node);
            if set.is_empty() {
                self.by_job.remove(&job);
            }
        }
        Some(job)
    }

    /// Drops one arbitrary outstanding reservation, used by the Pool
    /// resolver when it borrows surplus free-node capacity beyond what the
    /// starting job's own agreement accounts for (spec.md §4.3 Pool:
    /// "drop one arbitrary stale by-node entry"). Picking the
    /// lowest node id makes the choice deterministic.
    pub fn drop_arbitrary(&mut self) -> Option<(NodeId, JobId)> {
        let node = *self.by_node.keys().min()?;
        let job = self.drop_node(node)?;
        Some((node, job))
    }

    pub fn has_job(&self, job: JobId) -> bool {
        self.by_job.contains_key(&job)
    }

    pub fn has_node(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    pub fn nodes_for(&self, job: JobId) -> Option<&HashSet<NodeId>> {
        self.by_job.get(&job)
    }

    /// Atomically rotates ownership: the jobs currently owning `a` and `b`
    /// exchange them. Both nodes must already be in the store.
    pub fn swap(&mut self, a: NodeId, b: NodeId) -> Result<(), AgreementError> {
        let job_a = *self.by_node.get(&a).ok_or(AgreementError::NotInStore(a))?;
        let job_b = *self.by_node.get(&b).ok_or(AgreementError::NotInStore(b))?;

        self.by_job.get_mut(&job_a).unwrap().remove(&a);
        self.by_job.get_mut(&job_a).unwrap().insert(b);
        self.by_job.get_mut(&job_b).unwrap().remove(&b);
        self.by_job.get_mut(&job_b).unwrap().insert(a);

        self.by_node.insert(a, job_b);
        self.by_node.insert(b, job_a);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.by_job.is_empty() && self.by_node.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_job.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_restores_empty_store() {
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0), NodeId(1)]);
        assert!(store.has_job(JobId(1)));
        assert!(store.has_node(NodeId(0)));
        store.remove(JobId(1), None);
        assert!(store.is_empty());
    }

    #[test]
    fn add_unions_with_prior_reservation() {
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0)]);
        store.add(JobId(1), [NodeId(1)]);
        assert_eq!(store.nodes_for(JobId(1)).unwrap().len(), 2);
    }

    #[test]
    fn partial_remove_keeps_remaining_reservation() {
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0), NodeId(1)]);
        let removed = store.remove(JobId(1), Some(&[NodeId(0)]));
        assert_eq!(removed, HashSet::from([NodeId(0)]));
        assert!(store.has_job(JobId(1)));
        assert!(!store.has_node(NodeId(0)));
        assert!(store.has_node(NodeId(1)));
    }

    #[test]
    fn swap_exchanges_node_ownership_between_jobs() {
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0)]);
        store.add(JobId(2), [NodeId(1)]);
        store.swap(NodeId(0), NodeId(1)).unwrap();
        assert!(store.nodes_for(JobId(1)).unwrap().contains(&NodeId(1)));
        assert!(store.nodes_for(JobId(2)).unwrap().contains(&NodeId(0)));
        assert_eq!(store.by_node[&NodeId(0)], JobId(2));
        assert_eq!(store.by_node[&NodeId(1)], JobId(1));
    }

    #[test]
    fn swap_rejects_nodes_outside_the_store() {
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0)]);
        assert_eq!(
            store.swap(NodeId(0), NodeId(9)),
            Err(AgreementError::NotInStore(NodeId(9)))
        );
    }

    #[test]
    fn drop_node_keeps_maps_as_exact_inverses() {
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(0), NodeId(1)]);
        let job = store.drop_node(NodeId(0)).unwrap();
        assert_eq!(job, JobId(1));
        assert!(!store.has_node(NodeId(0)));
        assert!(store.nodes_for(JobId(1)).unwrap().contains(&NodeId(1)));
    }

    #[test]
    fn drop_arbitrary_picks_lowest_node_id_deterministically() {
        let mut store = AgreementStore::new();
        store.add(JobId(1), [NodeId(5)]);
        store.add(JobId(2), [NodeId(2)]);
        let (node, job) = store.drop_arbitrary().unwrap();
        assert_eq!(node, NodeId(2));
        assert_eq!(job, JobId(2));
    }

    #[test]
    fn resolving_an_empty_store_is_a_no_op() {
        let store = AgreementStore::new();
        assert!(store.is_empty());
        assert_eq!(store.nodes_for(JobId(1)), None);
    }
}
