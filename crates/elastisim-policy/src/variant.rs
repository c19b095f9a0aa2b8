use elastisim_agreements::{AgreementStore, ResolverPolicy};
use elastisim_core::{Cluster, EventSink, JobId, JobView, NodeId};

use crate::admission::{MinAnchoredStart, PrefAnchoredStart, StartTarget};
use crate::expand::{AverageAnchoredExpand, ExpandPlanner, MinAnchoredExpand, PrefAnchoredExpand};
use crate::shrink::{AverageAnchoredShrink, MinAnchoredShrink, PrefAnchoredShrink, ShrinkPlanner};

/// Which shrink-for-pending strategy a variant uses. Kept as its own enum
/// (rather than a `Box<dyn ShrinkPlanner>`) because pref-anchored shrink
/// needs two node-count targets from the pending job, not one, and so
/// cannot share the single-`required_nodes` trait shape with the other two
/// (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShrinkPolicy {
    MinAnchored,
    PrefAnchored,
    AverageAnchored,
}

impl ShrinkPolicy {
    fn plan(
        self,
        cluster: &Cluster,
        store: &AgreementStore,
        running_malleable: &[JobId],
        pending_job: JobId,
    ) -> Option<Vec<(JobId, Vec<NodeId>)>> {
        let view = JobView::new(cluster.job(pending_job));
        match self {
            ShrinkPolicy::MinAnchored => {
                MinAnchoredShrink.plan(cluster, store, running_malleable, view.job().num_nodes_min)
            }
            ShrinkPolicy::PrefAnchored => PrefAnchoredShrink.plan_for_job(
                cluster,
                store,
                running_malleable,
                view.pref_node_count(),
                view.job().num_nodes_min,
            ),
            ShrinkPolicy::AverageAnchored => {
                AverageAnchoredShrink.plan(cluster, store, running_malleable, view.job().num_nodes_min)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandPolicy {
    MinAnchored,
    PrefAnchored,
    AverageAnchored,
}

impl ExpandPolicy {
    fn expand(
        self,
        cluster: &mut Cluster,
        running_malleable: &[JobId],
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
    ) {
        match self {
            ExpandPolicy::MinAnchored => MinAnchoredExpand.expand(cluster, running_malleable, free, time, sink),
            ExpandPolicy::PrefAnchored => PrefAnchoredExpand.expand(cluster, running_malleable, free, time, sink),
            ExpandPolicy::AverageAnchored => {
                AverageAnchoredExpand.expand(cluster, running_malleable, free, time, sink)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    MinAnchored,
    PrefAnchored,
}

impl StartPolicy {
    fn target(self) -> &'static dyn StartTarget {
        match self {
            StartPolicy::MinAnchored => &MinAnchoredStart,
            StartPolicy::PrefAnchored => &PrefAnchoredStart,
        }
    }
}

/// A fully composed scheduling strategy: one choice along each of the four
/// independent axes spec.md §4 describes. The four canonical named
/// variants ([`Variant::rigid_easy_backfill`], [`Variant::min_common_pool`],
/// [`Variant::pref_common_pool`], [`Variant::average_steal_agreement`]) are
/// convenience constructors; any other combination is equally valid and
/// constructible directly.
#[derive(Debug, Clone, Copy)]
pub struct Variant {
    pub name: &'static str,
    pub start: StartPolicy,
    pub shrink: Option<ShrinkPolicy>,
    pub expand: Option<ExpandPolicy>,
    pub resolver: Option<ResolverPolicy>,
    pub easy_backfill: bool,
}

impl Variant {
    /// FCFS with EASY backfilling, rigid jobs only: no shrinking, no
    /// expanding, no agreements (spec.md §4.1, `rigid_easy_backfill`).
    pub fn rigid_easy_backfill() -> Self {
        Self {
            name: "rigid_easy_backfill",
            start: StartPolicy::MinAnchored,
            shrink: None,
            expand: None,
            resolver: None,
            easy_backfill: true,
        }
    }

    /// FCFS/EASY admission at `num_nodes_min`, min-anchored rebalancing,
    /// pool agreement resolution (spec.md §4, `min_common_pool`).
    pub fn min_common_pool() -> Self {
        Self {
            name: "min_common_pool",
            start: StartPolicy::MinAnchored,
            shrink: Some(ShrinkPolicy::MinAnchored),
            expand: Some(ExpandPolicy::MinAnchored),
            resolver: Some(ResolverPolicy::Pool),
            easy_backfill: true,
        }
    }

    /// FCFS/EASY admission toward `num_nodes_pref`, pref-anchored
    /// rebalancing, pool agreement resolution (spec.md §4,
    /// `pref_common_pool`).
    pub fn pref_common_pool() -> Self {
        Self {
            name: "pref_common_pool",
            start: StartPolicy::PrefAnchored,
            shrink: Some(ShrinkPolicy::PrefAnchored),
            expand: Some(ExpandPolicy::PrefAnchored),
            resolver: Some(ResolverPolicy::Pool),
            easy_backfill: true,
        }
    }

    /// FCFS/EASY admission at `num_nodes_min`, average-anchored
    /// rebalancing, stealing agreement resolution (spec.md §4,
    /// `average_steal_agreement`).
    pub fn average_steal_agreement() -> Self {
        Self {
            name: "average_steal_agreement",
            start: StartPolicy::MinAnchored,
            shrink: Some(ShrinkPolicy::AverageAnchored),
            expand: Some(ExpandPolicy::AverageAnchored),
            resolver: Some(ResolverPolicy::Steal),
            easy_backfill: true,
        }
    }

    pub fn start_target(&self) -> &'static dyn StartTarget {
        self.start.target()
    }

    pub fn plan_shrink(
        &self,
        cluster: &Cluster,
        store: &AgreementStore,
        running_malleable: &[JobId],
        pending_job: JobId,
    ) -> Option<Vec<(JobId, Vec<NodeId>)>> {
        self.shrink?.plan(cluster, store, running_malleable, pending_job)
    }

    pub fn run_expand(
        &self,
        cluster: &mut Cluster,
        running_malleable: &[JobId],
        free: &mut Vec<NodeId>,
        time: f64,
        sink: &mut dyn EventSink,
    ) {
        if let Some(policy) = self.expand {
            policy.expand(cluster, running_malleable, free, time, sink);
        }
    }
}
