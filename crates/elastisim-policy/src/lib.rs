//! Admission and rebalancing policies for the ElastiSim scheduler family.
//!
//! [`admission::admit_pending_jobs`] implements FCFS-with-EASY-backfilling.
//! [`shrink`] and [`expand`] hold the three interchangeable rebalancing
//! strategies. [`Variant`] composes a start target, shrink planner, expand
//! planner and agreement resolver into one named, runnable strategy.

mod admission;
mod expand;
mod priority;
mod shrink;
mod variant;

pub use admission::{admit_pending_jobs, MinAnchoredStart, PrefAnchoredStart, StartTarget};
pub use expand::{AverageAnchoredExpand, ExpandPlanner, MinAnchoredExpand, PrefAnchoredExpand};
pub use priority::{avg_priority, min_priority, pref_priority};
pub use shrink::{apply_shrink_plan, AverageAnchoredShrink, MinAnchoredShrink, PrefAnchoredShrink, ShrinkPlanner};
pub use variant::{ExpandPolicy, ShrinkPolicy, StartPolicy, Variant};
