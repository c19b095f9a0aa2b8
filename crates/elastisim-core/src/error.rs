use thiserror::Error;

use crate::JobId;

/// Invariant violations detected while injecting derived attributes into a
/// raw host job record. These are fatal: the driver re-raises them with its
/// variant name and lets the simulator abort (spec.md §7, "Invariant
/// violation").
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("job {job}: num_nodes_min ({min}) > num_nodes_pref ({pref})")]
    MinExceedsPref { job: JobId, min: u32, pref: u32 },

    #[error("job {job}: num_nodes_pref ({pref}) > num_nodes_max ({max})")]
    PrefExceedsMax { job: JobId, pref: u32, max: u32 },

    #[error("job {job}: rigid job node bounds must all be equal (min={min}, max={max})")]
    RigidBoundsMismatch { job: JobId, min: u32, max: u32 },
}
