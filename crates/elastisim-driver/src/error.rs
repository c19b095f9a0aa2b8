use elastisim_core::DomainError;
use thiserror::Error;

/// Errors a [`crate::Scheduler`] tick can fail with. Only invariant
/// violations are fatal (spec.md §7); infeasible plans and partial shrinks
/// are not errors at all — a planner just returns `None` and the driver
/// moves on. The driver prefixes every error with its variant's name before
/// propagating it, matching the original scheduler entry points' own
/// `except Exception as e: print(f"Scheduler Error for {name}"); raise e`.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler Error for {variant}: {source}")]
    Invariant {
        variant: &'static str,
        #[source]
        source: DomainError,
    },
}
