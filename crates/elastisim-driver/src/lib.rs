//! The per-tick scheduling pipeline for the ElastiSim scheduler family.
//!
//! [`Scheduler`] ties the domain model (`elastisim-core`), the agreement
//! store and resolvers (`elastisim-agreements`), and the admission/shrink/
//! expand policies (`elastisim-policy`) together into the single `tick`
//! entry point a transport loop calls once per simulator request.

mod error;
mod scheduler;

pub use error::SchedulerError;
pub use scheduler::Scheduler;
