//! Domain model for the ElastiSim scheduler family.
//!
//! `Job` and `Node` are the host-provided records the simulator hands the
//! scheduler on every invocation (see [`crate::job`] and [`crate::node`]).
//! They are plain data plus the small set of mutating operations the host
//! exposes (`assign`, `assign_num_gpus_per_node`, `remove`). Derived,
//! read-only attributes (estimated runtime, imputed preferred node count,
//! rebalancing priorities) live on the [`JobView`] wrapper instead of on the
//! record itself, so that nothing in this crate ever mutates a host record
//! except through the exposed operations.

mod cluster;
mod error;
mod event;
mod ids;
mod job;
mod node;

pub use cluster::Cluster;
pub use error::DomainError;
pub use event::{EventKind, EventRecord, EventSink, EventSubject, NullEventSink, RecordingEventSink};
pub use ids::{JobId, NodeId};
pub use job::{Job, JobArguments, JobState, JobType, JobView};
pub use node::{Node, NodeState};
