use serde::{Deserialize, Serialize};

use crate::ids::{JobId, NodeId};

/// The kinds of scheduling events the driver emits, matching the CSV event
/// log's `Event` column (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Start,
    Expand,
    Shrink,
    Stop,
    Kill,
    AgreementAdded,
    AgreementFulfilled,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "START",
            EventKind::Expand => "EXPAND",
            EventKind::Shrink => "SHRINK",
            EventKind::Stop => "STOP",
            EventKind::Kill => "KILL",
            EventKind::AgreementAdded => "AGREEMENT_ADDED",
            EventKind::AgreementFulfilled => "AGREEMENT_FULFILLED",
        }
    }
}

/// Who an event is about. `Transfer` is only used for `AGREEMENT_ADDED`,
/// rendered as `J<donor> -> J<pending>` (spec.md §6); every other event
/// names a single job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Job(JobId),
    Transfer { donor: JobId, pending: JobId },
}

impl std::fmt::Display for EventSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSubject::Job(id) => write!(f, "{id}"),
            EventSubject::Transfer { donor, pending } => write!(f, "{donor} -> {pending}"),
        }
    }
}

/// Capability interface for recording scheduling events, so tests can
/// substitute an in-memory sink and assert on ordered event traces
/// (spec.md §9 Design Notes).
pub trait EventSink {
    fn record(&mut self, time: f64, kind: EventKind, subject: EventSubject, nodes: &[NodeId]);
}

/// An [`EventSink`] that does nothing — used by callers that only want the
/// scheduling decision, not the event trace (e.g. the rigid-only variant's
/// unused resolver path).
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn record(&mut self, _time: f64, _kind: EventKind, _subject: EventSubject, _nodes: &[NodeId]) {}
}

/// An [`EventSink`] that keeps every recorded event in memory, in emission
/// order, for tests and the in-process replay transport.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventSink {
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub time: f64,
    pub kind: EventKind,
    pub subject: EventSubject,
    pub nodes: Vec<NodeId>,
}

impl EventSink for RecordingEventSink {
    fn record(&mut self, time: f64, kind: EventKind, subject: EventSubject, nodes: &[NodeId]) {
        self.events.push(EventRecord {
            time,
            kind,
            subject,
            nodes: nodes.to_vec(),
        });
    }
}
