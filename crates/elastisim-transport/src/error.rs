use thiserror::Error;

/// Transport-layer failures (spec.md §7 "Transport failure"). These are
/// always fatal to the current invocation: the caller has no way to recover
/// a half-read or half-written frame.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed transport url {0:?}: expected ipc://<path>")]
    InvalidUrl(String),

    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request/reply frame: {0}")]
    Frame(#[from] serde_json::Error),
}
