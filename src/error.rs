use thiserror::Error;

/// Errors raised by graph operations on a [`ScreenFlow`](crate::ScreenFlow).
///
/// Everything here is local and recoverable: the flow an operation was given
/// is never left half-mutated. Callers feeding gestures from a UI are
/// expected to drop stale-reference errors silently, since those only arise
/// from transient races between a gesture and a concurrent deletion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown screen node: {0}")]
    InvalidNodeReference(String),

    #[error("unknown connection: {0}")]
    InvalidConnectionReference(String),

    #[error("screen {0} is already part of this flow")]
    DuplicateScreen(String),

    #[error("screen node references a missing screen: {0}")]
    MissingScreenReference(String),
}
