//! Classify visit failures into retry policy failure kinds.

use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Kind of failure a visit ended with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request ran past its overall deadline
    ContextDeadlineExceeded,
    /// Establishing the connection timed out
    ConnectionTimedOut,
    /// The peer reset the connection (TCP RST)
    ConnectionReset,
    /// Anything else; never retried
    Other,
}

impl FailureKind {
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextDeadlineExceeded => "context_deadline_exceeded",
            Self::ConnectionTimedOut => "connection_timed_out",
            Self::ConnectionReset => "connection_reset",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an error by walking its `source()` chain
///
/// The first error in the chain that identifies a transient condition
/// decides the kind; errors that never do are [`FailureKind::Other`].
pub fn classify(error: &(dyn StdError + 'static)) -> FailureKind {
    let mut current = Some(error);

    while let Some(err) = current {
        if let Some(kind) = classify_one(err) {
            return kind;
        }
        current = err.source();
    }

    FailureKind::Other
}

fn classify_one(err: &(dyn StdError + 'static)) -> Option<FailureKind> {
    if let Some(e) = err.downcast_ref::<reqwest::Error>() {
        if e.is_timeout() {
            return Some(if e.is_connect() {
                FailureKind::ConnectionTimedOut
            } else {
                FailureKind::ContextDeadlineExceeded
            });
        }
        return None;
    }

    if let Some(e) = err.downcast_ref::<io::Error>() {
        return classify_io(e.kind());
    }

    if err.is::<tokio::time::error::Elapsed>() {
        return Some(FailureKind::ContextDeadlineExceeded);
    }

    None
}

fn classify_io(kind: io::ErrorKind) -> Option<FailureKind> {
    match kind {
        io::ErrorKind::TimedOut => Some(FailureKind::ConnectionTimedOut),
        io::ErrorKind::ConnectionReset => Some(FailureKind::ConnectionReset),
        _ => None,
    }
}
