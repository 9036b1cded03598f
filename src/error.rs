use std::fmt;

use backtrace::Backtrace;

/// The kind of failure a [`SmallError`] represents.
///
/// Kept small and closed so callers can match on it instead of parsing
/// the message: the deadlock/resource-exhaustion/bad-input distinction
/// is what lets a transaction driver decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The lock table detected a deadlock cycle and aborted the
    /// requester. Retryable after `complete_transaction(tid, false)`.
    TransactionAborted,
    /// The page cache is full and every resident page is dirty or
    /// locked, so no eviction victim exists.
    ResourceExhausted,
    /// Caller-supplied data is invalid (null tuple, unknown table,
    /// schema mismatch). Not retryable without fixing the input.
    BadInput,
    /// The underlying page store failed a read or write.
    Io,
    /// Anything else (parse errors from the SQL front end, etc).
    Other,
}

#[derive(Debug)]
pub struct SmallError {
    kind: ErrorKind,
    details: String,
    backtrace: Backtrace,
}

impl SmallError {
    pub fn new(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::Other, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: &str) -> SmallError {
        SmallError {
            kind,
            details: msg.to_string(),
            backtrace: Backtrace::new(),
        }
    }

    pub fn aborted(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::TransactionAborted, msg)
    }

    pub fn resource_exhausted(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::ResourceExhausted, msg)
    }

    pub fn bad_input(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::BadInput, msg)
    }

    pub fn io(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::Io, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ErrorKind::TransactionAborted
    }

    /// Log the captured backtrace at error level. Called at detection
    /// sites (deadlock, I/O failure) rather than at every propagation
    /// hop, matching the teacher's sparing use of this call.
    pub fn show_backtrace(&self) {
        log::error!("{}\n{:?}", self.details, self.backtrace);
    }
}

impl fmt::Display for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.details)
    }
}

impl std::error::Error for SmallError {}
