use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for tally operations.
///
/// Each kind describes one category of failure so callers can decide how to react,
/// e.g. retry with backoff on [ErrorKind::StorageUnavailable] but surface
/// [ErrorKind::NotFound] immediately.
///
/// # Examples
///
/// ```rust,ignore
/// use tally::errors::{ErrorKind, TallyError, TallyResult};
///
/// fn example() -> TallyResult<()> {
///     Err(TallyError::new("Counter not found", ErrorKind::NotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Sequence Errors
    /// The named counter does not exist and lazy creation is not enabled
    NotFound,
    /// The atomic increment-and-fetch could not be executed by the store
    StorageUnavailable,
    /// The counter name is empty or blank
    InvalidName,
    /// The counter reached `u64::MAX` and cannot be incremented further
    SequenceOverflow,

    // Operation Errors
    /// The operation is not valid in the current context
    InvalidOperation,

    // Data Encoding Errors
    /// A stored counter record could not be encoded or decoded
    EncodingError,

    // Backend and Store Errors
    /// Error from a storage backend
    BackendError,
    /// Generic IO error
    IOError,
    /// Store has not been opened yet
    StoreNotInitialized,
    /// Store has already been closed
    StoreAlreadyClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::StorageUnavailable => write!(f, "Storage unavailable"),
            ErrorKind::InvalidName => write!(f, "Invalid name"),
            ErrorKind::SequenceOverflow => write!(f, "Sequence overflow"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::StoreAlreadyClosed => write!(f, "Store already closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom tally error type.
///
/// `TallyError` carries a message, an [ErrorKind], an optional cause and a backtrace
/// captured at construction. Errors raised for a specific sequence also remember the
/// sequence name, so a caller retrying a [ErrorKind::StorageUnavailable] failure knows
/// which counter to retry.
///
/// # Examples
///
/// ```rust,ignore
/// use tally::errors::{ErrorKind, TallyError};
///
/// let cause = TallyError::new("disk detached", ErrorKind::IOError);
/// let err = TallyError::storage_unavailable("cities", cause);
/// assert_eq!(err.sequence_name(), Some("cities"));
/// ```
#[derive(Clone)]
pub struct TallyError {
    message: String,
    error_kind: ErrorKind,
    sequence_name: Option<String>,
    cause: Option<Box<TallyError>>,
    backtrace: Atomic<Backtrace>,
}

impl TallyError {
    /// Creates a new `TallyError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        TallyError {
            message: message.to_string(),
            error_kind,
            sequence_name: None,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `TallyError` with a cause error.
    ///
    /// The cause is preserved and reported through [Error::source] and the
    /// `Debug` output.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: TallyError) -> Self {
        TallyError {
            message: message.to_string(),
            error_kind,
            sequence_name: None,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Error raised when `name` has no backing counter.
    pub fn not_found(name: &str) -> Self {
        let mut error = TallyError::new(
            &format!("Sequence '{}' not found", name),
            ErrorKind::NotFound,
        );
        error.sequence_name = Some(name.to_string());
        error
    }

    /// Error raised when the store could not run the atomic primitive for `name`.
    pub fn storage_unavailable(name: &str, cause: TallyError) -> Self {
        let mut error = TallyError::new_with_cause(
            &format!("Storage unavailable for sequence '{}': {}", name, cause.message()),
            ErrorKind::StorageUnavailable,
            cause,
        );
        error.sequence_name = Some(name.to_string());
        error
    }

    /// Error raised when `name` cannot be incremented past `u64::MAX`.
    pub fn overflow(name: &str) -> Self {
        let mut error = TallyError::new(
            &format!("Sequence '{}' has reached its maximum value", name),
            ErrorKind::SequenceOverflow,
        );
        error.sequence_name = Some(name.to_string());
        error
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&TallyError> {
        self.cause.as_deref()
    }

    /// Name of the sequence this error was raised for, if any.
    pub fn sequence_name(&self) -> Option<&str> {
        self.sequence_name.as_deref()
    }
}

impl Display for TallyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for TallyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for TallyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for tally operations.
pub type TallyResult<T> = Result<T, TallyError>;

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        TallyError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<String> for TallyError {
    fn from(msg: String) -> Self {
        TallyError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for TallyError {
    fn from(msg: &str) -> Self {
        TallyError::new(msg, ErrorKind::InternalError)
    }
}
