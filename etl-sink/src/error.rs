//! Error types and result definitions for record conversion.
//!
//! Every fallible operation in this crate returns a [`SinkError`], which carries an [`ErrorKind`]
//! used by callers to pick a failure policy (fail the task, route the record to a dead-letter
//! path or abort the batch), plus the diagnostic metadata captured where the error was raised.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for conversion operations using [`SinkError`] as the error type.
pub type SinkResult<T> = Result<T, SinkError>;

/// Detailed payload stored inside a [`SinkError`].
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type for record conversion.
///
/// Errors are cheap to clone: the source and the backtrace are reference counted. Equality and
/// hashing only consider the stable parts of the error (kind and description), so errors raised
/// from different callsites still compare equal when they describe the same failure.
#[derive(Debug, Clone)]
pub struct SinkError {
    payload: ErrorPayload,
}

/// Specific categories of errors that can occur while converting records.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Data & Transformation Errors
    ConversionError,
    InvalidFieldName,

    // Record Invariant Errors
    NullRecordKey,
    UndefinedRecordTimestamp,

    // IO & Serialization Errors
    IoError,
    SerializationError,
    DeserializationError,

    // State Errors
    InvalidState,

    // Destination Errors
    DestinationError,
}

impl ErrorKind {
    /// Returns `true` when the kind signals a violated per-record invariant in upsert/delete mode.
    ///
    /// These errors must never be skipped silently: a record without a key cannot be deduplicated
    /// by the merge, and a record without a defined timestamp cannot be placed in the partition
    /// the destination table expects.
    pub fn is_fatal_record_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::NullRecordKey | ErrorKind::UndefinedRecordTimestamp
        )
    }
}

impl SinkError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        &self.payload.description
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> &Backtrace {
        self.payload.backtrace.as_ref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`SinkError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        SinkError {
            payload: ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            },
        }
    }
}

impl PartialEq for SinkError {
    fn eq(&self, other: &SinkError) -> bool {
        self.payload.kind == other.payload.kind
            && self.payload.description == other.payload.description
    }
}

impl Eq for SinkError {}

impl Hash for SinkError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.payload.kind.hash(state);
        self.payload.description.hash(state);
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let payload = &self.payload;
        let location = payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            payload.kind,
            payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        write_detail(payload.detail.as_deref(), f)?;
        write_backtrace(payload.backtrace.as_ref(), f)?;

        Ok(())
    }
}

impl error::Error for SinkError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}

/// Writes the captured backtrace, indented one level.
fn write_backtrace(backtrace: &Backtrace, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if backtrace.status() != BacktraceStatus::Captured {
        return Ok(());
    }

    let rendered_backtrace = format!("{backtrace}");
    if !rendered_backtrace.trim().is_empty() {
        write!(f, "\n  Backtrace:")?;
        for line in rendered_backtrace.lines() {
            if line.trim().is_empty() {
                write!(f, "\n    ")?;
            } else {
                write!(f, "\n    {line}")?;
            }
        }
    }

    Ok(())
}

/// Writes the detail block, indented one level.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    if detail.trim().is_empty() {
        return write!(f, "\n  Detail: <empty>");
    }

    write!(f, "\n  Detail:")?;
    for line in detail.lines() {
        if line.trim().is_empty() {
            write!(f, "\n    ")?;
        } else {
            write!(f, "\n    {line}")?;
        }
    }

    Ok(())
}

/// Creates a [`SinkError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SinkError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> SinkError {
        SinkError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`SinkError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for SinkError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> SinkError {
        SinkError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`std::io::Error`] to [`SinkError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for SinkError {
    #[track_caller]
    fn from(err: std::io::Error) -> SinkError {
        let detail = err.to_string();
        SinkError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`serde_json::Error`] to [`SinkError`].
///
/// Data and syntax failures map to [`ErrorKind::DeserializationError`] since serializing an
/// in-memory JSON value cannot produce them; everything else is a serialization failure.
impl From<serde_json::Error> for SinkError {
    #[track_caller]
    fn from(err: serde_json::Error) -> SinkError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        let detail = err.to_string();
        SinkError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
