//! Error types for site operations.
//!
//! Every failure maps onto one of four kinds, which is what callers use to
//! decide how to report it. None of them are retried: each is terminal for
//! the current invocation.

use thiserror::Error;

/// The four ways an operation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad domain, username, password or PHP version syntax
    Validation,
    /// No record and inference from OS state failed
    NotFound,
    /// A hard precondition did not hold; nothing was mutated
    Precondition,
    /// A mutation step failed after preconditions passed
    StepFailure,
}

impl ErrorKind {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation => "validation error",
            Self::NotFound => "not found",
            Self::Precondition => "precondition failed",
            Self::StepFailure => "step failed",
        }
    }

    /// Whether host state may have been changed before the failure.
    pub fn may_have_mutated(&self) -> bool {
        matches!(self, Self::StepFailure)
    }
}

/// Errors that can occur while resolving or mutating a site.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed syntax validation
    #[error("invalid {field} '{value}': {reason}")]
    Validation {
        /// Which input was rejected (domain, username, ...)
        field: &'static str,
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The site could not be found by record or inference
    #[error("site {domain} not found: {reason}")]
    NotFound {
        /// Domain that was looked up
        domain: String,
        /// Which lookup failed
        reason: String,
    },

    /// A precondition did not hold
    #[error("{0}")]
    Precondition(String),

    /// A named orchestration step failed
    #[error("{step} failed: {message}")]
    StepFailed {
        /// Human-readable step name
        step: String,
        /// Underlying failure
        message: String,
    },

    /// An external command exited unsuccessfully
    #[error("command `{command}` failed{}: {stderr}", exit_suffix(.code))]
    CommandFailed {
        /// Program and arguments
        command: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// Public IP lookup failed
    #[error("public IP lookup failed: {0}")]
    IpLookup(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Precondition(_) => ErrorKind::Precondition,
            _ => ErrorKind::StepFailure,
        }
    }

    pub(crate) fn validation(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(domain: &str, reason: impl Into<String>) -> Self {
        Error::NotFound {
            domain: domain.to_string(),
            reason: reason.into(),
        }
    }
}

#[allow(clippy::ref_option)]
fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" with exit code {c}"))
        .unwrap_or_default()
}

/// Attach an orchestration step name to a lower-level failure.
///
/// Validation, not-found and precondition errors pass through untouched so
/// their kind survives; everything else becomes [`Error::StepFailed`].
pub trait StepExt<T> {
    /// Name the step this result belongs to.
    fn step(self, step: &str) -> Result<T>;
}

impl<T, E> StepExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn step(self, step: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            err @ (Error::Validation { .. }
            | Error::NotFound { .. }
            | Error::Precondition(_)
            | Error::StepFailed { .. }) => err,
            other => Error::StepFailed {
                step: step.to_string(),
                message: other.to_string(),
            },
        })
    }
}

/// Result type for site operations.
pub type Result<T> = std::result::Result<T, Error>;
