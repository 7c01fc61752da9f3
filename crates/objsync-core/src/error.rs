use std::fmt;

use thiserror::Error;

/// Errors produced while converting domain values into their ledger encodings.
///
/// Codec errors are never retried: the input itself is wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Malformed hex, wrong length or otherwise unparsable input.
    #[error("Invalid format for {input:?}: {message}")]
    Format { input: String, message: String },

    /// A numeric value that cannot be represented in the wire format.
    #[error("Value {value} is out of range: {message}")]
    Range { value: String, message: String },
}

impl CodecError {
    /// Create a new Format error
    pub fn format(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a new Range error
    pub fn range(value: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Range {
            value: value.to_string(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    #[must_use]
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }
}

/// Coarse error categories used for logging and retry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or out-of-range input.
    Validation,
    /// An object that was expected to exist does not.
    NotFound,
    /// Gas or shared-object contention; retrying may succeed.
    Contention,
    /// The ledger executed the transaction and rejected it.
    Execution,
    /// Transport, RPC or decoding problems.
    Infrastructure,
    /// Missing or unobtainable authorization.
    Authorization,
    /// Conflicting caller intent.
    Conflict,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Contention => write!(f, "contention"),
            Self::Execution => write!(f, "execution"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Authorization => write!(f, "authorization"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
