//! Artifact cache error types.

pub use objsync_core::ErrorCategory;

/// Errors that can occur while reading or writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("I/O error on {path}: {message}")]
    Io {
        /// The file or location involved.
        path: String,
        /// Description of the failure.
        message: String,
    },

    /// Stored data could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },

    /// A record failed validation before being written.
    #[error("Invalid artifact {key}: {message}")]
    InvalidRecord {
        /// `kind/label` of the offending record.
        key: String,
        /// Why the record was rejected.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Io` error.
    #[must_use]
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRecord` error.
    #[must_use]
    pub fn invalid_record(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an I/O error.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. } | Self::Serialization { .. } => ErrorCategory::Infrastructure,
            Self::InvalidRecord { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::io("/tmp/artifacts.localnet.json", "permission denied");
        assert_eq!(
            err.to_string(),
            "I/O error on /tmp/artifacts.localnet.json: permission denied"
        );
        assert!(err.is_io());

        let err = StorageError::invalid_record("price_feed/MOCK", "empty label");
        assert_eq!(err.to_string(), "Invalid artifact price_feed/MOCK: empty label");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::serialization("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            StorageError::invalid_record("k", "m").category(),
            ErrorCategory::Validation
        );
    }
}
