//! Domain error types.

/// Top-level error type for stockdash.
///
/// `Clone` so that one failed fetch can be handed to every caller that was
/// waiting on the same deduplicated request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StockdashError {
    #[error("request failed: {reason}")]
    Transport { reason: String },

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("could not decode response: {reason}")]
    Decode { reason: String },

    #[error("stock {id} not found")]
    NotFound { id: i64 },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("io error: {reason}")]
    Io { reason: String },
}

impl StockdashError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for failures that originate on the other side of the wire.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Server { .. } | Self::Decode { .. }
        )
    }
}

impl From<std::io::Error> for StockdashError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<&StockdashError> for std::process::ExitCode {
    fn from(err: &StockdashError) -> Self {
        let code: u8 = match err {
            StockdashError::Io { .. } => 1,
            StockdashError::ConfigParse { .. } | StockdashError::ConfigInvalid { .. } => 2,
            StockdashError::Transport { .. }
            | StockdashError::Server { .. }
            | StockdashError::Decode { .. } => 3,
            StockdashError::Validation { .. } => 4,
            StockdashError::NotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
