use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("dictionary line {line}: {message}")]
    Dictionary { line: usize, message: String },
    #[error("phoneme recognizer failed: {message}")]
    Recognizer { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl ScoringError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn dictionary(line: usize, message: impl Into<String>) -> Self {
        Self::Dictionary {
            line,
            message: message.into(),
        }
    }

    /// For use by external recognizer adapters.
    pub fn recognizer(err: impl std::fmt::Display) -> Self {
        Self::Recognizer {
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
