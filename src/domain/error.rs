//! Domain error types.

/// Top-level error type for tickwatch.
#[derive(Debug, thiserror::Error)]
pub enum TickwatchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("quote feed error in {file}: {reason}")]
    FeedParse { file: String, reason: String },

    #[error("quote provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    #[error("unknown symbol: {query}")]
    UnknownSymbol { query: String },

    #[error("invalid initial capital {value}: {reason}")]
    InvalidCapital { value: f64, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TickwatchError> for std::process::ExitCode {
    fn from(err: &TickwatchError) -> Self {
        let code: u8 = match err {
            TickwatchError::Io(_) => 1,
            TickwatchError::ConfigParse { .. }
            | TickwatchError::ConfigMissing { .. }
            | TickwatchError::ConfigInvalid { .. }
            | TickwatchError::InvalidCapital { .. } => 2,
            TickwatchError::FeedParse { .. } => 3,
            TickwatchError::ProviderUnavailable { .. } => 4,
            TickwatchError::UnknownSymbol { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
