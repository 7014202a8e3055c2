use std::path::PathBuf;

use thiserror::Error;
use tvnav::{LayoutError, ParseKeyError};

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for unreadable or invalid layouts and key lists.
pub const EXIT_USAGE: i32 = 2;
/// Exit code for layouts where nothing can take focus.
pub const EXIT_NO_FOCUS: i32 = 3;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("invalid key {key:?}: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: ParseKeyError,
    },

    #[error("nothing in {path} can take focus")]
    NoFocus { path: PathBuf },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::Layout(_) | Self::InvalidKey { .. } => EXIT_USAGE,
            Self::NoFocus { .. } => EXIT_NO_FOCUS,
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }
}
