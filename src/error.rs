use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
/// Import error
pub enum ImportError {
    #[error("source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Configuration: {0}")]
    Configuration(String),

    #[error("Transformation: {0}")]
    Transformation(String),

    #[error("I/O failure reading line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("Settings: {0}")]
    Settings(#[from] serde_json::Error),
}
