use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessError>;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("File not found at {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("{} is missing required column {column:?}", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
