//! Crate-level error type and `Result` alias.
//! Configuration, renderer and database failures are fatal to a run; parameter,
//! format and render failures are contained to the job that raised them.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {arg}: {reason}")]
    InvalidArgument { arg: String, reason: String },

    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Configuration file {path:?} could not be read: {source}")]
    ConfigFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed properties: {0}")]
    MalformedProperties(#[from] java_properties::PropertiesError),

    #[error("Incorrectly formatted parameter: {entry}")]
    MalformedParameter { entry: String },

    #[error("Unsupported report format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Report {design} failed: {message}")]
    JobExecution { design: String, message: String },

    #[error("Report engine unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn invalid_argument(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            arg: arg.into(),
            reason: reason.into(),
        }
    }
}
