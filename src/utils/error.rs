use std::io;
use subprocess::{ExitStatus, PopenError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChageError {
    #[error("`{command}` failed with {status:?}: {stderr}")]
    Execution {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: PopenError,
    },

    #[error("unexpected chage output: {0}")]
    Parse(String),

    #[error("invalid value for {field}: {value:?}")]
    InvalidArgument { field: &'static str, value: String },

    #[error("no user given, pass --user or set \"user\" in the config file")]
    MissingUser,

    #[error("could not open config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to set up logging: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ChageError {
    pub fn parse(label: &str, value: &str) -> Self {
        ChageError::Parse(format!("{}: {:?}", label, value))
    }
}
