// Central Error Type for the Harness

use std::path::PathBuf;

use thiserror::Error;

/// Library-level error type
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("container not started")]
    NotStarted,

    #[error("container started but no ID returned")]
    NoContainerId,

    #[error(
        "failed to start container '{name}':\nCommand: {command}\nstdout: {stdout}\nstderr: {stderr}"
    )]
    StartFailed {
        name: String,
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("container {name} did not become ready in {timeout_secs}s")]
    ReadinessTimeout { name: String, timeout_secs: u64 },

    #[error("init script not found: {0}")]
    InitScriptNotFound(PathBuf),

    #[error("command '{command}' failed in container {name}:\nstdout: {stdout}\nstderr: {stderr}")]
    ExecFailed {
        name: String,
        command: String,
        stdout: String,
        stderr: String,
    },

    #[error("failed to read logs for container {name}: {stderr}")]
    LogsFailed { name: String, stderr: String },

    #[error("unparseable port specification '{0}' in inspect output")]
    MalformedPortSpec(String),

    #[error("runtime CLI error: {0}")]
    Cli(#[from] crate::port::runtime::CliError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using HarnessError
pub type Result<T> = std::result::Result<T, HarnessError>;
