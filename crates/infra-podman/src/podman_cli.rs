// Podman CLI adapter

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use podrun_core::port::runtime::{CliError, CliOutput, RuntimeCli};

/// Invokes the podman binary, capturing stdout/stderr/exit code.
///
/// Resolution happens once per instance; all lifecycle operations reuse
/// the same executable path.
pub struct PodmanCli {
    exe: PathBuf,
    remote_host: Option<String>,
}

impl PodmanCli {
    /// Locate `podman` on PATH.
    ///
    /// # Errors
    /// - CliError::NotFound when the binary is not resolvable
    pub fn discover() -> Result<Self, CliError> {
        let exe = which::which("podman").map_err(|_| CliError::NotFound)?;
        Ok(Self::new(exe))
    }

    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self {
            exe: exe.into(),
            remote_host: None,
        }
    }

    /// Export `PODMAN_HOST=<url>` on every invocation, targeting a remote
    /// podman socket.
    pub fn with_remote_host(mut self, url: impl Into<String>) -> Self {
        self.remote_host = Some(url.into());
        self
    }

    pub fn executable(&self) -> &Path {
        &self.exe
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.args(args).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(host) = &self.remote_host {
            cmd.env("PODMAN_HOST", host);
        }
        cmd
    }
}

#[async_trait]
impl RuntimeCli for PodmanCli {
    async fn run(&self, args: &[String]) -> Result<CliOutput, CliError> {
        debug!(exe = %self.exe.display(), args = ?args, "Invoking podman");

        let child = self
            .command(args)
            .spawn()
            .map_err(|e| CliError::SpawnFailed(e.to_string()))?;
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CliError::Io(e.to_string()))?;

        let result = CliOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!(exit_code = ?result.exit_code, "Podman invocation finished");
        Ok(result)
    }

    fn remove_detached(&self, container_id: &str) {
        // Drop paths cannot await completion; fire and forget.
        let result = std::process::Command::new(&self.exe)
            .args(["rm", "-f", container_id])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();
        if let Err(e) = result {
            warn!(id = %container_id, error = %e, "Detached container removal failed to spawn");
        }
    }
}
