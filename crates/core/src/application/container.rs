// Container Lifecycle Service

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::application::run_args::build_run_args;
use crate::domain::binding::{parse_port_mappings, PortBinding};
use crate::domain::spec::{ContainerSpec, LogOptions};
use crate::error::{HarnessError, Result};
use crate::port::runtime::RuntimeCli;

/// Captured result of an in-container command
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Lifecycle-managed container.
///
/// `start` launches detached and blocks until the readiness probe passes,
/// `exec`/`logs`/`status` operate on the running container, `stop` tears it
/// down. Dropping a handle that still owns a running container issues a
/// best-effort detached removal; prefer an explicit `stop` so failures are
/// observable.
pub struct Container {
    spec: ContainerSpec,
    runtime: Arc<dyn RuntimeCli>,
    container_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    /// Whether this handle launched the container (and should remove it on drop)
    owned: bool,
    ports: Option<BTreeMap<u16, Vec<PortBinding>>>,
}

impl Container {
    pub fn new(spec: ContainerSpec, runtime: Arc<dyn RuntimeCli>) -> Self {
        Self {
            spec,
            runtime,
            container_id: None,
            started_at: None,
            owned: false,
            ports: None,
        }
    }

    /// Attach to an already-running container by id (or name; the runtime
    /// accepts either). Attached handles never remove the container on drop.
    pub fn attach(
        spec: ContainerSpec,
        runtime: Arc<dyn RuntimeCli>,
        container_id: impl Into<String>,
    ) -> Self {
        Self {
            spec,
            runtime,
            container_id: Some(container_id.into()),
            started_at: None,
            owned: false,
            ports: None,
        }
    }

    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Release ownership without tearing down; returns the id, leaving the
    /// container running after this handle is dropped.
    pub fn detach(&mut self) -> Option<String> {
        self.owned = false;
        self.started_at = None;
        self.ports = None;
        self.container_id.take()
    }

    /// Start the container and wait for the readiness probe.
    ///
    /// Any previous instance under this handle is stopped first, so calling
    /// `start` twice yields a fresh container.
    ///
    /// # Errors
    /// - HarnessError::StartFailed carrying the full command line and the
    ///   runtime's output when the launch itself fails
    /// - HarnessError::NoContainerId when the runtime prints no id
    /// - HarnessError::ReadinessTimeout when the probe never passes
    pub async fn start(&mut self) -> Result<()> {
        self.stop().await;

        let args = build_run_args(&self.spec)?;
        let output = self.runtime.run(&args).await?;
        if !output.success() {
            return Err(HarnessError::StartFailed {
                name: self.spec.name.clone(),
                command: args.join(" "),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        let id = output.stdout.trim().to_string();
        if id.is_empty() {
            return Err(HarnessError::NoContainerId);
        }

        info!(name = %self.spec.name, id = %id, "Container started");
        self.container_id = Some(id);
        self.started_at = Some(Utc::now());
        self.owned = true;

        self.wait_for_ready().await
    }

    /// Poll `health_cmd` inside the container until it exits 0 or the
    /// deadline passes. No-op without a probe or a started container.
    async fn wait_for_ready(&self) -> Result<()> {
        let (Some(health_cmd), Some(id)) =
            (self.spec.health_cmd.as_ref(), self.container_id.as_deref())
        else {
            return Ok(());
        };

        let deadline = Instant::now() + self.spec.health_timeout;
        while Instant::now() < deadline {
            let mut args = vec!["exec".to_string(), id.to_string()];
            args.extend(health_cmd.iter().cloned());

            let probe = self.runtime.run(&args).await?;
            if probe.success() {
                debug!(name = %self.spec.name, "Readiness probe passed");
                return Ok(());
            }

            sleep(self.spec.health_interval).await;
        }

        Err(HarnessError::ReadinessTimeout {
            name: self.spec.name.clone(),
            timeout_secs: self.spec.health_timeout.as_secs(),
        })
    }

    /// Current runtime-reported state (`running`, `exited`, ...);
    /// `None` when this handle has no container.
    pub async fn status(&self) -> Result<Option<String>> {
        let Some(id) = self.container_id.as_deref() else {
            return Ok(None);
        };

        let output = self
            .runtime
            .run(&[
                "inspect".to_string(),
                id.to_string(),
                "--format".to_string(),
                "{{.State.Status}}".to_string(),
            ])
            .await?;

        Ok(Some(output.stdout.trim().to_string()))
    }

    /// Stop and remove the container. Never fails: a container that is
    /// already gone is the desired outcome, so cleanup problems are only
    /// logged. Clears the cached id and port mappings.
    pub async fn stop(&mut self) {
        let Some(id) = self.container_id.take() else {
            return;
        };
        self.started_at = None;
        self.owned = false;
        self.ports = None;

        for args in [
            vec!["stop".to_string(), id.clone()],
            vec!["rm".to_string(), "-f".to_string(), id.clone()],
        ] {
            if let Err(e) = self.runtime.run(&args).await {
                warn!(name = %self.spec.name, id = %id, error = %e, "Container cleanup command failed");
            }
        }

        info!(name = %self.spec.name, id = %id, "Container removed");
    }

    /// Run a command inside the container, capturing output.
    ///
    /// # Errors
    /// - HarnessError::NotStarted without a container
    /// - HarnessError::ExecFailed carrying stdout + stderr on non-zero exit
    pub async fn exec<S: AsRef<str>>(&self, cmd: &[S]) -> Result<ExecOutput> {
        let id = self.container_id.as_deref().ok_or(HarnessError::NotStarted)?;

        let mut args = vec!["exec".to_string(), id.to_string()];
        args.extend(cmd.iter().map(|s| s.as_ref().to_string()));

        let output = self.runtime.run(&args).await?;
        if !output.success() {
            return Err(HarnessError::ExecFailed {
                name: self.spec.name.clone(),
                command: cmd
                    .iter()
                    .map(|s| s.as_ref())
                    .collect::<Vec<_>>()
                    .join(" "),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Ok(ExecOutput {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    /// Fetch container logs. With `follow` the call captures until the
    /// container exits.
    pub async fn logs(&self, options: LogOptions) -> Result<String> {
        let id = self.container_id.as_deref().ok_or(HarnessError::NotStarted)?;

        let mut args = vec!["logs".to_string()];
        if let Some(tail) = options.tail {
            args.push("--tail".to_string());
            args.push(tail.to_string());
        }
        if options.follow {
            args.push("-f".to_string());
        }
        args.push(id.to_string());

        let output = self.runtime.run(&args).await?;
        if !output.success() {
            return Err(HarnessError::LogsFailed {
                name: self.spec.name.clone(),
                stderr: output.stderr,
            });
        }

        Ok(output.stdout)
    }

    /// Inspect published ports once and cache `{container_port: bindings}`
    /// until `stop`.
    pub async fn port_mappings(&mut self) -> Result<BTreeMap<u16, Vec<PortBinding>>> {
        if let Some(ports) = &self.ports {
            return Ok(ports.clone());
        }

        let id = self.container_id.as_deref().ok_or(HarnessError::NotStarted)?;

        let output = self
            .runtime
            .run(&[
                "inspect".to_string(),
                id.to_string(),
                "--format".to_string(),
                "{{json .NetworkSettings.Ports}}".to_string(),
            ])
            .await?;

        let mappings = parse_port_mappings(output.stdout.trim())?;
        self.ports = Some(mappings.clone());
        Ok(mappings)
    }

    /// Host port mapped to the given container port; `None` when the port
    /// is unmapped or has no binding.
    pub async fn host_port(&mut self, internal: u16) -> Result<Option<u16>> {
        let mappings = self.port_mappings().await?;
        Ok(mappings
            .get(&internal)
            .and_then(|bindings| bindings.first())
            .and_then(PortBinding::host_port_u16))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.container_id.is_some() {
            "running"
        } else {
            "stopped"
        };
        write!(
            f,
            "<Container {} [{}] id={:?}>",
            self.spec.name, state, self.container_id
        )
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        // Drop cannot await; hand the id to the runtime for a detached,
        // best-effort removal.
        if self.owned {
            if let Some(id) = self.container_id.take() {
                warn!(name = %self.spec.name, id = %id, "Container dropped while running; issuing detached removal");
                self.runtime.remove_detached(&id);
            }
        }
    }
}
