// Preflight Environment Checks
// Catches broken podman setups before the first container launch

use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use podrun_core::port::runtime::RuntimeCli;

/// A failed preflight check, carrying a remediation hint in the message.
#[derive(Error, Debug)]
#[error("{check}: {message}")]
pub struct PreflightError {
    pub check: &'static str,
    pub message: String,
}

impl PreflightError {
    fn new(check: &'static str, message: impl Into<String>) -> Self {
        Self {
            check,
            message: message.into(),
        }
    }
}

/// Outcome of one named check, for report-style rendering.
pub struct CheckReport {
    pub name: &'static str,
    pub outcome: Result<(), PreflightError>,
}

/// Running from inside a Snap sandbox hides containers from the rest of
/// the system.
pub fn check_snap_sandbox() -> Result<(), PreflightError> {
    let xdg = std::env::var("XDG_DATA_HOME").unwrap_or_default();
    if xdg.to_lowercase().contains("snap") {
        return Err(PreflightError::new(
            "snap sandbox",
            "Running inside Snap sandbox!\n\
             Podman containers will be invisible outside of it\n\
             Fix: open an external terminal and re-run from there",
        ));
    }
    Ok(())
}

pub fn check_podman_in_path() -> Result<(), PreflightError> {
    if which::which("podman").is_err() {
        return Err(PreflightError::new(
            "podman executable",
            "'podman' not found in PATH\n\
             Install: https://podman.io/getting-started/install.html",
        ));
    }
    Ok(())
}

/// Requires podman >= 4.0. A failed or unparseable `--version` is skipped;
/// resolution problems already surface in the PATH check.
pub async fn check_podman_version(cli: &dyn RuntimeCli) -> Result<(), PreflightError> {
    let output = match cli.run(&["--version".to_string()]).await {
        Ok(o) if o.success() => o,
        _ => return Ok(()),
    };

    let re = Regex::new(r"(\d+)\.(\d+)").expect("version pattern is valid");
    let Some(caps) = re.captures(&output.stdout) else {
        debug!(output = %output.stdout.trim(), "No version number in podman --version output");
        return Ok(());
    };
    let major: u32 = caps[1].parse().unwrap_or(0);
    let minor: u32 = caps[2].parse().unwrap_or(0);

    if (major, minor) < (4, 0) {
        return Err(PreflightError::new(
            "podman version",
            format!(
                "podman >= 4.0 required, found {}\n\
                 Upgrade your system packages or use a newer image in CI",
                output.stdout.trim()
            ),
        ));
    }
    Ok(())
}

pub async fn check_podman_socket(cli: &dyn RuntimeCli) -> Result<(), PreflightError> {
    let running = matches!(
        cli.run(&[
            "info".to_string(),
            "--format".to_string(),
            "{{.Host.RemoteSocket.Exists}}".to_string(),
        ])
        .await,
        Ok(o) if o.success() && o.stdout.trim() == "true"
    );

    if !running {
        return Err(PreflightError::new(
            "podman socket",
            "Podman socket not running\n\
             On Linux: systemctl --user start podman.socket\n\
             On macOS/WSL: podman machine init && podman machine start",
        ));
    }
    Ok(())
}

/// The graph root must exist and accept a probe file write. A failed
/// `info` invocation is skipped.
pub async fn check_storage_writable(cli: &dyn RuntimeCli) -> Result<(), PreflightError> {
    let output = match cli
        .run(&[
            "info".to_string(),
            "--format".to_string(),
            "{{.Store.GraphRoot}}".to_string(),
        ])
        .await
    {
        Ok(o) if o.success() => o,
        _ => return Ok(()),
    };

    let graph_root = PathBuf::from(output.stdout.trim());
    if !graph_root.exists() {
        return Err(PreflightError::new(
            "podman storage",
            format!("Podman storage path missing: {}", graph_root.display()),
        ));
    }

    let probe = graph_root.join(".podrun-test-write");
    let write_result = std::fs::write(&probe, "test").and_then(|_| std::fs::remove_file(&probe));
    if let Err(e) = write_result {
        return Err(PreflightError::new(
            "podman storage",
            format!(
                "Podman storage not writable: {}\n\
                 Error: {e}\n\
                 Fix: chown $USER -R ~/.local/share/containers",
                graph_root.display()
            ),
        ));
    }
    Ok(())
}

/// A `docker` binary earlier in PATH can shadow podman-compatible
/// tooling; opt out with PODMAN_IGNORE_DOCKER=1.
pub fn check_docker_conflict() -> Result<(), PreflightError> {
    if which::which("docker").is_ok() && std::env::var_os("PODMAN_IGNORE_DOCKER").is_none() {
        return Err(PreflightError::new(
            "docker conflict",
            "'docker' CLI found in PATH, may shadow 'podman'\n\
             Fix:\n\
             \x20 - Remove/rename the 'docker' binary\n\
             \x20 - Or set: export PODMAN_IGNORE_DOCKER=1",
        ));
    }
    Ok(())
}

pub fn check_wsl_shm() -> Result<(), PreflightError> {
    check_wsl_shm_at(Path::new("/proc/version"), Path::new("/dev/shm"))
}

/// Database images crash on WSL2 installs with an undersized /dev/shm.
fn check_wsl_shm_at(proc_version: &Path, shm: &Path) -> Result<(), PreflightError> {
    let Ok(version) = std::fs::read_to_string(proc_version) else {
        return Ok(()); // not Linux, so not WSL
    };
    if !version.to_lowercase().contains("microsoft") {
        return Ok(());
    }

    let Ok(meta) = std::fs::metadata(shm) else {
        return Ok(());
    };
    let shm_size = meta.len();
    if shm_size < 64 * 1024 * 1024 {
        return Err(PreflightError::new(
            "WSL /dev/shm",
            format!(
                "WSL2: /dev/shm too small ({}MB)\n\
                 MySQL/PostgreSQL will crash\n\
                 Fix in ~/.wslconfig:\n\
                 \x20 [wsl2]\n\
                 \x20 memory=8GB\n\
                 \x20 swap=2GB",
                shm_size / 1024 / 1024
            ),
        ));
    }
    Ok(())
}

/// Run every built-in check, collecting per-check outcomes for rendering.
pub async fn report(cli: &dyn RuntimeCli) -> Vec<CheckReport> {
    vec![
        CheckReport {
            name: "snap sandbox",
            outcome: check_snap_sandbox(),
        },
        CheckReport {
            name: "podman executable",
            outcome: check_podman_in_path(),
        },
        CheckReport {
            name: "podman version",
            outcome: check_podman_version(cli).await,
        },
        CheckReport {
            name: "podman socket",
            outcome: check_podman_socket(cli).await,
        },
        CheckReport {
            name: "podman storage",
            outcome: check_storage_writable(cli).await,
        },
        CheckReport {
            name: "docker conflict",
            outcome: check_docker_conflict(),
        },
        CheckReport {
            name: "WSL /dev/shm",
            outcome: check_wsl_shm(),
        },
    ]
}

/// Validate the environment, stopping at the first failure. Caller-supplied
/// checks run after the built-in list.
pub async fn run_preflight_checks(
    cli: &dyn RuntimeCli,
    custom_checks: &[fn() -> Result<(), PreflightError>],
) -> Result<(), PreflightError> {
    for check in report(cli).await {
        check.outcome?;
    }
    for check in custom_checks {
        check()?;
    }
    Ok(())
}
