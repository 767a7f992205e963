// podrun Infrastructure - Podman Adapters
// Implements: RuntimeCli; preflight environment checks

pub mod podman_cli;
pub mod preflight;

pub use podman_cli::PodmanCli;
pub use preflight::{run_preflight_checks, CheckReport, PreflightError};
