// Shared helpers for the real-podman integration suite

use std::sync::Arc;

use podrun_core::ContainerSpec;
use podrun_infra_podman::PodmanCli;

pub const TEST_PREFIX: &str = "podrun-integration-test";
pub const ALPINE: &str = "docker.io/library/alpine";

/// The suite self-skips instead of failing on machines without podman.
pub fn podman_available() -> bool {
    which::which("podman").is_ok()
}

/// Unique per-test container name, safe across parallel workers.
pub fn unique_name(tag: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{TEST_PREFIX}-{tag}-{}", &suffix[..8])
}

/// Long-running alpine container, the suite's workhorse.
pub fn alpine_spec(tag: &str) -> ContainerSpec {
    ContainerSpec::new(unique_name(tag), ALPINE)
        .with_command(vec!["sleep".to_string(), "infinity".to_string()])
}

pub fn runtime() -> Arc<PodmanCli> {
    Arc::new(PodmanCli::discover().expect("podman resolvable"))
}
