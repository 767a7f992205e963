// Container Specification Domain Model

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Generic container configuration.
///
/// Key features:
/// - `init_dir` + `init_scripts`: auto-mounted into the image's init
///   directory with `00-`, `01-` prefixes so the image runs them in the
///   order they were added.
/// - `volumes`: arbitrary additional mounts.
/// - `ports`: a `None` host side publishes on a runtime-assigned port.
/// - `health_cmd`: wait-for-ready probe, run via `exec` inside the container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// Readiness deadline for `health_cmd` polling
    pub health_timeout: Duration,
    /// Delay between readiness probes
    pub health_interval: Duration,
    /// container port -> host port (`None` = assigned by the runtime)
    pub ports: BTreeMap<u16, Option<u16>>,
    pub env: BTreeMap<String, String>,
    /// e.g. "/docker-entrypoint-initdb.d"
    pub init_dir: Option<String>,
    /// Mounted read-only into `init_dir`, renamed `00-`, `01-`, ...
    pub init_scripts: Vec<PathBuf>,
    /// host path -> container target (target may carry mount options like `:ro`)
    pub volumes: BTreeMap<PathBuf, String>,
    pub health_cmd: Option<Vec<String>>,
    /// Command override appended after the image
    pub command: Option<Vec<String>>,
    /// Connection URL exported as PODMAN_HOST on every CLI invocation
    pub remote_host: Option<String>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            health_timeout: Duration::from_secs(30),
            health_interval: Duration::from_secs(1),
            ports: BTreeMap::new(),
            env: BTreeMap::new(),
            init_dir: None,
            init_scripts: Vec::new(),
            volumes: BTreeMap::new(),
            health_cmd: None,
            command: None,
            remote_host: None,
        }
    }

    /// Publish a container port. `host` of `None` lets the runtime pick;
    /// read the assignment back with `Container::host_port`.
    pub fn with_port(mut self, internal: u16, host: Option<u16>) -> Self {
        self.ports.insert(internal, host);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_init_dir(mut self, dir: impl Into<String>) -> Self {
        self.init_dir = Some(dir.into());
        self
    }

    /// Append an init script; mount order follows call order.
    pub fn with_init_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.init_scripts.push(script.into());
        self
    }

    pub fn with_volume(mut self, host: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        self.volumes.insert(host.into(), target.into());
        self
    }

    pub fn with_health_cmd(mut self, cmd: Vec<String>) -> Self {
        self.health_cmd = Some(cmd);
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    pub fn with_command(mut self, command: Vec<String>) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_remote_host(mut self, url: impl Into<String>) -> Self {
        self.remote_host = Some(url.into());
        self
    }
}

/// Options for log retrieval.
///
/// `follow` captures output until the container exits; combine with `tail`
/// to bound the backlog.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub tail: Option<u64>,
    pub follow: bool,
}
