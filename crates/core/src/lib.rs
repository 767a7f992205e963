// podrun Core - Domain Logic & Ports
// NO infrastructure dependencies: podman is reached only through the RuntimeCli port

pub mod application;
pub mod domain;
pub mod error;
pub mod net;
pub mod port;

pub use application::container::{Container, ExecOutput};
pub use domain::spec::{ContainerSpec, LogOptions};
pub use error::{HarnessError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
