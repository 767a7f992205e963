// Application services: container lifecycle over the RuntimeCli port

pub mod container;
pub mod run_args;

pub use container::{Container, ExecOutput};
pub use run_args::build_run_args;
