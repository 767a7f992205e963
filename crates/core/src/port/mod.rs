// Ports: abstractions implemented by infra crates

pub mod runtime;

pub use runtime::{CliError, CliOutput, RuntimeCli};
