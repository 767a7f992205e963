// Domain models: container specification and inspect output

pub mod binding;
pub mod spec;

pub use binding::{parse_port_mappings, PortBinding};
pub use spec::{ContainerSpec, LogOptions};
