//! podrun - Command-line interface for the podman container harness

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use podrun_core::port::runtime::RuntimeCli;
use podrun_core::{Container, ContainerSpec, LogOptions};
use podrun_infra_podman::{preflight, PodmanCli};

#[derive(Parser)]
#[command(name = "podrun")]
#[command(about = "Podman container lifecycle harness", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Remote podman socket URL (exported as PODMAN_HOST)
    #[arg(long, env = "PODMAN_HOST", global = true)]
    remote_host: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the local podman environment
    Doctor,

    /// Start a detached container and wait for readiness
    Run {
        /// Container name
        #[arg(short, long)]
        name: String,

        /// Image reference
        #[arg(short, long)]
        image: String,

        /// Publish a port: HOST:CONTAINER, or :CONTAINER for a
        /// runtime-assigned host port
        #[arg(short = 'p', long = "publish")]
        ports: Vec<String>,

        /// Environment variable KEY=VALUE
        #[arg(short, long = "env")]
        env: Vec<String>,

        /// Volume mount HOST:TARGET[:OPTIONS]
        #[arg(short, long = "volume")]
        volumes: Vec<String>,

        /// In-container directory for --init-script mounts
        #[arg(long)]
        init_dir: Option<String>,

        /// Host init script, mounted into --init-dir in the order given
        #[arg(long = "init-script")]
        init_scripts: Vec<PathBuf>,

        /// Readiness probe, whitespace-split and run via exec
        #[arg(long)]
        health_cmd: Option<String>,

        /// Readiness deadline in seconds
        #[arg(long, default_value = "30")]
        health_timeout: u64,

        /// Readiness poll interval in seconds
        #[arg(long, default_value = "1.0")]
        health_interval: f64,

        /// Command override, after `--`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Run a command inside a container
    Exec {
        container: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },

    /// Fetch container logs
    Logs {
        container: String,

        /// Number of lines to tail
        #[arg(short = 'n', long)]
        tail: Option<u64>,

        /// Capture until the container exits
        #[arg(short, long)]
        follow: bool,
    },

    /// Show container status
    Status { container: String },

    /// Show the host port mapped to a container port
    Port { container: String, internal: u16 },

    /// Stop and remove a container
    Stop { container: String },
}

#[derive(Tabled)]
struct RunReport {
    name: String,
    id: String,
    status: String,
    started_at: String,
}

#[derive(Tabled)]
struct StatusReport {
    container: String,
    status: String,
}

fn init_logging() {
    let log_format = std::env::var("PODRUN_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("podrun=warn"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

fn build_runtime(remote_host: Option<String>) -> Result<Arc<PodmanCli>> {
    let mut podman = PodmanCli::discover().context("podman executable not found")?;
    tracing::debug!(exe = %podman.executable().display(), "Resolved podman executable");
    if let Some(host) = remote_host {
        podman = podman.with_remote_host(host);
    }
    Ok(Arc::new(podman))
}

/// Only the name matters for operations on an existing container; podman
/// accepts names wherever ids go.
fn attach(podman: &Arc<PodmanCli>, container: &str) -> Container {
    let spec = ContainerSpec::new(container, "");
    Container::attach(spec, podman.clone() as Arc<dyn RuntimeCli>, container)
}

/// HOST:CONTAINER, :CONTAINER, or bare CONTAINER
fn parse_port_spec(spec: &str) -> Result<(u16, Option<u16>)> {
    match spec.split_once(':') {
        Some((host, container)) => {
            let container = container
                .parse()
                .with_context(|| format!("invalid container port in '{spec}'"))?;
            let host = if host.is_empty() {
                None
            } else {
                Some(
                    host.parse()
                        .with_context(|| format!("invalid host port in '{spec}'"))?,
                )
            };
            Ok((container, host))
        }
        None => Ok((
            spec.parse()
                .with_context(|| format!("invalid container port '{spec}'"))?,
            None,
        )),
    }
}

fn parse_env_spec(spec: &str) -> Result<(String, String)> {
    spec.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| anyhow::anyhow!("invalid env '{spec}', expected KEY=VALUE"))
}

fn parse_volume_spec(spec: &str) -> Result<(PathBuf, String)> {
    let (host, target) = spec
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid volume '{spec}', expected HOST:TARGET"))?;
    Ok((PathBuf::from(host), target.to_string()))
}

async fn doctor(remote_host: Option<String>) -> Result<()> {
    let podman = match PodmanCli::discover() {
        Ok(podman) => match remote_host {
            Some(host) => podman.with_remote_host(host),
            None => podman,
        },
        Err(_) => {
            println!("{} podman executable", "✗".red().bold());
            println!("  'podman' not found in PATH");
            println!("  Install: https://podman.io/getting-started/install.html");
            bail!("1 preflight check failed");
        }
    };

    let reports = preflight::report(&podman).await;
    let mut failed = 0;
    for report in &reports {
        match &report.outcome {
            Ok(()) => println!("{} {}", "✓".green().bold(), report.name),
            Err(e) => {
                failed += 1;
                println!("{} {}", "✗".red().bold(), report.name);
                for line in e.message.lines() {
                    println!("  {line}");
                }
            }
        }
    }
    println!();

    if failed > 0 {
        bail!("{failed} preflight check(s) failed");
    }
    println!("{}", "✓ environment ready".green().bold());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_container(
    podman: Arc<PodmanCli>,
    name: String,
    image: String,
    ports: Vec<String>,
    env: Vec<String>,
    volumes: Vec<String>,
    init_dir: Option<String>,
    init_scripts: Vec<PathBuf>,
    health_cmd: Option<String>,
    health_timeout: u64,
    health_interval: f64,
    command: Vec<String>,
) -> Result<()> {
    let mut spec = ContainerSpec::new(name, image)
        .with_health_timeout(Duration::from_secs(health_timeout))
        .with_health_interval(Duration::from_secs_f64(health_interval));

    for port in &ports {
        let (internal, host) = parse_port_spec(port)?;
        spec = spec.with_port(internal, host);
    }
    for pair in &env {
        let (key, value) = parse_env_spec(pair)?;
        spec = spec.with_env(key, value);
    }
    for volume in &volumes {
        let (host, target) = parse_volume_spec(volume)?;
        spec = spec.with_volume(host, target);
    }
    if let Some(dir) = init_dir {
        spec = spec.with_init_dir(dir);
    }
    for script in init_scripts {
        spec = spec.with_init_script(script);
    }
    if let Some(probe) = health_cmd {
        spec = spec.with_health_cmd(probe.split_whitespace().map(str::to_string).collect());
    }
    if !command.is_empty() {
        spec = spec.with_command(command);
    }

    let mut container = Container::new(spec, podman as Arc<dyn RuntimeCli>);
    container.start().await?;

    let status = container.status().await?.unwrap_or_default();
    let report = RunReport {
        name: container.spec().name.clone(),
        id: container.container_id().unwrap_or_default().to_string(),
        status,
        started_at: container
            .started_at()
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
    };

    println!("{}", "✓ Container ready".green().bold());
    println!();
    println!("{}", Table::new(vec![report]));

    // Leave it running once this process exits.
    container.detach();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    if let Commands::Doctor = cli.command {
        return doctor(cli.remote_host).await;
    }

    let podman = build_runtime(cli.remote_host.clone())?;

    match cli.command {
        Commands::Doctor => unreachable!("handled above"),

        Commands::Run {
            name,
            image,
            ports,
            env,
            volumes,
            init_dir,
            init_scripts,
            health_cmd,
            health_timeout,
            health_interval,
            command,
        } => {
            run_container(
                podman,
                name,
                image,
                ports,
                env,
                volumes,
                init_dir,
                init_scripts,
                health_cmd,
                health_timeout,
                health_interval,
                command,
            )
            .await?;
        }

        Commands::Exec { container, command } => {
            let handle = attach(&podman, &container);
            let result = handle.exec(&command).await?;
            print!("{}", result.stdout);
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
        }

        Commands::Logs {
            container,
            tail,
            follow,
        } => {
            let handle = attach(&podman, &container);
            let logs = handle.logs(LogOptions { tail, follow }).await?;
            print!("{logs}");
        }

        Commands::Status { container } => {
            let handle = attach(&podman, &container);
            let status = handle.status().await?.unwrap_or_default();
            let report = StatusReport {
                container,
                status: if status.is_empty() {
                    "unknown".to_string()
                } else {
                    status
                },
            };
            println!("{}", Table::new(vec![report]));
        }

        Commands::Port {
            container,
            internal,
        } => {
            let mut handle = attach(&podman, &container);
            match handle.host_port(internal).await? {
                Some(host_port) => println!("{host_port}"),
                None => bail!("no host port mapped to container port {internal}"),
            }
        }

        Commands::Stop { container } => {
            let mut handle = attach(&podman, &container);
            handle.stop().await;
            println!("{}", format!("✓ Container {container} removed").green().bold());
        }
    }

    Ok(())
}
