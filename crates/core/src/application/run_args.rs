// Construction of the `run` Argument List

use crate::domain::spec::ContainerSpec;
use crate::error::{HarnessError, Result};

/// Build the full `run` argument list for a spec.
///
/// Does not include the executable itself, and never invokes anything.
/// Argument order is stable: detach + name, ports, environment,
/// init-script mounts, volumes, image, command override.
///
/// # Errors
/// - HarnessError::InitScriptNotFound when a configured init script is not
///   a regular file (caught here, before any process is spawned)
pub fn build_run_args(spec: &ContainerSpec) -> Result<Vec<String>> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        spec.name.clone(),
    ];

    // Ports: empty host side lets the runtime pick
    for (internal, host) in &spec.ports {
        let host_part = host.map(|p| p.to_string()).unwrap_or_default();
        args.push("-p".to_string());
        args.push(format!("{host_part}:{internal}"));
    }

    // Environment
    for (key, value) in &spec.env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }

    // Init scripts: mounted read-only with an index prefix so the image's
    // init machinery runs them in the order they were added
    if let Some(init_dir) = spec.init_dir.as_deref() {
        let init_dir = init_dir.trim_end_matches('/');
        for (i, script) in spec.init_scripts.iter().enumerate() {
            if !script.is_file() {
                return Err(HarnessError::InitScriptNotFound(script.clone()));
            }
            let file_name = script
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            args.push("-v".to_string());
            args.push(format!("{}:{init_dir}/{i:02}-{file_name}:ro", script.display()));
        }
    }

    // General volumes
    for (host_path, target) in &spec.volumes {
        args.push("-v".to_string());
        args.push(format!("{}:{target}", host_path.display()));
    }

    // Image
    args.push(spec.image.clone());

    // Command override
    if let Some(command) = &spec.command {
        args.extend(command.iter().cloned());
    }

    Ok(args)
}
