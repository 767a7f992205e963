// Init-script, volume, and environment tests against a real podman
// installation. Self-skipping when podman is not on PATH.

use std::fs;
use std::sync::Arc;

use podrun_core::port::runtime::RuntimeCli;
use podrun_core::{Container, ContainerSpec};
use podrun_integration_tests::{podman_available, runtime, unique_name, ALPINE};

#[tokio::test]
async fn init_scripts_mount_in_order() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed-data.sh");
    let create = dir.path().join("create-table.sh");
    fs::write(&seed, "#!/bin/sh\necho seed\n").unwrap();
    fs::write(&create, "#!/bin/sh\necho create\n").unwrap();

    // Alpine has no init machinery; the mounts themselves are what is
    // being verified, including the index prefix order.
    let spec = ContainerSpec::new(unique_name("init"), ALPINE)
        .with_init_dir("/init.d")
        .with_init_script(&seed)
        .with_init_script(&create)
        .with_command(vec!["sleep".to_string(), "infinity".to_string()]);

    let runtime = runtime();
    let mut container = Container::new(spec, runtime.clone() as Arc<dyn RuntimeCli>);
    container.start().await.expect("start");

    let listing = container.exec(&["ls", "/init.d"]).await.expect("ls");
    assert!(listing.stdout.contains("00-seed-data.sh"));
    assert!(listing.stdout.contains("01-create-table.sh"));

    // Mounted read-only.
    let write_attempt = container
        .exec(&["sh", "-c", "echo nope >> /init.d/00-seed-data.sh"])
        .await;
    assert!(write_attempt.is_err());

    container.stop().await;
}

#[tokio::test]
async fn volumes_mount_files_and_directories() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    fs::create_dir(&data_dir).unwrap();
    fs::write(data_dir.join("input.txt"), "hello from host\n").unwrap();

    let config_file = dir.path().join("app_config.json");
    fs::write(&config_file, "{\"debug\": true}\n").unwrap();

    let spec = ContainerSpec::new(unique_name("volumes"), ALPINE)
        .with_volume(&data_dir, "/mnt/data")
        .with_volume(&config_file, "/app/config.json:ro")
        .with_command(vec!["sleep".to_string(), "infinity".to_string()]);

    let runtime = runtime();
    let mut container = Container::new(spec, runtime.clone() as Arc<dyn RuntimeCli>);
    container.start().await.expect("start");

    let cat = container
        .exec(&["cat", "/mnt/data/input.txt"])
        .await
        .expect("cat mounted dir");
    assert_eq!(cat.stdout, "hello from host\n");

    let config = container
        .exec(&["cat", "/app/config.json"])
        .await
        .expect("cat mounted file");
    assert!(config.stdout.contains("debug"));

    // The directory mount is writable from inside the container.
    container
        .exec(&[
            "sh",
            "-c",
            "echo 'written from container' > /mnt/data/from_container.txt",
        ])
        .await
        .expect("write into mounted dir");
    assert!(data_dir.join("from_container.txt").exists());

    container.stop().await;
}

#[tokio::test]
async fn environment_variables_reach_the_container() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let spec = ContainerSpec::new(unique_name("env"), ALPINE)
        .with_env("MY_VAR", "value1")
        .with_command(vec!["sleep".to_string(), "infinity".to_string()]);

    let runtime = runtime();
    let mut container = Container::new(spec, runtime.clone() as Arc<dyn RuntimeCli>);
    container.start().await.expect("start");

    let result = container
        .exec(&["sh", "-c", "printf '%s' \"$MY_VAR\""])
        .await
        .expect("exec");
    assert_eq!(result.stdout, "value1");

    container.stop().await;
}
