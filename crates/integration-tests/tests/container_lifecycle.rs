// Lifecycle tests against a real podman installation.
// Self-skipping when podman is not on PATH, so the suite stays runnable
// on machines without a container runtime.

use std::sync::Arc;
use std::time::Duration;

use podrun_core::port::runtime::RuntimeCli;
use podrun_core::{Container, HarnessError, LogOptions};
use podrun_infra_podman::PodmanCli;
use podrun_integration_tests::{alpine_spec, podman_available, runtime};

async fn listed_in_ps(runtime: &Arc<PodmanCli>, id: &str) -> bool {
    let output = runtime
        .run(&[
            "ps".to_string(),
            "--all".to_string(),
            "--filter".to_string(),
            format!("id={id}"),
            "--quiet".to_string(),
        ])
        .await
        .expect("ps");
    !output.stdout.trim().is_empty()
}

#[tokio::test]
async fn starts_execs_and_reads_logs() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let runtime = runtime();
    let mut container =
        Container::new(alpine_spec("basics"), runtime.clone() as Arc<dyn RuntimeCli>);

    container.start().await.expect("start");
    assert!(container.container_id().is_some());
    assert!(container.started_at().is_some());

    let result = container.exec(&["echo", "hello"]).await.expect("exec");
    assert_eq!(result.stdout.trim(), "hello");
    assert_eq!(result.exit_code, Some(0));

    // `sleep infinity` logs nothing; the call itself must still succeed.
    container
        .logs(LogOptions {
            tail: Some(5),
            follow: false,
        })
        .await
        .expect("logs");

    assert_eq!(container.status().await.unwrap().as_deref(), Some("running"));

    container.stop().await;
    assert!(container.container_id().is_none());
}

#[tokio::test]
async fn restart_creates_a_fresh_container() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let runtime = runtime();
    let mut container =
        Container::new(alpine_spec("restart"), runtime.clone() as Arc<dyn RuntimeCli>);

    container.start().await.expect("first start");
    let first_id = container.container_id().unwrap().to_string();

    container.start().await.expect("second start");
    let second_id = container.container_id().unwrap().to_string();

    assert_ne!(first_id, second_id);
    container.stop().await;
}

#[tokio::test]
async fn stop_removes_the_container() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let runtime = runtime();
    let mut container = Container::new(alpine_spec("stop"), runtime.clone() as Arc<dyn RuntimeCli>);

    container.start().await.expect("start");
    let id = container.container_id().unwrap().to_string();

    assert!(listed_in_ps(&runtime, &id).await);

    container.stop().await;

    assert!(!listed_in_ps(&runtime, &id).await);
}

#[tokio::test]
async fn readiness_probe_blocks_start() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let runtime = runtime();
    let spec = alpine_spec("ready").with_health_cmd(vec![
        "test".to_string(),
        "-e".to_string(),
        "/".to_string(),
    ]);
    let mut container = Container::new(spec, runtime.clone() as Arc<dyn RuntimeCli>);

    container.start().await.expect("start with probe");
    container.stop().await;
}

#[tokio::test]
async fn failing_probe_times_out() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let runtime = runtime();
    let spec = alpine_spec("timeout")
        .with_health_cmd(vec!["false".to_string()])
        .with_health_timeout(Duration::from_secs(3))
        .with_health_interval(Duration::from_millis(200));
    let mut container = Container::new(spec, runtime.clone() as Arc<dyn RuntimeCli>);

    let err = container.start().await.unwrap_err();
    assert!(matches!(err, HarnessError::ReadinessTimeout { .. }));
    container.stop().await;
}

#[tokio::test]
async fn runtime_assigned_port_is_inspectable() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let runtime = runtime();
    let spec = alpine_spec("ports").with_port(80, None);
    let mut container = Container::new(spec, runtime.clone() as Arc<dyn RuntimeCli>);

    container.start().await.expect("start");

    let host_port = container.host_port(80).await.expect("inspect ports");
    assert!(host_port.is_some());
    assert_ne!(host_port.unwrap(), 0);

    assert_eq!(container.host_port(9999).await.unwrap(), None);

    container.stop().await;
}

#[tokio::test]
async fn dropped_handle_removes_the_container() {
    if !podman_available() {
        eprintln!("podman not installed; skipping");
        return;
    }
    let runtime = runtime();

    let id = {
        let mut container =
            Container::new(alpine_spec("drop"), runtime.clone() as Arc<dyn RuntimeCli>);
        container.start().await.expect("start");
        container.container_id().unwrap().to_string()
    };

    // Removal is detached; poll until the container disappears.
    for _ in 0..20 {
        if !listed_in_ps(&runtime, &id).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("container {id} still present after drop");
}
