use pretty_assertions::assert_eq;
use skiff::cleanup::ItemStatus;
use skiff::gateway::MemoryGateway;
use skiff::{
    ContainerRecord, EngineSettings, ImageSweep, LifecycleState, SkiffError, SkiffRuntime,
};
use std::net::IpAddr;
use std::sync::Arc;

fn runtime(gateway: MemoryGateway) -> SkiffRuntime {
    SkiffRuntime::new(Arc::new(gateway), EngineSettings::default())
}

#[tokio::test]
async fn remove_stopped_end_to_end() {
    let runtime = runtime(MemoryGateway::new().with_containers([
        ContainerRecord::new("1111111111111111", "web-001", LifecycleState::Stopped),
        ContainerRecord::new("2222222222222222", "web-002", LifecycleState::Running),
        ContainerRecord::new("3333333333333333", "db-001", LifecycleState::Stopped),
    ]));

    let report = runtime.remove_stopped_containers().await.unwrap();
    assert_eq!(report.count(), 2);
    assert_eq!(report.to_string(), "Removed (2) containers.");

    // web-002 survives, so the next web name continues after it
    assert_eq!(runtime.next_name("web").await.unwrap(), "web-003");
    assert_eq!(runtime.next_name("db").await.unwrap(), "db-001");
}

#[tokio::test]
async fn remove_all_then_nothing_left() {
    let runtime = runtime(MemoryGateway::new().with_containers([
        ContainerRecord::new("1111111111111111", "web-001", LifecycleState::Running),
        ContainerRecord::new("2222222222222222", "web-002", LifecycleState::Unknown),
    ]));

    assert_eq!(runtime.remove_all_containers().await.unwrap().count(), 2);
    assert_eq!(runtime.remove_all_containers().await.unwrap().count(), 0);
}

#[tokio::test]
async fn next_name_ignores_lookalike_containers() {
    let runtime = runtime(MemoryGateway::new().with_containers([
        ContainerRecord::new("a", "web-004", LifecycleState::Running),
        ContainerRecord::new("b", "webapp-020", LifecycleState::Running),
        ContainerRecord::new("c", "old-web-050", LifecycleState::Stopped),
    ]));

    assert_eq!(runtime.next_name("web").await.unwrap(), "web-005");
}

#[tokio::test]
async fn next_name_rejects_empty_prefix() {
    let runtime = runtime(MemoryGateway::new());
    assert!(matches!(
        runtime.next_name("").await,
        Err(SkiffError::InvalidPrefix)
    ));
}

#[tokio::test]
async fn container_ip_prefers_bridge() {
    let bridge: IpAddr = "172.17.0.2".parse().unwrap();
    let runtime = runtime(MemoryGateway::new().with_containers([
        ContainerRecord::new("a", "web-001", LifecycleState::Running)
            .with_network("app-net", Some("10.1.0.4".parse().unwrap()))
            .with_network("bridge", Some(bridge)),
    ]));

    assert_eq!(runtime.container_ip("web-001").await.unwrap(), bridge);
}

#[tokio::test]
async fn container_ip_errors() {
    let runtime = runtime(MemoryGateway::new().with_containers([
        ContainerRecord::new("a", "web-001", LifecycleState::Stopped),
    ]));

    assert!(matches!(
        runtime.container_ip("web").await,
        Err(SkiffError::ContainerNotFound { .. })
    ));
    assert!(matches!(
        runtime.container_ip("web-001").await,
        Err(SkiffError::NoAddress { .. })
    ));
}

#[tokio::test]
async fn vanished_container_is_benign() {
    let runtime = runtime(MemoryGateway::new().with_ghost_container(ContainerRecord::new(
        "1111111111111111",
        "web-001",
        LifecycleState::Stopped,
    )));

    let report = runtime.remove_stopped_containers().await.unwrap();
    assert_eq!(report.count(), 0);
    assert_eq!(report.outcomes().len(), 1);
    assert_eq!(report.outcomes()[0].status, ItemStatus::AlreadyGone);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn image_cleanup_through_runtime() {
    let runtime = runtime(MemoryGateway::new().with_images([
        skiff::ImageRecord::new("sha256:0123456789abcdef", ["<none>:<none>"]).with_size(2048),
    ]));

    let report = runtime.clean_images(ImageSweep::Auto).await.unwrap();
    assert_eq!(report.to_string(), "Removed (1) images, reclaimed 2.0 KB.");
}
