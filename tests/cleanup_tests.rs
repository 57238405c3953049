use pretty_assertions::assert_eq;
use skiff::cleanup::{CleanupEngine, ContainerSelector, EngineSettings, ImageSweep, ItemStatus};
use skiff::fleet::{classify_images, is_dangling};
use skiff::gateway::memory::GatewayCall;
use skiff::gateway::MemoryGateway;
use skiff::{ContainerRecord, ImageRecord, LifecycleState, SkiffError};
use std::sync::Arc;
use std::time::Duration;

const WEB_1: &str = "aaaaaaaaaaaa1111111111111111";
const WEB_2: &str = "bbbbbbbbbbbb2222222222222222";
const DB_1: &str = "cccccccccccc3333333333333333";

fn fleet() -> MemoryGateway {
    MemoryGateway::new().with_containers([
        ContainerRecord::new(WEB_1, "web-001", LifecycleState::Stopped),
        ContainerRecord::new(WEB_2, "web-002", LifecycleState::Running),
        ContainerRecord::new(DB_1, "db-001", LifecycleState::Stopped),
    ])
}

fn engine(gateway: &Arc<MemoryGateway>) -> CleanupEngine {
    CleanupEngine::new(gateway.clone(), EngineSettings::default())
}

#[tokio::test]
async fn remove_stopped_leaves_running() {
    let gateway = Arc::new(fleet());
    let report = engine(&gateway)
        .remove_containers(ContainerSelector::Stopped)
        .await
        .unwrap();

    assert_eq!(report.count(), 2);
    assert_eq!(report.ids(), ["aaaaaaaaaaaa", "cccccccccccc"]);
    let left: Vec<String> = gateway
        .containers()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(left, vec!["web-002".to_string()]);
}

#[tokio::test]
async fn removals_are_forced() {
    let gateway = Arc::new(fleet());
    engine(&gateway)
        .remove_containers(ContainerSelector::All)
        .await
        .unwrap();

    let calls = gateway.calls().unwrap();
    assert_eq!(calls.len(), 3);
    assert!(calls
        .iter()
        .all(|c| matches!(c, GatewayCall::RemoveContainer { force: true, .. })));
    assert!(gateway.containers().unwrap().is_empty());
}

#[tokio::test]
async fn second_removal_is_a_no_op() {
    let gateway = Arc::new(fleet());
    let engine = engine(&gateway);

    let first = engine
        .remove_containers(ContainerSelector::Stopped)
        .await
        .unwrap();
    let second = engine
        .remove_containers(ContainerSelector::Stopped)
        .await
        .unwrap();

    assert_eq!(first.count(), 2);
    assert_eq!(second.count(), 0);
    assert!(second.outcomes().is_empty());
    assert!(!second.has_failures());
}

#[tokio::test]
async fn one_failure_does_not_abort_the_batch() {
    let gateway = Arc::new(fleet().with_failure(WEB_1));
    let report = engine(&gateway)
        .remove_containers(ContainerSelector::Stopped)
        .await
        .unwrap();

    assert_eq!(report.count(), 1);
    assert_eq!(report.ids(), ["cccccccccccc"]);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].id, "aaaaaaaaaaaa");
}

#[tokio::test]
async fn stop_applies_grace_period_to_running_only() {
    let gateway = Arc::new(fleet());
    let report = engine(&gateway).stop_containers(None).await.unwrap();

    assert_eq!(report.count(), 1);
    assert_eq!(report.to_string(), "Stopped (1) containers.");
    assert_eq!(
        gateway.calls().unwrap(),
        vec![GatewayCall::StopContainer {
            id: WEB_2.to_string(),
            grace: Duration::from_secs(30),
        }]
    );

    let again = engine(&gateway).stop_containers(None).await.unwrap();
    assert_eq!(again.count(), 0);
}

#[tokio::test]
async fn stop_single_container_by_name() {
    let gateway = Arc::new(fleet().with_containers([ContainerRecord::new(
        "dddddddddddd4444",
        "cache-001",
        LifecycleState::Running,
    )]));
    let report = engine(&gateway)
        .stop_containers(Some("cache-001"))
        .await
        .unwrap();

    assert_eq!(report.ids(), ["dddddddddddd"]);
    let still_running = gateway
        .containers()
        .unwrap()
        .into_iter()
        .filter(|c| c.is_running())
        .count();
    assert_eq!(still_running, 1);
}

#[tokio::test]
async fn stop_unknown_target_is_an_error() {
    let gateway = Arc::new(fleet());
    let result = engine(&gateway).stop_containers(Some("nope")).await;
    assert!(matches!(result, Err(SkiffError::ContainerNotFound { .. })));
}

#[tokio::test]
async fn unreachable_runtime_is_fatal() {
    let gateway = Arc::new(fleet().offline());
    let result = engine(&gateway)
        .remove_containers(ContainerSelector::All)
        .await;
    assert!(matches!(result, Err(SkiffError::Gateway { .. })));
}

#[test]
fn mixed_references_mark_whole_image_dangling() {
    let images = vec![
        ImageRecord::new("sha256:mixed", ["repo:<none>", "repo2:v1"]),
        ImageRecord::new("sha256:tagged", ["repo:v1"]),
    ];
    let parts = classify_images(images);
    assert_eq!(parts.dangling.len(), 1);
    assert_eq!(parts.dangling[0].id, "sha256:mixed");
    assert_eq!(parts.tagged.len(), 1);
}

#[tokio::test]
async fn sweep_reaches_layers_exposed_by_earlier_removals() {
    let gateway = Arc::new(
        MemoryGateway::new()
            .with_images([
                ImageRecord::new("sha256:aaaaaaaaaaaaaaaa", ["<none>:<none>"]).with_size(100),
                ImageRecord::new("sha256:bbbbbbbbbbbbbbbb", ["builder:stage"]).with_size(50),
                ImageRecord::new("sha256:eeeeeeeeeeeeeeee", ["nginx:latest"]).with_size(10),
            ])
            .with_layer_parent("sha256:aaaaaaaaaaaaaaaa", "sha256:bbbbbbbbbbbbbbbb"),
    );
    let report = engine(&gateway)
        .clean_dangling_images(ImageSweep::Sweep)
        .await
        .unwrap();

    assert_eq!(report.ids(), ["aaaaaaaaaaaa", "bbbbbbbbbbbb"]);
    assert_eq!(report.reclaimed_bytes(), 150);
    assert!(report.rounds() <= 3);

    let left = gateway.images().unwrap();
    assert_eq!(left.len(), 1);
    assert!(!is_dangling(&left[0]));
}

#[tokio::test]
async fn sweep_stops_when_nothing_is_dangling() {
    let gateway = Arc::new(MemoryGateway::new().with_images([ImageRecord::new(
        "sha256:eeee",
        ["nginx:latest"],
    )]));
    let report = engine(&gateway)
        .clean_dangling_images(ImageSweep::Sweep)
        .await
        .unwrap();

    assert_eq!(report.count(), 0);
    assert_eq!(report.rounds(), 1);
}

#[tokio::test]
async fn failing_image_is_reported_once() {
    let gateway = Arc::new(
        MemoryGateway::new()
            .with_images([
                ImageRecord::new("sha256:ffffffffffffffff", ["<none>:<none>"]),
                ImageRecord::new("sha256:aaaaaaaaaaaaaaaa", ["<none>:<none>"]),
            ])
            .with_failure("sha256:ffffffffffffffff"),
    );
    let report = engine(&gateway)
        .clean_dangling_images(ImageSweep::Sweep)
        .await
        .unwrap();

    assert_eq!(report.ids(), ["aaaaaaaaaaaa"]);
    let failed: Vec<_> = report
        .outcomes()
        .iter()
        .filter(|o| matches!(o.status, ItemStatus::Failed(_)))
        .collect();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
async fn prune_is_preferred_when_available() {
    let gateway = Arc::new(
        MemoryGateway::new()
            .with_prune()
            .with_images([
                ImageRecord::new("sha256:aaaaaaaaaaaaaaaa", ["<none>:<none>"]).with_size(7),
                ImageRecord::new("sha256:eeeeeeeeeeeeeeee", ["nginx:latest"]),
            ]),
    );
    let report = engine(&gateway)
        .clean_dangling_images(ImageSweep::Auto)
        .await
        .unwrap();

    assert_eq!(report.ids(), ["aaaaaaaaaaaa"]);
    assert_eq!(report.reclaimed_bytes(), 7);
    assert_eq!(gateway.calls().unwrap(), vec![GatewayCall::PruneImages]);
}

#[tokio::test]
async fn sweep_mode_bypasses_prune() {
    let gateway = Arc::new(
        MemoryGateway::new()
            .with_prune()
            .with_images([ImageRecord::new("sha256:aaaaaaaaaaaaaaaa", ["<none>:<none>"])]),
    );
    engine(&gateway)
        .clean_dangling_images(ImageSweep::Sweep)
        .await
        .unwrap();

    let calls = gateway.calls().unwrap();
    assert!(!calls.contains(&GatewayCall::PruneImages));
    assert!(gateway.images().unwrap().is_empty());
}

#[tokio::test]
async fn clean_fleet_yields_empty_reports() {
    let gateway = Arc::new(MemoryGateway::new());
    let engine = engine(&gateway);

    assert_eq!(engine.stop_containers(None).await.unwrap().count(), 0);
    assert_eq!(
        engine
            .remove_containers(ContainerSelector::All)
            .await
            .unwrap()
            .count(),
        0
    );
    assert_eq!(
        engine
            .clean_dangling_images(ImageSweep::Auto)
            .await
            .unwrap()
            .count(),
        0
    );
}
