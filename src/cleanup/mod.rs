//! Cleanup engine
//!
//! Drives stop and remove requests through a [`RuntimeGateway`] and folds
//! the per-item results into a [`CleanupReport`]. A single item failing never
//! aborts a batch; it is recorded as [`ItemStatus::Failed`] and the caller
//! decides what that means for the exit status.
//!
//! Dangling image removal runs to a fixpoint: removing one image can leave
//! its parent layer untagged, which only shows up on the next listing.

use crate::error::{Result, SkiffError};
use crate::fleet::{classify_containers, classify_images};
use crate::gateway::{GatewayAction, RuntimeGateway};
use crate::types::{ContainerRecord, short_id};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub mod report;

pub use report::{CleanupKind, CleanupReport, ItemOutcome, ItemStatus, format_bytes};

/// Grace period granted to a container before the runtime kills it.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(30);

/// Upper bound on image sweep rounds.
pub const DEFAULT_MAX_IMAGE_ROUNDS: usize = 64;

/// Which containers a removal applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerSelector {
    All,
    Stopped,
}

/// How dangling images are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSweep {
    /// Use the runtime's bulk prune when the settings allow and it exists.
    #[default]
    Auto,
    /// Always remove images one by one until nothing changes.
    Sweep,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub stop_grace: Duration,
    pub prefer_prune: bool,
    pub max_image_rounds: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            stop_grace: DEFAULT_STOP_GRACE,
            prefer_prune: true,
            max_image_rounds: DEFAULT_MAX_IMAGE_ROUNDS,
        }
    }
}

pub struct CleanupEngine {
    gateway: Arc<dyn RuntimeGateway>,
    settings: EngineSettings,
}

impl CleanupEngine {
    pub fn new(gateway: Arc<dyn RuntimeGateway>, settings: EngineSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Stop running containers, or only `target` (name or id prefix) if given.
    pub async fn stop_containers(&self, target: Option<&str>) -> Result<CleanupReport> {
        let containers = self.gateway.list_containers(true, None).await?;
        let matches = |c: &ContainerRecord| {
            target.is_none_or(|t| c.name == t.trim_start_matches('/') || c.id.starts_with(t))
        };

        if let Some(name) = target {
            if !containers.iter().any(matches) {
                return Err(SkiffError::ContainerNotFound {
                    name: name.to_string(),
                });
            }
        }

        let running = classify_containers(containers).running;
        let mut report = CleanupReport::new(CleanupKind::StoppedContainers);

        for container in running.iter().filter(|c| matches(*c)) {
            debug!("Stopping container {} ({})", container.name, container.short_id());
            let result = self
                .gateway
                .stop_container(&container.id, self.settings.stop_grace)
                .await;
            report.record(container.short_id(), settle("stop", &container.id, result));
        }

        info!("{}", report);
        Ok(report)
    }

    /// Force-remove the selected containers.
    pub async fn remove_containers(&self, selector: ContainerSelector) -> Result<CleanupReport> {
        let containers = self.gateway.list_containers(true, None).await?;
        let targets = match selector {
            ContainerSelector::All => containers,
            ContainerSelector::Stopped => classify_containers(containers).stopped,
        };

        let mut report = CleanupReport::new(CleanupKind::RemovedContainers);
        for container in &targets {
            debug!("Removing container {} ({})", container.name, container.short_id());
            let result = self.gateway.remove_container(&container.id, true).await;
            report.record(container.short_id(), settle("remove", &container.id, result));
        }

        for id in report.ids() {
            info!("Removed container {}", id);
        }
        info!("{}", report);
        Ok(report)
    }

    /// Remove dangling images, preferring the runtime's bulk prune.
    pub async fn clean_dangling_images(&self, mode: ImageSweep) -> Result<CleanupReport> {
        if mode == ImageSweep::Auto && self.settings.prefer_prune {
            if let Some(outcome) = self.gateway.prune_dangling_images().await? {
                let mut report = CleanupReport::new(CleanupKind::RemovedImages);
                for id in &outcome.removed {
                    report.record(short_id(id), ItemStatus::Done);
                }
                report.add_reclaimed(outcome.reclaimed_bytes);
                info!("{} (bulk prune)", report);
                return Ok(report);
            }
            debug!("Runtime has no prune primitive, sweeping image by image");
        }

        self.sweep_dangling_images().await
    }

    async fn sweep_dangling_images(&self) -> Result<CleanupReport> {
        let mut report = CleanupReport::new(CleanupKind::RemovedImages);
        let mut failed: HashSet<String> = HashSet::new();
        let mut previous: Option<usize> = None;
        let mut rounds = 0;

        loop {
            rounds += 1;
            let images = self.gateway.list_images(true).await?;
            let pending: Vec<_> = classify_images(images)
                .dangling
                .into_iter()
                .filter(|i| !failed.contains(&i.id))
                .collect();

            let mut removed = 0;
            for image in &pending {
                let result = self.gateway.remove_image(&image.id, true).await;
                let status = settle("remove image", &image.id, result);
                match status {
                    ItemStatus::Done => {
                        removed += 1;
                        report.add_reclaimed(image.size);
                    }
                    ItemStatus::Failed(_) => {
                        failed.insert(image.id.clone());
                    }
                    ItemStatus::AlreadyGone => {}
                }
                report.record(image.short_id(), status);
            }

            debug!("Image sweep round {} removed {} images", rounds, removed);

            // Stop once a round makes no progress, or repeats the last one.
            if removed == 0 || previous == Some(removed) {
                break;
            }
            if rounds >= self.settings.max_image_rounds {
                warn!("Image sweep stopped after {} rounds", rounds);
                break;
            }
            previous = Some(removed);
        }

        report.set_rounds(rounds);
        info!("{} ({} rounds)", report, rounds);
        Ok(report)
    }
}

fn settle(action: &str, id: &str, result: Result<GatewayAction>) -> ItemStatus {
    match result {
        Ok(GatewayAction::Done) => ItemStatus::Done,
        Ok(GatewayAction::Missing) => {
            debug!("{}: {} already gone", action, id);
            ItemStatus::AlreadyGone
        }
        Err(e) => {
            warn!("Failed to {} {}: {}", action, id, e);
            ItemStatus::Failed(e.to_string())
        }
    }
}
