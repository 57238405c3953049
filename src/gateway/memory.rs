//! In-memory runtime gateway
//!
//! Holds a container and image registry behind a mutex and applies stop and
//! remove requests to it. Failures can be injected per identifier, and image
//! layers can be chained so that removing a child exposes its parent as
//! dangling on the next listing.

use super::{GatewayAction, PruneOutcome, RuntimeGateway};
use crate::error::{Result, SkiffError};
use crate::fleet::is_dangling;
use crate::types::{ContainerRecord, ImageRecord, LifecycleState, NONE_TAG};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// A request the gateway received, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    StopContainer { id: String, grace: Duration },
    RemoveContainer { id: String, force: bool },
    RemoveImage { id: String, force: bool },
    PruneImages,
}

#[derive(Default)]
struct Registry {
    containers: Vec<ContainerRecord>,
    /// Listed but already gone from the runtime: a stale read.
    ghosts: Vec<ContainerRecord>,
    images: Vec<ImageRecord>,
    /// child image id -> parent image id
    parents: HashMap<String, String>,
    failing: HashSet<String>,
    calls: Vec<GatewayCall>,
    offline: bool,
}

impl Registry {
    fn ensure_online(&self) -> Result<()> {
        if self.offline {
            Err(SkiffError::gateway("runtime is not reachable"))
        } else {
            Ok(())
        }
    }

    fn ensure_not_failing(&self, id: &str) -> Result<()> {
        if self.failing.contains(id) {
            Err(SkiffError::gateway(format!("injected failure for {}", id)))
        } else {
            Ok(())
        }
    }

    /// Drop an image and untag the parent it was holding up.
    fn drop_image(&mut self, id: &str) -> Option<ImageRecord> {
        let index = self.images.iter().position(|i| i.id == id)?;
        let removed = self.images.remove(index);

        if let Some(parent) = self.parents.remove(id) {
            let still_referenced = self.parents.values().any(|p| *p == parent);
            if !still_referenced {
                if let Some(image) = self.images.iter_mut().find(|i| i.id == parent) {
                    debug!("Layer {} is now dangling", parent);
                    image.repo_tags = vec![format!("{}:{}", NONE_TAG, NONE_TAG)];
                }
            }
        }
        Some(removed)
    }
}

/// Gateway over an in-process registry
#[derive(Default)]
pub struct MemoryGateway {
    registry: Mutex<Registry>,
    supports_prune: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(self, containers: impl IntoIterator<Item = ContainerRecord>) -> Self {
        if let Ok(mut reg) = self.registry.lock() {
            reg.containers.extend(containers);
        }
        self
    }

    pub fn with_images(self, images: impl IntoIterator<Item = ImageRecord>) -> Self {
        if let Ok(mut reg) = self.registry.lock() {
            reg.images.extend(images);
        }
        self
    }

    /// Declare that `child` is built on `parent`. Removing the last child of
    /// a parent leaves the parent untagged.
    pub fn with_layer_parent(self, child: &str, parent: &str) -> Self {
        if let Ok(mut reg) = self.registry.lock() {
            reg.parents.insert(child.to_string(), parent.to_string());
        }
        self
    }

    /// Make every stop or remove request for `id` fail.
    pub fn with_failure(self, id: &str) -> Self {
        if let Ok(mut reg) = self.registry.lock() {
            reg.failing.insert(id.to_string());
        }
        self
    }

    /// Offer the bulk prune primitive.
    pub fn with_prune(mut self) -> Self {
        self.supports_prune = true;
        self
    }

    /// Simulate a runtime that cannot be reached.
    pub fn offline(self) -> Self {
        if let Ok(mut reg) = self.registry.lock() {
            reg.offline = true;
        }
        self
    }

    /// List `container` without it existing, as if another process removed
    /// it between the listing and the request.
    pub fn with_ghost_container(self, container: ContainerRecord) -> Self {
        if let Ok(mut reg) = self.registry.lock() {
            reg.ghosts.push(container);
        }
        self
    }

    pub fn containers(&self) -> Result<Vec<ContainerRecord>> {
        Ok(self.registry()?.containers.clone())
    }

    pub fn images(&self) -> Result<Vec<ImageRecord>> {
        Ok(self.registry()?.images.clone())
    }

    pub fn calls(&self) -> Result<Vec<GatewayCall>> {
        Ok(self.registry()?.calls.clone())
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry
            .lock()
            .map_err(|_| SkiffError::gateway("registry lock poisoned"))
    }
}

#[async_trait]
impl RuntimeGateway for MemoryGateway {
    async fn list_containers(
        &self,
        all: bool,
        name_filter: Option<&str>,
    ) -> Result<Vec<ContainerRecord>> {
        let reg = self.registry()?;
        reg.ensure_online()?;
        Ok(reg
            .containers
            .iter()
            .chain(reg.ghosts.iter())
            .filter(|c| all || c.is_running())
            .filter(|c| name_filter.is_none_or(|name| c.name.contains(name)))
            .cloned()
            .collect())
    }

    async fn list_images(&self, _all: bool) -> Result<Vec<ImageRecord>> {
        let reg = self.registry()?;
        reg.ensure_online()?;
        Ok(reg.images.clone())
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<GatewayAction> {
        let mut reg = self.registry()?;
        reg.ensure_online()?;
        reg.calls.push(GatewayCall::StopContainer {
            id: id.to_string(),
            grace,
        });
        reg.ensure_not_failing(id)?;

        match reg.containers.iter_mut().find(|c| c.id == id) {
            Some(container) => {
                container.state = LifecycleState::Stopped;
                Ok(GatewayAction::Done)
            }
            None => Ok(GatewayAction::Missing),
        }
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<GatewayAction> {
        let mut reg = self.registry()?;
        reg.ensure_online()?;
        reg.calls.push(GatewayCall::RemoveContainer {
            id: id.to_string(),
            force,
        });
        reg.ensure_not_failing(id)?;

        let Some(index) = reg.containers.iter().position(|c| c.id == id) else {
            return Ok(GatewayAction::Missing);
        };
        if reg.containers[index].is_running() && !force {
            return Err(SkiffError::gateway(format!(
                "cannot remove running container {}",
                id
            )));
        }
        reg.containers.remove(index);
        Ok(GatewayAction::Done)
    }

    async fn remove_image(&self, id: &str, force: bool) -> Result<GatewayAction> {
        let mut reg = self.registry()?;
        reg.ensure_online()?;
        reg.calls.push(GatewayCall::RemoveImage {
            id: id.to_string(),
            force,
        });
        reg.ensure_not_failing(id)?;

        match reg.drop_image(id) {
            Some(_) => Ok(GatewayAction::Done),
            None => Ok(GatewayAction::Missing),
        }
    }

    async fn prune_dangling_images(&self) -> Result<Option<PruneOutcome>> {
        if !self.supports_prune {
            return Ok(None);
        }
        let mut reg = self.registry()?;
        reg.ensure_online()?;
        reg.calls.push(GatewayCall::PruneImages);

        let mut outcome = PruneOutcome::default();
        loop {
            let dangling: Vec<String> = reg
                .images
                .iter()
                .filter(|i| is_dangling(i) && !reg.failing.contains(&i.id))
                .map(|i| i.id.clone())
                .collect();
            if dangling.is_empty() {
                break;
            }
            for id in dangling {
                if let Some(image) = reg.drop_image(&id) {
                    outcome.reclaimed_bytes += image.size;
                    outcome.removed.push(image.id);
                }
            }
        }
        Ok(Some(outcome))
    }
}
