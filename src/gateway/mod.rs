//! Runtime gateway abstraction
//!
//! Everything skiff knows about the container runtime goes through
//! [`RuntimeGateway`]. The engine receives the gateway explicitly, so the
//! same logic runs against the Docker daemon ([`DockerGateway`]) or an
//! in-memory registry ([`MemoryGateway`]).
//!
//! ## Idempotence
//!
//! The live registry may change between a listing and the action taken on
//! it. Stop and remove primitives therefore report a vanished target as
//! [`GatewayAction::Missing`] instead of failing.

use crate::error::Result;
use crate::types::{ContainerRecord, ImageRecord};
use async_trait::async_trait;
use std::time::Duration;

pub mod docker;
pub mod memory;

pub use docker::DockerGateway;
pub use memory::MemoryGateway;

/// Result of a stop or remove request that reached the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayAction {
    /// The runtime carried out the request (or the target was already in the
    /// requested state).
    Done,
    /// The target no longer exists.
    Missing,
}

/// Result of a bulk prune of dangling images
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneOutcome {
    pub removed: Vec<String>,
    pub reclaimed_bytes: u64,
}

#[async_trait]
pub trait RuntimeGateway: Send + Sync {
    /// List containers, including stopped ones when `all` is set.
    async fn list_containers(
        &self,
        all: bool,
        name_filter: Option<&str>,
    ) -> Result<Vec<ContainerRecord>>;

    /// List images, including intermediate layers when `all` is set.
    async fn list_images(&self, all: bool) -> Result<Vec<ImageRecord>>;

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<GatewayAction>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<GatewayAction>;

    async fn remove_image(&self, id: &str, force: bool) -> Result<GatewayAction>;

    /// Remove all dangling images in one call. `None` when the runtime has no
    /// such primitive.
    async fn prune_dangling_images(&self) -> Result<Option<PruneOutcome>> {
        Ok(None)
    }
}
