//! Skiff - single-host container fleet maintenance
//!
//! This crate lists, stops and removes containers and images through a
//! [`RuntimeGateway`](gateway::RuntimeGateway), and allocates sequential,
//! collision-free container names.

pub mod cleanup;
pub mod config;
pub mod error;
pub mod fleet;
pub mod gateway;
pub mod logging;
pub mod naming;
pub mod types;

pub use config::SkiffConfig;
pub use error::{Result, SkiffError};

// Export main types at root level
pub use cleanup::{CleanupReport, ContainerSelector, EngineSettings, ImageSweep};
pub use types::{ContainerRecord, ImageRecord, LifecycleState};

use cleanup::CleanupEngine;
use gateway::{DockerGateway, RuntimeGateway};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Core Skiff API for fleet maintenance
pub struct SkiffRuntime {
    gateway: Arc<dyn RuntimeGateway>,
    engine: CleanupEngine,
}

impl SkiffRuntime {
    /// Create a runtime over any gateway
    pub fn new(gateway: Arc<dyn RuntimeGateway>, settings: EngineSettings) -> Self {
        let engine = CleanupEngine::new(Arc::clone(&gateway), settings);
        Self { gateway, engine }
    }

    /// Connect to the Docker daemon described by `config`
    pub async fn connect(config: &SkiffConfig) -> Result<Self> {
        let gateway = match config.docker_socket.as_deref() {
            Some(socket) => DockerGateway::connect_with_socket(socket).await?,
            None => DockerGateway::connect().await?,
        };
        Ok(Self::new(Arc::new(gateway), config.engine_settings()))
    }

    /// Stop running containers, or just `target`
    pub async fn stop_containers(&self, target: Option<&str>) -> Result<CleanupReport> {
        self.engine.stop_containers(target).await
    }

    /// Remove every container that is not running
    pub async fn remove_stopped_containers(&self) -> Result<CleanupReport> {
        self.engine
            .remove_containers(ContainerSelector::Stopped)
            .await
    }

    /// Remove every container
    pub async fn remove_all_containers(&self) -> Result<CleanupReport> {
        self.engine.remove_containers(ContainerSelector::All).await
    }

    /// Remove dangling images
    pub async fn clean_images(&self, mode: ImageSweep) -> Result<CleanupReport> {
        self.engine.clean_dangling_images(mode).await
    }

    /// Next free `<prefix>-<NNN>` name
    pub async fn next_name(&self, prefix: &str) -> Result<String> {
        if prefix.is_empty() {
            return Err(SkiffError::InvalidPrefix);
        }
        let containers = self.gateway.list_containers(true, Some(prefix)).await?;
        debug!("{} containers share prefix {}", containers.len(), prefix);
        naming::allocate_name(prefix, containers.iter().map(|c| c.name.as_str()))
    }

    /// Address of the container called `name`
    pub async fn container_ip(&self, name: &str) -> Result<IpAddr> {
        let containers = self.gateway.list_containers(true, Some(name)).await?;
        let exists = containers
            .iter()
            .any(|c| c.name == name.trim_start_matches('/'));
        if !exists {
            return Err(SkiffError::ContainerNotFound {
                name: name.to_string(),
            });
        }
        fleet::container_ip(&containers, name).ok_or_else(|| SkiffError::NoAddress {
            name: name.to_string(),
        })
    }

    pub fn engine(&self) -> &CleanupEngine {
        &self.engine
    }
}
