//! Docker Engine gateway backed by bollard

use super::{GatewayAction, PruneOutcome, RuntimeGateway};
use crate::error::{Result, SkiffError};
use crate::types::{
    ContainerRecord, ImageRecord, LifecycleState, NONE_TAG, NetworkAttachment, PortBinding,
};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{ListContainersOptions, RemoveContainerOptions, StopContainerOptions};
use bollard::image::{ListImagesOptions, PruneImagesOptions, RemoveImageOptions};
use bollard::models::{ContainerSummary, ImageSummary};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Seconds bollard waits on the socket before giving up.
const SOCKET_TIMEOUT_SECS: u64 = 120;

/// Gateway talking to a local Docker daemon
pub struct DockerGateway {
    docker: Docker,
}

impl DockerGateway {
    /// Connect to the daemon from `DOCKER_HOST` or the platform default socket.
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Self::verified(docker).await
    }

    /// Connect through an explicit unix socket path.
    pub async fn connect_with_socket(path: &str) -> Result<Self> {
        let docker =
            Docker::connect_with_socket(path, SOCKET_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?;
        Self::verified(docker).await
    }

    async fn verified(docker: Docker) -> Result<Self> {
        docker
            .ping()
            .await
            .map_err(|e| SkiffError::gateway(format!("Docker daemon is not reachable: {}", e)))?;
        info!("Connected to Docker daemon");
        Ok(Self { docker })
    }
}

/// Map "no such container/image" to `Missing`, "already stopped" to `Done`.
fn settle(result: std::result::Result<(), bollard::errors::Error>) -> Result<GatewayAction> {
    match result {
        Ok(()) => Ok(GatewayAction::Done),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 304, ..
        }) => Ok(GatewayAction::Done),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => Ok(GatewayAction::Missing),
        Err(e) => Err(e.into()),
    }
}

fn container_record(summary: ContainerSummary) -> Option<ContainerRecord> {
    let id = summary.id?;
    let name = summary
        .names
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_default();

    let ports = summary
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| PortBinding {
            source: p.ip.as_deref().and_then(|ip| ip.parse().ok()),
            destination: None,
            private_port: p.private_port,
            public_port: p.public_port,
        })
        .collect();

    let mut networks: Vec<NetworkAttachment> = summary
        .network_settings
        .and_then(|s| s.networks)
        .unwrap_or_default()
        .into_iter()
        .map(|(network, endpoint)| NetworkAttachment {
            network,
            ip_address: endpoint
                .ip_address
                .filter(|ip| !ip.is_empty())
                .and_then(|ip| ip.parse().ok()),
        })
        .collect();
    networks.sort_by(|a, b| a.network.cmp(&b.network));

    Some(ContainerRecord {
        id,
        name,
        image: summary.image.unwrap_or_default(),
        state: summary
            .state
            .as_deref()
            .map(LifecycleState::from_runtime)
            .unwrap_or(LifecycleState::Unknown),
        created: summary
            .created
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        started: None,
        ports,
        networks,
        labels: summary.labels.unwrap_or_default(),
    })
}

fn image_record(summary: ImageSummary) -> ImageRecord {
    // Newer daemons report untagged layers with no references at all.
    let repo_tags = if summary.repo_tags.is_empty() {
        vec![format!("{}:{}", NONE_TAG, NONE_TAG)]
    } else {
        summary.repo_tags
    };
    ImageRecord {
        id: summary.id,
        repo_tags,
        size: u64::try_from(summary.size).unwrap_or(0),
    }
}

#[async_trait]
impl RuntimeGateway for DockerGateway {
    async fn list_containers(
        &self,
        all: bool,
        name_filter: Option<&str>,
    ) -> Result<Vec<ContainerRecord>> {
        let mut filters = HashMap::new();
        if let Some(name) = name_filter {
            filters.insert("name".to_string(), vec![name.to_string()]);
        }
        let options = ListContainersOptions::<String> {
            all,
            filters,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        debug!("Listed {} containers", containers.len());
        Ok(containers.into_iter().filter_map(container_record).collect())
    }

    async fn list_images(&self, all: bool) -> Result<Vec<ImageRecord>> {
        let options = ListImagesOptions::<String> {
            all,
            ..Default::default()
        };

        let images = self.docker.list_images(Some(options)).await?;
        debug!("Listed {} images", images.len());
        Ok(images.into_iter().map(image_record).collect())
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<GatewayAction> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        settle(self.docker.stop_container(id, Some(options)).await)
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<GatewayAction> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        settle(self.docker.remove_container(id, Some(options)).await)
    }

    async fn remove_image(&self, id: &str, force: bool) -> Result<GatewayAction> {
        let options = RemoveImageOptions {
            force,
            ..Default::default()
        };
        settle(
            self.docker
                .remove_image(id, Some(options), None)
                .await
                .map(|_| ()),
        )
    }

    async fn prune_dangling_images(&self) -> Result<Option<PruneOutcome>> {
        let mut filters = HashMap::new();
        filters.insert("dangling".to_string(), vec!["true".to_string()]);
        let options = PruneImagesOptions::<String> { filters };

        let response = self.docker.prune_images(Some(options)).await?;
        let removed = response
            .images_deleted
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| item.deleted)
            .collect();

        Ok(Some(PruneOutcome {
            removed,
            reclaimed_bytes: response
                .space_reclaimed
                .and_then(|b| u64::try_from(b).ok())
                .unwrap_or(0),
        }))
    }
}
