//! Partitioning of container and image snapshots.

use crate::types::{ContainerRecord, ImageRecord, NONE_TAG};
use std::net::IpAddr;

/// Network consulted first when resolving a container address.
pub const DEFAULT_NETWORK: &str = "bridge";

/// Containers split by lifecycle state
#[derive(Debug, Clone, Default)]
pub struct ContainerPartition {
    pub running: Vec<ContainerRecord>,
    /// Everything not running, including containers in an unknown state.
    pub stopped: Vec<ContainerRecord>,
}

/// Images split by tag state
#[derive(Debug, Clone, Default)]
pub struct ImagePartition {
    pub tagged: Vec<ImageRecord>,
    pub dangling: Vec<ImageRecord>,
}

pub fn classify_containers(records: impl IntoIterator<Item = ContainerRecord>) -> ContainerPartition {
    let (running, stopped) = records.into_iter().partition(ContainerRecord::is_running);
    ContainerPartition { running, stopped }
}

pub fn classify_images(records: impl IntoIterator<Item = ImageRecord>) -> ImagePartition {
    let (dangling, tagged) = records.into_iter().partition(is_dangling);
    ImagePartition { tagged, dangling }
}

/// An image is dangling when any of its references names `<none>` as the
/// repository or the tag. One real tag does not save an image that also
/// carries a `<none>` reference.
pub fn is_dangling(image: &ImageRecord) -> bool {
    image
        .repo_tags
        .iter()
        .any(|tag| tag.split(':').any(|part| part == NONE_TAG))
}

/// Address of the container called `name`.
///
/// Prefers the default bridge network, then the first attached network (by
/// name) that has an address. `None` when no container has that exact name
/// or none of its networks carry an address.
pub fn container_ip<'a>(
    records: impl IntoIterator<Item = &'a ContainerRecord>,
    name: &str,
) -> Option<IpAddr> {
    let wanted = name.trim_start_matches('/');
    let container = records
        .into_iter()
        .find(|c| c.name.trim_start_matches('/') == wanted)?;

    let bridge = container
        .networks
        .iter()
        .find(|n| n.network == DEFAULT_NETWORK)
        .and_then(|n| n.ip_address);
    if bridge.is_some() {
        return bridge;
    }

    let mut networks: Vec<_> = container
        .networks
        .iter()
        .filter(|n| n.ip_address.is_some())
        .collect();
    networks.sort_by(|a, b| a.network.cmp(&b.network));
    networks.first().and_then(|n| n.ip_address)
}
