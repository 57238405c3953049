use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

/// Width of the canonical short identifier shown in reports.
pub const SHORT_ID_LEN: usize = 12;

/// Sentinel the runtime uses for a missing repository or tag.
pub const NONE_TAG: &str = "<none>";

/// Container lifecycle state as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Running,
    Stopped,
    Unknown,
}

impl LifecycleState {
    /// Map a runtime state string (`running`, `exited`, ...) to a lifecycle state.
    pub fn from_runtime(state: &str) -> Self {
        match state.to_ascii_lowercase().as_str() {
            "running" => LifecycleState::Running,
            "created" | "exited" | "dead" | "paused" | "stopped" => LifecycleState::Stopped,
            _ => LifecycleState::Unknown,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Stopped => write!(f, "stopped"),
            LifecycleState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Published port binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub source: Option<IpAddr>,
    pub destination: Option<IpAddr>,
    pub private_port: u16,
    pub public_port: Option<u16>,
}

/// Network a container is attached to, with its address on that network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub network: String,
    pub ip_address: Option<IpAddr>,
}

/// Snapshot of a container as observed through the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: LifecycleState,
    pub created: Option<DateTime<Utc>>,
    pub started: Option<DateTime<Utc>>,
    pub ports: Vec<PortBinding>,
    pub networks: Vec<NetworkAttachment>,
    pub labels: HashMap<String, String>,
}

impl ContainerRecord {
    /// Minimal record, mostly useful for fakes and tests.
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: LifecycleState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: String::new(),
            state,
            created: None,
            started: None,
            ports: Vec::new(),
            networks: Vec::new(),
            labels: HashMap::new(),
        }
    }

    pub fn with_network(mut self, network: impl Into<String>, ip: Option<IpAddr>) -> Self {
        self.networks.push(NetworkAttachment {
            network: network.into(),
            ip_address: ip,
        });
        self
    }

    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }
}

/// Snapshot of an image as observed through the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub size: u64,
}

impl ImageRecord {
    pub fn new<I, S>(id: impl Into<String>, repo_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            repo_tags: repo_tags.into_iter().map(Into::into).collect(),
            size: 0,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }
}

/// Canonical display prefix of a runtime identifier (digest algorithm stripped).
pub fn short_id(id: &str) -> String {
    let hex = id.split_once(':').map(|(_, rest)| rest).unwrap_or(id);
    hex.chars().take(SHORT_ID_LEN).collect()
}
