use std::fmt;

/// What happened to one container or image during a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Done,
    /// The target disappeared before the request reached it.
    AlreadyGone,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Short identifier of the target.
    pub id: String,
    pub status: ItemStatus,
}

/// Kind of entity a report describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupKind {
    StoppedContainers,
    RemovedContainers,
    RemovedImages,
}

/// Outcome of one maintenance operation
///
/// `ids` lists the short identifiers of the entities actually acted upon, so
/// `count()` is always `ids.len()`. Every attempt, successful or not, is kept
/// in `outcomes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    kind: CleanupKind,
    ids: Vec<String>,
    outcomes: Vec<ItemOutcome>,
    reclaimed_bytes: u64,
    rounds: usize,
}

impl CleanupReport {
    pub fn new(kind: CleanupKind) -> Self {
        Self {
            kind,
            ids: Vec::new(),
            outcomes: Vec::new(),
            reclaimed_bytes: 0,
            rounds: 0,
        }
    }

    pub(crate) fn record(&mut self, id: String, status: ItemStatus) {
        if status == ItemStatus::Done {
            self.ids.push(id.clone());
        }
        self.outcomes.push(ItemOutcome { id, status });
    }

    pub(crate) fn add_reclaimed(&mut self, bytes: u64) {
        self.reclaimed_bytes = self.reclaimed_bytes.saturating_add(bytes);
    }

    pub(crate) fn set_rounds(&mut self, rounds: usize) {
        self.rounds = rounds;
    }

    pub fn kind(&self) -> CleanupKind {
        self.kind
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ItemStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn reclaimed_bytes(&self) -> u64 {
        self.reclaimed_bytes
    }

    /// Fixpoint rounds run for an image sweep; zero for everything else.
    pub fn rounds(&self) -> usize {
        self.rounds
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CleanupKind::StoppedContainers => write!(f, "Stopped ({}) containers.", self.count()),
            CleanupKind::RemovedContainers => write!(f, "Removed ({}) containers.", self.count()),
            CleanupKind::RemovedImages => write!(
                f,
                "Removed ({}) images, reclaimed {}.",
                self.count(),
                format_bytes(self.reclaimed_bytes)
            ),
        }
    }
}

/// Formats bytes as human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
