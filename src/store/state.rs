//! The read model held by the store.

use std::sync::Arc;

use indra_types::{Alert, ConnectionStatus, Insight, MetricsSnapshot, Process, SystemInfo};
use serde::Serialize;

use super::history::{History, DEFAULT_HISTORY_SIZE};

/// Capacity limits for the store's bounded collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// Maximum number of snapshots kept in the metrics history.
    pub history_size: usize,
    /// Maximum number of alerts kept (most recent first).
    pub max_alerts: usize,
    /// Maximum number of insights kept (most recent first).
    pub max_insights: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            max_alerts: 100,
            max_insights: 50,
        }
    }
}

/// Everything the dashboard renders, in one consistent value.
///
/// The collections sit behind `Arc`s shared between successive states; a
/// write only copies the slices it changes.
#[derive(Debug, Clone)]
pub struct SystemState {
    pub connection_status: ConnectionStatus,
    /// The latest snapshot; replaced wholesale on every update.
    pub metrics: Option<MetricsSnapshot>,
    pub history: Arc<History>,
    pub system_info: Option<SystemInfo>,
    pub processes: Arc<Vec<Process>>,
    /// Most recent first.
    pub alerts: Arc<Vec<Alert>>,
    /// Most recent first.
    pub insights: Arc<Vec<Insight>>,
    /// A REST refresh is in flight.
    pub is_loading: bool,
    /// Result of the last REST health check; `None` until one completes.
    pub backend_reachable: Option<bool>,
    /// Incremented on every applied write.
    pub revision: u64,
}

impl SystemState {
    pub(crate) fn new(limits: &StoreLimits) -> Self {
        Self {
            connection_status: ConnectionStatus::Disconnected,
            metrics: None,
            history: Arc::new(History::new(limits.history_size)),
            system_info: None,
            processes: Arc::default(),
            alerts: Arc::default(),
            insights: Arc::default(),
            is_loading: false,
            backend_reachable: None,
            revision: 0,
        }
    }

    /// Number of alerts not yet marked as read.
    pub fn unread_alerts(&self) -> usize {
        self.alerts.iter().filter(|a| !a.read).count()
    }

    /// Serializable view of the state, used by exports.
    pub fn export(&self) -> StateExport<'_> {
        StateExport {
            connection_status: self.connection_status,
            metrics: self.metrics.as_ref(),
            history: self.history.iter().collect(),
            system_info: self.system_info.as_ref(),
            processes: self.processes.as_slice(),
            alerts: self.alerts.as_slice(),
            insights: self.insights.as_slice(),
        }
    }
}

/// Borrowed, serializable projection of [`SystemState`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateExport<'a> {
    pub connection_status: ConnectionStatus,
    pub metrics: Option<&'a MetricsSnapshot>,
    pub history: Vec<&'a MetricsSnapshot>,
    pub system_info: Option<&'a SystemInfo>,
    pub processes: &'a [Process],
    pub alerts: &'a [Alert],
    pub insights: &'a [Insight],
}
