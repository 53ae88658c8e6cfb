//! Shared read-model store.
//!
//! The store is the single source of truth for live dashboard state. The
//! connection manager writes live fields, REST pollers and actions write the
//! remaining slices, and any number of consumers read snapshots or subscribe
//! to change notifications.
//!
//! ## Consistency
//!
//! ```text
//!  writer ──▶ [turn lock] ──▶ mutate (truncate to bounds) ──▶ publish Arc ──▶ notify listeners
//! ```
//!
//! - Every write takes the store's turn lock, mutates a copy-on-write
//!   `Arc<SystemState>` (collections are shared `Arc`s and only the ones a
//!   write touches are copied), applies collection bounds, publishes the new `Arc`
//!   and then notifies listeners, all before the next write may start. Readers
//!   therefore never observe a torn write or an over-capacity collection,
//!   and listeners see writes in the order they were applied.
//! - Listeners receive the whole state ("whole state changed"); they select
//!   the slices they need.
//! - A listener may itself write to the store. The nested write is applied
//!   and delivered before the outer notification continues.
//!
//! The store is constructor-injected: create one with [`SystemStore::new`]
//! and hand clones to every writer and consumer.

mod history;
mod state;

pub use history::{History, DEFAULT_HISTORY_SIZE};
pub use state::{StateExport, StoreLimits, SystemState};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indra_types::{Alert, ConnectionStatus, Insight, MetricsSnapshot, Process, SystemInfo};
use parking_lot::{ReentrantMutex, RwLock};
use tokio::sync::watch;

/// Callback invoked after every applied write.
pub type Listener = Arc<dyn Fn(&Arc<SystemState>) + Send + Sync>;

/// Handle returned by [`SystemStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner {
    state: RwLock<Arc<SystemState>>,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
    turn: ReentrantMutex<()>,
    limits: StoreLimits,
}

/// Cheaply clonable handle to the shared read model.
#[derive(Clone)]
pub struct SystemStore {
    inner: Arc<Inner>,
}

impl fmt::Debug for SystemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemStore")
            .field("limits", &self.inner.limits)
            .field("revision", &self.inner.state.read().revision)
            .field("listeners", &self.inner.listeners.read().len())
            .finish()
    }
}

impl Default for SystemStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}

impl SystemStore {
    /// Create an empty store with the given collection limits.
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(Arc::new(SystemState::new(&limits))),
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                turn: ReentrantMutex::new(()),
                limits,
            }),
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.inner.limits
    }

    /// The current state. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<SystemState> {
        Arc::clone(&self.inner.state.read())
    }

    /// Register a listener called synchronously after every applied write.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Arc<SystemState>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Bridge change notifications into a watch channel.
    ///
    /// The receiver starts marked as seen with the current state; it is
    /// marked changed after every subsequent write.
    pub fn watch(&self) -> watch::Receiver<Arc<SystemState>> {
        let _turn = self.inner.turn.lock();
        let (tx, rx) = watch::channel(self.snapshot());
        self.subscribe(move |state| {
            tx.send_replace(Arc::clone(state));
        });
        rx
    }

    pub fn set_connection_status(&self, status: ConnectionStatus) {
        self.write(|state| {
            if state.connection_status == status {
                return false;
            }
            state.connection_status = status;
            true
        });
    }

    /// Replace the current snapshot and append it to the history.
    pub fn set_metrics(&self, snapshot: MetricsSnapshot) {
        self.write(|state| {
            state.metrics = Some(snapshot.clone());
            Arc::make_mut(&mut state.history).record(snapshot);
            true
        });
    }

    pub fn set_processes(&self, processes: Vec<Process>) {
        self.write(|state| {
            state.processes = Arc::new(processes);
            true
        });
    }

    /// Remove a process from the list. Returns false if it was not present.
    pub fn remove_process(&self, pid: u32) -> bool {
        self.write(|state| {
            if !state.processes.iter().any(|p| p.pid == pid) {
                return false;
            }
            Arc::make_mut(&mut state.processes).retain(|p| p.pid != pid);
            true
        })
    }

    pub fn set_system_info(&self, info: SystemInfo) {
        self.write(|state| {
            state.system_info = Some(info);
            true
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.write(|state| {
            if state.is_loading == loading {
                return false;
            }
            state.is_loading = loading;
            true
        });
    }

    /// Record the outcome of a REST health check.
    pub fn set_backend_reachable(&self, reachable: bool) {
        self.write(|state| {
            if state.backend_reachable == Some(reachable) {
                return false;
            }
            state.backend_reachable = Some(reachable);
            true
        });
    }

    /// Prepend an alert, dropping the oldest beyond the alert cap.
    pub fn add_alert(&self, alert: Alert) {
        let cap = self.inner.limits.max_alerts;
        self.write(|state| {
            let alerts = Arc::make_mut(&mut state.alerts);
            alerts.insert(0, alert);
            alerts.truncate(cap);
            true
        });
    }

    /// Prepend an insight, dropping the oldest beyond the insight cap.
    pub fn add_insight(&self, insight: Insight) {
        let cap = self.inner.limits.max_insights;
        self.write(|state| {
            let insights = Arc::make_mut(&mut state.insights);
            insights.insert(0, insight);
            insights.truncate(cap);
            true
        });
    }

    pub fn has_insight(&self, id: &str) -> bool {
        self.inner.state.read().insights.iter().any(|i| i.id == id)
    }

    /// Mark an alert as read. Unknown ids (and alerts already read) are a no-op.
    pub fn mark_alert_as_read(&self, id: &str) -> bool {
        self.write(|state| {
            let Some(index) = state.alerts.iter().position(|a| a.id == id && !a.read) else {
                return false;
            };
            Arc::make_mut(&mut state.alerts)[index].read = true;
            true
        })
    }

    /// Apply one write turn. `mutate` returns whether it changed anything;
    /// unchanged writes neither bump the revision nor notify.
    fn write<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut SystemState) -> bool,
    {
        let _turn = self.inner.turn.lock();
        let published = {
            let mut current = self.inner.state.write();
            let mut next = SystemState::clone(&current);
            if !mutate(&mut next) {
                return false;
            }
            next.revision += 1;
            *current = Arc::new(next);
            Arc::clone(&current)
        };
        self.notify(&published);
        true
    }

    fn notify(&self, state: &Arc<SystemState>) {
        let listeners: Vec<Listener> =
            self.inner.listeners.read().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(state);
        }
    }
}
