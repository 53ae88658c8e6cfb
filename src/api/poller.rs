//! Periodic REST refreshes into the store.
//!
//! Each refresh runs on its own task and awaits its request before the next
//! tick, so requests from one refresh never overlap. Across refreshes the
//! last completed write wins.
//!
//! Metrics fetched over REST never touch the store directly: they are
//! handed to the sync driver through a [`FallbackSender`].

use std::future::Future;
use std::time::Duration;

use indra_types::ConnectionStatus;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::ApiClient;
use crate::store::SystemStore;
use crate::sync::FallbackSender;

/// Number of processes requested per refresh.
const PROCESS_PAGE: u32 = 100;

/// How often each slice is refreshed. A zero interval disables that refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Metrics fallback, only polled while the live connection is down.
    pub metrics: Duration,
    pub processes: Duration,
    pub system_info: Duration,
    pub insights: Duration,
    /// Backend reachability check.
    pub health: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            metrics: Duration::from_secs(5),
            processes: Duration::from_secs(10),
            system_info: Duration::from_secs(30),
            insights: Duration::from_secs(60),
            health: Duration::from_secs(10),
        }
    }
}

/// Running refresh tasks. Dropping the poller stops them.
#[derive(Debug)]
pub struct Poller {
    store: SystemStore,
    tasks: Vec<JoinHandle<()>>,
}

impl Poller {
    /// Start the refresh tasks. Must be called within a tokio runtime.
    ///
    /// Without a `fallback` sender the metrics refresh is not started.
    pub fn spawn(
        client: ApiClient,
        store: SystemStore,
        fallback: Option<FallbackSender>,
        intervals: PollIntervals,
    ) -> Self {
        let mut tasks = Vec::new();

        {
            let (client, store) = (client.clone(), store.clone());
            tasks.extend(every(intervals.processes, move || {
                refresh_processes(client.clone(), store.clone())
            }));
        }
        {
            let (client, store) = (client.clone(), store.clone());
            tasks.extend(every(intervals.system_info, move || {
                refresh_system_info(client.clone(), store.clone())
            }));
        }
        {
            let (client, store) = (client.clone(), store.clone());
            tasks.extend(every(intervals.insights, move || {
                refresh_insights(client.clone(), store.clone())
            }));
        }
        {
            let (client, store) = (client.clone(), store.clone());
            tasks.extend(every(intervals.health, move || {
                refresh_health(client.clone(), store.clone())
            }));
        }
        if let Some(fallback) = fallback {
            let store = store.clone();
            tasks.extend(every(intervals.metrics, move || {
                refresh_metrics(client.clone(), store.clone(), fallback.clone())
            }));
        }

        Self { store, tasks }
    }

    /// Abort every refresh task and clear the loading flag.
    pub fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.store.set_loading(false);
        debug!("pollers stopped");
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn every<F, Fut>(period: Duration, mut job: F) -> Option<JoinHandle<()>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if period.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            job().await;
        }
    }))
}

async fn refresh_processes(client: ApiClient, store: SystemStore) {
    store.set_loading(true);
    match client.processes(0, PROCESS_PAGE).await {
        Ok(processes) => store.set_processes(processes),
        Err(e) => warn!(error = %e, "failed to refresh processes"),
    }
    store.set_loading(false);
}

async fn refresh_system_info(client: ApiClient, store: SystemStore) {
    match client.system_info().await {
        Ok(info) => store.set_system_info(info),
        Err(e) => warn!(error = %e, "failed to refresh system info"),
    }
}

async fn refresh_insights(client: ApiClient, store: SystemStore) {
    let analysis = match client.ai_analysis().await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(error = %e, "failed to refresh insights");
            return;
        }
    };

    // Oldest first so the API's first insight ends up at the front
    let mut added = 0;
    for insight in analysis.insights.into_iter().rev() {
        if !store.has_insight(&insight.id) {
            store.add_insight(insight);
            added += 1;
        }
    }
    if added > 0 {
        debug!(added, "new insights");
    }
}

async fn refresh_health(client: ApiClient, store: SystemStore) {
    let reachable = match client.health().await {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "health check failed");
            false
        }
    };
    if store.snapshot().backend_reachable != Some(reachable) {
        info!(reachable, "backend reachability changed");
    }
    store.set_backend_reachable(reachable);
}

/// Fetch the latest stored snapshot while the live stream is down. The
/// driver decides whether it still applies when it arrives.
async fn refresh_metrics(client: ApiClient, store: SystemStore, fallback: FallbackSender) {
    if store.snapshot().connection_status == ConnectionStatus::Connected {
        return;
    }

    match client.latest_metrics().await {
        Ok(snapshot) => {
            if !fallback.offer(snapshot) {
                debug!("sync driver stopped, dropping fallback snapshot");
            }
        }
        Err(e) if e.is_not_found() => debug!("no stored metrics yet"),
        Err(e) => warn!(error = %e, "failed to poll metrics"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    use crate::api::testing::MockApi;
    use crate::sync::{SyncClient, SyncConfig, SyncHandle};

    const PROCESSES: &str =
        r#"{"processes": [{"id": 9, "pid": 101, "name": "postgres", "cpu_percent": 4.0}], "total": 1, "page": 1, "size": 100}"#;
    const ANALYSIS: &str = r#"{
        "stats": {"insights_generated": 2},
        "status": {"status_message": "idle"},
        "insights": [
            {"id": 1, "category": "performance", "description": "d1", "recommendation": "r1", "severity": "low"},
            {"id": 2, "category": "security", "description": "d2", "recommendation": "r2", "severity": "high"}
        ]
    }"#;
    const METRICS: &str = r#"{"id": 1, "timestamp": "2024-05-01T10:00:00", "cpu_usage": 12.0}"#;

    fn only(f: impl FnOnce(&mut PollIntervals)) -> PollIntervals {
        let mut intervals = PollIntervals {
            metrics: Duration::ZERO,
            processes: Duration::ZERO,
            system_info: Duration::ZERO,
            insights: Duration::ZERO,
            health: Duration::ZERO,
        };
        f(&mut intervals);
        intervals
    }

    fn client(api: &MockApi) -> ApiClient {
        ApiClient::builder().base_url(api.base_url()).build().unwrap()
    }

    async fn eventually(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    #[tokio::test]
    async fn test_processes_are_refreshed() {
        let api = MockApi::start().await.route("/api/processes", 200, PROCESSES);
        let store = SystemStore::default();
        let intervals = only(|i| i.processes = Duration::from_millis(50));

        let _poller = Poller::spawn(client(&api), store.clone(), Default::default(), intervals);

        eventually(|| store.snapshot().processes.len() == 1).await;
        assert_eq!(store.snapshot().processes[0].name, "postgres");
        eventually(|| api.count("/api/processes") >= 2).await;
    }

    #[tokio::test]
    async fn test_insights_are_deduplicated() {
        let api = MockApi::start().await.route("/api/ai-analysis", 200, ANALYSIS);
        let store = SystemStore::default();
        let intervals = only(|i| i.insights = Duration::from_millis(30));

        let _poller = Poller::spawn(client(&api), store.clone(), Default::default(), intervals);

        eventually(|| api.count("/api/ai-analysis") >= 3).await;
        let state = store.snapshot();
        assert_eq!(state.insights.len(), 2);
        assert_eq!(state.insights[0].id, "ai-1");
        assert_eq!(state.insights[1].id, "ai-2");
    }

    fn offline_sync(store: &SystemStore) -> SyncHandle {
        let config = SyncConfig {
            url: Url::parse("ws://127.0.0.1:9/").unwrap(),
            policy: Default::default(),
            auto_connect: false,
        };
        SyncClient::spawn(config, store.clone(), Default::default())
    }

    #[tokio::test]
    async fn test_metrics_fallback_only_while_offline() {
        let api = MockApi::start()
            .await
            .route("/api/system/metrics/latest", 200, METRICS);
        let store = SystemStore::default();
        let sync = offline_sync(&store);
        // Reported as live, so the poller holds off
        store.set_connection_status(ConnectionStatus::Connected);
        let intervals = only(|i| i.metrics = Duration::from_millis(20));

        let _poller = Poller::spawn(client(&api), store.clone(), Some(sync.fallback()), intervals);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(api.count("/api/system/metrics/latest"), 0);
        assert!(store.snapshot().metrics.is_none());

        store.set_connection_status(ConnectionStatus::Disconnected);
        eventually(|| store.snapshot().metrics.is_some()).await;
        assert_eq!(store.snapshot().metrics.as_ref().map(|m| m.cpu.usage), Some(12.0));
        sync.shutdown().await;
    }

    #[tokio::test]
    async fn test_metrics_not_polled_without_fallback() {
        let api = MockApi::start()
            .await
            .route("/api/system/metrics/latest", 200, METRICS);
        let store = SystemStore::default();
        let intervals = only(|i| i.metrics = Duration::from_millis(20));

        let _poller = Poller::spawn(client(&api), store.clone(), None, intervals);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(api.count("/api/system/metrics/latest"), 0);
        assert!(store.snapshot().metrics.is_none());
    }

    #[tokio::test]
    async fn test_health_marks_backend_reachable() {
        let api = MockApi::start()
            .await
            .route("/health", 200, r#"{"status": "healthy", "service": "IndraOS Backend"}"#);
        let store = SystemStore::default();
        let intervals = only(|i| i.health = Duration::from_millis(20));

        let _poller = Poller::spawn(client(&api), store.clone(), None, intervals);

        eventually(|| store.snapshot().backend_reachable == Some(true)).await;

        api.set_route("/health", 503, r#"{"detail": "Service unavailable"}"#);
        eventually(|| store.snapshot().backend_reachable == Some(false)).await;
        assert_eq!(store.snapshot().connection_status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_health_marks_unreachable_backend() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = ApiClient::builder()
            .base_url(format!("http://{}/api", addr))
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let store = SystemStore::default();
        let intervals = only(|i| i.health = Duration::from_millis(20));

        let _poller = Poller::spawn(client, store.clone(), None, intervals);

        eventually(|| store.snapshot().backend_reachable == Some(false)).await;
    }

    #[tokio::test]
    async fn test_failures_leave_store_untouched() {
        let api = MockApi::start()
            .await
            .route("/api/processes", 500, r#"{"detail": "Internal server error"}"#);
        let store = SystemStore::default();
        let intervals = only(|i| i.processes = Duration::from_millis(20));

        let mut poller = Poller::spawn(client(&api), store.clone(), Default::default(), intervals);
        eventually(|| api.count("/api/processes") >= 2).await;
        poller.stop();

        let state = store.snapshot();
        assert!(!state.is_loading);
        assert!(state.processes.is_empty());
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_stop_cancels_refreshes() {
        let api = MockApi::start().await.route("/api/processes", 200, PROCESSES);
        let store = SystemStore::default();
        let intervals = only(|i| i.processes = Duration::from_millis(20));

        let mut poller = Poller::spawn(client(&api), store.clone(), Default::default(), intervals);
        eventually(|| api.count("/api/processes") >= 1).await;
        poller.stop();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let after_stop = api.count("/api/processes");
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(api.count("/api/processes"), after_stop);
    }
}
