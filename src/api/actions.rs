//! Operator actions against the API.
//!
//! Every action returns its result to the caller and also records a
//! success or error alert in the store, so the outcome shows up in the
//! alert list whichever view triggered it.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indra_types::{Alert, AlertKind};
use tracing::{info, warn};

use super::{ApiClient, ApiError};
use crate::store::SystemStore;

/// Cheaply clonable action runner.
#[derive(Debug, Clone)]
pub struct Actions {
    client: ApiClient,
    store: SystemStore,
    sequence: Arc<AtomicU64>,
}

impl Actions {
    pub fn new(client: ApiClient, store: SystemStore) -> Self {
        Self {
            client,
            store,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Terminate a process. On success the process is removed from the store.
    pub async fn kill_process(&self, pid: u32) -> Result<(), ApiError> {
        let result = self
            .run(
                self.client.kill_process(pid),
                "Process terminated",
                format!("Process {} was terminated", pid),
                "Failed to terminate process",
            )
            .await;
        if result.is_ok() {
            self.store.remove_process(pid);
        }
        result
    }

    pub async fn start_service(&self, name: &str) -> Result<(), ApiError> {
        self.run(
            self.client.start_service(name),
            "Service started",
            format!("{} is starting", name),
            "Failed to start service",
        )
        .await
    }

    pub async fn stop_service(&self, name: &str) -> Result<(), ApiError> {
        self.run(
            self.client.stop_service(name),
            "Service stopped",
            format!("{} was stopped", name),
            "Failed to stop service",
        )
        .await
    }

    pub async fn restart_service(&self, name: &str) -> Result<(), ApiError> {
        self.run(
            self.client.restart_service(name),
            "Service restarted",
            format!("{} is restarting", name),
            "Failed to restart service",
        )
        .await
    }

    pub async fn resolve_security_event(&self, id: u64) -> Result<(), ApiError> {
        self.run(
            self.client.resolve_security_event(id),
            "Security event resolved",
            format!("Event {} marked as resolved", id),
            "Failed to resolve security event",
        )
        .await
    }

    pub async fn delete_security_event(&self, id: u64) -> Result<(), ApiError> {
        self.run(
            self.client.delete_security_event(id),
            "Security event deleted",
            format!("Event {} was deleted", id),
            "Failed to delete security event",
        )
        .await
    }

    async fn run<F>(
        &self,
        request: F,
        success_title: &str,
        success_message: String,
        failure_title: &str,
    ) -> Result<(), ApiError>
    where
        F: Future<Output = Result<(), ApiError>>,
    {
        match request.await {
            Ok(()) => {
                info!(%success_message, "action succeeded");
                self.notify(AlertKind::Success, success_title, success_message);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "{}", failure_title);
                self.notify(AlertKind::Error, failure_title, e.to_string());
                Err(e)
            }
        }
    }

    fn notify(&self, kind: AlertKind, title: &str, message: String) {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.store
            .add_alert(Alert::new(format!("action-{}", n), kind, title, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::MockApi;
    use indra_types::{ConnectionStatus, Process};

    fn setup(api: &MockApi) -> (Actions, SystemStore) {
        let store = SystemStore::default();
        store.set_processes(vec![
            Process {
                pid: 42,
                name: "stress".into(),
                ..Default::default()
            },
            Process {
                pid: 7,
                name: "init".into(),
                ..Default::default()
            },
        ]);
        let client = ApiClient::builder().base_url(api.base_url()).build().unwrap();
        (Actions::new(client, store.clone()), store)
    }

    #[tokio::test]
    async fn test_kill_success_removes_process() {
        let api = MockApi::start().await.route("/api/processes/42", 200, "{}");
        let (actions, store) = setup(&api);

        actions.kill_process(42).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.processes.len(), 1);
        assert_eq!(state.processes[0].pid, 7);
        assert_eq!(state.alerts[0].kind, AlertKind::Success);
        assert!(api.requests().contains(&"DELETE /api/processes/42".to_string()));
    }

    #[tokio::test]
    async fn test_kill_failure_reports_error() {
        let api = MockApi::start()
            .await
            .route("/api/processes/7", 403, r#"{"detail": "Access denied"}"#);
        let (actions, store) = setup(&api);

        let err = actions.kill_process(7).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 403, .. }));

        let state = store.snapshot();
        assert_eq!(state.processes.len(), 2);
        assert_eq!(state.alerts.len(), 1);
        assert_eq!(state.alerts[0].kind, AlertKind::Error);
        assert!(state.alerts[0].message.contains("Access denied"));
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_service_and_security_actions() {
        let api = MockApi::start()
            .await
            .route("/api/services/nginx/restart", 200, "{}")
            .route("/api/security/events/5/resolve", 200, "{}");
        let (actions, store) = setup(&api);

        actions.restart_service("nginx").await.unwrap();
        actions.resolve_security_event(5).await.unwrap();
        assert!(actions.delete_security_event(6).await.is_err());

        let requests = api.requests();
        assert!(requests.contains(&"POST /api/services/nginx/restart".to_string()));
        assert!(requests.contains(&"DELETE /api/security/events/6".to_string()));

        let kinds: Vec<AlertKind> = store.snapshot().alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::Error, AlertKind::Success, AlertKind::Success]
        );
        let ids: Vec<String> = store.snapshot().alerts.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["action-3", "action-2", "action-1"]);
    }
}
