//! Connection lifecycle state machine.
//!
//! ```text
//!                 connect()
//!  Disconnected ─────────────▶ Connecting ──open──▶ Connected
//!       ▲  ▲                        │                   │
//!       │  └──── error / close ─────┘                   │
//!       └─────────────────── error / close ─────────────┘
//!
//!  close (not intentional) ──▶ schedule reconnect ──timer──▶ connect()
//! ```
//!
//! The manager is the sole writer of the live fields of the store
//! (connection status and metrics snapshots). It is driven from a single
//! task; see [`super::SyncClient`].

use std::sync::Arc;

use indra_types::{current_timestamp_ms, ConnectionStatus, MetricsSnapshot};
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::backoff::ReconnectPolicy;
use super::transport::{
    ReconnectTimer, SessionId, TimerToken, Transport, TransportEvent, TransportEventKind,
};
use crate::data::HealthTracker;
use crate::store::SystemStore;

/// Owns the live connection and keeps the store's live fields current.
pub struct ConnectionManager<T, R> {
    url: Url,
    transport: T,
    timer: R,
    store: SystemStore,
    policy: ReconnectPolicy,
    health: Arc<Mutex<HealthTracker>>,
    status: ConnectionStatus,
    attempts: u32,
    intentional_close: bool,
    session: Option<SessionId>,
    decode_errors: u64,
}

impl<T: Transport, R: ReconnectTimer> ConnectionManager<T, R> {
    pub fn new(
        url: Url,
        transport: T,
        timer: R,
        store: SystemStore,
        policy: ReconnectPolicy,
        health: Arc<Mutex<HealthTracker>>,
    ) -> Self {
        Self {
            url,
            transport,
            timer,
            store,
            policy,
            health,
            status: ConnectionStatus::Disconnected,
            attempts: 0,
            intentional_close: false,
            session: None,
            decode_errors: 0,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Reconnect attempts made since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Messages dropped because they failed to decode or validate.
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timer(&self) -> &R {
        &self.timer
    }

    /// Open a connection unless one is already open or in flight.
    pub fn connect(&mut self) {
        if self.status.is_active() {
            debug!(status = ?self.status, "connect ignored, connection already active");
            return;
        }

        self.intentional_close = false;
        self.timer.cancel();
        if let Some(previous) = self.session.take() {
            self.transport.close(previous);
        }

        self.set_status(ConnectionStatus::Connecting);
        let session = self.transport.open(&self.url);
        info!(url = %self.url, %session, attempt = self.attempts, "connecting");
        self.session = Some(session);
    }

    /// Close the connection and suppress automatic reconnects. Idempotent.
    pub fn disconnect(&mut self) {
        self.intentional_close = true;
        self.timer.cancel();
        if let Some(session) = self.session.take() {
            self.transport.close(session);
            info!(%session, "disconnected");
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Route a transport event, dropping events from superseded sessions.
    pub fn handle_event(&mut self, event: TransportEvent) {
        if self.session != Some(event.session) {
            debug!(session = %event.session, "dropping event from stale session");
            return;
        }

        match event.kind {
            TransportEventKind::Open => self.on_open(),
            TransportEventKind::Message(payload) => self.on_message(&payload),
            TransportEventKind::Error(reason) => self.on_error(&reason),
            TransportEventKind::Close => self.on_close(),
        }
    }

    pub fn on_open(&mut self) {
        info!(url = %self.url, "connected");
        self.attempts = 0;
        self.timer.cancel();
        self.set_status(ConnectionStatus::Connected);
    }

    /// Decode one payload and publish it. Bad payloads are logged and dropped.
    pub fn on_message(&mut self, payload: &str) {
        match decode_snapshot(payload) {
            Ok(snapshot) => self.publish(snapshot),
            Err(e) => {
                self.decode_errors += 1;
                warn!(errors = self.decode_errors, error = %e, "dropping metrics message");
            }
        }
    }

    /// Apply a snapshot fetched over REST. Ignored while the live stream is
    /// connected, and when it is not newer than the current snapshot.
    pub fn on_fallback_snapshot(&mut self, snapshot: MetricsSnapshot) {
        if self.status == ConnectionStatus::Connected {
            debug!("ignoring fallback snapshot, live stream connected");
            return;
        }
        if !snapshot.is_plausible() {
            warn!("dropping implausible fallback snapshot");
            return;
        }

        let current = self.store.snapshot();
        let latest = current.metrics.as_ref().map(|m| m.timestamp_ms);
        if latest.is_some_and(|latest| snapshot.timestamp_ms <= latest) {
            debug!(timestamp_ms = snapshot.timestamp_ms, "fallback snapshot is not newer");
            return;
        }
        self.publish(snapshot);
    }

    fn publish(&mut self, mut snapshot: MetricsSnapshot) {
        if snapshot.timestamp_ms == 0 {
            snapshot.timestamp_ms = current_timestamp_ms();
        }

        let alerts = self.health.lock().observe(&snapshot);
        self.store.set_metrics(snapshot);
        for alert in alerts {
            self.store.add_alert(alert);
        }
    }

    /// Mark the connection down. Reconnects are driven by the close that follows.
    pub fn on_error(&mut self, reason: &str) {
        warn!(url = %self.url, %reason, "connection error");
        self.set_status(ConnectionStatus::Disconnected);
    }

    pub fn on_close(&mut self) {
        self.session = None;
        self.set_status(ConnectionStatus::Disconnected);

        if self.intentional_close {
            debug!("connection closed on request");
            return;
        }

        if let Some(delay) = self.policy.next_delay(&mut self.attempts) {
            self.timer.schedule(delay);
            info!(
                attempt = self.attempts,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "connection lost, scheduling reconnect"
            );
        }
    }

    /// Called when a scheduled reconnect fires.
    pub fn on_reconnect_due(&mut self, token: TimerToken) {
        if !self.timer.acknowledge(token) {
            debug!(?token, "ignoring superseded reconnect timer");
            return;
        }
        self.connect();
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
        self.store.set_connection_status(status);
    }
}

#[derive(Debug, Error)]
enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an object of metric sections")]
    NotAnObject,
    #[error("readings out of range")]
    Implausible,
}

/// Parse a live payload. Every level of a snapshot must be a JSON object.
fn decode_snapshot(payload: &str) -> Result<MetricsSnapshot, DecodeError> {
    let value: Value = serde_json::from_str(payload)?;
    if !is_object_tree(&value) {
        return Err(DecodeError::NotAnObject);
    }
    let snapshot: MetricsSnapshot = serde_json::from_value(value)?;
    if !snapshot.is_plausible() {
        return Err(DecodeError::Implausible);
    }
    Ok(snapshot)
}

fn is_object_tree(value: &Value) -> bool {
    match value {
        Value::Object(fields) => fields.values().all(|field| match field {
            Value::Array(_) => false,
            Value::Object(_) => is_object_tree(field),
            _ => true,
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct FakeTransport {
        next: u64,
        pub opened: Vec<SessionId>,
        pub closed: Vec<SessionId>,
    }

    impl Transport for FakeTransport {
        fn open(&mut self, _url: &Url) -> SessionId {
            self.next += 1;
            let session = SessionId(self.next);
            self.opened.push(session);
            session
        }

        fn close(&mut self, session: SessionId) {
            self.closed.push(session);
        }
    }

    #[derive(Debug, Default)]
    struct FakeTimer {
        next: u64,
        pub pending: Option<TimerToken>,
        pub scheduled: Vec<Duration>,
    }

    impl ReconnectTimer for FakeTimer {
        fn schedule(&mut self, delay: Duration) -> TimerToken {
            self.next += 1;
            let token = TimerToken(self.next);
            self.pending = Some(token);
            self.scheduled.push(delay);
            token
        }

        fn cancel(&mut self) {
            self.pending = None;
        }

        fn is_pending(&self) -> bool {
            self.pending.is_some()
        }

        fn acknowledge(&mut self, token: TimerToken) -> bool {
            if self.pending == Some(token) {
                self.pending = None;
                true
            } else {
                false
            }
        }
    }

    fn manager_with(policy: ReconnectPolicy) -> ConnectionManager<FakeTransport, FakeTimer> {
        ConnectionManager::new(
            Url::parse("ws://localhost:8000/api/ws/system-metrics").unwrap(),
            FakeTransport::default(),
            FakeTimer::default(),
            SystemStore::default(),
            policy,
            Arc::new(Mutex::new(HealthTracker::default())),
        )
    }

    fn manager() -> ConnectionManager<FakeTransport, FakeTimer> {
        manager_with(ReconnectPolicy::default())
    }

    fn event(
        m: &ConnectionManager<FakeTransport, FakeTimer>,
        kind: TransportEventKind,
    ) -> TransportEvent {
        TransportEvent::new(m.session().expect("no current session"), kind)
    }

    /// Fail the current session and fire the resulting reconnect timer, if any.
    fn fail_and_retry(m: &mut ConnectionManager<FakeTransport, FakeTimer>) {
        if m.session().is_none() {
            return;
        }
        let error = event(m, TransportEventKind::Error("refused".into()));
        let close = event(m, TransportEventKind::Close);
        m.handle_event(error);
        m.handle_event(close);
        if let Some(token) = m.timer().pending {
            m.on_reconnect_due(token);
        }
    }

    const SNAPSHOT: &str = r#"{"cpu":{"usage":12.5},"memory":{"percentage":40}}"#;

    #[test]
    fn test_connect_is_noop_while_active() {
        let mut m = manager();
        m.connect();
        m.connect();
        assert_eq!(m.status(), ConnectionStatus::Connecting);

        let open = event(&m, TransportEventKind::Open);
        m.handle_event(open);
        m.connect();

        assert_eq!(m.status(), ConnectionStatus::Connected);
        assert_eq!(m.transport().opened.len(), 1);
    }

    #[test]
    fn test_open_resets_attempts_and_timer() {
        let mut m = manager();
        m.connect();
        fail_and_retry(&mut m);
        fail_and_retry(&mut m);
        assert_eq!(m.attempts(), 2);

        let open = event(&m, TransportEventKind::Open);
        m.handle_event(open);

        assert_eq!(m.status(), ConnectionStatus::Connected);
        assert_eq!(m.attempts(), 0);
        assert!(!m.timer().is_pending());
        assert_eq!(m.store.snapshot().connection_status, ConnectionStatus::Connected);
    }

    #[test]
    fn test_backoff_sequence_stops_at_max_attempts() {
        let mut m = manager_with(ReconnectPolicy {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(8000),
            max_attempts: 3,
        });
        m.connect();
        for _ in 0..4 {
            fail_and_retry(&mut m);
        }

        let delays: Vec<u128> = m.timer().scheduled.iter().map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000]);
        assert!(!m.timer().is_pending());
        assert_eq!(m.attempts(), 3);
        assert_eq!(m.status(), ConnectionStatus::Disconnected);
        assert_eq!(m.transport().opened.len(), 4);
    }

    #[test]
    fn test_delays_non_decreasing_and_capped() {
        let mut m = manager();
        m.connect();
        for _ in 0..15 {
            fail_and_retry(&mut m);
        }

        let scheduled = &m.timer().scheduled;
        assert_eq!(scheduled.len(), 10);
        assert!(scheduled.windows(2).all(|w| w[0] <= w[1]));
        assert!(scheduled.iter().all(|d| *d <= Duration::from_secs(30)));
        assert!(!m.timer().is_pending());
    }

    #[test]
    fn test_manual_reconnect_after_exhaustion_keeps_counter() {
        let mut m = manager_with(ReconnectPolicy {
            max_attempts: 1,
            ..ReconnectPolicy::default()
        });
        m.connect();
        fail_and_retry(&mut m);
        fail_and_retry(&mut m);
        assert!(!m.timer().is_pending());

        m.connect();
        assert_eq!(m.status(), ConnectionStatus::Connecting);
        assert_eq!(m.attempts(), 1);
        fail_and_retry(&mut m);
        assert_eq!(m.timer().scheduled.len(), 1);
    }

    #[test]
    fn test_disconnect_while_connecting_suppresses_reconnect() {
        let mut m = manager();
        m.connect();
        let stale = event(&m, TransportEventKind::Close);

        m.disconnect();
        assert_eq!(m.status(), ConnectionStatus::Disconnected);
        assert_eq!(m.transport().closed, m.transport().opened);

        m.handle_event(stale);
        m.on_close();
        assert!(!m.timer().is_pending());
        assert!(m.timer().scheduled.is_empty());
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut m = manager();
        m.disconnect();
        m.disconnect();
        assert_eq!(m.status(), ConnectionStatus::Disconnected);
        assert!(m.transport().closed.is_empty());
    }

    #[test]
    fn test_connect_after_disconnect_clears_flag() {
        let mut m = manager();
        m.connect();
        m.disconnect();
        m.connect();

        let close = event(&m, TransportEventKind::Close);
        m.handle_event(close);
        assert!(m.timer().is_pending());
    }

    #[test]
    fn test_error_alone_does_not_schedule() {
        let mut m = manager();
        m.connect();
        let error = event(&m, TransportEventKind::Error("reset".into()));
        m.handle_event(error);

        assert_eq!(m.status(), ConnectionStatus::Disconnected);
        assert!(!m.timer().is_pending());
    }

    #[test]
    fn test_malformed_message_is_dropped() {
        let mut m = manager();
        m.connect();
        let open = event(&m, TransportEventKind::Open);
        m.handle_event(open);

        for payload in [SNAPSHOT, "{not json", r#"{"cpu":{"usage":20}}"#] {
            let message = event(&m, TransportEventKind::Message(payload.into()));
            m.handle_event(message);
        }

        assert_eq!(m.status(), ConnectionStatus::Connected);
        assert_eq!(m.decode_errors(), 1);
        let state = m.store.snapshot();
        let usages: Vec<f64> = state.history.iter().map(|s| s.cpu.usage).collect();
        assert_eq!(usages, vec![12.5, 20.0]);
        assert_eq!(state.metrics.as_ref().map(|s| s.cpu.usage), Some(20.0));
    }

    #[test]
    fn test_non_object_payloads_are_decode_errors() {
        let mut m = manager();
        m.connect();
        m.on_open();
        m.on_message(SNAPSHOT);

        let payloads = [
            "[]",
            r#"[5, {"usage": 50.0}]"#,
            "42",
            "null",
            r#""cpu""#,
            r#"{"cpu": [50.0, 4, 2400.0]}"#,
        ];
        for payload in payloads {
            m.on_message(payload);
        }

        assert_eq!(m.decode_errors(), payloads.len() as u64);
        let state = m.store.snapshot();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.metrics.as_ref().map(|s| s.cpu.usage), Some(12.5));
        assert!(state.alerts.is_empty());
    }

    #[test]
    fn test_decode_accepts_partial_objects() {
        let snapshot = decode_snapshot(r#"{"cpu":{"usage":5,"temperature":null},"disk":{}}"#)
            .expect("partial snapshot decodes");
        assert_eq!(snapshot.cpu.usage, 5.0);
        assert_eq!(snapshot.cpu.temperature, None);
        assert!(matches!(decode_snapshot("[]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode_snapshot("{"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_fallback_snapshot_ignored_while_connected() {
        let mut m = manager();
        m.connect();
        m.on_open();
        m.on_message(r#"{"timestampMs":1000,"cpu":{"usage":10}}"#);

        let fallback = MetricsSnapshot::builder().timestamp_ms(2000).cpu_usage(80.0).build();
        m.on_fallback_snapshot(fallback);

        let state = m.store.snapshot();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.metrics.as_ref().map(|s| s.cpu.usage), Some(10.0));
    }

    #[test]
    fn test_fallback_snapshot_applies_while_offline_in_order() {
        let mut m = manager();
        m.connect();
        m.on_open();
        m.on_message(r#"{"timestampMs":1000,"cpu":{"usage":10}}"#);
        let close = event(&m, TransportEventKind::Close);
        m.handle_event(close);

        let older = MetricsSnapshot::builder().timestamp_ms(500).cpu_usage(70.0).build();
        let newer = MetricsSnapshot::builder().timestamp_ms(3000).cpu_usage(95.0).build();
        m.on_fallback_snapshot(older);
        m.on_fallback_snapshot(newer.clone());
        m.on_fallback_snapshot(newer);

        let state = m.store.snapshot();
        let stamps: Vec<u64> = state.history.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stamps, vec![1000, 3000]);
        assert_eq!(state.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(state.alerts.len(), 1);
        assert_eq!(m.decode_errors(), 0);
    }

    #[test]
    fn test_implausible_message_is_dropped() {
        let mut m = manager();
        m.connect();
        m.on_open();
        m.on_message(r#"{"cpu":{"usage":250}}"#);

        assert_eq!(m.decode_errors(), 1);
        assert!(m.store.snapshot().metrics.is_none());
    }

    #[test]
    fn test_message_is_stamped_and_raises_health_alert() {
        let mut m = manager();
        m.connect();
        m.on_open();
        m.on_message(r#"{"cpu":{"usage":95}}"#);

        let state = m.store.snapshot();
        assert!(state.metrics.as_ref().is_some_and(|s| s.timestamp_ms > 0));
        assert_eq!(state.alerts.len(), 1);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut m = manager();
        m.connect();
        let close = event(&m, TransportEventKind::Close);
        m.handle_event(close);
        let token = m.timer().pending.expect("reconnect scheduled");

        m.connect();
        m.on_reconnect_due(token);
        assert_eq!(m.transport().opened.len(), 2);
    }

    #[test]
    fn test_events_from_replaced_session_are_dropped() {
        let mut m = manager();
        m.connect();
        let old_error = event(&m, TransportEventKind::Error("boom".into()));
        m.handle_event(old_error);
        let old_close = event(&m, TransportEventKind::Close);

        // Reconnect before the old session's close arrives
        m.connect();
        m.handle_event(old_close);

        assert_eq!(m.status(), ConnectionStatus::Connecting);
        assert!(!m.timer().is_pending());
        assert_eq!(m.transport().closed, vec![SessionId(1)]);
    }
}
