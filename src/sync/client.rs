//! Runs a [`ConnectionManager`] on its own task.
//!
//! All inputs (transport events, fired reconnect timers, commands from the
//! UI and REST fallback snapshots) are serialized through one `select!`
//! loop, so the manager only ever handles one event at a time.

use std::sync::Arc;

use indra_types::MetricsSnapshot;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;

use super::backoff::ReconnectPolicy;
use super::manager::ConnectionManager;
use super::timer::TokioTimer;
use super::websocket::WebSocketTransport;
use crate::data::HealthTracker;
use crate::store::SystemStore;

/// Settings for the live connection.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub url: Url,
    pub policy: ReconnectPolicy,
    /// Connect as soon as the client is spawned.
    pub auto_connect: bool,
}

#[derive(Debug)]
enum Command {
    Connect,
    Disconnect,
    Fallback(MetricsSnapshot),
    Shutdown,
}

/// Spawns the connection driver.
pub struct SyncClient;

impl SyncClient {
    /// Start the driver task. Must be called within a tokio runtime.
    pub fn spawn(
        config: SyncConfig,
        store: SystemStore,
        health: Arc<Mutex<HealthTracker>>,
    ) -> SyncHandle {
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (timer_tx, mut timers) = mpsc::unbounded_channel();
        let (command_tx, mut commands) = mpsc::unbounded_channel();

        let mut manager = ConnectionManager::new(
            config.url,
            WebSocketTransport::new(event_tx),
            TokioTimer::new(timer_tx),
            store,
            config.policy,
            health,
        );

        let task = tokio::spawn(async move {
            if config.auto_connect {
                manager.connect();
            }

            loop {
                tokio::select! {
                    Some(event) = events.recv() => manager.handle_event(event),
                    Some(token) = timers.recv() => manager.on_reconnect_due(token),
                    command = commands.recv() => match command {
                        Some(Command::Connect) => manager.connect(),
                        Some(Command::Disconnect) => manager.disconnect(),
                        Some(Command::Fallback(snapshot)) => manager.on_fallback_snapshot(snapshot),
                        Some(Command::Shutdown) | None => {
                            manager.disconnect();
                            break;
                        }
                    },
                }
            }
            debug!(decode_errors = manager.decode_errors(), "sync driver stopped");
        });

        SyncHandle {
            commands: command_tx,
            task,
        }
    }
}

/// Handle to a running sync driver.
#[derive(Debug)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Request a connection (manual reconnect). No-op if one is active.
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Close the connection and stop reconnecting until `connect` is called.
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    /// A sender that feeds REST snapshots to the driver while offline.
    pub fn fallback(&self) -> FallbackSender {
        FallbackSender {
            commands: self.commands.clone(),
        }
    }

    /// Disconnect and wait for the driver to stop.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.task.await {
            error!(error = %e, "sync driver task failed");
        }
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.commands.send(command) {
            debug!(command = ?e.0, "sync driver already stopped");
        }
    }
}

/// Offers metrics fetched over REST to the sync driver, which applies them
/// only while the live stream is not connected. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FallbackSender {
    commands: mpsc::UnboundedSender<Command>,
}

impl FallbackSender {
    /// Returns false once the driver has stopped.
    pub fn offer(&self, snapshot: MetricsSnapshot) -> bool {
        self.commands.send(Command::Fallback(snapshot)).is_ok()
    }
}
