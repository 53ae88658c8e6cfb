//! # indra-monitor
//!
//! Live-data sync client and terminal dashboard for the IndraOS monitoring
//! API.
//!
//! A single shared read model ([`SystemStore`]) holds everything the
//! dashboard shows. The live metrics stream feeds it through a WebSocket
//! connection that reconnects with exponential backoff; REST pollers fill
//! in processes, host information and analysis insights.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                              │
//! │  ┌──────────┐  metrics   ┌──────────┐  watch   ┌──────────┐  │
//! │  │   sync   │───────────▶│  store   │─────────▶│ app / ui │  │
//! │  │(WebSocket)│  status   │(read model)          │  (TUI)   │  │
//! │  └──────────┘            └──────────┘          └────┬─────┘  │
//! │                               ▲                     │        │
//! │  ┌──────────┐  processes,     │        kill, marks  │        │
//! │  │   api    │─────────────────┘◀────────────────────┘        │
//! │  │  (REST)  │  info, insights                                │
//! │  └──────────┘                                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`sync`]**: connection lifecycle, backoff and the WebSocket transport
//! - **[`store`]**: the shared state with subscriptions and bounded history
//! - **[`api`]**: REST client, periodic pollers and operator actions
//! - **[`data`]**: health thresholds, edge-triggered alerts, duration helpers
//! - **[`config`]**: layered settings (defaults, TOML file, environment)
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the terminal dashboard
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use indra_monitor::{HealthTracker, SyncClient, SyncConfig, SystemStore};
//! use parking_lot::Mutex;
//!
//! # tokio_test::block_on(async {
//! let store = SystemStore::default();
//! store.subscribe(|state| {
//!     if let Some(metrics) = &state.metrics {
//!         println!("cpu {:.1}%", metrics.cpu.usage);
//!     }
//! });
//!
//! let config = SyncConfig {
//!     url: "ws://localhost:8000/api/ws/system-metrics".parse().unwrap(),
//!     policy: Default::default(),
//!     auto_connect: true,
//! };
//! let health = Arc::new(Mutex::new(HealthTracker::default()));
//! let handle = SyncClient::spawn(config, store.clone(), health);
//! handle.shutdown().await;
//! # });
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod store;
pub mod sync;
pub mod ui;

pub use api::{Actions, ApiClient, ApiError, PollIntervals, Poller};
pub use app::{App, View};
pub use config::{RuntimeConfig, Settings};
pub use data::{HealthStatus, HealthTracker, Thresholds};
pub use store::{StoreLimits, SubscriptionId, SystemState, SystemStore};
pub use sync::{
    ConnectionManager, FallbackSender, ReconnectPolicy, SyncClient, SyncConfig, SyncHandle,
};
