//! Live-data synchronization.
//!
//! Keeps the store's live fields fresh from the metrics WebSocket:
//!
//! ```text
//! WebSocketTransport ──TransportEvent──┐
//! TokioTimer ─────────TimerToken───────┤
//! SyncHandle ─────────Command──────────┼──▶ SyncClient task ──▶ ConnectionManager ──▶ SystemStore
//! FallbackSender ─────REST snapshot────┘
//! ```
//!
//! - [`ReconnectPolicy`]: exponential backoff with a delay cap and attempt limit
//! - [`ConnectionManager`]: the connection state machine, generic over its
//!   [`Transport`] and [`ReconnectTimer`] so it can be driven by fakes in tests
//! - [`SyncClient`] / [`SyncHandle`]: the tokio driver and its control handle
//! - [`FallbackSender`]: REST metrics offered to the driver while offline

mod backoff;
mod client;
mod manager;
mod timer;
mod transport;
mod websocket;

pub use backoff::ReconnectPolicy;
pub use client::{FallbackSender, SyncClient, SyncConfig, SyncHandle};
pub use manager::ConnectionManager;
pub use timer::TokioTimer;
pub use transport::{
    ReconnectTimer, SessionId, TimerToken, Transport, TransportEvent, TransportEventKind,
};
pub use websocket::WebSocketTransport;
