//! # indra-types
//!
//! Wire types exchanged between the IndraOS monitoring API and its clients.
//!
//! The live metrics stream delivers one [`MetricsSnapshot`] per WebSocket
//! message. The REST API serves [`SystemInfo`], [`Process`] lists and the
//! other inventory types in [`system`]. [`Alert`] and [`Insight`] are the
//! notification types kept by client-side stores.
//!
//! ## Features
//!
//! - `serde`: JSON (de)serialization. Field names follow the camelCase
//!   format the dashboard API speaks.
//!
//! ## Example
//!
//! ```rust
//! use indra_types::MetricsSnapshot;
//!
//! let snapshot = MetricsSnapshot::builder()
//!     .cpu_usage(42.5)
//!     .memory(6.0, 16.0)
//!     .disk_percentage(71.0)
//!     .build();
//!
//! assert_eq!(snapshot.cpu.usage, 42.5);
//! assert_eq!(snapshot.memory.percentage, 37.5);
//! ```

mod alert;
mod connection;
mod metrics;
pub mod system;

pub use alert::*;
pub use connection::*;
pub use metrics::*;
pub use system::{
    NetworkInterface, Process, ProcessPriority, ProcessStatus, SecurityEvent, Service, SystemInfo,
};

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
