//! Derived views over metrics data.
//!
//! ## Submodules
//!
//! - [`duration`]: Parsing of duration strings (e.g., "5s", "500ms") and uptime formatting
//! - [`health`]: Threshold classification ([`Thresholds`], [`HealthStatus`]) and
//!   edge-triggered health alerts ([`HealthTracker`])
//!
//! ## Data Flow
//!
//! ```text
//! MetricsSnapshot (decoded from the stream or polled over REST)
//!        │
//!        ├──▶ HealthTracker::observe() ──▶ Alert (into the store)
//!        │
//!        └──▶ SystemStore::set_metrics()
//! ```

pub mod duration;
pub mod health;

pub use duration::{format_uptime, parse_duration};
pub use health::{HealthStatus, HealthTracker, Resource, Thresholds};
