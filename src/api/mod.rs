//! REST collaborator.
//!
//! - [`ApiClient`]: typed access to the monitoring API
//! - [`Poller`]: periodic refreshes of the non-live store slices
//! - [`Actions`]: operator actions with their outcome recorded as alerts
//!
//! Failures here never affect the live connection status.

mod actions;
mod client;
mod error;
mod poller;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::Actions;
pub use client::{
    AiAnalysis, AnalysisStats, AnalysisStatus, ApiClient, ApiClientBuilder, HealthResponse,
    SecurityQuery, DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};
pub use error::ApiError;
pub use poller::{PollIntervals, Poller};
