//! Live connection status.

/// State of the live metrics connection.
///
/// Transitions: `Disconnected -> Connecting -> (Connected | Disconnected)`,
/// `Connected -> Disconnected`. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConnectionStatus {
    /// No live connection; either never connected, failed, or closed.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The stream is open and delivering snapshots.
    Connected,
}

impl ConnectionStatus {
    /// Returns the display label for this status.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "offline",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "live",
        }
    }

    /// Whether a new connection attempt would be redundant.
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionStatus::Connecting | ConnectionStatus::Connected)
    }
}
