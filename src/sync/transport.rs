//! Seams between the connection manager and the outside world.
//!
//! The manager never touches sockets or clocks directly. It asks a
//! [`Transport`] to open and close sessions, and a [`ReconnectTimer`] to
//! schedule a single pending reconnect. Both report back through events
//! that the driver feeds into the manager.

use std::fmt;
use std::time::Duration;

use url::Url;

/// Identifies one transport session (one open attempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one scheduled reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// What happened on a transport session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEventKind {
    Open,
    Message(String),
    Error(String),
    Close,
}

/// A transport event tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEvent {
    pub session: SessionId,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(session: SessionId, kind: TransportEventKind) -> Self {
        Self { session, kind }
    }
}

/// A message-oriented, full-duplex transport.
///
/// `open` returns immediately; the outcome arrives later as an `Open` or
/// `Error`/`Close` event for the returned session.
pub trait Transport {
    fn open(&mut self, url: &Url) -> SessionId;

    /// Request a graceful close. Events for `session` may still arrive and
    /// are expected to be ignored by the caller.
    fn close(&mut self, session: SessionId);
}

/// A single-shot timer with at most one pending schedule.
pub trait ReconnectTimer {
    /// Schedule a fire after `delay`, replacing any pending schedule.
    fn schedule(&mut self, delay: Duration) -> TimerToken;

    fn cancel(&mut self);

    fn is_pending(&self) -> bool;

    /// Consume a fired token. Returns false if it is not the pending one.
    fn acknowledge(&mut self, token: TimerToken) -> bool;
}
