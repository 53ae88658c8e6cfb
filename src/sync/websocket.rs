//! WebSocket transport built on tokio-tungstenite.
//!
//! Each `open` spawns a session task that connects, forwards frames as
//! [`TransportEvent`]s and always finishes with a `Close` event. `close`
//! signals the task to send a close frame and stop.

use std::collections::HashMap;

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use super::transport::{SessionId, Transport, TransportEvent, TransportEventKind};

/// Spawns one tokio task per session. Must be used within a tokio runtime.
#[derive(Debug)]
pub struct WebSocketTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    next: u64,
    sessions: HashMap<SessionId, oneshot::Sender<()>>,
}

impl WebSocketTransport {
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            events,
            next: 0,
            sessions: HashMap::new(),
        }
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, url: &Url) -> SessionId {
        // Finished sessions drop their receiver
        self.sessions.retain(|_, shutdown| !shutdown.is_closed());

        self.next += 1;
        let session = SessionId(self.next);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.sessions.insert(session, shutdown_tx);

        tokio::spawn(run_session(
            url.clone(),
            session,
            self.events.clone(),
            shutdown_rx,
        ));
        session
    }

    fn close(&mut self, session: SessionId) {
        if let Some(shutdown) = self.sessions.remove(&session) {
            let _ = shutdown.send(());
        }
    }
}

async fn run_session(
    url: Url,
    session: SessionId,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let emit = |kind: TransportEventKind| {
        let _ = events.send(TransportEvent::new(session, kind));
    };

    let connect = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = &mut shutdown => {
            debug!(%session, "closed before connecting");
            emit(TransportEventKind::Close);
            return;
        }
    };

    let (mut ws, _) = match connect {
        Ok(value) => value,
        Err(err) => {
            emit(TransportEventKind::Error(err.to_string()));
            emit(TransportEventKind::Close);
            return;
        }
    };
    emit(TransportEventKind::Open);

    loop {
        tokio::select! {
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => emit(TransportEventKind::Message(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    emit(TransportEventKind::Message(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(%session, ?frame, "server closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    emit(TransportEventKind::Error(err.to_string()));
                    break;
                }
                None => break,
            },
            _ = &mut shutdown => {
                let _ = ws.close(None).await;
                break;
            }
        }
    }

    emit(TransportEventKind::Close);
}
