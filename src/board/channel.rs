//! Realtime push channel over a websocket.
//!
//! One background task per subscription: connect, send `Join`, forward
//! events to the board view, keep the socket alive with pings, and on any
//! drop reconnect with [`Backoff`]. Cancelling the [`Subscription`] sends
//! `Leave` and closes the socket.

use std::time::Duration;

use boardsync_common::{ChannelRequest, ChannelScope, RealtimeEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::errors::SyncError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Backoff ──────────────────────────────────────────────────────────

/// Reconnect delays: `fast_attempts` tries at `fast_delay`, then
/// `slow_delay` doubling on every further attempt up to `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    fast_attempts: u32,
    fast_delay: Duration,
    slow_delay: Duration,
    max_delay: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(fast_attempts: u32, fast_delay: Duration, slow_delay: Duration, max_delay: Duration) -> Self {
        Self {
            fast_attempts,
            fast_delay,
            slow_delay,
            max_delay,
            attempt: 0,
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn next_delay(&mut self) -> Duration {
        self.attempt += 1;
        if self.attempt <= self.fast_attempts {
            return self.fast_delay;
        }
        let doublings = (self.attempt - self.fast_attempts - 1).min(16);
        self.slow_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            3,
            Duration::from_secs(1),
            Duration::from_secs(5),
            Duration::from_secs(30),
        )
    }
}

// ── Channel ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum ChannelMessage {
    Event(RealtimeEvent),
    /// The socket came back after a drop; pushes may have been missed.
    Reconnected,
}

#[derive(Debug, Clone)]
pub struct RealtimeChannel {
    url: String,
    token: Option<String>,
    ping_interval: Duration,
    pong_timeout: Duration,
    backoff: Backoff,
}

impl RealtimeChannel {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token,
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(60),
            backoff: Backoff::default(),
        }
    }

    pub fn with_keepalive(mut self, ping_interval: Duration, pong_timeout: Duration) -> Self {
        self.ping_interval = ping_interval;
        self.pong_timeout = pong_timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Join `scope` and forward its events into `tx` until the returned
    /// subscription is cancelled or dropped, or `tx` is closed.
    pub fn subscribe(&self, scope: ChannelScope, tx: mpsc::Sender<ChannelMessage>) -> Subscription {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_channel(self.clone(), scope, tx, token.clone()));
        Subscription {
            token,
            handle: Some(handle),
        }
    }

    async fn connect(&self) -> Result<Socket, SyncError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| SyncError::Channel(format!("Invalid websocket URL {}: {}", self.url, e)))?;
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SyncError::Channel(format!("Invalid token header: {e}")))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        let (socket, _response) = connect_async(request)
            .await
            .map_err(|e| SyncError::Channel(format!("Failed to connect to {}: {}", self.url, e)))?;
        Ok(socket)
    }
}

/// Unsubscribe token for a realtime subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        self.token.cancel();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Unsubscribe and wait for `Leave` to be sent and the socket closed.
    pub async fn close(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

enum SessionEnd {
    Cancelled,
    ReceiverGone,
    Disconnected(String),
}

async fn run_channel(
    channel: RealtimeChannel,
    scope: ChannelScope,
    tx: mpsc::Sender<ChannelMessage>,
    cancel: CancellationToken,
) {
    let mut backoff = channel.backoff.clone();
    let mut connected_before = false;

    loop {
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = channel.connect() => result,
        };

        match connected {
            Ok(socket) => {
                backoff.reset();
                if connected_before && tx.send(ChannelMessage::Reconnected).await.is_err() {
                    break;
                }
                connected_before = true;
                tracing::info!(url = %channel.url, ?scope, "realtime channel connected");

                match run_session(socket, &channel, &scope, &tx, &cancel).await {
                    SessionEnd::Cancelled | SessionEnd::ReceiverGone => break,
                    SessionEnd::Disconnected(reason) => {
                        tracing::warn!(url = %channel.url, reason = %reason, "realtime channel dropped");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt = backoff.attempt() + 1, "realtime connect failed");
            }
        }

        let delay = backoff.next_delay();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "reconnecting realtime channel");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    tracing::debug!(?scope, "realtime channel stopped");
}

/// One connected session: join, pump events, keep alive.
///
/// If no Pong arrives within the pong timeout after a Ping, the session is
/// considered dead.
async fn run_session(
    socket: Socket,
    channel: &RealtimeChannel,
    scope: &ChannelScope,
    tx: &mpsc::Sender<ChannelMessage>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    let join = match (ChannelRequest::Join { scope: *scope }).to_json() {
        Ok(json) => json,
        Err(e) => return SessionEnd::Disconnected(format!("Failed to encode join: {e}")),
    };
    if let Err(e) = sink.send(Message::text(join)).await {
        return SessionEnd::Disconnected(e.to_string());
    }

    let mut ping_interval = tokio::time::interval(channel.ping_interval);
    ping_interval.tick().await;
    let mut last_pong = Instant::now();
    let mut awaiting_pong = false;

    let end = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Ok(leave) = (ChannelRequest::Leave { scope: *scope }).to_json() {
                    let _ = sink.send(Message::text(leave)).await;
                }
                break SessionEnd::Cancelled;
            }

            _ = ping_interval.tick() => {
                if awaiting_pong && last_pong.elapsed() > channel.pong_timeout {
                    break SessionEnd::Disconnected("pong timeout".to_string());
                }
                if let Err(e) = sink.send(Message::Ping(Vec::new().into())).await {
                    break SessionEnd::Disconnected(e.to_string());
                }
                awaiting_pong = true;
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match RealtimeEvent::from_json(text.as_str()) {
                        Ok(event) => {
                            if tx.send(ChannelMessage::Event(event)).await.is_err() {
                                break SessionEnd::ReceiverGone;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "ignoring malformed realtime frame"),
                    },
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break SessionEnd::Disconnected("closed by server".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break SessionEnd::Disconnected(e.to_string()),
                }
            }
        }
    };

    let _ = sink.send(Message::Close(None)).await;
    end
}
