//! # Order Notifications
//!
//! Websocket listener for order events with automatic reconnection.
//!
//! Every event invalidates the `transactions` and `reports` cache keys
//! before it is handed to the receiver, so a listener that re-reads an
//! order after an event never gets the pre-event copy.
//!
//! ```text
//! Disconnected ─spawn─► Connecting ─ok─► Connected ─closed─┐
//!                           ▲    └─err──────────────────────┤
//!                           │                               ▼
//!                      Reconnecting ◄──── delay elapsed ─ Waiting
//! ```
//!
//! The loop ends on `shutdown()`, when the receiver is dropped, or after
//! `max_retries` failed attempts in a row.

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use pupuk_core::TransactionStatus;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, COOKIE};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::resources::keys;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why `pump_events` returned.
enum Stop {
    /// Server closed the socket; reconnect.
    Closed,
    /// Shutdown requested or the receiver is gone.
    Finished,
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    OrderCreated,
    OrderUpdated,
}

/// One message on the order channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    #[serde(rename = "type")]
    pub kind: OrderEventKind,
    pub transaction_id: String,
    pub invoice_number: String,
    pub status: TransactionStatus,
    pub updated_at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn from_json(text: &str) -> ClientResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// =============================================================================
// Connection State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Sleeping out the retry delay.
    Waiting,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Waiting => "waiting",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub url: String,
    pub connect_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Maximum reconnection attempts (0 = infinite).
    pub max_retries: u32,
    pub ping_interval: Duration,
}

impl NotifierConfig {
    pub fn from_client_config(config: &ClientConfig) -> ClientResult<Self> {
        let settings = &config.notifications;
        Ok(NotifierConfig {
            url: config.ws_url()?,
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_secs(settings.max_backoff_secs),
            max_retries: settings.max_retries,
            ping_interval: Duration::from_secs(30),
        })
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Handle to a running notifier.
#[derive(Clone)]
pub struct NotifierHandle {
    state: Arc<RwLock<ConnectionState>>,
    shutdown_tx: mpsc::Sender<()>,
}

impl NotifierHandle {
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Closes the connection and stops reconnecting.
    pub async fn shutdown(&self) -> ClientResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| ClientError::ChannelError("Notifier already stopped".into()))
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Listens on the order channel until shut down or the event receiver is
/// dropped.
///
/// ## Usage
/// ```rust,ignore
/// let config = NotifierConfig::from_client_config(&client_config)?;
/// let (handle, mut events) = OrderNotifier::spawn(config, api.clone(), cache.clone());
///
/// while let Some(event) = events.recv().await {
///     println!("{} is now {}", event.invoice_number, event.status);
/// }
/// ```
pub struct OrderNotifier {
    config: NotifierConfig,
    api: ApiClient,
    cache: Arc<QueryCache>,
    state: Arc<RwLock<ConnectionState>>,
    events_tx: mpsc::Sender<OrderEvent>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl OrderNotifier {
    /// Starts the background task.
    ///
    /// `api` supplies the session cookie for each handshake, so a notifier
    /// started after login authenticates as that user.
    pub fn spawn(
        config: NotifierConfig,
        api: ApiClient,
        cache: Arc<QueryCache>,
    ) -> (NotifierHandle, mpsc::Receiver<OrderEvent>) {
        let (events_tx, events_rx) = mpsc::channel::<OrderEvent>(100);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let state = Arc::new(RwLock::new(ConnectionState::Disconnected));

        let notifier = OrderNotifier {
            config,
            api,
            cache,
            state: state.clone(),
            events_tx,
            shutdown_rx,
        };
        tokio::spawn(notifier.run());

        (NotifierHandle { state, shutdown_tx }, events_rx)
    }

    async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    async fn run(mut self) {
        info!(url = %self.config.url, "Order notifier starting");

        let mut delays = self.retry_delays();
        let mut failures = 0u32;

        while self.shutdown_rx.try_recv().is_err() {
            self.set_state(ConnectionState::Connecting).await;

            match self.handshake().await {
                Ok(socket) => {
                    info!("Order notifications connected");
                    self.set_state(ConnectionState::Connected).await;
                    delays.reset();
                    failures = 0;

                    match self.pump_events(socket).await {
                        Ok(Stop::Finished) => break,
                        Ok(Stop::Closed) => info!("Order notifications disconnected"),
                        Err(e) => warn!(error = %e, "Order notification connection lost"),
                    }
                }
                Err(e) => error!(error = %e, "Failed to connect to order notifications"),
            }

            if self.events_tx.is_closed() {
                debug!("Event receiver dropped");
                break;
            }

            failures += 1;
            if self.config.max_retries > 0 && failures >= self.config.max_retries {
                error!(attempts = failures, "Giving up on order notifications");
                break;
            }

            let Some(delay) = delays.next_backoff() else {
                break;
            };
            self.set_state(ConnectionState::Waiting).await;
            debug!(?delay, attempt = failures, "Retrying order notifications");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    *self.state.write().await = ConnectionState::Reconnecting;
                }
                _ = self.shutdown_rx.recv() => break,
            }
        }

        self.set_state(ConnectionState::Disconnected).await;
        info!("Order notifier stopped");
    }

    async fn handshake(&self) -> ClientResult<WsStream> {
        let mut request = self.config.url.as_str().into_client_request()?;
        if let Some(cookie) = self.api.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| ClientError::WebSocketError(e.to_string()))?;
            request.headers_mut().insert(COOKIE, value);
        }

        match timeout(self.config.connect_timeout, connect_async(request)).await {
            Ok(Ok((ws_stream, response))) => {
                debug!(status = ?response.status(), "Websocket handshake complete");
                Ok(ws_stream)
            }
            Ok(Err(e)) => Err(ClientError::from(e)),
            Err(_) => Err(ClientError::Timeout(self.config.connect_timeout.as_secs())),
        }
    }

    /// Reads events until the connection ends.
    async fn pump_events(&mut self, socket: WsStream) -> ClientResult<Stop> {
        let (mut write, mut read) = socket.split();

        let mut ping_interval = tokio::time::interval(self.config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick fires immediately
        ping_interval.tick().await;

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => match OrderEvent::from_json(&text) {
                        Ok(event) => {
                            if !self.handle_event(event).await {
                                return Ok(Stop::Finished);
                            }
                        }
                        Err(e) => warn!(error = %e, "Ignoring malformed order event"),
                    },
                    Some(Ok(WsMessage::Ping(data))) => {
                        write.send(WsMessage::Pong(data)).await?;
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        debug!(?frame, "Server closed the order channel");
                        return Ok(Stop::Closed);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(ClientError::from(e)),
                    None => return Ok(Stop::Closed),
                },

                _ = ping_interval.tick() => {
                    write.send(WsMessage::Ping(Vec::new().into())).await?;
                }

                _ = self.shutdown_rx.recv() => {
                    debug!("Closing order channel on shutdown");
                    let _ = write.send(WsMessage::Close(None)).await;
                    return Ok(Stop::Finished);
                }
            }
        }
    }

    /// Returns false when nobody listens anymore.
    async fn handle_event(&self, event: OrderEvent) -> bool {
        info!(
            kind = ?event.kind,
            transaction_id = %event.transaction_id,
            invoice = %event.invoice_number,
            status = %event.status,
            "Order event"
        );
        self.cache.invalidate(keys::TRANSACTIONS).await;
        self.cache.invalidate(keys::REPORTS).await;

        self.events_tx.send(event).await.is_ok()
    }

    fn retry_delays(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_backoff,
            max_interval: self.config.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server;
    use axum::extract::ws::{Message, WebSocketUpgrade};
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event_json(id: &str, kind: &str, status: &str) -> String {
        json!({
            "type": kind,
            "transactionId": id,
            "invoiceNumber": format!("INV-{}", id),
            "status": status,
            "updatedAt": "2026-03-01T02:00:00Z"
        })
        .to_string()
    }

    fn test_config(base_url: &str) -> NotifierConfig {
        let mut config = NotifierConfig::from_client_config(&ClientConfig::with_base_url(base_url)).unwrap();
        config.initial_backoff = Duration::from_millis(10);
        config.max_backoff = Duration::from_millis(50);
        config
    }

    /// Each connection gets one event and is then closed by the server.
    fn one_event_per_connection(connections: Arc<AtomicUsize>) -> Router {
        Router::new().route(
            "/ws/orders",
            get(move |ws: WebSocketUpgrade| {
                let connections = connections.clone();
                async move {
                    ws.on_upgrade(move |mut socket| async move {
                        let n = connections.fetch_add(1, Ordering::SeqCst) + 1;
                        let event = event_json(&format!("t{}", n), "order_updated", "paid");
                        let _ = socket.send(Message::Text(event.into())).await;
                        let _ = socket.send(Message::Close(None)).await;
                    })
                }
            }),
        )
    }

    #[test]
    fn test_event_parsing() {
        let event = OrderEvent::from_json(&event_json("t1", "order_created", "pending")).unwrap();
        assert_eq!(event.kind, OrderEventKind::OrderCreated);
        assert_eq!(event.invoice_number, "INV-t1");
        assert_eq!(event.status, TransactionStatus::Pending);

        assert!(OrderEvent::from_json(r#"{"type":"order_deleted"}"#).is_err());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Waiting.to_string(), "waiting");
    }

    #[tokio::test]
    async fn test_events_invalidate_transactions_and_reconnect() {
        let connections = Arc::new(AtomicUsize::new(0));
        let base = test_server::spawn(one_event_per_connection(connections.clone())).await;
        let api = ApiClient::new(&ClientConfig::with_base_url(base.clone())).unwrap();
        let cache = Arc::new(QueryCache::new(Duration::from_secs(60)));
        cache.set("transactions", &vec!["stale"]).await.unwrap();
        cache.set("products", &vec!["kept"]).await.unwrap();

        let (handle, mut events) = OrderNotifier::spawn(test_config(&base), api, cache.clone());

        let first = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
        assert_eq!(first.transaction_id, "t1");
        assert!(!cache.is_fresh("transactions").await);
        assert!(cache.is_fresh("products").await);

        // server closed the first connection; the notifier comes back
        let second = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
        assert_eq!(second.transaction_id, "t2");
        assert!(connections.load(Ordering::SeqCst) >= 2);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_handshake_carries_session_cookie() {
        let router = Router::new()
            .route(
                "/api/auth/login",
                axum::routing::post(|| async {
                    (
                        [("set-cookie", "session=abc123; Path=/; HttpOnly")],
                        axum::Json(json!({ "message": "ok" })),
                    )
                }),
            )
            .route(
                "/ws/orders",
                get(|ws: WebSocketUpgrade, headers: HeaderMap| async move {
                    let cookie = headers
                        .get("cookie")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    ws.on_upgrade(move |mut socket| async move {
                        let status = if cookie.contains("session=abc123") { "paid" } else { "cancelled" };
                        let _ = socket
                            .send(Message::Text(event_json("t1", "order_updated", status).into()))
                            .await;
                    })
                    .into_response()
                }),
            );
        let base = test_server::spawn(router).await;
        let api = ApiClient::new(&ClientConfig::with_base_url(base.clone())).unwrap();
        api.post_unit("/auth/login", &json!({})).await.unwrap();

        let (handle, mut events) =
            OrderNotifier::spawn(test_config(&base), api, Arc::new(QueryCache::new(Duration::from_secs(60))));
        let event = timeout(Duration::from_secs(5), events.recv()).await.unwrap().unwrap();
        assert_eq!(event.status, TransactionStatus::Paid);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        // bind and drop a listener so the port refuses connections
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = test_config(&format!("http://{}/api", addr));
        config.max_retries = 2;
        let api = ApiClient::new(&ClientConfig::with_base_url(format!("http://{}/api", addr))).unwrap();

        let (handle, mut events) =
            OrderNotifier::spawn(config, api, Arc::new(QueryCache::new(Duration::from_secs(60))));

        // the sender is dropped once the task stops
        let closed = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
        assert!(closed.is_none());
        assert_eq!(handle.state().await, ConnectionState::Disconnected);
    }
}
