//! WebSocket Ledger Server
//!
//! Async WebSocket server for transaction submission.
//! Authenticates callers, runs their transactions one at a time through a
//! single ledger and broadcasts committed events to every connection.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::Address;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::time::Instant;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::ledger::{EventRecord, Ledger, Tx};
use crate::network::auth::{authenticate, AuthConfig, AuthError};
use crate::network::protocol::{
    AuthRequest, AuthResult, ClientMessage, ErrorCode, ReceiptInfo, Rejection, ServerMessage,
    SubmitRequest,
};
use crate::store::{Commit, SnapshotStore, StoreError};

/// Environment override for the bind address.
pub const BIND_ENV: &str = "SQUAD_LEDGER_BIND";

/// Upper bound on records returned by one `query_events`.
pub const MAX_EVENTS_PER_QUERY: usize = 1000;

/// Capacity of the committed-event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Connections silent for this long are closed.
    pub idle_timeout: Duration,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            version: crate::VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults with the bind address taken from `SQUAD_LEDGER_BIND` when set.
    pub fn from_env() -> Result<Self, LedgerServerError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(BIND_ENV) {
            config.bind_addr = raw
                .parse()
                .map_err(|_| LedgerServerError::InvalidConfig(format!("{BIND_ENV}={raw}")))?;
        }
        Ok(config)
    }
}

/// Ledger server errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// Bad server configuration.
    #[error("Invalid server config: {0}")]
    InvalidConfig(String),
}

/// Connected client state.
struct ConnectedClient {
    /// Attested caller (after auth).
    caller: Option<Address>,
    /// Connection time.
    connected_at: Instant,
    /// Last activity.
    last_activity: Instant,
}

/// Message handling shared by every connection task.
#[derive(Clone)]
pub struct LedgerService {
    ledger: Arc<Mutex<Ledger>>,
    auth: Arc<AuthConfig>,
    store: Option<SnapshotStore>,
    events_tx: broadcast::Sender<EventRecord>,
    version: String,
}

impl LedgerService {
    /// Wrap a ledger.
    pub fn new(ledger: Ledger, auth: AuthConfig, snapshot_path: Option<PathBuf>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            auth: Arc::new(auth),
            store: snapshot_path.map(SnapshotStore::new),
            events_tx,
            version: crate::VERSION.to_string(),
        }
    }

    /// Shared handle to the ledger.
    pub fn ledger(&self) -> Arc<Mutex<Ledger>> {
        self.ledger.clone()
    }

    /// Receive every event committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events_tx.subscribe()
    }

    /// Answer one client message. `caller` is the connection's identity.
    pub async fn handle(&self, caller: &mut Option<Address>, msg: ClientMessage) -> ServerMessage {
        match msg {
            ClientMessage::Auth(req) => self.handle_auth(caller, req),
            ClientMessage::Submit(req) => match *caller {
                Some(address) => self.handle_submit(address, req).await,
                None => ServerMessage::error(ErrorCode::NotAuthenticated, "Must authenticate first"),
            },
            ClientMessage::QueryRoot { commitment } => {
                let ledger = self.ledger.lock().await;
                let root = ledger.root(commitment);
                ServerMessage::Root {
                    commitment,
                    root: root.current(),
                    version: root.version(),
                }
            }
            ClientMessage::QueryClaimed { account, token } => {
                let ledger = self.ledger.lock().await;
                let amount = match token {
                    Some(token) => ledger.claimed_token(token, account),
                    None => ledger.claimed_eth(account),
                };
                ServerMessage::Claimed {
                    account,
                    token,
                    amount,
                }
            }
            ClientMessage::QueryEvents { since } => {
                let ledger = self.ledger.lock().await;
                ServerMessage::Events {
                    records: ledger
                        .events_since(since)
                        .iter()
                        .take(MAX_EVENTS_PER_QUERY)
                        .cloned()
                        .collect(),
                    sequence: ledger.sequence(),
                }
            }
            ClientMessage::Ping { timestamp } => ServerMessage::Pong {
                timestamp,
                server_time: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64,
            },
        }
    }

    /// Handle authentication.
    fn handle_auth(&self, caller: &mut Option<Address>, req: AuthRequest) -> ServerMessage {
        match authenticate(&req.token, &self.auth) {
            Ok(address) => {
                *caller = Some(address);
                info!(caller = %address, client_version = ?req.client_version, "client authenticated");
                ServerMessage::AuthResult(AuthResult {
                    success: true,
                    caller: Some(address),
                    code: None,
                    error: None,
                    server_version: self.version.clone(),
                })
            }
            Err(err) => {
                warn!(error = %err, "authentication failed");
                ServerMessage::AuthResult(AuthResult {
                    success: false,
                    caller: None,
                    code: Some(auth_error_code(&err)),
                    error: Some(err.to_string()),
                    server_version: self.version.clone(),
                })
            }
        }
    }

    /// Execute a transaction, make it durable and publish its events.
    async fn handle_submit(&self, caller: Address, req: SubmitRequest) -> ServerMessage {
        let request_id = req.request_id.unwrap_or_else(Uuid::new_v4);
        let tx = Tx::from(caller).with_value(req.value);

        let mut ledger = self.ledger.lock().await;
        let before = ledger.sequence();
        let previous = self.store.as_ref().map(|_| ledger.state().clone());

        match ledger.submit(tx, req.call) {
            Ok(receipt) => {
                if let Err(err) = self.persist(&ledger).await {
                    error!(%request_id, sequence = receipt.sequence, error = %err, "commit not durable, rolling back");
                    if let Some(state) = previous {
                        ledger.rollback(state, before);
                    }
                    return ServerMessage::error(
                        ErrorCode::PersistFailed,
                        format!("request {request_id} rolled back: {err}"),
                    );
                }
                for record in ledger.events_since(before) {
                    // Err only means nobody is listening
                    let _ = self.events_tx.send(record.clone());
                }
                ServerMessage::Receipt(ReceiptInfo {
                    request_id,
                    sequence: receipt.sequence,
                    output: receipt.output,
                    events: receipt.events,
                    committed_at: Utc::now(),
                })
            }
            Err(err) => ServerMessage::Rejected(Rejection {
                request_id,
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist the latest commit if a store is configured. Called with the
    /// ledger locked so commits reach disk in sequence order.
    async fn persist(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };
        let commit = Commit::capture(ledger);
        tokio::task::spawn_blocking(move || store.commit(&commit))
            .await
            .map_err(|err| StoreError::Io(std::io::Error::other(err)))?
    }
}

fn auth_error_code(err: &AuthError) -> ErrorCode {
    match err {
        AuthError::Expired => ErrorCode::TokenExpired,
        AuthError::NotConfigured => ErrorCode::AuthFailed,
        _ => ErrorCode::InvalidToken,
    }
}

/// The ledger server.
pub struct LedgerServer {
    /// Server configuration.
    config: ServerConfig,
    /// Message handling.
    service: LedgerService,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl LedgerServer {
    /// Create a new ledger server.
    pub fn new(config: ServerConfig, service: LedgerService) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            service,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Bind the configured address and serve until shutdown.
    #[instrument(skip(self), fields(bind = %self.config.bind_addr))]
    pub async fn run(&self) -> Result<(), LedgerServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), LedgerServerError> {
        info!("Ledger server listening on {}", listener.local_addr()?);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let service = self.service.clone();
        let idle_timeout = self.config.idle_timeout;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);
            let mut events_rx = service.subscribe();

            // Register client
            {
                let now = Instant::now();
                let mut clients = clients.write().await;
                clients.insert(addr, ConnectedClient {
                    caller: None,
                    connected_at: now,
                    last_activity: now,
                });
            }

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            let mut caller: Option<Address> = None;
            let mut idle_deadline = Instant::now() + idle_timeout;

            // Handle incoming messages and committed events
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                idle_deadline = Instant::now() + idle_timeout;

                                let reply = match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => service.handle(&mut caller, client_msg).await,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        ServerMessage::error(ErrorCode::InvalidInput, "Invalid message format")
                                    }
                                };

                                {
                                    let mut clients = clients.write().await;
                                    if let Some(client) = clients.get_mut(&addr) {
                                        client.caller = caller;
                                        client.last_activity = Instant::now();
                                    }
                                }

                                if msg_tx.send(reply).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Binary(_))) => {
                                let _ = msg_tx.send(ServerMessage::error(
                                    ErrorCode::InvalidInput,
                                    "Binary frames are not supported",
                                )).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            // Ping/pong frames are answered by tungstenite
                            _ => {}
                        }
                    }
                    record = events_rx.recv() => {
                        match record {
                            Ok(record) => {
                                if msg_tx.send(ServerMessage::Event(record)).await.is_err() {
                                    break;
                                }
                            }
                            Err(RecvError::Lagged(skipped)) => {
                                warn!("Client {} lagged, {} events dropped", addr, skipped);
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                    _ = tokio::time::sleep_until(idle_deadline) => {
                        info!("Closing idle client {}", addr);
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Idle timeout".to_string(),
                        }).await;
                        break;
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Flush queued replies, then close
            drop(msg_tx);
            let _ = sender_task.await;

            let removed = clients.write().await.remove(&addr);
            if let Some(client) = removed {
                info!(
                    caller = ?client.caller,
                    connected_secs = client.connected_at.elapsed().as_secs(),
                    "Client {} cleaned up",
                    addr
                );
            }
        });
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Message handling shared with connection tasks.
    pub fn service(&self) -> &LedgerService {
        &self.service
    }
}
