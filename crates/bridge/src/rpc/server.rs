// CDP Bridge - Chrome DevTools Protocol bridge for embedded script engines
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! HTTP discovery and WebSocket transport.
//!
//! The server knows nothing about the protocol. It hands HTTP paths and text
//! messages to a [`RequestHandler`] and writes back whatever comes out:
//!
//! - `GET /json/version`, `/json`, `/json/list` are answered from
//!   [`RequestHandler::handle_http`]; other paths get `404`, other verbs `405`.
//! - A WebSocket upgrade on `/` opens a connection with a fresh session id.
//!   Each connection has one read loop that handles its messages in order.
//! - Events queued on the [`EventStream`] are written to every open
//!   connection by a single broadcaster task.
//!
//! Writes to one connection go through a per-connection async mutex, so a
//! broadcast and a response never interleave.

use std::{
    fmt,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{
        ws::{close_code, rejection::WebSocketUpgradeRejection, CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router as HttpRouter,
};
use dashmap::DashMap;
use eyre::{Result, WrapErr};
use futures::{
    future::join_all,
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use super::types::{EventStream, Reply};
use crate::config::BridgeConfig;

/// Identifier of one WebSocket connection
pub type SessionId = u64;

/// What the server needs from the protocol layer.
pub trait RequestHandler: Send + Sync + 'static {
    /// Body of a discovery document for `path`, `None` for unknown paths.
    /// `port` is the port the server is bound to.
    fn handle_http(&self, path: &str, port: u16) -> Option<String>;

    /// Handle one complete text message. Runs on a blocking thread.
    fn handle_message(&self, session: SessionId, message: &str) -> Option<Reply>;
}

/// Write side of one client connection.
pub struct Connection {
    id: SessionId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Connection {
    fn new(id: SessionId, sink: SplitSink<WebSocket, Message>) -> Self {
        Self { id, sink: Mutex::new(sink), reader: parking_lot::Mutex::new(None) }
    }

    /// Session id
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Write one text message.
    pub async fn send(&self, message: String) -> Result<(), axum::Error> {
        self.sink.lock().await.send(Message::Text(message.into())).await
    }

    async fn close(&self, code: u16, reason: &'static str) -> Result<(), axum::Error> {
        let frame = CloseFrame { code, reason: reason.into() };
        self.sink.lock().await.send(Message::Close(Some(frame))).await
    }

    /// Close with a bounded handshake, then stop the read loop.
    async fn shutdown(&self, timeout: Duration) {
        match tokio::time::timeout(timeout, self.close(close_code::AWAY, "Server shutting down")).await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(session = self.id, %err, "Close frame not sent"),
            Err(_) => warn!(session = self.id, "Timed out sending close frame"),
        }

        let reader = self.reader.lock().take();
        if let Some(mut reader) = reader {
            if tokio::time::timeout(timeout, &mut reader).await.is_err() {
                warn!(session = self.id, "Close handshake timed out, aborting connection");
                reader.abort();
            }
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish_non_exhaustive()
    }
}

/// The live connection table.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    inner: Arc<DashMap<SessionId, Arc<Connection>>>,
}

impl Connections {
    fn insert(&self, connection: Arc<Connection>) {
        self.inner.insert(connection.id, connection);
    }

    fn remove(&self, id: SessionId) {
        self.inner.remove(&id);
    }

    fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.inner.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of open connections
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no connection is open
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Write `message` to every open connection. A failing connection does
    /// not stop delivery to the others. Returns the number of successful
    /// writes.
    pub async fn broadcast(&self, message: &str) -> usize {
        let targets = self.snapshot();
        let results = join_all(targets.iter().map(|connection| async move {
            (connection.id, connection.send(message.to_string()).await)
        }))
        .await;

        results
            .into_iter()
            .filter(|(id, result)| match result {
                Ok(()) => true,
                Err(err) => {
                    warn!(session = id, %err, "Failed to deliver event");
                    false
                }
            })
            .count()
    }
}

struct Shared<H> {
    handler: Arc<H>,
    connections: Connections,
    next_session: AtomicU64,
    accepting: Arc<AtomicBool>,
    port: u16,
}

/// Handle to a running server.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    connections: Connections,
    accepting: Arc<AtomicBool>,
    close_timeout: Duration,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
    broadcaster: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Port the server is listening on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// WebSocket URL clients connect to
    pub fn websocket_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    /// Number of open connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Write `message` to every open connection.
    pub async fn broadcast(&self, message: &str) -> usize {
        self.connections.broadcast(message).await
    }

    /// Close every connection, then stop the listener.
    pub async fn shutdown(mut self) -> Result<()> {
        info!(addr = %self.addr, "Shutting down server");
        self.accepting.store(false, Ordering::SeqCst);

        let connections = self.connections.snapshot();
        join_all(connections.iter().map(|c| c.shutdown(self.close_timeout))).await;
        self.connections.inner.clear();

        if self.shutdown_tx.send(()).is_err() {
            warn!("Server already stopped");
        }
        self.broadcaster.abort();

        match tokio::time::timeout(self.close_timeout, &mut self.server).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%err, "Server task ended abnormally"),
            Err(_) => {
                warn!("Server did not stop in time, aborting");
                self.server.abort();
            }
        }

        info!("Server stopped");
        Ok(())
    }
}

/// Bind the listener described by `config` and start serving.
///
/// Binding errors (e.g. the port is in use) are returned; nothing is left
/// running in that case.
pub async fn start<H: RequestHandler>(
    config: &BridgeConfig,
    handler: Arc<H>,
    mut events: EventStream,
) -> Result<ServerHandle> {
    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .wrap_err_with(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;

    let connections = Connections::default();
    let accepting = Arc::new(AtomicBool::new(true));
    let shared = Arc::new(Shared {
        handler,
        connections: connections.clone(),
        next_session: AtomicU64::new(0),
        accepting: accepting.clone(),
        port: addr.port(),
    });

    let app = HttpRouter::new()
        .route("/", any(root::<H>))
        .fallback(discovery::<H>)
        .with_state(shared);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await;
        if let Err(err) = result {
            error!(%err, "Server error");
        }
    });

    let broadcast_to = connections.clone();
    let broadcaster = tokio::spawn(async move {
        while let Some(message) = events.recv().await {
            let delivered = broadcast_to.broadcast(&message).await;
            debug!(delivered, "Broadcast event");
        }
    });

    info!(%addr, "CDP server listening");
    Ok(ServerHandle {
        addr,
        connections,
        accepting,
        close_timeout: config.close_timeout,
        shutdown_tx,
        server,
        broadcaster,
    })
}

fn json_response(body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json; charset=UTF-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

async fn discovery<H: RequestHandler>(
    State(shared): State<Arc<Shared<H>>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "Only GET is supported").into_response();
    }
    match shared.handler.handle_http(uri.path(), shared.port) {
        Some(body) => json_response(body),
        None => {
            debug!(path = uri.path(), "Unknown discovery path");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn root<H: RequestHandler>(
    State(shared): State<Arc<Shared<H>>>,
    method: Method,
    uri: Uri,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(_) => return discovery(State(shared), method, uri).await,
    };
    if !shared.accepting.load(Ordering::SeqCst) {
        return (StatusCode::CONFLICT, "Server is shutting down").into_response();
    }

    ws.on_failed_upgrade(|err| warn!(%err, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| accept(shared, socket))
}

async fn accept<H: RequestHandler>(shared: Arc<Shared<H>>, socket: WebSocket) {
    let id = shared.next_session.fetch_add(1, Ordering::SeqCst) + 1;
    let (sink, stream) = socket.split();
    let connection = Arc::new(Connection::new(id, sink));
    shared.connections.insert(connection.clone());
    info!(session = id, "Client connected");

    let reader = tokio::spawn(read_loop(shared, connection.clone(), stream));
    *connection.reader.lock() = Some(reader);
}

async fn read_loop<H: RequestHandler>(
    shared: Arc<Shared<H>>,
    connection: Arc<Connection>,
    mut stream: SplitStream<WebSocket>,
) {
    let id = connection.id;
    'frames: while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!(session = id, %err, "Connection error");
                break;
            }
        };

        match frame {
            Message::Text(text) => {
                let handler = shared.handler.clone();
                let text = text.to_string();
                let reply =
                    match tokio::task::spawn_blocking(move || handler.handle_message(id, &text)).await {
                        Ok(reply) => reply,
                        Err(err) => {
                            error!(session = id, %err, "Request handler task failed");
                            None
                        }
                    };

                for message in reply.into_iter().flat_map(Reply::into_messages) {
                    if let Err(err) = connection.send(message).await {
                        warn!(session = id, %err, "Failed to send reply");
                        break 'frames;
                    }
                }
            }
            Message::Binary(_) => {
                warn!(session = id, "Binary frame received, closing connection");
                if let Err(err) =
                    connection.close(close_code::UNSUPPORTED, "Cannot accept binary message").await
                {
                    debug!(session = id, %err, "Close frame not sent");
                }
                break;
            }
            Message::Close(_) => {
                debug!(session = id, "Close requested by client");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    shared.connections.remove(id);
    info!(session = id, "Client disconnected");
}
