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

//! Test utilities for integration tests

/// Initialization utilities for tests
pub mod init {
    /// Initialize logging for a test
    pub fn init_test_environment() {
        cdp_bridge_common::logging::ensure_test_logging(None);
    }
}

/// Bridge server utilities
pub mod server {
    use std::sync::Arc;

    use cdp_bridge::{BridgeConfig, DebugAgent, ServerHandle};
    use eyre::Result;
    use tracing::info;

    use crate::mock::MockEngine;

    /// A running bridge over a [`MockEngine`]
    pub struct TestBridge {
        /// The scripted engine
        pub engine: Arc<MockEngine>,
        /// The agent the engine reports to
        pub agent: Arc<DebugAgent<MockEngine>>,
        /// The server handle; `None` once shut down
        pub server: Option<ServerHandle>,
    }

    impl TestBridge {
        /// WebSocket URL of the server
        pub fn websocket_url(&self) -> String {
            self.server.as_ref().map(ServerHandle::websocket_url).unwrap_or_default()
        }

        /// HTTP base URL of the server, without a trailing slash
        pub fn http_url(&self) -> String {
            self.server.as_ref().map(|s| format!("http://{}", s.addr())).unwrap_or_default()
        }

        /// Shut the server down
        pub async fn shutdown(&mut self) -> Result<()> {
            match self.server.take() {
                Some(server) => server.shutdown().await,
                None => Ok(()),
            }
        }
    }

    /// Start a bridge on an ephemeral port of 127.0.0.1
    pub async fn start_bridge(pause_on_start: bool) -> Result<TestBridge> {
        let engine = Arc::new(MockEngine::new());
        let config = BridgeConfig::default()
            .with_host("127.0.0.1")
            .with_port(0)
            .with_name("Test Bridge")
            .with_version("0.0.1")
            .with_pause_on_start(pause_on_start);
        let agent = DebugAgent::new(engine.clone(), config);
        let server = agent.serve().await?;
        info!(url = %server.websocket_url(), "Test bridge started");

        Ok(TestBridge { engine, agent, server: Some(server) })
    }
}

/// WebSocket client utilities
pub mod client {
    use std::{collections::VecDeque, time::Duration};

    use eyre::{bail, eyre, Result};
    use futures::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::{net::TcpStream, time::timeout};
    use tokio_tungstenite::{
        connect_async,
        tungstenite::{protocol::CloseFrame, Message},
        MaybeTlsStream, WebSocketStream,
    };
    use tracing::debug;

    /// How long to wait for any single message
    pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    /// A DevTools protocol client
    pub struct CdpClient {
        stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        next_id: i64,
        /// Events received while waiting for responses
        events: VecDeque<Value>,
    }

    impl CdpClient {
        /// Connect to `url`
        pub async fn connect(url: &str) -> Result<Self> {
            let (stream, _) = connect_async(url).await?;
            Ok(Self { stream, next_id: 0, events: VecDeque::new() })
        }

        /// Number the following requests from `first`
        pub fn with_first_id(mut self, first: i64) -> Self {
            self.next_id = first - 1;
            self
        }

        /// Send a request and return its id without waiting
        pub async fn send(&mut self, method: &str, params: Value) -> Result<i64> {
            self.next_id += 1;
            let id = self.next_id;
            let request = json!({ "id": id, "method": method, "params": params });
            self.send_raw(Message::text(request.to_string())).await?;
            Ok(id)
        }

        /// Send any frame
        pub async fn send_raw(&mut self, message: Message) -> Result<()> {
            self.stream.send(message).await?;
            Ok(())
        }

        /// Send a request and wait for its `result`. Events arriving first are
        /// kept for [`Self::next_event`].
        pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
            let id = self.send(method, params).await?;
            self.response(id).await
        }

        /// Wait for the response to request `id`
        pub async fn response(&mut self, id: i64) -> Result<Value> {
            loop {
                let message = self.next_json().await?;
                match message.get("id").and_then(Value::as_i64) {
                    Some(got) if got == id => {
                        return message.get("result").cloned().ok_or_else(|| eyre!("no result in {message}"));
                    }
                    Some(got) => bail!("expected response {id}, got {got}"),
                    None => self.events.push_back(message),
                }
            }
        }

        /// Wait for the next event named `method`, skipping others
        pub async fn next_event(&mut self, method: &str) -> Result<Value> {
            while let Some(event) = self.events.pop_front() {
                if event["method"] == method {
                    return Ok(event["params"].clone());
                }
                debug!(skipped = %event["method"], "Skipping event");
            }
            loop {
                let message = self.next_json().await?;
                if message["method"] == method {
                    return Ok(message["params"].clone());
                }
                debug!(skipped = %message["method"], "Skipping message");
            }
        }

        /// Whether a message arrives within `wait`
        pub async fn is_silent_for(&mut self, wait: Duration) -> bool {
            if !self.events.is_empty() {
                return false;
            }
            timeout(wait, self.stream.next()).await.is_err()
        }

        /// Wait for the server to close the connection
        pub async fn closed(&mut self) -> Result<Option<CloseFrame>> {
            loop {
                match timeout(RECV_TIMEOUT, self.stream.next()).await? {
                    Some(Ok(Message::Close(frame))) => return Ok(frame),
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => bail!("connection error before close: {err}"),
                    None => bail!("connection ended without a close frame"),
                }
            }
        }

        async fn next_json(&mut self) -> Result<Value> {
            loop {
                let message = timeout(RECV_TIMEOUT, self.stream.next())
                    .await
                    .map_err(|_| eyre!("timed out waiting for a message"))?
                    .ok_or_else(|| eyre!("connection closed"))??;
                match message {
                    Message::Text(text) => return Ok(serde_json::from_str(text.as_str())?),
                    Message::Close(frame) => bail!("connection closed: {frame:?}"),
                    _ => continue,
                }
            }
        }
    }
}
