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

//! Protocol message envelopes and dispatch errors.
//!
//! - [`CdpRequest`] - `{id, method: "Domain.function", params}` from a client
//! - [`CdpResponse`] - `{id, result}` sent back on the requesting connection
//! - [`CdpEventMessage`] - `{method, params}` pushed to clients
//! - [`EventSink`] - producer side of the broadcast queue
//! - [`DispatchError`] - every way a request can fail to produce a response

use cdp_bridge_common::types::CdpEvent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::{error, trace};

/// An incoming protocol request.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRequest {
    /// Request id, echoed in the response
    pub id: i64,
    /// Fully qualified method, e.g. `Debugger.enable`
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<Value>,
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdpResponse {
    /// Id of the request being answered
    pub id: i64,
    /// Method result; `{}` when the method returns nothing
    pub result: Value,
}

impl CdpResponse {
    /// Response to request `id`. A missing or `null` result becomes `{}`.
    pub fn new(id: i64, result: Option<Value>) -> Self {
        let result = match result {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(result) => result,
        };
        Self { id, result }
    }
}

/// An event envelope.
#[derive(Debug, Serialize)]
pub struct CdpEventMessage<'a, P> {
    /// Fully qualified event name
    pub method: &'a str,
    /// Event payload
    pub params: &'a P,
}

/// Encode `event` as `{method, params}`.
pub fn encode_event<E: CdpEvent>(event: &E) -> serde_json::Result<String> {
    serde_json::to_string(&CdpEventMessage { method: E::METHOD, params: event })
}

/// Consumer side of the broadcast queue.
pub type EventStream = mpsc::UnboundedReceiver<String>;

/// Producer side of the broadcast queue. Sending never blocks, so the engine
/// thread can emit without touching socket I/O.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<String>,
}

impl EventSink {
    /// Create a connected sink and stream.
    pub fn channel() -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue `event` for every connected client.
    pub fn emit<E: CdpEvent>(&self, event: &E) {
        match encode_event(event) {
            Ok(message) => self.send(message),
            Err(err) => error!(event = E::METHOD, %err, "Failed to encode event"),
        }
    }

    /// Queue an already encoded message.
    pub fn send(&self, message: String) {
        if self.tx.send(message).is_err() {
            trace!("No broadcaster running, event dropped");
        }
    }
}

/// What a handled request sends back on its own connection: the response,
/// then the events the request deferred, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    /// Encoded response
    pub response: String,
    /// Encoded events written after the response
    pub events: Vec<String>,
}

impl Reply {
    /// Every message of the reply in send order.
    pub fn into_messages(self) -> impl Iterator<Item = String> {
        std::iter::once(self.response).chain(self.events)
    }
}

/// Why a request produced no response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The message is not a request object
    #[error("malformed request: {0}")]
    MalformedRequest(#[source] serde_json::Error),
    /// The method name is not of the form `Domain.function`
    #[error("malformed method name '{0}'")]
    MalformedMethod(String),
    /// No such domain
    #[error("unknown domain '{domain}' in '{method}'")]
    UnknownDomain {
        /// Requested domain
        domain: String,
        /// Full method name
        method: String,
    },
    /// The domain exists but does not have the method
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
    /// The parameters do not decode into the method's parameter type
    #[error("invalid params for '{method}': {source}")]
    InvalidParams {
        /// Full method name
        method: String,
        /// Decode failure
        #[source]
        source: serde_json::Error,
    },
    /// The handler failed
    #[error("'{method}' failed: {message}")]
    Handler {
        /// Full method name
        method: String,
        /// Failure description
        message: String,
    },
    /// The handler panicked
    #[error("'{method}' panicked")]
    Panicked {
        /// Full method name
        method: String,
    },
}

impl DispatchError {
    /// Whether the client sent something the bridge does not understand, as
    /// opposed to a failure on the bridge side.
    pub fn is_protocol_error(&self) -> bool {
        !matches!(self, Self::Handler { .. } | Self::Panicked { .. })
    }
}
