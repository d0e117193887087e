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

//! Typed method dispatch.
//!
//! A [`Router`] is an explicit table of [`Domain`]s, each mapping function
//! names to handlers. Registering a handler captures its parameter and result
//! types, so dispatch decodes `params` into the handler's own parameter
//! struct and encodes whatever it returns:
//!
//! ```rust,ignore
//! let router = Router::new().domain(
//!     Domain::new("Debugger")
//!         .method("enable", debugger::enable)
//!         .method("getScriptSource", debugger::get_script_source),
//! );
//! ```
//!
//! Requests that cannot be dispatched (bad JSON, unknown method, bad params,
//! failing or panicking handlers) are logged and produce no response.

use std::{
    any::type_name,
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
};

use cdp_bridge_common::types::CdpEvent;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, trace, warn};

use super::{
    types::{encode_event, CdpRequest, CdpResponse, DispatchError, Reply},
    utils::split_method,
};

/// Per-request state available to handlers.
#[derive(Debug)]
pub struct CallContext {
    id: i64,
    deferred: Vec<String>,
}

impl CallContext {
    /// Id of the request being handled
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Send `event` on the requesting connection after the response.
    pub fn defer<E: CdpEvent>(&mut self, event: &E) {
        match encode_event(event) {
            Ok(message) => self.deferred.push(message),
            Err(err) => error!(event = E::METHOD, %err, "Failed to encode deferred event"),
        }
    }
}

type Handler<S> =
    Box<dyn Fn(&S, &mut CallContext, Value) -> Result<Option<Value>, DispatchError> + Send + Sync>;

/// The methods of one protocol domain.
pub struct Domain<S> {
    name: &'static str,
    methods: HashMap<&'static str, Handler<S>>,
}

impl<S: 'static> Domain<S> {
    /// Create an empty domain
    pub fn new(name: &'static str) -> Self {
        Self { name, methods: HashMap::new() }
    }

    /// Register `handler` as `<domain>.<name>`.
    ///
    /// The handler returns `Ok(None)` for lookup misses, which is answered
    /// with an empty result.
    pub fn method<P, R, F>(mut self, name: &'static str, handler: F) -> Self
    where
        P: DeserializeOwned,
        R: Serialize,
        F: Fn(&S, &mut CallContext, P) -> eyre::Result<Option<R>> + Send + Sync + 'static,
    {
        let method = format!("{}.{}", self.name, name);
        trace!(%method, params = type_name::<P>(), result = type_name::<R>(), "Registering method");

        let handler: Handler<S> = Box::new(move |state, cx, params| {
            let params: P = serde_json::from_value(params)
                .map_err(|source| DispatchError::InvalidParams { method: method.clone(), source })?;
            let result = handler(state, cx, params)
                .map_err(|err| DispatchError::Handler { method: method.clone(), message: format!("{err:#}") })?;
            result
                .map(serde_json::to_value)
                .transpose()
                .map_err(|err| DispatchError::Handler { method: method.clone(), message: err.to_string() })
        });

        if self.methods.insert(name, handler).is_some() {
            warn!(domain = self.name, name, "Method registered twice, keeping the last handler");
        }
        self
    }

    /// Domain name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `name` is registered
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

/// Registry of domains, dispatching requests against a shared state `S`.
pub struct Router<S> {
    domains: HashMap<&'static str, Domain<S>>,
}

impl<S: 'static> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> Router<S> {
    /// Create an empty router
    pub fn new() -> Self {
        Self { domains: HashMap::new() }
    }

    /// Add a domain
    pub fn domain(mut self, domain: Domain<S>) -> Self {
        self.domains.insert(domain.name, domain);
        self
    }

    /// Whether `Domain.function` is registered
    pub fn supports(&self, method: &str) -> bool {
        split_method(method)
            .and_then(|(domain, function)| self.domains.get(domain).map(|d| d.has_method(function)))
            .unwrap_or(false)
    }

    /// Dispatch one request message.
    pub fn dispatch(&self, state: &S, message: &str) -> Result<Reply, DispatchError> {
        let CdpRequest { id, method, params } =
            serde_json::from_str(message).map_err(DispatchError::MalformedRequest)?;

        let (domain_name, function) =
            split_method(&method).ok_or_else(|| DispatchError::MalformedMethod(method.clone()))?;
        let domain = self.domains.get(domain_name).ok_or_else(|| DispatchError::UnknownDomain {
            domain: domain_name.to_string(),
            method: method.clone(),
        })?;
        let handler =
            domain.methods.get(function).ok_or_else(|| DispatchError::UnknownMethod(method.clone()))?;

        let params = match params {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(params) => params,
        };

        debug!(id, %method, "Dispatching request");
        let mut cx = CallContext { id, deferred: Vec::new() };
        let result = catch_unwind(AssertUnwindSafe(|| handler(state, &mut cx, params)))
            .map_err(|_| DispatchError::Panicked { method: method.clone() })??;

        let response = serde_json::to_string(&CdpResponse::new(id, result))
            .map_err(|err| DispatchError::Handler { method, message: err.to_string() })?;
        Ok(Reply { response, events: cx.deferred })
    }

    /// Dispatch one request message, logging failures. `None` means nothing
    /// is sent back.
    pub fn handle(&self, state: &S, message: &str) -> Option<Reply> {
        match self.dispatch(state, message) {
            Ok(reply) => Some(reply),
            Err(err) if err.is_protocol_error() => {
                warn!(%err, "Dropping request");
                None
            }
            Err(err) => {
                error!(%err, "Request failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_bridge_common::types::{Empty, NoParams, ResumedEvent};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counter {
        value: AtomicU32,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct AddParams {
        amount: u32,
        #[serde(default)]
        announce: Option<bool>,
    }

    #[derive(Serialize)]
    struct ValueResult {
        value: u32,
    }

    fn add(counter: &Counter, cx: &mut CallContext, params: AddParams) -> eyre::Result<Option<ValueResult>> {
        let value = counter.value.fetch_add(params.amount, Ordering::SeqCst) + params.amount;
        if params.announce == Some(true) {
            cx.defer(&ResumedEvent {});
        }
        Ok(Some(ValueResult { value }))
    }

    fn router() -> Router<Counter> {
        Router::new().domain(
            Domain::new("Counter")
                .method("add", add)
                .method("missing", |_: &Counter, _: &mut CallContext, _: NoParams| Ok(None::<Empty>))
                .method("fail", |_: &Counter, _: &mut CallContext, _: NoParams| -> eyre::Result<Option<Empty>> {
                    eyre::bail!("boom")
                })
                .method("panic", |_: &Counter, _: &mut CallContext, _: NoParams| -> eyre::Result<Option<Empty>> {
                    panic!("handler panicked")
                }),
        )
    }

    fn response(reply: &Reply) -> Value {
        serde_json::from_str(&reply.response).unwrap()
    }

    #[test]
    fn test_dispatch_decodes_params_and_encodes_result() {
        let counter = Counter::default();
        let reply = router()
            .handle(&counter, r#"{"id":7,"method":"Counter.add","params":{"amount":5}}"#)
            .unwrap();
        assert_eq!(response(&reply), json!({ "id": 7, "result": { "value": 5 } }));
        assert!(reply.events.is_empty());
    }

    #[test]
    fn test_deferred_events_follow_response() {
        let counter = Counter::default();
        let reply = router()
            .handle(&counter, r#"{"id":1,"method":"Counter.add","params":{"amount":1,"announce":true}}"#)
            .unwrap();
        assert_eq!(reply.events.len(), 1);
        assert_eq!(
            serde_json::from_str::<Value>(&reply.events[0]).unwrap(),
            json!({ "method": "Debugger.resumed", "params": {} })
        );
    }

    #[test]
    fn test_lookup_miss_is_empty_result() {
        let counter = Counter::default();
        let reply = router().handle(&counter, r#"{"id":2,"method":"Counter.missing"}"#).unwrap();
        assert_eq!(response(&reply), json!({ "id": 2, "result": {} }));

        // Null params are treated as no params.
        let reply =
            router().handle(&counter, r#"{"id":3,"method":"Counter.missing","params":null}"#).unwrap();
        assert_eq!(response(&reply), json!({ "id": 3, "result": {} }));
    }

    #[test]
    fn test_protocol_errors_produce_no_response() {
        let counter = Counter::default();
        let router = router();

        assert!(matches!(
            router.dispatch(&counter, "not json"),
            Err(DispatchError::MalformedRequest(_))
        ));
        assert!(matches!(
            router.dispatch(&counter, r#"{"id":1,"method":"enable"}"#),
            Err(DispatchError::MalformedMethod(_))
        ));
        assert!(matches!(
            router.dispatch(&counter, r#"{"id":1,"method":"Profiler.enable"}"#),
            Err(DispatchError::UnknownDomain { .. })
        ));
        assert!(matches!(
            router.dispatch(&counter, r#"{"id":1,"method":"Counter.reset"}"#),
            Err(DispatchError::UnknownMethod(_))
        ));
        assert!(matches!(
            router.dispatch(&counter, r#"{"id":1,"method":"Counter.add","params":{"amount":"x"}}"#),
            Err(DispatchError::InvalidParams { .. })
        ));
        assert!(router.handle(&counter, r#"{"id":1,"method":"Counter.reset"}"#).is_none());
        assert_eq!(counter.value.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_failures_are_contained() {
        let counter = Counter::default();
        let router = router();

        let err = router.dispatch(&counter, r#"{"id":1,"method":"Counter.fail"}"#).unwrap_err();
        assert!(!err.is_protocol_error());
        assert!(err.to_string().contains("boom"));

        assert!(matches!(
            router.dispatch(&counter, r#"{"id":1,"method":"Counter.panic"}"#),
            Err(DispatchError::Panicked { .. })
        ));

        // The router keeps working afterwards.
        assert!(router.handle(&counter, r#"{"id":2,"method":"Counter.add","params":{"amount":2}}"#).is_some());
    }

    #[test]
    fn test_supports() {
        let router = router();
        assert!(router.supports("Counter.add"));
        assert!(!router.supports("Counter.reset"));
        assert!(!router.supports("Runtime.enable"));
    }
}
