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

//! HTTP discovery documents served at `/json/version` and `/json/list`.

use cdp_bridge_common::types::PROTOCOL_VERSION;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::BridgeConfig;

/// One debuggable target in `/json/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescription {
    /// Display name of the bridge
    pub description: String,
    /// Favicon URL, empty when unset
    pub fav_icon_url: String,
    /// URL opening the bundled DevTools frontend
    pub devtools_frontend_url: String,
    /// Target id
    pub id: String,
    /// Target title
    pub title: String,
    /// Target URL
    pub url: String,
    /// Target type, always `other`
    #[serde(rename = "type")]
    pub kind: String,
    /// Debugger endpoint
    pub web_socket_debugger_url: String,
}

/// Static discovery metadata of one bridge.
#[derive(Debug, Clone)]
pub struct Discovery {
    config: BridgeConfig,
    engine_name: String,
    engine_version: String,
    target_id: String,
}

impl Discovery {
    /// Create discovery metadata.
    pub fn new(
        config: BridgeConfig,
        engine_name: impl Into<String>,
        engine_version: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            config,
            engine_name: engine_name.into(),
            engine_version: engine_version.into(),
            target_id: target_id.into(),
        }
    }

    /// `/json/version` for a server bound to `port`.
    pub fn version(&self, port: u16) -> Value {
        let config = self.config.bound_to(port);
        let mut version = json!({
            "Browser": format!("{}/{}", config.name, config.version),
            "Protocol-Version": PROTOCOL_VERSION,
            "webSocketDebuggerUrl": config.websocket_url(),
        });
        version[format!("{}-Version", self.engine_name)] = Value::String(self.engine_version.clone());
        version
    }

    /// `/json/list` for a server bound to `port`.
    pub fn targets(&self, port: u16) -> Vec<TargetDescription> {
        let config = self.config.bound_to(port);
        vec![TargetDescription {
            description: config.name.clone(),
            fav_icon_url: config.favicon_url.clone().unwrap_or_default(),
            devtools_frontend_url: config.devtools_frontend_url(),
            id: self.target_id.clone(),
            title: format!("{} Script", self.engine_name),
            url: String::new(),
            kind: "other".to_string(),
            web_socket_debugger_url: config.websocket_url(),
        }]
    }

    /// Body served at `path`, if it is a discovery path.
    pub fn respond(&self, path: &str, port: u16) -> Option<String> {
        let body = match path {
            "/json/version" => self.version(port),
            "/json" | "/json/list" => serde_json::to_value(self.targets(port)).ok()?,
            _ => return None,
        };
        Some(body.to_string())
    }
}
