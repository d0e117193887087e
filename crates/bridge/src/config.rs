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

//! Bridge configuration.

use std::{str::FromStr, time::Duration};

use cdp_bridge_common::env::{
    CDP_BRIDGE_FAVICON_URL, CDP_BRIDGE_HOST, CDP_BRIDGE_NAME, CDP_BRIDGE_PAUSE_ON_START,
    CDP_BRIDGE_PORT,
};
use eyre::{eyre, Result, WrapErr};

/// Default listen host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port, the conventional remote debugging port
pub const DEFAULT_PORT: u16 = 9222;

/// Default display name
pub const DEFAULT_NAME: &str = "CDP Bridge";

/// Default bound on a connection's close handshake during shutdown
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_millis(2500);

/// Configuration of a [`DebugAgent`](crate::agent::DebugAgent) and its server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Host to listen on, also used in advertised URLs
    pub host: String,
    /// Port to listen on; `0` picks an ephemeral port
    pub port: u16,
    /// Display name reported to clients
    pub name: String,
    /// Display version reported to clients
    pub version: String,
    /// Favicon advertised in the target list
    pub favicon_url: Option<String>,
    /// Halt on the first statement until a client resumes
    pub pause_on_start: bool,
    /// Bound on each connection's close handshake during shutdown
    pub close_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            favicon_url: None,
            pause_on_start: true,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl BridgeConfig {
    /// Defaults overlaid with the `CDP_BRIDGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup(CDP_BRIDGE_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(CDP_BRIDGE_PORT) {
            config.port = parse(CDP_BRIDGE_PORT, &port)?;
        }
        if let Some(name) = lookup(CDP_BRIDGE_NAME) {
            config.name = name;
        }
        if let Some(url) = lookup(CDP_BRIDGE_FAVICON_URL) {
            config.favicon_url = Some(url).filter(|url| !url.is_empty());
        }
        if let Some(flag) = lookup(CDP_BRIDGE_PAUSE_ON_START) {
            config.pause_on_start = parse_flag(&flag)
                .ok_or_else(|| eyre!("Invalid {CDP_BRIDGE_PAUSE_ON_START} value '{flag}'"))?;
        }
        Ok(config)
    }

    /// Set the listen host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the listen port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the display version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the favicon URL
    pub fn with_favicon_url(mut self, url: impl Into<String>) -> Self {
        self.favicon_url = Some(url.into());
        self
    }

    /// Enable or disable halting on the first statement
    pub fn with_pause_on_start(mut self, pause: bool) -> Self {
        self.pause_on_start = pause;
        self
    }

    /// Set the close handshake bound
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// `host:port` as advertised, with `port` overriding the configured one.
    pub fn authority(&self, port: u16) -> String {
        format!("{}:{}", self.host, port)
    }

    /// WebSocket URL of the debugger endpoint
    pub fn websocket_url(&self) -> String {
        format!("ws://{}/", self.authority(self.port))
    }

    /// HTTP URL of the discovery endpoint
    pub fn http_url(&self) -> String {
        format!("http://{}/", self.authority(self.port))
    }

    /// URL that opens the bundled DevTools frontend on this bridge
    pub fn devtools_frontend_url(&self) -> String {
        format!(
            "devtools://devtools/bundled/js_app.html?ws={}/&v8only=true",
            self.authority(self.port)
        )
    }

    /// Copy of this configuration advertising the actually bound `port`.
    pub fn bound_to(&self, port: u16) -> Self {
        Self { port, ..self.clone() }
    }
}

fn parse<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().wrap_err_with(|| format!("Invalid {name} value '{value}'"))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
