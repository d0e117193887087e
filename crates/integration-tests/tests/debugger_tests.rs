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

//! Script and breakpoint management over a live WebSocket session

use std::{sync::Arc, time::Duration};

use cdp_bridge::BreakPoint;
use cdp_bridge_integration_tests::{
    mock::MockAst,
    test_utils::{client::CdpClient, init, server},
};
use serde_json::{json, Value};

const MAIN: &str = "let a = 1;\nfunction f() {\n  return a;\n}\nf();\n";
const LIB: &str = "export const b = 2;\n";

fn parse(bridge: &server::TestBridge, key: &str, url: &str, text: &str) {
    bridge.agent.on_parsed(key, url, text, Arc::new(MockAst::parse(text)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_enable_announces_parsed_scripts() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    parse(&bridge, "main", "file:///main.js", MAIN);
    parse(&bridge, "lib", "file:///lib.js", LIB);

    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    let result = client.call("Debugger.enable", json!({})).await.unwrap();
    assert_eq!(result["debuggerId"], bridge.agent.debugger_id());

    let first = client.next_event("Debugger.scriptParsed").await.unwrap();
    assert_eq!(first["scriptId"], "1");
    assert_eq!(first["url"], "file:///main.js");
    assert_eq!(first["startLine"], 0);
    assert_eq!(first["endLine"], 5);
    assert_eq!(first["endColumn"], 0);
    assert_eq!(first["executionContextId"], 1);
    assert_eq!(first["length"], MAIN.len());
    assert!(first["hash"].as_str().is_some_and(|hash| !hash.is_empty()));

    let second = client.next_event("Debugger.scriptParsed").await.unwrap();
    assert_eq!(second["scriptId"], "2");
    assert_eq!(second["url"], "file:///lib.js");

    // A second enable replays the known scripts to the caller.
    client.call("Debugger.enable", json!({})).await.unwrap();
    assert_eq!(client.next_event("Debugger.scriptParsed").await.unwrap()["scriptId"], "1");
    assert_eq!(client.next_event("Debugger.scriptParsed").await.unwrap()["scriptId"], "2");
    assert!(client.is_silent_for(Duration::from_millis(200)).await);

    // Scripts parsed while enabled are announced as they arrive.
    parse(&bridge, "late", "file:///late.js", "late();\n");
    let late = client.next_event("Debugger.scriptParsed").await.unwrap();
    assert_eq!(late["scriptId"], "3");

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_enable_announces_existing_scripts_to_each_client() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    parse(&bridge, "main", "file:///main.js", MAIN);

    let mut first = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    first.call("Debugger.enable", json!({})).await.unwrap();
    assert_eq!(first.next_event("Debugger.scriptParsed").await.unwrap()["scriptId"], "1");

    let mut second = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    second.call("Debugger.enable", json!({})).await.unwrap();
    let announced = second.next_event("Debugger.scriptParsed").await.unwrap();
    assert_eq!(announced["scriptId"], "1");
    assert_eq!(announced["url"], "file:///main.js");

    // The replay goes to the requester only.
    assert!(first.is_silent_for(Duration::from_millis(200)).await);

    // Scripts parsed afterwards reach both clients once.
    parse(&bridge, "lib", "file:///lib.js", LIB);
    assert_eq!(first.next_event("Debugger.scriptParsed").await.unwrap()["scriptId"], "2");
    assert_eq!(second.next_event("Debugger.scriptParsed").await.unwrap()["scriptId"], "2");

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_script_source_and_possible_breakpoints() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    parse(&bridge, "main", "file:///main.js", MAIN);
    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();

    let source = client.call("Debugger.getScriptSource", json!({ "scriptId": "1" })).await.unwrap();
    assert_eq!(source["scriptSource"], MAIN);

    let unknown = client.call("Debugger.getScriptSource", json!({ "scriptId": "42" })).await.unwrap();
    assert_eq!(unknown, json!({}));

    let possible = client
        .call(
            "Debugger.getPossibleBreakpoints",
            json!({
                "start": { "scriptId": "1", "lineNumber": 1 },
                "end": { "scriptId": "1", "lineNumber": 3, "columnNumber": 0 },
            }),
        )
        .await
        .unwrap();
    assert_eq!(
        possible["locations"],
        json!([
            { "scriptId": "1", "lineNumber": 1, "columnNumber": 0 },
            { "scriptId": "1", "lineNumber": 2, "columnNumber": 2 },
            { "scriptId": "1", "lineNumber": 3, "columnNumber": 0, "type": "return" },
        ])
    );

    let whole = client
        .call("Debugger.getPossibleBreakpoints", json!({ "start": { "scriptId": "1", "lineNumber": 0 } }))
        .await
        .unwrap();
    assert_eq!(whole["locations"].as_array().unwrap().len(), 5);

    let mismatched = client
        .call(
            "Debugger.getPossibleBreakpoints",
            json!({
                "start": { "scriptId": "1", "lineNumber": 0 },
                "end": { "scriptId": "2", "lineNumber": 0 },
            }),
        )
        .await
        .unwrap();
    assert_eq!(mismatched, json!({}));

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_set_and_remove_breakpoint() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    parse(&bridge, "main", "file:///main.js", MAIN);
    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();

    let result = client
        .call(
            "Debugger.setBreakpoint",
            json!({ "location": { "scriptId": "1", "lineNumber": 1, "columnNumber": 5 } }),
        )
        .await
        .unwrap();
    assert_eq!(result["breakpointId"], "1");
    assert_eq!(result["actualLocation"], json!({ "scriptId": "1", "lineNumber": 2, "columnNumber": 2 }));
    assert_eq!(
        bridge.engine.breakpoints(),
        vec![BreakPoint { source_key: "main".into(), line: 3, column: 2, condition: None }]
    );

    let removed = client.call("Debugger.removeBreakpoint", json!({ "breakpointId": "1" })).await.unwrap();
    assert_eq!(removed, json!({}));
    assert!(bridge.engine.breakpoints().is_empty());

    // Past the last location clamps to it.
    let clamped = client
        .call(
            "Debugger.setBreakpoint",
            json!({ "location": { "scriptId": "1", "lineNumber": 99 }, "condition": "a > 0" }),
        )
        .await
        .unwrap();
    assert_eq!(clamped["actualLocation"], json!({ "scriptId": "1", "lineNumber": 4, "columnNumber": 0 }));
    assert_eq!(bridge.engine.breakpoints()[0].condition.as_deref(), Some("a > 0"));

    client.call("Debugger.setBreakpointsActive", json!({ "active": false })).await.unwrap();
    assert!(!bridge.engine.breakpoints_active());

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_breakpoint_by_url_binds_later_scripts() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    client.call("Debugger.enable", json!({})).await.unwrap();

    let result = client
        .call("Debugger.setBreakpointByUrl", json!({ "lineNumber": 2, "url": "file:///main.js" }))
        .await
        .unwrap();
    let id = result["breakpointId"].as_str().unwrap().to_string();
    assert_eq!(result["locations"], json!([]));
    assert!(bridge.engine.breakpoints().is_empty());

    parse(&bridge, "main", "file:///main.js", MAIN);
    parse(&bridge, "other", "file:///other.js", MAIN);

    let resolved = client.next_event("Debugger.breakpointResolved").await.unwrap();
    assert_eq!(resolved["breakpointId"], id.as_str());
    assert_eq!(resolved["location"], json!({ "scriptId": "1", "lineNumber": 2, "columnNumber": 2 }));
    assert_eq!(bridge.engine.breakpoints().len(), 1);

    // Regex matches both scripts, which are already parsed.
    let result = client
        .call("Debugger.setBreakpointByUrl", json!({ "lineNumber": 0, "urlRegex": "\\.js$" }))
        .await
        .unwrap();
    assert_eq!(result["locations"].as_array().unwrap().len(), 2);
    assert_eq!(bridge.engine.breakpoints().len(), 3);

    let removed_id = result["breakpointId"].clone();
    client.call("Debugger.removeBreakpoint", json!({ "breakpointId": removed_id })).await.unwrap();
    assert_eq!(bridge.engine.breakpoints().len(), 1);

    let invalid = client
        .call("Debugger.setBreakpointByUrl", json!({ "lineNumber": 0, "urlRegex": "(" }))
        .await
        .unwrap();
    assert_eq!(invalid, json!({}));

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_undispatchable_requests_get_no_response() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    parse(&bridge, "main", "file:///main.js", MAIN);
    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();

    client.send("Debugger.bogus", json!({})).await.unwrap();
    client.send("Profiler.enable", json!({})).await.unwrap();
    client.send("Debugger.getScriptSource", json!({ "scriptId": 1 })).await.unwrap();
    client
        .send_raw(tokio_tungstenite::tungstenite::Message::text("not json"))
        .await
        .unwrap();

    // The next response must be for this request, not for any of the above.
    let source = client.call("Debugger.getScriptSource", json!({ "scriptId": "1" })).await.unwrap();
    assert_eq!(source["scriptSource"], MAIN);

    let enabled = client.call("Runtime.enable", Value::Null).await.unwrap();
    assert_eq!(enabled, json!({}));

    bridge.shutdown().await.unwrap();
}
