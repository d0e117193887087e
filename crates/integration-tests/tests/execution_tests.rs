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

//! Pausing, stepping and inspecting a halted engine thread

use std::{sync::Arc, thread, time::Duration};

use cdp_bridge::{JsValue, PauseType, StepMode};
use cdp_bridge_integration_tests::{
    mock::{debug_info, frame, MockAst, MockObject},
    test_utils::{client::CdpClient, init, server},
};
use serde_json::json;

const MAIN: &str = "let x = 1;\nlet y = x + 1;\nconsole.log(y);\n";

fn setup(bridge: &server::TestBridge) {
    bridge.agent.on_parsed("main", "file:///main.js", MAIN, Arc::new(MockAst::parse(MAIN)));
}

/// Run one step hook at `line` on a dedicated engine thread.
fn step_at(bridge: &server::TestBridge, line: u32) -> thread::JoinHandle<StepMode> {
    let agent = bridge.agent.clone();
    thread::spawn(move || {
        agent.on_step(debug_info(
            PauseType::Step,
            vec![frame("main", line, 0, vec![("x", JsValue::Number(1.0))])],
        ))
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_on_start_and_resume() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(true).await.unwrap();
    setup(&bridge);
    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    client.call("Debugger.enable", json!({})).await.unwrap();

    let engine_thread = step_at(&bridge, 1);
    let paused = client.next_event("Debugger.paused").await.unwrap();
    assert_eq!(paused["reason"], "other");
    assert_eq!(paused["callFrames"][0]["callFrameId"], "0");
    assert_eq!(paused["callFrames"][0]["url"], "file:///main.js");
    assert_eq!(
        paused["callFrames"][0]["location"],
        json!({ "scriptId": "1", "lineNumber": 0, "columnNumber": 0 })
    );
    assert!(bridge.agent.coordinator().is_halted());

    client.call("Debugger.resume", json!({})).await.unwrap();
    client.next_event("Debugger.resumed").await.unwrap();
    assert_eq!(engine_thread.join().unwrap(), StepMode::Into);

    // Disarmed: the next statement runs without halting.
    assert_eq!(step_at(&bridge, 2).join().unwrap(), StepMode::Into);
    assert!(client.is_silent_for(Duration::from_millis(200)).await);

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_step_commands_release_with_their_mode() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(true).await.unwrap();
    setup(&bridge);
    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    client.call("Runtime.enable", json!({})).await.unwrap();

    for (line, method, mode) in [
        (1, "Debugger.stepOver", StepMode::Over),
        (2, "Debugger.stepInto", StepMode::Into),
        (3, "Debugger.stepOut", StepMode::Out),
    ] {
        let engine_thread = step_at(&bridge, line);
        let paused = client.next_event("Debugger.paused").await.unwrap();
        assert_eq!(paused["callFrames"][0]["location"]["lineNumber"], line - 1);

        client.call(method, json!({})).await.unwrap();
        client.next_event("Debugger.resumed").await.unwrap();
        assert_eq!(engine_thread.join().unwrap(), mode);
    }

    // Still armed after stepping; resume releases for good.
    let engine_thread = step_at(&bridge, 3);
    client.next_event("Debugger.paused").await.unwrap();
    client.call("Debugger.resume", json!({})).await.unwrap();
    engine_thread.join().unwrap();
    assert!(!bridge.agent.coordinator().is_armed());

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resume_while_running_is_ignored() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    setup(&bridge);
    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();

    client.call("Debugger.resume", json!({})).await.unwrap();
    client.call("Debugger.stepOver", json!({})).await.unwrap();
    assert_eq!(step_at(&bridge, 1).join().unwrap(), StepMode::Into);

    // An explicit pause request halts the next statement.
    client.call("Debugger.pause", json!({})).await.unwrap();
    let engine_thread = step_at(&bridge, 2);
    let paused = client.next_event("Debugger.paused").await.unwrap();
    assert_eq!(paused["reason"], "debugCommand");

    client.call("Debugger.resume", json!({})).await.unwrap();
    assert_eq!(engine_thread.join().unwrap(), StepMode::Into);

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_breakpoint_hit_reports_breakpoint_ids() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    setup(&bridge);
    let mut first = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    let mut second = CdpClient::connect(&bridge.websocket_url()).await.unwrap();

    let result = first
        .call("Debugger.setBreakpoint", json!({ "location": { "scriptId": "1", "lineNumber": 1 } }))
        .await
        .unwrap();
    let id = result["breakpointId"].clone();
    second.call("Runtime.enable", json!({})).await.unwrap();

    let agent = bridge.agent.clone();
    let engine_thread = thread::spawn(move || {
        agent.on_break(debug_info(PauseType::Breakpoint, vec![frame("main", 2, 0, Vec::new())]))
    });

    for client in [&mut first, &mut second] {
        let paused = client.next_event("Debugger.paused").await.unwrap();
        assert_eq!(paused["reason"], "other");
        assert_eq!(paused["hitBreakpoints"], json!([id]));
    }

    second.call("Debugger.resume", json!({})).await.unwrap();
    for client in [&mut first, &mut second] {
        client.next_event("Debugger.resumed").await.unwrap();
    }
    assert_eq!(engine_thread.join().unwrap(), StepMode::Into);

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_inspect_paused_frame() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(true).await.unwrap();
    setup(&bridge);

    let prototype = MockObject::plain("Object").with_property("inherited", JsValue::Boolean(true));
    let point = MockObject::new(cdp_bridge::ObjectClass::Plain, "Point", "Point", Some(prototype))
        .with_property("x", JsValue::Number(1.5))
        .with_property("y", JsValue::Number(f64::NAN));
    bridge.engine.on_evaluate("point", JsValue::Object(point));
    bridge.engine.on_evaluate_throw("boom()", "boom");

    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    let evaluate = |expression: &str| {
        json!({ "callFrameId": "0", "expression": expression, "objectGroup": "console" })
    };

    // Nothing to evaluate in while running.
    let running = client.call("Debugger.evaluateOnCallFrame", evaluate("point")).await.unwrap();
    assert_eq!(running, json!({}));

    let engine_thread = step_at(&bridge, 1);
    let paused = client.next_event("Debugger.paused").await.unwrap();

    let scope_id = paused["callFrames"][0]["scopeChain"][0]["object"]["objectId"].clone();
    assert_eq!(paused["callFrames"][0]["scopeChain"][0]["type"], "local");
    let scope = client.call("Runtime.getProperties", json!({ "objectId": scope_id })).await.unwrap();
    assert_eq!(scope["result"][0]["name"], "x");
    assert_eq!(scope["result"][0]["value"], json!({ "type": "number", "value": 1, "description": "1" }));

    let result = client.call("Debugger.evaluateOnCallFrame", evaluate("point")).await.unwrap();
    assert_eq!(result["result"]["type"], "object");
    assert_eq!(result["result"]["className"], "Point");
    assert!(result.get("exceptionDetails").is_none());
    let point_id = result["result"]["objectId"].clone();

    let properties =
        client.call("Runtime.getProperties", json!({ "objectId": point_id })).await.unwrap();
    let names: Vec<_> =
        properties["result"].as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
    assert_eq!(names, vec![json!("x"), json!("y"), json!("inherited")]);
    assert_eq!(properties["result"][1]["value"]["unserializableValue"], "NaN");
    assert_eq!(properties["result"][2]["isOwn"], false);

    let own = client
        .call("Runtime.getProperties", json!({ "objectId": point_id, "ownProperties": true }))
        .await
        .unwrap();
    assert_eq!(own["result"].as_array().unwrap().len(), 2);
    assert_eq!(own["internalProperties"][0]["name"], "[[Prototype]]");

    let thrown = client.call("Debugger.evaluateOnCallFrame", evaluate("boom()")).await.unwrap();
    assert_eq!(thrown["exceptionDetails"]["text"], "Uncaught Error: boom");
    assert_eq!(thrown["result"]["subtype"], "error");

    let other_frame = client
        .call(
            "Debugger.evaluateOnCallFrame",
            json!({ "callFrameId": "1", "expression": "point" }),
        )
        .await
        .unwrap();
    assert_eq!(
        other_frame["result"]["value"],
        "<evaluation on non-top call frames not supported yet>"
    );

    let unscripted = client.call("Debugger.evaluateOnCallFrame", evaluate("nope")).await.unwrap();
    assert_eq!(unscripted, json!({}));

    // Released objects are gone.
    client.call("Runtime.releaseObjectGroup", json!({ "objectGroup": "console" })).await.unwrap();
    let released = client.call("Runtime.getProperties", json!({ "objectId": point_id })).await.unwrap();
    assert_eq!(released, json!({}));

    client.call("Debugger.resume", json!({})).await.unwrap();
    engine_thread.join().unwrap();

    // Scope ids die with the pause.
    let stale = client.call("Runtime.getProperties", json!({ "objectId": scope_id })).await.unwrap();
    assert_eq!(stale, json!({}));

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_if_waiting_for_debugger() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();

    let agent = bridge.agent.clone();
    let host = thread::spawn(move || agent.wait_for_debugger(Some(Duration::from_secs(5))));

    let mut client = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    client.call("Runtime.runIfWaitingForDebugger", json!({})).await.unwrap();
    assert!(host.join().unwrap());

    bridge.shutdown().await.unwrap();
}
