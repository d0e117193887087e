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

//! Connection lifecycle: rejected frames, isolation and shutdown

use std::time::Duration;

use cdp_bridge_integration_tests::test_utils::{client::CdpClient, init, server};
use serde_json::json;
use tokio_tungstenite::tungstenite::{protocol::frame::coding::CloseCode, Message};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_frame_closes_only_that_connection() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    let mut bad = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    let mut good = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    good.call("Runtime.enable", json!({})).await.unwrap();

    bad.send_raw(Message::binary(vec![0x01, 0x02, 0x03])).await.unwrap();
    let frame = bad.closed().await.unwrap().expect("close frame");
    assert_eq!(frame.code, CloseCode::Unsupported);
    assert_eq!(u16::from(frame.code), 1003);

    let result = good.call("Debugger.disable", json!({})).await.unwrap();
    assert_eq!(result, json!({}));

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_responses_stay_on_their_connection() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    let mut low = CdpClient::connect(&bridge.websocket_url()).await.unwrap();
    let mut high = CdpClient::connect(&bridge.websocket_url()).await.unwrap().with_first_id(1000);

    let mut low_ids = Vec::new();
    let mut high_ids = Vec::new();
    for _ in 0..5 {
        low_ids.push(low.send("Runtime.enable", json!({})).await.unwrap());
        high_ids.push(high.send("Debugger.disable", json!({})).await.unwrap());
    }
    assert_eq!(high_ids, vec![1000, 1001, 1002, 1003, 1004]);

    // `response` fails on any id other than the one awaited, so each client
    // sees exactly its own responses, in order.
    for id in high_ids {
        assert_eq!(high.response(id).await.unwrap(), json!({}));
    }
    for id in low_ids {
        assert_eq!(low.response(id).await.unwrap(), json!({}));
    }
    assert!(low.is_silent_for(Duration::from_millis(200)).await);
    assert!(high.is_silent_for(Duration::from_millis(200)).await);

    bridge.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_closes_every_connection() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    let url = bridge.websocket_url();

    let mut clients = Vec::new();
    for _ in 0..3 {
        let mut client = CdpClient::connect(&url).await.unwrap();
        client.call("Runtime.enable", json!({})).await.unwrap();
        clients.push(client);
    }
    assert_eq!(bridge.server.as_ref().unwrap().connection_count(), 3);

    let shutdown = tokio::spawn(async move {
        bridge.shutdown().await.unwrap();
        bridge
    });
    for client in &mut clients {
        let frame = client.closed().await.unwrap().expect("close frame");
        assert_eq!(frame.code, CloseCode::Away);
    }
    let bridge = shutdown.await.unwrap();
    assert!(bridge.server.is_none());

    assert!(CdpClient::connect(&url).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_port_in_use_is_a_startup_error() {
    init::init_test_environment();
    let mut bridge = server::start_bridge(false).await.unwrap();
    let port = bridge.server.as_ref().unwrap().port();

    let config = cdp_bridge::BridgeConfig::default().with_port(port);
    let engine = std::sync::Arc::new(cdp_bridge_integration_tests::mock::MockEngine::new());
    let agent = cdp_bridge::DebugAgent::new(engine, config);
    assert!(agent.serve().await.is_err());

    bridge.shutdown().await.unwrap();
}
