//! Integration tests for the JSON-lines method channel.
//!
//! A full node (auto-responding simulated radio, coordinator, dispatcher) is
//! served over an in-memory `tokio::io::duplex` pipe, and the tests talk to
//! it the way a consumer would: one JSON object per line.

use std::sync::Arc;
use std::time::Duration;

use sendora_core::DeviceAddress;
use sendora_node::application::coordinator::{Coordinator, CoordinatorHandle, CoordinatorOptions};
use sendora_node::application::dispatcher::{CommandDispatcher, CredentialPrefixes};
use sendora_node::application::event_bus::EventBus;
use sendora_node::infrastructure::channel::{serve, ChannelError};
use sendora_node::infrastructure::radio::{SimulatedRadio, SimulatedRadioConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

struct Client {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
    coordinator: CoordinatorHandle,
    server: JoinHandle<Result<(), ChannelError>>,
}

impl Client {
    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn next(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("node must answer within 5s")
            .expect("read must succeed")
            .expect("node closed the channel");
        serde_json::from_str(&line).expect("every line must be JSON")
    }

    async fn close(mut self) {
        // End of input for the node; the read half stays open until then.
        self.writer.shutdown().await.unwrap();
        let result = self.server.await.expect("server task must not panic");
        assert!(result.is_ok());
        self.coordinator.shutdown().await;
    }
}

fn start_node() -> Client {
    let radio = SimulatedRadio::new(SimulatedRadioConfig {
        peers: vec![("B".to_string(), DeviceAddress::parse("aa:bb").unwrap())],
        ..SimulatedRadioConfig::default()
    });
    let (bus, mut events) = EventBus::new(16);
    let (handle, _task) =
        Coordinator::spawn(Arc::new(radio), bus, CoordinatorOptions::default()).unwrap();
    let dispatcher = CommandDispatcher::new(handle.clone(), CredentialPrefixes::default());

    let (client, node) = tokio::io::duplex(4096);
    let (node_read, node_write) = tokio::io::split(node);
    let server =
        tokio::spawn(async move { serve(node_read, node_write, &dispatcher, &mut events).await });

    let (client_read, client_write) = tokio::io::split(client);
    Client {
        lines: BufReader::new(client_read).lines(),
        writer: client_write,
        coordinator: handle,
        server,
    }
}

#[tokio::test]
async fn test_discovery_and_connection_over_the_wire() {
    // Arrange
    let mut client = start_node();

    // Act / Assert: discovery
    client
        .send(r#"{"id":1,"method":"startDiscovery"}"#)
        .await;
    assert_eq!(
        client.next().await,
        json!({"id": 1, "success": true, "data": "Discovery started", "error": null})
    );
    assert_eq!(
        client.next().await,
        json!({"event": "onPeersAvailable", "arguments": [{"name": "B", "address": "aa:bb"}]})
    );

    // Status before connecting
    client
        .send(r#"{"id":2,"method":"checkConnectionStatus"}"#)
        .await;
    assert_eq!(client.next().await["data"], json!("Not connected"));

    // Connect
    client
        .send(r#"{"id":3,"method":"connectToPeer","arguments":{"address":"aa:bb"}}"#)
        .await;
    assert_eq!(client.next().await["data"], json!("Connecting to peer"));
    assert_eq!(
        client.next().await,
        json!({"event": "onConnected", "arguments": "aa:bb"})
    );

    client
        .send(r#"{"id":4,"method":"checkConnectionStatus"}"#)
        .await;
    assert_eq!(client.next().await["data"], json!("Connected to aa:bb"));

    client.close().await;
}

#[tokio::test]
async fn test_malformed_line_gets_error_without_id() {
    let mut client = start_node();

    client.send("{not json").await;
    let response = client.next().await;

    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["success"], json!(false));
    assert_eq!(response["error"]["code"], json!("MALFORMED_REQUEST"));

    // The channel keeps serving after a bad line.
    client
        .send(r#"{"id":9,"method":"stopDiscovery"}"#)
        .await;
    assert_eq!(client.next().await["data"], json!("Discovery stopped"));

    client.close().await;
}

#[tokio::test]
async fn test_invalid_and_unknown_requests_report_codes() {
    let mut client = start_node();

    client
        .send(r#"{"id":5,"method":"connectToPeer","arguments":{"address":""}}"#)
        .await;
    let invalid = client.next().await;
    client
        .send(r#"{"id":6,"method":"removeGroup"}"#)
        .await;
    let unknown = client.next().await;

    assert_eq!(invalid["id"], json!(5));
    assert_eq!(invalid["error"]["code"], json!("INVALID_ADDRESS"));
    assert_eq!(unknown["id"], json!(6));
    assert_eq!(unknown["error"]["code"], json!("NOT_IMPLEMENTED"));

    client.close().await;
}

#[tokio::test]
async fn test_generate_network_details_returns_object() {
    let mut client = start_node();

    client.send("").await;
    client
        .send(r#"{"id":7,"method":"generateNetworkDetails"}"#)
        .await;
    let response = client.next().await;

    assert_eq!(response["id"], json!(7));
    let ssid = response["data"]["ssid"].as_str().unwrap();
    let password = response["data"]["password"].as_str().unwrap();
    assert!(ssid.starts_with("Sendora_"));
    assert!(password.starts_with("Pass_"));
    assert_eq!(ssid.trim_start_matches("Sendora_"), password.trim_start_matches("Pass_"));

    client.close().await;
}
