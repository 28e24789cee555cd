//! Integration tests for the sendora-core method-channel protocol.
//!
//! These drive the domain state machines through a short session and check
//! the JSON lines a consumer would see, exercising the decoder, the
//! controllers and the event encoder together.

use sendora_core::{
    decode_call, encode_event, encode_response,
    protocol::messages::{MethodResponse, ReplyPayload},
    Command, CommandError, ConnectDecision, ConnectionController, ConnectionInfo, DeviceAddress,
    Event, Peer, PeerRegistry,
};
use serde_json::{json, Value};

fn parse(line: &str) -> Value {
    serde_json::from_str(line).expect("encoded frame must be valid JSON")
}

#[test]
fn test_connect_request_decodes_to_command() {
    let call = decode_call(r#"{"id":7,"method":"connectToPeer","arguments":{"address":"AA:BB"}}"#)
        .expect("well-formed call");

    let command = Command::from_call(&call).expect("known method");

    assert_eq!(
        command,
        Command::ConnectToPeer {
            address: "AA:BB".to_string()
        }
    );
}

#[test]
fn test_peer_snapshot_is_reported_in_address_order() {
    let mut registry = PeerRegistry::new();
    let snapshot = vec![
        Peer::new(DeviceAddress::parse("cc:dd").unwrap(), "C"),
        Peer::new(DeviceAddress::parse("aa:bb").unwrap(), "B"),
    ];

    let diff = registry.replace_snapshot(snapshot);
    assert!(!diff.is_empty());
    let line = encode_event(&Event::PeersAvailable {
        peers: registry.current_peers(),
    })
    .unwrap();

    assert_eq!(
        parse(&line),
        json!({
            "event": "onPeersAvailable",
            "arguments": [
                {"name": "B", "address": "aa:bb"},
                {"name": "C", "address": "cc:dd"}
            ]
        })
    );
}

#[test]
fn test_connect_then_group_formed_produces_on_connected() {
    let mut controller = ConnectionController::new();

    let decision = controller.connect("aa:bb").unwrap();
    let token = match decision {
        ConnectDecision::Initiate { token, .. } => token,
        other => panic!("expected a new attempt, got {other:?}"),
    };
    controller.on_connect_result(token, Ok(()));
    let changed = controller
        .on_connection_info(&ConnectionInfo::formed(false, "aa:bb"))
        .expect("state must change");

    assert_eq!(changed.status_line(), "Connected to aa:bb");
    let line = encode_event(&Event::Connected {
        address: "aa:bb".to_string(),
    })
    .unwrap();
    assert_eq!(parse(&line), json!({"event": "onConnected", "arguments": "aa:bb"}));
}

#[test]
fn test_invalid_address_response_carries_stable_code() {
    let mut controller = ConnectionController::new();

    let result = controller
        .connect("")
        .map(|_| ReplyPayload::Text("Connecting to peer".to_string()))
        .map_err(CommandError::from);
    let line = encode_response(&MethodResponse::from_result(Some(4), result)).unwrap();

    let value = parse(&line);
    assert_eq!(value["id"], json!(4));
    assert_eq!(value["success"], json!(false));
    assert_eq!(value["error"]["code"], json!("INVALID_ADDRESS"));
    assert_eq!(controller.status().status_line(), "Not connected");
}

#[test]
fn test_disconnected_event_has_no_arguments() {
    let line = encode_event(&Event::Disconnected).unwrap();
    assert_eq!(line, r#"{"event":"onDisconnected"}"#);
}

#[test]
fn test_malformed_line_is_rejected_with_code() {
    let err = decode_call("{\"method\":").unwrap_err();
    assert_eq!(err.code(), "MALFORMED_REQUEST");
}
