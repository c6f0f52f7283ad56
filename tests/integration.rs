//! Integration tests for presence-ipc.
//!
//! These tests run a connection against a real Unix Domain Socket server.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use presence_ipc::activity::Activity;
use presence_ipc::codec::PacketCodec;
use presence_ipc::handler::{Capability, HandlerRegistry, PacketHandler};
use presence_ipc::packet::{HandshakePacket, SetActivityPacket};
use presence_ipc::protocol::{build_frame, opcodes, FrameBuffer, Header, HEADER_SIZE};
use presence_ipc::{Connection, IpcError, Packet, ReadMode, SocketListener};
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug)]
enum Event {
    Packet(Packet),
    Closed(String),
}

struct ChannelListener(mpsc::UnboundedSender<Event>);

impl SocketListener for ChannelListener {
    fn on_packet(&self, packet: Packet) {
        let _ = self.0.send(Event::Packet(packet));
    }

    fn on_closed(&self, reason: &str) {
        let _ = self.0.send(Event::Closed(reason.to_string()));
    }
}

/// A bound socket at `{tmp}/discord-ipc-0`.
struct Server {
    _dir: TempDir,
    endpoint: PathBuf,
    listener: UnixListener,
}

impl Server {
    fn bind() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = dir.path().join("discord-ipc-0");
        let listener = UnixListener::bind(&endpoint).unwrap();
        Self {
            _dir: dir,
            endpoint,
            listener,
        }
    }

    async fn accept(&self) -> UnixStream {
        let (stream, _) = tokio::time::timeout(WAIT, self.listener.accept())
            .await
            .expect("timed out waiting for client")
            .unwrap();
        stream
    }
}

async fn read_frame(stream: &mut UnixStream) -> (u32, Vec<u8>) {
    let mut header = [0u8; HEADER_SIZE];
    stream.read_exact(&mut header).await.unwrap();
    let header = Header::decode(&header).unwrap();
    let mut payload = vec![0u8; header.payload_length as usize];
    stream.read_exact(&mut payload).await.unwrap();
    (header.opcode, payload)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for listener event")
        .expect("listener channel closed")
}

fn listening_connection(endpoint: &Path) -> (Connection, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connection = Connection::builder()
        .endpoint(endpoint)
        .listener(ChannelListener(tx))
        .build();
    (connection, rx)
}

/// Handshake arrives at the server byte-for-byte.
#[tokio::test]
async fn test_handshake_reaches_server() {
    let server = Server::bind();
    let (connection, _rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;

    connection.handshake("42424242").await.unwrap();

    let (opcode, payload) = read_frame(&mut peer).await;
    assert_eq!(opcode, opcodes::HANDSHAKE);
    assert_eq!(payload, br#"{"client_id":"42424242","v":1}"#);
}

/// Full activity update carries pid, nonce and nested activity.
#[tokio::test]
async fn test_set_activity_reaches_server() {
    let server = Server::bind();
    let (connection, _rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;

    let activity = Activity::new("Editing", "main.rs")
        .with_timestamps(1_700_000_000, None)
        .with_large_image("logo", Some("Logo"))
        .with_party("party-1", 1, 4)
        .with_button("Site", "https://example.com");
    connection
        .send(&SetActivityPacket::new(4242, Some(activity)).with_nonce("7").into())
        .await
        .unwrap();

    let (opcode, payload) = read_frame(&mut peer).await;
    assert_eq!(opcode, opcodes::FRAME);

    let payload: Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(payload["cmd"], "SET_ACTIVITY");
    assert_eq!(payload["nonce"], "7");
    assert_eq!(payload["args"]["pid"], 4242);

    let activity = &payload["args"]["activity"];
    assert_eq!(activity["details"], "Editing");
    assert_eq!(activity["timestamps"], json!({ "start": 1_700_000_000 }));
    assert_eq!(activity["assets"]["large_image"], "logo");
    assert_eq!(activity["party"]["size"], json!([1, 4]));
    assert_eq!(activity["buttons"][0]["url"], "https://example.com");
    assert!(activity.get("secrets").is_none());
}

/// Server frames are decoded and delivered in order.
#[tokio::test]
async fn test_server_packets_delivered() {
    let server = Server::bind();
    let (connection, mut rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;

    let ready = json!({ "cmd": "DISPATCH", "evt": "READY", "data": { "v": 1 } });
    peer.write_all(&build_frame(opcodes::FRAME, &serde_json::to_vec(&ready).unwrap()))
        .await
        .unwrap();

    match next_event(&mut rx).await {
        Event::Packet(Packet::Dispatch(packet)) => {
            assert_eq!(packet.command, "DISPATCH");
            assert_eq!(packet.event.as_deref(), Some("READY"));
            assert_eq!(packet.data.get("v"), Some(&json!(1)));
        }
        other => panic!("expected dispatch, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    peer.write_all(&build_frame(
        opcodes::CLOSE,
        br#"{"code":4000,"message":"Invalid Client ID"}"#,
    ))
    .await
    .unwrap();

    match next_event(&mut rx).await {
        Event::Packet(Packet::Error(packet)) => {
            assert_eq!(packet.code, 4000);
            assert_eq!(packet.message, "Invalid Client ID");
        }
        other => panic!("expected error packet, got {other:?}"),
    }
}

/// Server hang-up notifies the listener exactly once.
#[tokio::test]
async fn test_server_close_notifies_once() {
    let server = Server::bind();
    let (connection, mut rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let peer = server.accept().await;
    drop(peer);

    assert!(matches!(next_event(&mut rx).await, Event::Closed(_)));
    assert!(!connection.is_connected());

    // A send racing the teardown must not produce a second notification
    let _ = connection.handshake("42424242").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

/// Explicit disconnect closes the socket without notifying.
#[tokio::test]
async fn test_disconnect_closes_socket() {
    let server = Server::bind();
    let (connection, mut rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;

    connection.disconnect().await.unwrap();

    let mut buf = [0u8; 1];
    let n = tokio::time::timeout(WAIT, peer.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
    assert!(matches!(
        connection.disconnect().await,
        Err(IpcError::NotConnected)
    ));
}

/// Reconnecting after disconnect opens a fresh socket.
#[tokio::test]
async fn test_reconnect() {
    let server = Server::bind();
    let (connection, _rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let _first = server.accept().await;
    connection.disconnect().await.unwrap();

    connection.connect().await.unwrap();
    let mut second = server.accept().await;
    connection.handshake("42424242").await.unwrap();

    assert_eq!(read_frame(&mut second).await.0, opcodes::HANDSHAKE);
}

/// Connection shared across tasks keeps frames whole.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_do_not_interleave() {
    let server = Server::bind();
    let (connection, _rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;
    let connection = Arc::new(connection);

    let mut tasks = Vec::new();
    for i in 0..8 {
        let connection = connection.clone();
        tasks.push(tokio::spawn(async move {
            for j in 0..10 {
                connection
                    .handshake(format!("client-{i}-{j}"))
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut frames = FrameBuffer::new();
    let mut received = Vec::new();
    let mut buf = vec![0u8; 4096];
    while received.len() < 80 {
        let n = tokio::time::timeout(WAIT, peer.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        received.extend(frames.push(&buf[..n]).unwrap());
    }

    for frame in &received {
        assert_eq!(frame.opcode(), opcodes::HANDSHAKE);
        let payload: Value = serde_json::from_slice(frame.payload()).unwrap();
        assert!(payload["client_id"].as_str().unwrap().starts_with("client-"));
    }
}

/// A frame larger than the read buffer arrives whole, and the frame behind it
/// is not lost.
#[tokio::test]
async fn test_large_frame_over_socket() {
    let server = Server::bind();
    let (connection, mut rx) = listening_connection(&server.endpoint);

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;

    let blob = "x".repeat(100 * 1024);
    let join = json!({ "cmd": "DISPATCH", "evt": "ACTIVITY_JOIN", "data": { "secret": blob } });
    let mut bytes = build_frame(opcodes::FRAME, &serde_json::to_vec(&join).unwrap());
    assert!(bytes.len() > presence_ipc::DEFAULT_READ_BUFFER_SIZE);
    bytes.extend(build_frame(
        opcodes::CLOSE,
        br#"{"code":4000,"message":"Invalid Client ID"}"#,
    ));
    peer.write_all(&bytes).await.unwrap();

    match next_event(&mut rx).await {
        Event::Packet(Packet::Dispatch(packet)) => {
            assert_eq!(packet.data.get("secret"), Some(&json!(blob)));
        }
        other => panic!("expected dispatch, got {other:?}"),
    }
    match next_event(&mut rx).await {
        Event::Packet(Packet::Error(packet)) => assert_eq!(packet.code, 4000),
        other => panic!("expected error packet, got {other:?}"),
    }
    assert!(connection.is_connected());
}

/// Length-delimited reads split coalesced server frames.
#[tokio::test]
async fn test_length_delimited_over_socket() {
    let server = Server::bind();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection = Connection::builder()
        .endpoint(&server.endpoint)
        .read_mode(ReadMode::LengthDelimited)
        .listener(ChannelListener(tx))
        .build();

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;

    let mut bytes = Vec::new();
    for evt in ["READY", "ACTIVITY_JOIN"] {
        let payload = json!({ "cmd": "DISPATCH", "evt": evt, "data": {} });
        bytes.extend(build_frame(opcodes::FRAME, &serde_json::to_vec(&payload).unwrap()));
    }
    peer.write_all(&bytes).await.unwrap();

    for expected in ["READY", "ACTIVITY_JOIN"] {
        match next_event(&mut rx).await {
            Event::Packet(Packet::Dispatch(packet)) => {
                assert_eq!(packet.event.as_deref(), Some(expected))
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
    }
}

/// Handshake handler that can also decode, so the server side can reuse it.
struct EchoHandshake;

impl PacketHandler for EchoHandshake {
    fn opcode(&self) -> u32 {
        opcodes::HANDSHAKE
    }

    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Encode, Capability::Decode]
    }

    fn encode(&self, packet: &Packet) -> Option<Value> {
        match packet {
            Packet::Handshake(handshake) => Some(json!({
                "v": handshake.version,
                "client_id": handshake.client_id,
            })),
            _ => None,
        }
    }

    fn decode(&self, payload: &Map<String, Value>) -> Option<Packet> {
        let client_id = payload.get("client_id")?.as_str()?;
        Some(HandshakePacket::new(client_id).into())
    }
}

/// Custom registry replaces the built-in handler set on both ends.
#[tokio::test]
async fn test_custom_registry() {
    let server = Server::bind();
    let mut registry = HandlerRegistry::empty();
    registry.register(Box::new(EchoHandshake)).unwrap();
    let server_codec = PacketCodec::with_registry(registry);

    let mut client_registry = HandlerRegistry::empty();
    client_registry.register(Box::new(EchoHandshake)).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection = Connection::builder()
        .endpoint(&server.endpoint)
        .registry(client_registry)
        .listener(ChannelListener(tx))
        .build();

    connection.connect().await.unwrap();
    let mut peer = server.accept().await;

    // No SetActivity encoder in this registry
    assert!(matches!(
        connection.set_activity(None).await,
        Err(IpcError::Unencodable(1))
    ));

    connection.handshake("42424242").await.unwrap();
    let (opcode, payload) = read_frame(&mut peer).await;
    let mut frame = build_frame(opcode, &payload);
    let decoded = server_codec.decode(&frame).unwrap();
    assert_eq!(decoded, Some(HandshakePacket::new("42424242").into()));

    // Echo it back; the client decodes handshakes with this registry
    frame = server_codec.encode(&decoded.unwrap()).unwrap().unwrap();
    peer.write_all(&frame).await.unwrap();
    match next_event(&mut rx).await {
        Event::Packet(Packet::Handshake(packet)) => assert_eq!(packet.client_id, "42424242"),
        other => panic!("expected handshake, got {other:?}"),
    }
}
