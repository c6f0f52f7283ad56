//! Connection lifecycle, background reader, and serialized writes.
//!
//! The [`ConnectionBuilder`] configures the endpoint, read strategy, handler
//! set and listener. The [`Connection`] then runs the lifecycle:
//! 1. Open the transport at endpoint index 0
//! 2. Spawn one background task that reads, decodes and delivers packets
//! 3. Write frames from the caller's task, one at a time
//! 4. Tear down on explicit disconnect or on the first I/O failure
//!
//! # Example
//!
//! ```ignore
//! use presence_ipc::{Activity, Connection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Connection::builder().listener(MyListener).build();
//!
//!     connection.connect().await?;
//!     connection.handshake("1234567890").await?;
//!     connection
//!         .set_activity(Some(Activity::new("Editing", "main.rs")))
//!         .await?;
//!
//!     connection.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Teardown
//!
//! Connection state is an atomic enum. Reader failure, writer failure and
//! `disconnect()` all race to swap `Connected -> Disconnected` while holding
//! the writer lock; only the winner closes the transport, and only an I/O
//! failure notifies [`SocketListener::on_closed`]. Each connection gets an
//! epoch so a reader from an older connection can never close a newer one.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::activity::Activity;
use crate::codec::PacketCodec;
use crate::error::{IpcError, Result};
use crate::handler::HandlerRegistry;
use crate::listener::SocketListener;
use crate::packet::{HandshakePacket, Packet, SetActivityPacket};
use crate::protocol::{FrameBuffer, Header, DEFAULT_MAX_PAYLOAD_SIZE, HEADER_SIZE};
use crate::transport::{ipc_endpoint, BoxedReader, BoxedWriter, PipeStream, DEFAULT_ENDPOINT_INDEX};

/// Default number of bytes requested per read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// How the background reader turns socket reads into frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Every read is decoded as exactly one frame and the declared length
    /// is not checked. A read that fills the read buffer is continued up to
    /// the declared frame end, so frames larger than the buffer arrive whole.
    /// Otherwise a frame split across reads, or several small frames arriving
    /// in one read, is misframed.
    #[default]
    SingleRead,
    /// Reads are accumulated and cut at the declared frame length.
    LengthDelimited,
}

/// Connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Endpoint to open instead of the resolved `discord-ipc-0`.
    pub endpoint: Option<PathBuf>,
    pub read_mode: ReadMode,
    /// Bytes requested per read call.
    pub read_buffer_size: usize,
    /// Largest payload the reader will assemble past the read buffer.
    pub max_payload_size: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            read_mode: ReadMode::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    /// Transport is being opened.
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Builder for configuring and creating a [`Connection`].
pub struct ConnectionBuilder {
    config: ConnectionConfig,
    registry: Option<HandlerRegistry>,
    listener: Option<Arc<dyn SocketListener>>,
}

impl ConnectionBuilder {
    /// Create a new connection builder.
    pub fn new() -> Self {
        Self {
            config: ConnectionConfig::default(),
            registry: None,
            listener: None,
        }
    }

    /// Set the listener for inbound packets and connection loss.
    pub fn listener<L: SocketListener>(self, listener: L) -> Self {
        self.shared_listener(Arc::new(listener))
    }

    /// Set a listener that is also held elsewhere.
    pub fn shared_listener(mut self, listener: Arc<dyn SocketListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Connect to `endpoint` instead of the resolved default.
    pub fn endpoint(mut self, endpoint: impl Into<PathBuf>) -> Self {
        self.config.endpoint = Some(endpoint.into());
        self
    }

    /// Set the read strategy.
    ///
    /// Default: [`ReadMode::SingleRead`]
    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.config.read_mode = mode;
        self
    }

    /// Set the number of bytes requested per read.
    ///
    /// Default: 64 KiB
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the largest payload the reader assembles.
    ///
    /// Default: 16 MiB
    pub fn max_payload_size(mut self, size: u32) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Use a custom handler set instead of the built-in one.
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the connection. Nothing is opened until [`Connection::connect`].
    pub fn build(self) -> Connection {
        let codec = match self.registry {
            Some(registry) => PacketCodec::with_registry(registry),
            None => PacketCodec::new(),
        };

        Connection {
            shared: Arc::new(Shared {
                state: AtomicU8::new(ConnectionState::Disconnected as u8),
                epoch: AtomicU64::new(0),
                writer: Mutex::new(None),
                listener: self.listener,
            }),
            codec,
            config: self.config,
            reader_task: StdMutex::new(None),
        }
    }
}

impl Default for ConnectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between the caller and the background reader.
struct Shared {
    state: AtomicU8,
    /// Bumped on every successful connect.
    epoch: AtomicU64,
    writer: Mutex<Option<BoxedWriter>>,
    listener: Option<Arc<dyn SocketListener>>,
}

impl Shared {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch && self.state() == ConnectionState::Connected
    }

    /// Swap `Connected -> Disconnected` for `epoch` and take the writer.
    ///
    /// Must be called with the writer lock held; returns `None` if another
    /// path already tore this connection down.
    fn close_locked(&self, slot: &mut Option<BoxedWriter>, epoch: u64) -> Option<BoxedWriter> {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return None;
        }
        self.state
            .compare_exchange(
                ConnectionState::Connected as u8,
                ConnectionState::Disconnected as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .ok()?;
        slot.take()
    }

    /// Close the transport after an I/O failure and notify the listener.
    async fn lose(&self, epoch: u64, reason: &str) {
        let closed = {
            let mut slot = self.writer.lock().await;
            self.close_locked(&mut slot, epoch)
        };
        if let Some(writer) = closed {
            self.finish_loss(writer, reason).await;
        }
    }

    async fn finish_loss(&self, mut writer: BoxedWriter, reason: &str) {
        warn!(reason = %reason, "connection lost");
        let _ = writer.shutdown().await;
        if let Some(listener) = &self.listener {
            listener.on_closed(reason);
        }
    }

    fn deliver(&self, decoded: Result<Option<Packet>>) {
        match decoded {
            Ok(Some(packet)) => {
                if let Some(listener) = &self.listener {
                    listener.on_packet(packet);
                }
            }
            Ok(None) => debug!("frame did not decode to a known packet"),
            Err(e) => warn!(error = %e, "dropping undecodable frame"),
        }
    }
}

/// A client connection to the local presence endpoint.
///
/// Methods take `&self`, so a connection can be shared behind an `Arc`.
pub struct Connection {
    shared: Arc<Shared>,
    codec: PacketCodec,
    config: ConnectionConfig,
    reader_task: StdMutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Create a new connection builder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Connection with default settings and no listener.
    pub fn new() -> Self {
        ConnectionBuilder::new().build()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// The endpoint [`connect`](Self::connect) opens.
    pub fn endpoint(&self) -> PathBuf {
        self.config
            .endpoint
            .clone()
            .unwrap_or_else(|| ipc_endpoint(DEFAULT_ENDPOINT_INDEX))
    }

    /// Open the transport and start the background reader.
    ///
    /// # Errors
    ///
    /// - [`IpcError::AlreadyConnected`] if a connection is live or opening
    /// - [`IpcError::Connection`] if the endpoint cannot be opened; the
    ///   connection stays disconnected
    pub async fn connect(&self) -> Result<()> {
        self.begin_connect()?;

        let endpoint = self.endpoint();
        debug!(endpoint = %endpoint.display(), "connecting");

        let stream = match PipeStream::connect(&endpoint).await {
            Ok(stream) => stream,
            Err(e) => {
                self.abandon_connect();
                return Err(e);
            }
        };

        let (reader, writer) = stream.into_split();
        self.attach(reader, writer).await;
        Ok(())
    }

    /// Run the connection over an already-open byte stream.
    ///
    /// Behaves like [`connect`](Self::connect) once the transport is open.
    pub async fn connect_with_stream<S>(&self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.begin_connect()?;
        let (reader, writer) = tokio::io::split(stream);
        self.attach(Box::new(reader), Box::new(writer)).await;
        Ok(())
    }

    /// Close the connection.
    ///
    /// Does not notify [`SocketListener::on_closed`].
    ///
    /// # Errors
    ///
    /// - [`IpcError::NotConnected`] if already disconnected
    /// - [`IpcError::Disconnection`] if shutting down the transport fails
    pub async fn disconnect(&self) -> Result<()> {
        let closed = {
            let mut slot = self.shared.writer.lock().await;
            let epoch = self.shared.epoch.load(Ordering::SeqCst);
            self.shared.close_locked(&mut slot, epoch)
        };
        let Some(mut writer) = closed else {
            return Err(IpcError::NotConnected);
        };

        self.abort_reader();
        debug!("disconnecting");
        writer.shutdown().await.map_err(IpcError::Disconnection)
    }

    /// Encode and write a packet.
    ///
    /// A failed write closes the connection and notifies the listener; it is
    /// not reported here.
    ///
    /// # Errors
    ///
    /// - [`IpcError::NotConnected`] if not connected
    /// - [`IpcError::Validation`] if the packet is invalid; nothing is written
    /// - [`IpcError::Unencodable`] if no handler encodes this packet
    pub async fn send(&self, packet: &Packet) -> Result<()> {
        if !self.is_connected() {
            return Err(IpcError::NotConnected);
        }

        let frame = self
            .codec
            .encode(packet)?
            .ok_or(IpcError::Unencodable(packet.opcode()))?;

        let mut slot = self.shared.writer.lock().await;
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        let Some(writer) = slot.as_mut() else {
            return Err(IpcError::NotConnected);
        };

        let written = match writer.write_all(&frame).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            let closed = self.shared.close_locked(&mut slot, epoch);
            drop(slot);
            if let Some(writer) = closed {
                self.abort_reader();
                self.shared.finish_loss(writer, &e.to_string()).await;
            }
        }

        Ok(())
    }

    /// Send the opening handshake for `client_id`.
    pub async fn handshake(&self, client_id: impl Into<String>) -> Result<()> {
        self.send(&HandshakePacket::new(client_id).into()).await
    }

    /// Set (or with `None`, clear) the presence of the current process.
    pub async fn set_activity(&self, activity: Option<Activity>) -> Result<()> {
        self.send(&SetActivityPacket::for_current_process(activity).into())
            .await
    }

    fn begin_connect(&self) -> Result<()> {
        self.shared
            .state
            .compare_exchange(
                ConnectionState::Disconnected as u8,
                ConnectionState::Connecting as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .map(|_| ())
            .map_err(|_| IpcError::AlreadyConnected)
    }

    fn abandon_connect(&self) {
        self.shared
            .state
            .store(ConnectionState::Disconnected as u8, Ordering::SeqCst);
    }

    async fn attach(&self, reader: BoxedReader, writer: BoxedWriter) {
        let epoch = {
            let mut slot = self.shared.writer.lock().await;
            *slot = Some(writer);
            let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            self.shared
                .state
                .store(ConnectionState::Connected as u8, Ordering::SeqCst);
            epoch
        };
        debug!(epoch, read_mode = ?self.config.read_mode, "connected");

        let task = tokio::spawn(read_loop(
            reader,
            self.shared.clone(),
            self.codec.clone(),
            epoch,
            self.config.clone(),
        ));

        let previous = self
            .reader_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn abort_reader(&self) {
        let task = self
            .reader_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.abort_reader();
    }
}

/// Background read loop: read, decode, deliver until the transport fails.
async fn read_loop(
    mut reader: BoxedReader,
    shared: Arc<Shared>,
    codec: PacketCodec,
    epoch: u64,
    config: ConnectionConfig,
) {
    let read_size = config.read_buffer_size.max(HEADER_SIZE);
    let mut buf = vec![0u8; read_size];
    let mut frame_buffer = match config.read_mode {
        ReadMode::SingleRead => None,
        ReadMode::LengthDelimited => Some(FrameBuffer::with_max_payload(config.max_payload_size)),
    };

    let reason = loop {
        let read = match &frame_buffer {
            None => read_single(&mut reader, &mut buf, read_size, config.max_payload_size).await,
            Some(_) => reader.read(&mut buf).await,
        };
        let n = match read {
            Ok(0) => break "connection closed by peer".to_string(),
            Ok(n) => n,
            Err(e) => break e.to_string(),
        };

        // The connection may have been closed while this read was pending.
        if !shared.is_current(epoch) {
            return;
        }

        match frame_buffer.as_mut() {
            None => shared.deliver(codec.decode(&buf[..n])),
            Some(frame_buffer) => match frame_buffer.push(&buf[..n]) {
                Ok(frames) => {
                    for frame in &frames {
                        shared.deliver(codec.decode_frame(frame));
                    }
                }
                // The stream cannot be resynchronized after a bad header.
                Err(e) => break e.to_string(),
            },
        }
    };

    shared.lose(epoch, &reason).await;
}

/// One read for [`ReadMode::SingleRead`].
///
/// A read that fills all `read_size` bytes may hold only the start of a
/// larger frame; reading then continues up to the frame end declared in the
/// header, and stops there so a following frame is left for the next read.
async fn read_single(
    reader: &mut BoxedReader,
    buf: &mut Vec<u8>,
    read_size: usize,
    max_payload_size: u32,
) -> std::io::Result<usize> {
    buf.resize(read_size, 0);
    let mut filled = reader.read(&mut buf[..]).await?;
    if filled < read_size {
        return Ok(filled);
    }

    let frame_end = match Header::decode(&buf[..filled]) {
        Some(header) if header.payload_length <= max_payload_size => {
            HEADER_SIZE + header.payload_length as usize
        }
        _ => return Ok(filled),
    };
    if frame_end > buf.len() {
        buf.resize(frame_end, 0);
    }

    while filled < frame_end {
        let n = reader.read(&mut buf[filled..frame_end]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    Ok(filled)
}
