//! Connection lifecycle and the socket worker behind it.
//!
//! A [`StreamSource`] runs on its own thread and forwards [`TransportEvent`]s
//! over an `mpsc` channel, one channel per connection. The main thread owns
//! the [`Connection`] state machine and feeds it those events one at a time:
//!
//! ```text
//!            connect                Opened
//!   Idle ─────────────▶ Connecting ────────▶ Connected
//!                          │    │                │  │
//!                   Failed │    │ Closed  Closed │  │ Failed
//!                          ▼    ▼                ▼  ▼
//!                        Error  Disconnected ◀──┘  Error
//! ```
//!
//! `Disconnected` and `Error` only leave through another `connect`.
//! `disconnect` is accepted from every state.

use std::fmt;
use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::Message;

// ════════════════════════════════════════════════════════════════════════════
// States, events, errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle         => "idle",
            ConnectionState::Connecting   => "connecting",
            ConnectionState::Connected    => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Error        => "error",
        }
    }

    /// A stream is open or being opened.
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("handshake with {url} failed: {source}")]
    Handshake { url: String, #[source] source: tungstenite::Error },
    #[error("stream {url} failed: {source}")]
    Stream { url: String, #[source] source: tungstenite::Error },
    #[error("cannot start stream worker: {0}")]
    Spawn(#[source] io::Error),
    #[error("stream worker for {url} exited without closing")]
    WorkerExited { url: String },
}

/// What a stream worker reports to the main thread.
#[derive(Debug)]
pub enum TransportEvent {
    /// Handshake succeeded.
    Opened,
    Text(String),
    /// Binary message of the given length; not a valid frame.
    Binary(usize),
    /// Graceful close by the peer.
    Closed,
    Failed(TransportError),
}

// ════════════════════════════════════════════════════════════════════════════
// StopSignal: release a worker that may be blocked in a read
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct StopInner {
    stopped: AtomicBool,
    socket:  Mutex<Option<TcpStream>>,
}

/// Shared stop flag. Triggering it also shuts down the attached socket so a
/// blocked read returns immediately.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<StopInner>);

impl StopSignal {
    pub fn new() -> Self {
        StopSignal::default()
    }

    pub fn trigger(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
        if let Ok(guard) = self.0.socket.lock() {
            if let Some(socket) = guard.as_ref() {
                let _ = socket.shutdown(Shutdown::Both);
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.0.stopped.load(Ordering::SeqCst)
    }

    /// Register the worker's socket. If the signal already fired, the
    /// socket is shut down on the spot.
    pub fn attach(&self, socket: TcpStream) {
        if let Ok(mut guard) = self.0.socket.lock() {
            if self.is_triggered() {
                let _ = socket.shutdown(Shutdown::Both);
            }
            *guard = Some(socket);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StreamSource + spawn helper
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`TransportEvent`]s over a channel.
///
/// Implementations must stop quietly (no `Closed`/`Failed`) once `stop` is
/// triggered, and should return when `tx` is disconnected.
pub trait StreamSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<TransportEvent>, stop: StopSignal);
}

/// Receiving end of one connection. Dropping it releases the worker.
#[derive(Debug)]
pub struct StreamLink {
    rx:   Receiver<TransportEvent>,
    stop: StopSignal,
}

impl StreamLink {
    /// A link fed by hand, for custom connectors and tests.
    pub fn channel() -> (Sender<TransportEvent>, StreamLink) {
        let (tx, rx) = mpsc::channel();
        (tx, StreamLink { rx, stop: StopSignal::new() })
    }

    pub fn try_recv(&self) -> Result<TransportEvent, TryRecvError> {
        self.rx.try_recv()
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }
}

impl Drop for StreamLink {
    fn drop(&mut self) {
        self.stop.trigger();
    }
}

/// Spawn a stream source on its own thread and return the link to it.
pub fn spawn_stream<S: StreamSource>(source: S) -> StreamLink {
    let (tx, rx) = mpsc::channel();
    let stop = StopSignal::new();

    let worker_tx   = tx.clone();
    let worker_stop = stop.clone();
    let spawned = thread::Builder::new()
        .name("hand-stream".into())
        .spawn(move || Box::new(source).run(worker_tx, worker_stop));
    if let Err(e) = spawned {
        let _ = tx.send(TransportEvent::Failed(TransportError::Spawn(e)));
    }

    StreamLink { rx, stop }
}

/// Opens links; the seam between the session and the network.
pub trait Connector {
    fn open(&mut self, url: &str) -> StreamLink;
}

// ════════════════════════════════════════════════════════════════════════════
// WebSocketSource: tungstenite client (receive-only)
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct WebSocketSource {
    url: String,
}

impl WebSocketSource {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketSource { url: url.into() }
    }
}

impl StreamSource for WebSocketSource {
    fn run(self: Box<Self>, tx: Sender<TransportEvent>, stop: StopSignal) {
        let url = self.url;
        debug!(%url, "opening stream");

        let (mut socket, _response) = match tungstenite::connect(url.as_str()) {
            Ok(pair) => pair,
            Err(source) => {
                if !stop.is_triggered() {
                    let _ = tx.send(TransportEvent::Failed(TransportError::Handshake { url, source }));
                }
                return;
            }
        };

        let raw = match socket.get_ref() {
            MaybeTlsStream::Plain(s)  => s.try_clone(),
            MaybeTlsStream::Rustls(s) => s.sock.try_clone(),
            _ => Err(io::Error::new(io::ErrorKind::Unsupported, "unknown stream type")),
        };
        match raw {
            Ok(s)  => stop.attach(s),
            Err(e) => warn!(%url, error = %e, "socket cannot be released early"),
        }

        if stop.is_triggered() {
            let _ = socket.close(None);
            return;
        }
        if tx.send(TransportEvent::Opened).is_err() {
            return;
        }

        loop {
            let event = match socket.read() {
                Ok(Message::Text(text))    => TransportEvent::Text(text),
                Ok(Message::Binary(bytes)) => TransportEvent::Binary(bytes.len()),
                // ping/pong replies and the close handshake are handled by tungstenite
                Ok(_) => continue,
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    if !stop.is_triggered() {
                        let _ = tx.send(TransportEvent::Closed);
                    }
                    return;
                }
                Err(source) => {
                    if !stop.is_triggered() {
                        let _ = tx.send(TransportEvent::Failed(TransportError::Stream { url, source }));
                    }
                    return;
                }
            };
            if stop.is_triggered() || tx.send(event).is_err() {
                return;
            }
        }
    }
}

/// Production connector: one [`WebSocketSource`] thread per link.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(&mut self, url: &str) -> StreamLink {
        spawn_stream(WebSocketSource::new(url))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Connection: the state machine
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of feeding one event to [`Connection::apply`].
#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    Changed(ConnectionState),
    Text(String),
    Binary(usize),
    Ignored,
}

#[derive(Debug, Default)]
pub struct Connection {
    state:      ConnectionState,
    url:        Option<String>,
    link:       Option<StreamLink>,
    last_error: Option<TransportError>,
}

impl Connection {
    pub fn new() -> Self {
        Connection::default()
    }

    pub fn state(&self)      -> ConnectionState        { self.state }
    pub fn url(&self)        -> Option<&str>           { self.url.as_deref() }
    pub fn last_error(&self) -> Option<&TransportError> { self.last_error.as_ref() }
    pub fn has_link(&self)   -> bool                   { self.link.is_some() }

    /// Adopt a freshly opened link. Any previous link is released first.
    pub fn connect(&mut self, url: impl Into<String>, link: StreamLink) -> ConnectionState {
        self.release();
        self.url = Some(url.into());
        self.link = Some(link);
        self.last_error = None;
        self.set_state(ConnectionState::Connecting)
    }

    /// Release the link and report `Disconnected`, from any state.
    pub fn disconnect(&mut self) -> ConnectionState {
        self.release();
        self.set_state(ConnectionState::Disconnected)
    }

    /// Next pending event from the current link, if any. A worker that
    /// vanished while the stream was live is reported as a failure.
    pub fn poll(&mut self) -> Option<TransportEvent> {
        let link = self.link.as_ref()?;
        match link.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) if self.state.is_live() => {
                let url = self.url.clone().unwrap_or_default();
                Some(TransportEvent::Failed(TransportError::WorkerExited { url }))
            }
            Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Single dispatch point for transport events.
    pub fn apply(&mut self, event: TransportEvent) -> Applied {
        use ConnectionState::*;

        match (self.state, event) {
            (Connecting, TransportEvent::Opened) => Applied::Changed(self.set_state(Connected)),

            (Connected, TransportEvent::Text(text)) => Applied::Text(text),
            (Connected, TransportEvent::Binary(len)) => Applied::Binary(len),

            (Connecting | Connected, TransportEvent::Closed) => {
                self.release();
                Applied::Changed(self.set_state(Disconnected))
            }

            (Connecting | Connected, TransportEvent::Failed(error)) => {
                warn!(url = self.url.as_deref().unwrap_or(""), %error, "stream failed");
                self.last_error = Some(error);
                self.release();
                Applied::Changed(self.set_state(Error))
            }

            (state, event) => {
                debug!(%state, ?event, "ignoring stale transport event");
                Applied::Ignored
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) -> ConnectionState {
        if self.state != state {
            info!(from = %self.state, to = %state, url = self.url.as_deref().unwrap_or(""), "connection");
        }
        self.state = state;
        state
    }

    fn release(&mut self) {
        if let Some(link) = self.link.take() {
            link.stop.trigger();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
