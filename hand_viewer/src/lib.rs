//! # hand_viewer
//!
//! Live client for a hand-tracking backend. One WebSocket stream per mode
//! delivers JSON frames (video + 21-point hand landmarks); each frame is
//! decoded, classified and drawn by [`hand_core`], and the results are pushed
//! to a [`Presenter`](presenter::Presenter).
//!
//! ## Data flow
//!
//! ```text
//! socket thread ──mpsc──▶ Session::pump ──▶ FrameIngestor ──▶ { classifier, renderer, fps }
//!   (StreamSource)          (main thread)                          │
//!                                                                  ▼
//!                                                       Presenter (HudState → window)
//! ```
//!
//! All state lives on the main thread. The socket worker only forwards
//! [`TransportEvent`](connection::TransportEvent)s.
//!
//! ## Modes
//!
//! | Mode | Endpoint | Shows |
//! |---|---|---|
//! | `coordinates` | `/ws/coordinates` | skeleton, tip coordinates, pinch distance |
//! | `cursor` | `/ws/cursor` | screen cursor, gesture label |
//!
//! ## Window keys
//!
//! | Key | Action |
//! |---|---|
//! | `1` | Switch to coordinates mode |
//! | `2` | Switch to cursor mode |
//! | `R` | Reconnect the current mode |
//! | `X` | Disconnect |
//! | `Q` / `Esc` | Quit |

use thiserror::Error;

pub mod app;
pub mod backoff;
pub mod canvas;
pub mod config;
pub mod connection;
pub mod ingest;
pub mod presenter;
pub mod session;
pub mod video;
pub mod visualizer;

pub use config::{ConfigError, Mode, ViewerConfig};
pub use connection::{ConnectionState, TransportError, TransportEvent, WebSocketConnector};
pub use session::Session;

/// Top-level failure of the windowed application.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("window: {0}")]
    Window(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
