//! The windowed application loop.
//!
//! One thread does everything: poll keys, pump the session (which ingests
//! frames into the skeleton canvas and the HUD), then present.

use std::time::Instant;

use hand_core::Surface;
use tracing::info;

use crate::canvas::PixelCanvas;
use crate::config::ViewerConfig;
use crate::connection::WebSocketConnector;
use crate::presenter::HudState;
use crate::session::Session;
use crate::visualizer::{UserCommand, Visualizer};
use crate::ViewerError;

/// Run until the window closes or the user quits. The stream is always
/// released before returning.
pub fn run(config: ViewerConfig) -> Result<(), ViewerError> {
    config.validate()?;

    let mut vis = Visualizer::new(&config)?;
    let mut skeleton = PixelCanvas::new(config.canvas_width as usize, config.canvas_height as usize);
    let mut hud = HudState::new();

    let start_mode = config.mode;
    let mut session = Session::new(config, WebSocketConnector, Instant::now());
    session.start(start_mode, Instant::now(), &mut hud);

    'frames: while vis.is_open() {
        // 1. Window input
        for command in vis.poll_input() {
            let now = Instant::now();
            match command {
                UserCommand::SwitchMode(mode) => {
                    if session.mode() != Some(mode) {
                        skeleton.clear();
                    }
                    session.switch_mode(mode, now, &mut hud);
                }
                UserCommand::Reconnect  => { session.reconnect(now, &mut hud); }
                UserCommand::Disconnect => session.disconnect(&mut hud),
                UserCommand::Quit       => break 'frames,
            }
        }

        // 2. Drain the stream
        session.pump(Instant::now(), &mut skeleton, &mut hud);

        // 3. Render
        vis.render(&mut hud, &skeleton);
    }

    info!(
        frames = session.ingestor().received(),
        dropped = session.ingestor().dropped(),
        "closing",
    );
    session.stop(&mut hud);
    Ok(())
}
