//! `minifb` window: video, skeleton overlay, HUD.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ mode / state            (HUD strip)      │
//! │ fps / hands                              │
//! │ mode readouts                            │
//! │                                          │
//! │      video frame, scaled to the window   │
//! │      + skeleton layer (coordinates)      │
//! │      + cursor crosshair (cursor)         │
//! │                                          │
//! │ key legend                               │
//! └──────────────────────────────────────────┘
//! ```

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use tracing::debug;

use crate::canvas::PixelCanvas;
use crate::config::{Mode, ViewerConfig};
use crate::presenter::HudState;
use crate::video::{decode_data_uri, VideoError, VideoFrame};
use crate::ViewerError;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:     u32   = 0xFF1A1A2E;
const HUD_BG:       u32   = 0xFF0F3460;
const HUD_TEXT:     u32   = 0xFFEEEEEE;
const LEGEND_TEXT:  u32   = 0xFF888888;
const CURSOR_COLOR: u32   = 0xFFFFD700;
const TEXT_SCALE:   usize = 2;
const LINE_H:       usize = 6 * TEXT_SCALE + 2;
const LEGEND:       &str  = "1=coordinates  2=cursor  r=reconnect  x=disconnect  q=quit";

/// What the user asked for this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserCommand {
    SwitchMode(Mode),
    Reconnect,
    Disconnect,
    Quit,
}

/// Key binding table.
pub fn command_for(key: Key) -> Option<UserCommand> {
    match key {
        Key::Key1 | Key::NumPad1 => Some(UserCommand::SwitchMode(Mode::Coordinates)),
        Key::Key2 | Key::NumPad2 => Some(UserCommand::SwitchMode(Mode::Cursor)),
        Key::R                   => Some(UserCommand::Reconnect),
        Key::X                   => Some(UserCommand::Disconnect),
        Key::Q | Key::Escape     => Some(UserCommand::Quit),
        _ => None,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    frame:  PixelCanvas,
    video:  Option<VideoFrame>,
    screen: (u32, u32),
}

impl Visualizer {
    pub fn new(config: &ViewerConfig) -> Result<Self, ViewerError> {
        let (w, h) = (config.canvas_width as usize, config.canvas_height as usize);
        let mut window = Window::new(
            "Hand Viewer",
            w, h,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| ViewerError::Window(e.to_string()))?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            frame:  PixelCanvas::new(w, h),
            video:  None,
            screen: (config.screen_width, config.screen_height),
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Keys pressed since the last frame, in binding order.
    pub fn poll_input(&self) -> Vec<UserCommand> {
        if !self.window.is_open() {
            return vec![UserCommand::Quit];
        }
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(command_for)
            .collect()
    }

    /// Compose and present one frame.
    pub fn render(&mut self, hud: &mut HudState, skeleton: &PixelCanvas) {
        if let Some(reference) = hud.take_image() {
            match decode_data_uri(&reference) {
                Ok(video) => self.video = Some(video),
                Err(VideoError::NotDataUri) => debug!("video frame is a plain URL; not fetched"),
                Err(e) => debug!(error = %e, "video frame not shown"),
            }
        }

        let (w, h) = (self.frame.width(), self.frame.height());

        // ── video ─────────────────────────────────────────────────────────
        match &self.video {
            Some(video) if hud.mode.is_some() => video.blit_scaled(self.frame.pixels_mut(), w, h),
            _ => self.frame.fill(BG_COLOR),
        }

        // ── overlays ──────────────────────────────────────────────────────
        match hud.mode {
            Some(m) if m.draws_skeleton() && skeleton.width() == w && skeleton.height() == h => {
                skeleton.composite_onto(self.frame.pixels_mut());
            }
            Some(m) if m.shows_cursor() => {
                if let Some(cursor) = hud.cursor {
                    let x = cursor.x as f32 * w as f32 / self.screen.0 as f32;
                    let y = cursor.y as f32 * h as f32 / self.screen.1 as f32;
                    self.draw_crosshair(x, y);
                }
            }
            _ => {}
        }

        // ── HUD ───────────────────────────────────────────────────────────
        let lines = hud.lines();
        self.frame.fill_rect(0, 0, w, lines.len() * LINE_H + 8, HUD_BG);
        for (i, line) in lines.iter().enumerate() {
            self.frame.draw_label(line, 8, 6 + i * LINE_H, TEXT_SCALE, HUD_TEXT);
        }
        self.frame.draw_label(LEGEND, 8, h.saturating_sub(10), 1, LEGEND_TEXT);

        self.window.update_with_buffer(self.frame.pixels(), w, h).ok();
    }

    fn draw_crosshair(&mut self, x: f32, y: f32) {
        self.frame.line((x - 10.0, y), (x + 10.0, y), 2.0, CURSOR_COLOR);
        self.frame.line((x, y - 10.0), (x, y + 10.0), 2.0, CURSOR_COLOR);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bindings() {
        assert_eq!(command_for(Key::Key1), Some(UserCommand::SwitchMode(Mode::Coordinates)));
        assert_eq!(command_for(Key::Key2), Some(UserCommand::SwitchMode(Mode::Cursor)));
        assert_eq!(command_for(Key::R), Some(UserCommand::Reconnect));
        assert_eq!(command_for(Key::X), Some(UserCommand::Disconnect));
        assert_eq!(command_for(Key::Escape), Some(UserCommand::Quit));
        assert_eq!(command_for(Key::Q), Some(UserCommand::Quit));
        assert_eq!(command_for(Key::Space), None);
    }

    #[test]
    fn legend_fits_default_window() {
        // 1× glyphs advance 4 px
        assert!(LEGEND.chars().count() * 4 + 8 <= ViewerConfig::default().canvas_width as usize);
    }
}
