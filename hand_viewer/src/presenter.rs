//! The outward-facing collaborator interface and the stock HUD model.
//!
//! The core pushes results into a [`Presenter`]; it never asks how they are
//! shown. [`HudState`] keeps the latest value of everything so the window can
//! render it once per frame.

use hand_core::{Gesture, ScreenPoint};

use crate::config::Mode;
use crate::connection::ConnectionState;
use crate::ingest::CoordinateReadout;

/// Receives derived state as it changes.
pub trait Presenter {
    fn on_gesture(&mut self, gesture: Gesture);
    fn on_hand_count(&mut self, count: usize);
    fn on_connection_state(&mut self, state: ConnectionState);
    fn on_fps(&mut self, fps: u32);

    /// Video frame reference (data URI or URL) from the latest frame.
    fn on_frame_image(&mut self, _image: &str) {}
    fn on_coordinates(&mut self, _readout: &CoordinateReadout) {}
    fn on_cursor(&mut self, _cursor: ScreenPoint) {}
    /// Active mode changed; `None` when the session stopped.
    fn on_mode(&mut self, _mode: Option<Mode>) {}
}

// ════════════════════════════════════════════════════════════════════════════
// HudState
// ════════════════════════════════════════════════════════════════════════════

/// Latest value of every readout. Readouts stay on screen until replaced,
/// so a frame with no hand leaves the previous values visible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HudState {
    pub mode:        Option<Mode>,
    pub state:       ConnectionState,
    pub fps:         u32,
    pub hand_count:  usize,
    pub gesture:     Option<Gesture>,
    pub cursor:      Option<ScreenPoint>,
    pub coordinates: Option<CoordinateReadout>,
    image:           Option<String>,
}

impl HudState {
    pub fn new() -> Self {
        HudState::default()
    }

    /// The video frame received since the last call, if any.
    pub fn take_image(&mut self) -> Option<String> {
        self.image.take()
    }

    /// Text lines for the overlay.
    pub fn lines(&self) -> Vec<String> {
        let mode = self.mode.map_or("none", |m| m.path());
        let mut lines = vec![
            format!("mode: {mode}   state: {}", self.state),
            format!("fps: {}   hands: {}", self.fps, self.hand_count),
        ];

        match self.mode {
            Some(Mode::Coordinates) => match &self.coordinates {
                Some(c) => {
                    lines.push(format!("index  x: {:.1}%  y: {:.1}%", c.index.0, c.index.1));
                    lines.push(format!("thumb  x: {:.1}%  y: {:.1}%", c.thumb.0, c.thumb.1));
                    lines.push(format!("pinch: {:.3}", c.pinch_distance));
                }
                None => lines.push("index  -   thumb  -".to_string()),
            },
            Some(Mode::Cursor) => {
                let cursor = self.cursor.map_or("-".to_string(), |p| format!("{}, {}", p.x, p.y));
                let gesture = self.gesture.map_or("-", |g| g.label());
                lines.push(format!("cursor: {cursor}"));
                lines.push(format!("gesture: {gesture}"));
            }
            None => {}
        }
        lines
    }
}

impl Presenter for HudState {
    fn on_gesture(&mut self, gesture: Gesture)            { self.gesture = Some(gesture); }
    fn on_hand_count(&mut self, count: usize)             { self.hand_count = count; }
    fn on_connection_state(&mut self, state: ConnectionState) { self.state = state; }
    fn on_fps(&mut self, fps: u32)                        { self.fps = fps; }

    fn on_frame_image(&mut self, image: &str) {
        self.image = Some(image.to_string());
    }

    fn on_coordinates(&mut self, readout: &CoordinateReadout) {
        self.coordinates = Some(*readout);
    }

    fn on_cursor(&mut self, cursor: ScreenPoint) {
        self.cursor = Some(cursor);
    }

    fn on_mode(&mut self, mode: Option<Mode>) {
        if self.mode != mode {
            self.gesture = None;
            self.cursor = None;
            self.coordinates = None;
            self.hand_count = 0;
            self.image = None;
        }
        self.mode = mode;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RecordingPresenter: event log for tests
// ════════════════════════════════════════════════════════════════════════════


// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readouts_are_sticky() {
        let mut hud = HudState::new();
        hud.on_mode(Some(Mode::Cursor));
        hud.on_gesture(Gesture::Drag);
        hud.on_hand_count(1);
        hud.on_hand_count(0);
        assert_eq!(hud.gesture, Some(Gesture::Drag));
    }

    #[test]
    fn mode_change_clears_mode_specific_fields() {
        let mut hud = HudState::new();
        hud.on_mode(Some(Mode::Cursor));
        hud.on_cursor(ScreenPoint { x: 1, y: 2 });
        hud.on_fps(30);
        hud.on_mode(Some(Mode::Coordinates));
        assert!(hud.cursor.is_none());
        assert_eq!(hud.fps, 30);

        // same mode again keeps state
        hud.on_coordinates(&CoordinateReadout { index: (1.0, 2.0), thumb: (3.0, 4.0), pinch_distance: 0.1 });
        hud.on_mode(Some(Mode::Coordinates));
        assert!(hud.coordinates.is_some());
    }

    #[test]
    fn image_is_taken_once() {
        let mut hud = HudState::new();
        hud.on_frame_image("data:image/png;base64,AA");
        assert_eq!(hud.take_image().as_deref(), Some("data:image/png;base64,AA"));
        assert_eq!(hud.take_image(), None);
    }

    #[test]
    fn lines_follow_mode() {
        let mut hud = HudState::new();
        hud.on_mode(Some(Mode::Coordinates));
        hud.on_connection_state(ConnectionState::Connected);
        hud.on_coordinates(&CoordinateReadout { index: (50.0, 51.0), thumb: (40.0, 42.5), pinch_distance: 0.0141 });
        let lines = hud.lines();
        assert_eq!(lines[0], "mode: coordinates   state: connected");
        assert_eq!(lines[2], "index  x: 50.0%  y: 51.0%");
        assert_eq!(lines[4], "pinch: 0.014");

        hud.on_mode(Some(Mode::Cursor));
        hud.on_cursor(ScreenPoint { x: 960, y: 551 });
        hud.on_gesture(Gesture::Click);
        let lines = hud.lines();
        assert_eq!(lines[2], "cursor: 960, 551");
        assert_eq!(lines[3], "gesture: Click");
    }

    #[test]
    fn stopped_session_has_no_mode_lines() {
        let mut hud = HudState::new();
        hud.on_mode(None);
        assert_eq!(hud.lines().len(), 2);
        assert!(hud.lines()[0].starts_with("mode: none"));
    }
}
