//! Per-frame ingestion: decode, derive, draw, count.
//!
//! [`FrameIngestor::ingest`] handles one inbound message end to end and is
//! never interrupted by another. Steps, in order:
//!
//! 1. count the frame for FPS (even if it turns out to be garbage)
//! 2. decode; a malformed payload is dropped and reported
//! 3. pass the video frame reference to the presenter
//! 4. derive what the active mode needs from the first hand and, in
//!    coordinates mode, redraw the skeleton
//! 5. publish the hand count

use std::time::{Duration, Instant};

use hand_core::{
    classify_with, decode, distance, percent, render_set, to_screen, DecodeError, FpsCounter,
    Frame, GeometryError, Gesture, GestureThresholds, HandObservation, LandmarkError, ScreenPoint,
    SkeletonStyle, Surface,
};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::config::{Mode, ViewerConfig};
use crate::presenter::Presenter;

/// Raw inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload<'a> {
    Text(&'a str),
    /// Binary message of this many bytes.
    Binary(usize),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("invalid hand geometry: {0}")]
    InvalidInput(#[from] GeometryError),
}

/// Coordinates-mode readout for the first hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateReadout {
    /// Index fingertip, percent of frame.
    pub index:          (f32, f32),
    /// Thumb tip, percent of frame.
    pub thumb:          (f32, f32),
    /// Normalized thumb-to-index distance.
    pub pinch_distance: f32,
}

/// What one successfully decoded frame produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub hand_count:    usize,
    pub gesture:       Option<Gesture>,
    pub cursor:        Option<ScreenPoint>,
    pub coordinates:   Option<CoordinateReadout>,
    pub drew_skeleton: bool,
    /// Why the first hand was skipped, if it was.
    pub rejected:      Option<LandmarkError>,
}

// ════════════════════════════════════════════════════════════════════════════
// FrameIngestor
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct FrameIngestor {
    fps:        FpsCounter,
    screen:     (u32, u32),
    thresholds: GestureThresholds,
    style:      SkeletonStyle,
    received:   u64,
    dropped:    u64,
}

impl FrameIngestor {
    pub fn new(config: &ViewerConfig, now: Instant) -> Self {
        FrameIngestor {
            fps:        FpsCounter::new(now),
            screen:     (config.screen_width, config.screen_height),
            thresholds: config.thresholds(),
            style:      SkeletonStyle::default(),
            received:   0,
            dropped:    0,
        }
    }

    pub fn received(&self) -> u64          { self.received }
    pub fn dropped(&self)  -> u64          { self.dropped }
    pub fn fps(&self)      -> &FpsCounter  { &self.fps }

    pub fn ingest<S, P>(
        &mut self,
        payload:   Payload<'_>,
        mode:      Mode,
        surface:   &mut S,
        presenter: &mut P,
    ) -> Result<FrameReport, IngestError>
    where
        S: Surface + ?Sized,
        P: Presenter + ?Sized,
    {
        self.fps.record_frame();
        self.received += 1;

        let decoded = match payload {
            Payload::Text(text) => decode(text),
            Payload::Binary(len) => Err(DecodeError::Binary(len)),
        };
        let frame = match decoded {
            Ok(frame) => frame,
            Err(e) => {
                self.dropped += 1;
                warn!(error = %e, "dropping frame");
                return Err(e.into());
            }
        };

        if let Some(image) = frame.image.as_deref() {
            presenter.on_frame_image(image);
        }

        let mut report = FrameReport { hand_count: frame.hand_count(), ..FrameReport::default() };
        let outcome = self.first_hand(&frame, mode, surface, presenter, &mut report);
        presenter.on_hand_count(report.hand_count);

        match outcome {
            Ok(()) => {
                trace!(hands = report.hand_count, gesture = ?report.gesture, "frame");
                Ok(report)
            }
            Err(e) => {
                self.dropped += 1;
                error!(error = %e, "hand geometry violates the frame contract");
                Err(e.into())
            }
        }
    }

    fn first_hand<S, P>(
        &self,
        frame:     &Frame,
        mode:      Mode,
        surface:   &mut S,
        presenter: &mut P,
        report:    &mut FrameReport,
    ) -> Result<(), GeometryError>
    where
        S: Surface + ?Sized,
        P: Presenter + ?Sized,
    {
        let hand = match frame.first_hand() {
            None => return Ok(()),
            Some(Err(e)) => {
                debug!(error = %e, "skipping malformed hand");
                report.rejected = Some(e.clone());
                return Ok(());
            }
            Some(Ok(hand)) => hand,
        };

        // Derive everything before touching the presenter or the surface so a
        // bad hand leaves both as they were.
        let coordinates = if mode.shows_coordinates() { Some(readout(hand)?) } else { None };
        let cursor = if mode.shows_cursor() {
            Some(to_screen(hand.index_finger(), self.screen.0, self.screen.1)?)
        } else {
            None
        };
        let gesture = if mode.classifies_gesture() {
            Some(classify_with(hand, &self.thresholds)?)
        } else {
            None
        };

        if let Some(c) = &coordinates { presenter.on_coordinates(c); }
        if let Some(p) = cursor       { presenter.on_cursor(p); }
        if let Some(g) = gesture      { presenter.on_gesture(g); }
        if mode.draws_skeleton() {
            report.drew_skeleton = render_set(surface, hand.landmarks(), &self.style);
        }

        report.coordinates = coordinates;
        report.cursor = cursor;
        report.gesture = gesture;
        Ok(())
    }

    /// Close the FPS interval if it is due and publish the reading.
    pub fn tick_fps<P: Presenter + ?Sized>(&mut self, now: Instant, presenter: &mut P) -> Option<u32> {
        let fps = self.fps.tick(now)?;
        presenter.on_fps(fps);
        Some(fps)
    }

    pub fn fps_due(&self, now: Instant, interval: Duration) -> bool {
        self.fps.is_due(now, interval)
    }

    /// Start counting afresh, e.g. after switching streams.
    pub fn reset_counters(&mut self, now: Instant) {
        self.fps.reset(now);
        self.received = 0;
        self.dropped = 0;
    }
}

fn readout(hand: &HandObservation) -> Result<CoordinateReadout, GeometryError> {
    Ok(CoordinateReadout {
        index:          percent(hand.index_finger()),
        thumb:          percent(hand.thumb()),
        pinch_distance: distance(hand.index_finger(), hand.thumb())?,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
