//! The 21-point hand topology and the validated types built on it.
//!
//! A [`LandmarkSet`] can only be constructed from exactly
//! [`LANDMARK_COUNT`] finite points, so everything downstream (classifier,
//! renderer) can index it without re-checking.

use thiserror::Error;

use crate::geometry::{distance, Point2D};

// ════════════════════════════════════════════════════════════════════════════
// Topology
// ════════════════════════════════════════════════════════════════════════════

pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_BASE: usize = 5;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_BASE: usize = 9;
pub const MIDDLE_TIP: usize = 12;
pub const RING_BASE:  usize = 13;
pub const RING_TIP:   usize = 16;
pub const PINKY_BASE: usize = 17;
pub const PINKY_TIP:  usize = 20;

/// Distal landmark of every finger chain, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Finger bases, including the wrist shared by all chains.
pub const FINGER_BASES: [usize; 5] = [WRIST, INDEX_BASE, MIDDLE_BASE, RING_BASE, PINKY_BASE];

/// Wrist-to-tip polylines: thumb, index, middle, ring, pinky.
pub const FINGER_CHAINS: [[usize; 5]; 5] = [
    [WRIST, 1, 2, 3, THUMB_TIP],
    [WRIST, INDEX_BASE, 6, 7, INDEX_TIP],
    [WRIST, MIDDLE_BASE, 10, 11, MIDDLE_TIP],
    [WRIST, RING_BASE, 14, 15, RING_TIP],
    [WRIST, PINKY_BASE, 18, 19, PINKY_TIP],
];

/// Tip fields further than this from their landmark are reported as divergent.
pub const TIP_DIVERGENCE: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("expected 21 landmarks, got {0}")]
    Cardinality(usize),
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("{field} tip has a non-finite coordinate")]
    NonFiniteTip { field: &'static str },
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

/// Exactly 21 finite landmarks in the fixed hand topology.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkSet([Point2D; LANDMARK_COUNT]);

impl LandmarkSet {
    pub fn points(&self) -> &[Point2D; LANDMARK_COUNT] {
        &self.0
    }

    pub fn wrist(&self) -> Point2D {
        self.0[WRIST]
    }

    pub fn thumb_tip(&self) -> Point2D {
        self.0[THUMB_TIP]
    }

    pub fn index_tip(&self) -> Point2D {
        self.0[INDEX_TIP]
    }
}

impl TryFrom<&[Point2D]> for LandmarkSet {
    type Error = LandmarkError;

    fn try_from(points: &[Point2D]) -> Result<Self, Self::Error> {
        let array: [Point2D; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::Cardinality(points.len()))?;
        if let Some(index) = array.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }
        Ok(LandmarkSet(array))
    }
}

impl std::ops::Index<usize> for LandmarkSet {
    type Output = Point2D;

    fn index(&self, i: usize) -> &Point2D {
        &self.0[i]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand.
///
/// `index_finger` and `thumb` are the authoritative tip positions for gesture
/// math and cursor mapping. When the producer sends them they are kept as-is,
/// even if they disagree with `landmarks[8]` / `landmarks[4]`; otherwise they
/// are copied from the landmark array. The skeleton always draws the raw
/// array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandObservation {
    index_finger: Point2D,
    thumb:        Point2D,
    landmarks:    LandmarkSet,
}

impl HandObservation {
    /// Tips derived from the landmark array.
    pub fn new(landmarks: LandmarkSet) -> Self {
        HandObservation {
            index_finger: landmarks.index_tip(),
            thumb:        landmarks.thumb_tip(),
            landmarks,
        }
    }

    /// Tips supplied separately by the producer.
    pub fn with_tips(
        landmarks: LandmarkSet,
        index_finger: Point2D,
        thumb: Point2D,
    ) -> Result<Self, LandmarkError> {
        if !index_finger.is_finite() {
            return Err(LandmarkError::NonFiniteTip { field: "index_finger" });
        }
        if !thumb.is_finite() {
            return Err(LandmarkError::NonFiniteTip { field: "thumb" });
        }
        Ok(HandObservation { index_finger, thumb, landmarks })
    }

    pub fn index_finger(&self) -> Point2D { self.index_finger }
    pub fn thumb(&self)        -> Point2D { self.thumb }
    pub fn landmarks(&self)    -> &LandmarkSet { &self.landmarks }

    /// Largest distance between a tip field and its landmark entry.
    pub fn tip_divergence(&self) -> f32 {
        let index = distance(self.index_finger, self.landmarks.index_tip()).unwrap_or(0.0);
        let thumb = distance(self.thumb, self.landmarks.thumb_tip()).unwrap_or(0.0);
        index.max(thumb)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
