//! Gesture classification from a single hand observation.
//!
//! Labels are recomputed from scratch every frame; there is no memory of
//! the previous label.
//!
//! | Check (in order) | Label |
//! |---|---|
//! | thumb tip ↔ index tip `< click` | `Click` |
//! | every fingertip within `fist` of the wrist | `Drag` |
//! | otherwise | `Moving` |
//!
//! Thresholds are in normalized frame units and are not scaled by apparent
//! hand size, so a hand far from the camera reads as more closed than the
//! same pose up close.

use std::fmt;

use serde::Deserialize;

use crate::geometry::{distance, GeometryError};
use crate::landmarks::{HandObservation, LandmarkSet, FINGERTIPS};

/// Pinch distance below which the hand is clicking.
pub const CLICK_THRESHOLD: f32 = 0.05;

/// Fingertip-to-wrist distance at or below which a finger counts as curled.
pub const FIST_THRESHOLD: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    Moving,
    Click,
    Drag,
}

impl Gesture {
    pub fn label(&self) -> &'static str {
        match self {
            Gesture::Moving => "Moving",
            Gesture::Click  => "Click",
            Gesture::Drag   => "Drag",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    pub click: f32,
    pub fist:  f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds { click: CLICK_THRESHOLD, fist: FIST_THRESHOLD }
    }
}

/// Classify with the default thresholds.
pub fn classify(hand: &HandObservation) -> Result<Gesture, GeometryError> {
    classify_with(hand, &GestureThresholds::default())
}

/// Classify with explicit thresholds. `Click` takes precedence over `Drag`.
pub fn classify_with(
    hand: &HandObservation,
    thresholds: &GestureThresholds,
) -> Result<Gesture, GeometryError> {
    let pinch = distance(hand.index_finger(), hand.thumb())?;
    if pinch < thresholds.click {
        return Ok(Gesture::Click);
    }
    if fist_within(hand.landmarks(), thresholds.fist)? {
        Ok(Gesture::Drag)
    } else {
        Ok(Gesture::Moving)
    }
}

/// True when every fingertip is within [`FIST_THRESHOLD`] of the wrist.
pub fn is_fist(landmarks: &LandmarkSet) -> Result<bool, GeometryError> {
    fist_within(landmarks, FIST_THRESHOLD)
}

fn fist_within(landmarks: &LandmarkSet, threshold: f32) -> Result<bool, GeometryError> {
    let wrist = landmarks.wrist();
    for &tip in FINGERTIPS.iter() {
        if distance(landmarks[tip], wrist)? > threshold {
            return Ok(false);
        }
    }
    Ok(true)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
