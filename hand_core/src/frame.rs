//! Inbound frame decoding.
//!
//! The producer sends one JSON object per frame:
//!
//! ```json
//! { "frame": "data:image/jpeg;base64,...",
//!   "hands": [ { "index_finger": {"x":0.5,"y":0.4},
//!                "thumb":        {"x":0.4,"y":0.5},
//!                "landmarks":    [ {"x":..,"y":..}, ... 21 entries ] } ] }
//! ```
//!
//! Every field is optional on the wire. Unknown fields (`app`, landmark `id`
//! and `z`) are ignored. Each hand is validated here, once, so a malformed
//! hand never reaches the classifier or the renderer.

use serde::Deserialize;
use thiserror::Error;
use tracing::trace;

use crate::geometry::Point2D;
use crate::landmarks::{HandObservation, LandmarkError, LandmarkSet, TIP_DIVERGENCE};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed frame payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary message of {0} bytes is not a frame")]
    Binary(usize),
}

// ── wire shapes ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WireFrame {
    #[serde(default)]
    frame: Option<String>,
    #[serde(default)]
    hands: Option<Vec<WireHand>>,
}

#[derive(Deserialize)]
struct WireHand {
    #[serde(default)]
    index_finger: Option<Point2D>,
    #[serde(default)]
    thumb:        Option<Point2D>,
    #[serde(default)]
    landmarks:    Option<Vec<Point2D>>,
}

impl WireHand {
    fn validate(self) -> Result<HandObservation, LandmarkError> {
        let points = self.landmarks.unwrap_or_default();
        let set = LandmarkSet::try_from(points.as_slice())?;
        let hand = HandObservation::with_tips(
            set,
            self.index_finger.unwrap_or_else(|| set.index_tip()),
            self.thumb.unwrap_or_else(|| set.thumb_tip()),
        )?;
        let divergence = hand.tip_divergence();
        if divergence > TIP_DIVERGENCE {
            trace!(divergence, "tip fields disagree with landmark array");
        }
        Ok(hand)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// One decoded frame. Hands keep their arrival order; a hand that failed
/// validation stays in place as an `Err` so it still counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Video frame reference (data URI or URL). Empty strings are dropped.
    pub image: Option<String>,
    pub hands: Vec<Result<HandObservation, LandmarkError>>,
}

impl Frame {
    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }

    pub fn first_hand(&self) -> Option<&Result<HandObservation, LandmarkError>> {
        self.hands.first()
    }
}

/// Decode one text message into a [`Frame`].
pub fn decode(text: &str) -> Result<Frame, DecodeError> {
    let wire: WireFrame = serde_json::from_str(text)?;
    Ok(Frame {
        image: wire.frame.filter(|f| !f.is_empty()),
        hands: wire
            .hands
            .unwrap_or_default()
            .into_iter()
            .map(WireHand::validate)
            .collect(),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn landmarks_json(n: usize) -> String {
        let pts: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"id":{i},"x":{},"y":0.5,"z":-0.01}}"#, i as f32 / 40.0))
            .collect();
        format!("[{}]", pts.join(","))
    }

    #[test]
    fn empty_object_is_a_handless_frame() {
        let f = decode("{}").unwrap();
        assert_eq!(f.hand_count(), 0);
        assert!(f.image.is_none());
    }

    #[test]
    fn null_fields_are_absent() {
        let f = decode(r#"{"app":"cursor","frame":null,"hands":null}"#).unwrap();
        assert_eq!(f.hand_count(), 0);
        assert!(f.image.is_none());
    }

    #[test]
    fn empty_image_reference_is_dropped() {
        let f = decode(r#"{"frame":"","hands":[]}"#).unwrap();
        assert!(f.image.is_none());
    }

    #[test]
    fn image_reference_is_kept() {
        let f = decode(r#"{"frame":"data:image/jpeg;base64,AAAA"}"#).unwrap();
        assert_eq!(f.image.as_deref(), Some("data:image/jpeg;base64,AAAA"));
    }

    #[test]
    fn full_hand_decodes_with_explicit_tips() {
        let text = format!(
            r#"{{"hands":[{{"index_finger":{{"x":0.9,"y":0.1}},"thumb":{{"x":0.1,"y":0.9}},"landmarks":{}}}]}}"#,
            landmarks_json(21),
        );
        let f = decode(&text).unwrap();
        let hand = f.first_hand().unwrap().as_ref().unwrap();
        assert_eq!(hand.index_finger(), Point2D::new(0.9, 0.1));
        assert_eq!(hand.thumb(), Point2D::new(0.1, 0.9));
        assert_eq!(hand.landmarks()[20], Point2D::new(0.5, 0.5));
    }

    #[test]
    fn missing_tips_are_derived() {
        let text = format!(r#"{{"hands":[{{"landmarks":{}}}]}}"#, landmarks_json(21));
        let f = decode(&text).unwrap();
        let hand = f.first_hand().unwrap().as_ref().unwrap();
        assert_eq!(hand.index_finger(), hand.landmarks()[8]);
        assert_eq!(hand.thumb(), hand.landmarks()[4]);
    }

    #[test]
    fn short_hand_is_kept_as_error_and_still_counted() {
        let text = format!(
            r#"{{"hands":[{{"landmarks":{}}},{{"landmarks":{}}}]}}"#,
            landmarks_json(20),
            landmarks_json(21),
        );
        let f = decode(&text).unwrap();
        assert_eq!(f.hand_count(), 2);
        assert_eq!(f.hands[0], Err(LandmarkError::Cardinality(20)));
        assert!(f.hands[1].is_ok());
    }

    #[test]
    fn hand_without_landmarks_is_malformed() {
        let f = decode(r#"{"hands":[{"index_finger":{"x":0.1,"y":0.1}}]}"#).unwrap();
        assert_eq!(f.hands[0], Err(LandmarkError::Cardinality(0)));
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        assert!(matches!(decode("{\"hands\": ["), Err(DecodeError::Json(_))));
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode(r#"{"hands": 3}"#), Err(DecodeError::Json(_))));
    }

    #[test]
    fn non_numeric_coordinate_is_a_decode_error() {
        let text = r#"{"hands":[{"landmarks":[{"x":"a","y":0.1}]}]}"#;
        assert!(decode(text).is_err());
    }
}
