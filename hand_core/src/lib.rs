//! # hand_core
//!
//! The per-frame core of the hand viewer: a validated 21-point landmark model,
//! geometric gesture classification, and a skeleton renderer that draws onto
//! any [`Surface`].
//!
//! Nothing in here does I/O or keeps state between frames except
//! [`FpsCounter`].
//!
//! ## Landmark topology
//!
//! | Index | Role |
//! |---|---|
//! | 0 | wrist (fist reference, base of every chain) |
//! | 4, 8, 12, 16, 20 | thumb, index, middle, ring, pinky tips |
//! | 5, 9, 13, 17 | finger bases |
//! | everything else | intermediate joints |
//!
//! ## Quick start
//!
//! ```rust
//! use hand_core::{decode, classify, Gesture};
//!
//! let frame = decode(r#"{"hands": []}"#).unwrap();
//! assert_eq!(frame.hand_count(), 0);
//!
//! if let Some(Ok(hand)) = frame.first_hand() {
//!     let gesture: Gesture = classify(hand).unwrap();
//!     println!("{gesture}");
//! }
//! ```

pub mod fps;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod landmarks;
pub mod skeleton;

pub use fps::FpsCounter;
pub use frame::{decode, DecodeError, Frame};
pub use geometry::{distance, percent, to_screen, GeometryError, Point2D, ScreenPoint};
pub use gesture::{classify, classify_with, is_fist, Gesture, GestureThresholds};
pub use landmarks::{HandObservation, LandmarkError, LandmarkSet, LANDMARK_COUNT};
pub use skeleton::{render, render_set, Color, DrawCall, Marker, RecordingSurface, SkeletonStyle, Stroke, Surface};
