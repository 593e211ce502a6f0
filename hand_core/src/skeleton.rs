//! Skeleton rendering onto an abstract 2D surface.
//!
//! Every call clears the surface and redraws the whole hand: five wrist-to-tip
//! polylines, then markers on the index tip, the thumb tip and the finger
//! bases. Landmarks are scaled from normalized coordinates to the surface
//! size reported by [`Surface::size`].

use tracing::trace;

use crate::geometry::Point2D;
use crate::landmarks::{LandmarkSet, FINGER_BASES, FINGER_CHAINS, INDEX_TIP, LANDMARK_COUNT, THUMB_TIP};

// ════════════════════════════════════════════════════════════════════════════
// Drawing primitives
// ════════════════════════════════════════════════════════════════════════════

/// Packed `0xAARRGGBB` color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn argb(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub color:  Color,
    pub radius: f32,
}

/// The three primitives the renderer needs. Coordinates are in surface
/// pixels, origin top-left.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    fn stroke_polyline(&mut self, points: &[(f32, f32)], stroke: Stroke);
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color);
}

/// Colors and sizes for one skeleton.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkeletonStyle {
    pub bone:      Stroke,
    pub index_tip: Marker,
    pub thumb_tip: Marker,
    pub base:      Marker,
}

mod colors {
    use super::Color;

    pub const BONE:      Color = Color::rgb(0x00, 0xDB, 0xDE);
    pub const INDEX_TIP: Color = Color::rgb(0xFF, 0x00, 0x00);
    pub const THUMB_TIP: Color = Color::rgb(0x00, 0xFF, 0x00);
    pub const BASE:      Color = Color::rgb(0xFF, 0xFF, 0x00);
}

impl Default for SkeletonStyle {
    fn default() -> Self {
        SkeletonStyle {
            bone:      Stroke { color: colors::BONE, width: 2.0 },
            index_tip: Marker { color: colors::INDEX_TIP, radius: 6.0 },
            thumb_tip: Marker { color: colors::THUMB_TIP, radius: 6.0 },
            base:      Marker { color: colors::BASE, radius: 4.0 },
        }
    }
}

impl SkeletonStyle {
    fn marker_for(&self, index: usize) -> Option<Marker> {
        match index {
            INDEX_TIP => Some(self.index_tip),
            THUMB_TIP => Some(self.thumb_tip),
            i if FINGER_BASES.contains(&i) => Some(self.base),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Rendering
// ════════════════════════════════════════════════════════════════════════════

/// Draw a raw landmark slice. Anything other than 21 points is skipped
/// without touching the surface; returns whether the hand was drawn.
pub fn render<S: Surface + ?Sized>(surface: &mut S, landmarks: &[Point2D], style: &SkeletonStyle) -> bool {
    if landmarks.len() != LANDMARK_COUNT {
        trace!(count = landmarks.len(), "skipping malformed landmark set");
        return false;
    }

    let (w, h) = surface.size();
    let (w, h) = (w as f32, h as f32);
    let scale = |p: Point2D| (p.x * w, p.y * h);

    surface.clear();

    for chain in FINGER_CHAINS {
        let polyline = chain.map(|i| scale(landmarks[i]));
        surface.stroke_polyline(&polyline, style.bone);
    }

    for (index, &point) in landmarks.iter().enumerate() {
        if let Some(marker) = style.marker_for(index) {
            surface.fill_circle(scale(point), marker.radius, marker.color);
        }
    }

    true
}

/// Draw a validated landmark set.
pub fn render_set<S: Surface + ?Sized>(surface: &mut S, landmarks: &LandmarkSet, style: &SkeletonStyle) -> bool {
    render(surface, landmarks.points(), style)
}

// ════════════════════════════════════════════════════════════════════════════
// RecordingSurface: headless surface that logs every call
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear,
    Polyline { points: Vec<(f32, f32)>, stroke: Stroke },
    Circle { center: (f32, f32), radius: f32, color: Color },
}

/// A [`Surface`] that draws nothing and records every primitive, for tests
/// and for offline tooling.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    width:     u32,
    height:    u32,
    pub calls: Vec<DrawCall>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        RecordingSurface { width, height, calls: Vec::new() }
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Circle { .. }))
    }

    pub fn polylines(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(|c| matches!(c, DrawCall::Polyline { .. }))
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], stroke: Stroke) {
        self.calls.push(DrawCall::Polyline { points: points.to_vec(), stroke });
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color) {
        self.calls.push(DrawCall::Circle { center, radius, color });
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
