//! Pure geometry over normalized landmark points.
//!
//! Coordinates are normalized to `[0, 1]` relative to the source video frame.
//! Non-finite input is an upstream contract violation and is rejected with
//! [`GeometryError::NonFinite`] rather than propagated as NaN.

use serde::Deserialize;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Point types
// ════════════════════════════════════════════════════════════════════════════

/// A landmark position, normalized to the source video frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Point2D { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Integer pixel position on a screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f32, y: f32 },
}

fn finite(p: Point2D) -> Result<Point2D, GeometryError> {
    if p.is_finite() {
        Ok(p)
    } else {
        Err(GeometryError::NonFinite { x: p.x, y: p.y })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Operations
// ════════════════════════════════════════════════════════════════════════════

/// Euclidean distance in normalized units. No clamping.
pub fn distance(a: Point2D, b: Point2D) -> Result<f32, GeometryError> {
    let a = finite(a)?;
    let b = finite(b)?;
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    Ok((dx * dx + dy * dy).sqrt())
}

/// Map a normalized point onto a `width × height` screen, rounding to the
/// nearest pixel.
pub fn to_screen(p: Point2D, width: u32, height: u32) -> Result<ScreenPoint, GeometryError> {
    let p = finite(p)?;
    Ok(ScreenPoint {
        x: (p.x as f64 * width as f64).round() as i32,
        y: (p.y as f64 * height as f64).round() as i32,
    })
}

/// Percent-of-frame readout, `(x * 100, y * 100)`.
pub fn percent(p: Point2D) -> (f32, f32) {
    (p.x * 100.0, p.y * 100.0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn distance_to_self_is_zero() {
        for &(x, y) in &[(0.0, 0.0), (0.5, 0.5), (1.0, 0.25), (0.123, 0.987)] {
            let p = Point2D::new(x, y);
            assert_eq!(distance(p, p).unwrap(), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Point2D::new(0.1, 0.9);
        let b = Point2D::new(0.7, 0.2);
        assert_eq!(distance(a, b).unwrap(), distance(b, a).unwrap());
    }

    #[test]
    fn distance_three_four_five() {
        let d = distance(Point2D::new(0.0, 0.0), Point2D::new(0.3, 0.4)).unwrap();
        assert!((d - 0.5).abs() < EPS);
    }

    #[test]
    fn distance_rejects_nan() {
        let err = distance(Point2D::new(f32::NAN, 0.0), Point2D::default()).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { .. }));
    }

    #[test]
    fn distance_rejects_infinity_on_either_side() {
        let inf = Point2D::new(0.0, f32::INFINITY);
        assert!(distance(Point2D::default(), inf).is_err());
        assert!(distance(inf, Point2D::default()).is_err());
    }

    #[test]
    fn to_screen_rounds_to_nearest() {
        let s = to_screen(Point2D::new(0.5, 0.25), 1920, 1080).unwrap();
        assert_eq!(s, ScreenPoint { x: 960, y: 270 });

        // 0.3333 * 1000 = 333.3 → 333 ; 0.6667 * 1000 = 666.7 → 667
        let s = to_screen(Point2D::new(0.3333, 0.6667), 1000, 1000).unwrap();
        assert_eq!(s, ScreenPoint { x: 333, y: 667 });
    }

    #[test]
    fn to_screen_does_not_clamp() {
        let s = to_screen(Point2D::new(1.1, -0.1), 100, 100).unwrap();
        assert_eq!(s, ScreenPoint { x: 110, y: -10 });
    }

    #[test]
    fn to_screen_rejects_non_finite() {
        assert!(to_screen(Point2D::new(f32::NAN, 0.5), 100, 100).is_err());
    }

    #[test]
    fn percent_readout() {
        let (x, y) = percent(Point2D::new(0.5, 0.51));
        assert!((x - 50.0).abs() < 1e-4);
        assert!((y - 51.0).abs() < 1e-4);
    }
}
