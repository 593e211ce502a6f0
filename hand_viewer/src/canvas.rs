//! Software ARGB canvas implementing [`Surface`], plus a tiny bitmap font.
//!
//! The skeleton layer clears to fully transparent so it can be composited
//! over the video frame; [`PixelCanvas::composite_onto`] copies every pixel
//! whose alpha is non-zero.

use hand_core::{Color, Stroke, Surface};

pub const TRANSPARENT: u32 = 0x0000_0000;

/// Step along a polyline segment when stamping discs, in pixels.
const LINE_STEP: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct PixelCanvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        PixelCanvas { width, height, buf: vec![TRANSPARENT; width * height] }
    }

    pub fn width(&self)  -> usize  { self.width }
    pub fn height(&self) -> usize  { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }
    pub fn pixels_mut(&mut self) -> &mut [u32] { &mut self.buf }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn opaque_count(&self) -> usize {
        self.buf.iter().filter(|&&p| p >> 24 != 0).count()
    }

    pub fn fill(&mut self, color: u32) {
        self.buf.fill(color);
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }

    fn set_pixel_i(&mut self, x: i64, y: i64, color: u32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize, color);
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// Filled disc. Covers every pixel whose centre lies within `radius`,
    /// and always the pixel under `center`.
    pub fn disc(&mut self, cx: f32, cy: f32, radius: f32, color: u32) {
        if !(cx.is_finite() && cy.is_finite() && radius.is_finite()) {
            return;
        }
        let r = radius.max(0.0);
        let r2 = r * r;
        let x0 = ((cx - r).floor() as i64).max(0);
        let x1 = ((cx + r).ceil() as i64).min(self.width as i64 - 1);
        let y0 = ((cy - r).floor() as i64).max(0);
        let y1 = ((cy + r).ceil() as i64).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel_i(x, y, color);
                }
            }
        }
        self.set_pixel_i(cx.floor() as i64, cy.floor() as i64, color);
    }

    /// Thick line by stamping discs of `width / 2` along the segment.
    /// Only the part within reach of the canvas is stepped, so the cost is
    /// bounded by the canvas size however far away the endpoints are.
    pub fn line(&mut self, a: (f32, f32), b: (f32, f32), width: f32, color: u32) {
        let r = (width / 2.0).max(0.5);
        let reach = (self.width as f32 + r, self.height as f32 + r);
        let Some((a, b)) = clip_segment(a, b, (-r, -r), reach) else {
            return;
        };
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = (dx * dx + dy * dy).sqrt();
        let steps = ((len / LINE_STEP).ceil() as usize).max(1);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.disc(a.0 + dx * t, a.1 + dy * t, r, color);
        }
    }

    /// 3×5 bitmap text, each font pixel drawn as a `scale × scale` block.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            if cx + 3 * scale > self.width {
                break;
            }
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
        }
    }

    /// Copy every non-transparent pixel onto `dst`, which must be the same size.
    pub fn composite_onto(&self, dst: &mut [u32]) {
        for (d, &s) in dst.iter_mut().zip(self.buf.iter()) {
            if s >> 24 != 0 {
                *d = s;
            }
        }
    }
}

impl Surface for PixelCanvas {
    fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn clear(&mut self) {
        self.buf.fill(TRANSPARENT);
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)], stroke: Stroke) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], stroke.width, stroke.color.argb());
        }
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Color) {
        self.disc(center.0, center.1, radius, color.argb());
    }
}

/// Liang–Barsky: the part of `a → b` inside the rectangle `min..=max`, or
/// `None` when the segment misses it or has a non-finite endpoint.
fn clip_segment(
    a:   (f32, f32),
    b:   (f32, f32),
    min: (f32, f32),
    max: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    if !(dx.is_finite() && dy.is_finite()) {
        return None;
    }
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [(-dx, a.0 - min.0), (dx, max.0 - a.0), (-dy, a.1 - min.1), (dy, max.1 - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some(((a.0 + dx * t0, a.1 + dy * t0), (a.0 + dx * t1, a.1 + dy * t1)))
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

pub fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
