//! Video frame references → pixels.
//!
//! The backend embeds each camera frame as `data:image/jpeg;base64,...`.
//! Plain URLs are valid references too but are not fetched; they come back
//! as [`VideoError::NotDataUri`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("frame reference is not a data URI")]
    NotDataUri,
    #[error("data URI is not base64-encoded")]
    NotBase64,
    #[error("bad base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("cannot decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decoded frame as packed `0xAARRGGBB` pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl VideoFrame {
    /// Nearest-neighbour scale into a `dst_w × dst_h` buffer.
    pub fn blit_scaled(&self, dst: &mut [u32], dst_w: usize, dst_h: usize) {
        if self.width == 0 || self.height == 0 || dst.len() < dst_w * dst_h {
            return;
        }
        for y in 0..dst_h {
            let sy = y * self.height / dst_h;
            let src_row = &self.pixels[sy * self.width..(sy + 1) * self.width];
            let dst_row = &mut dst[y * dst_w..(y + 1) * dst_w];
            for (x, d) in dst_row.iter_mut().enumerate() {
                *d = src_row[x * self.width / dst_w];
            }
        }
    }
}

pub fn decode_data_uri(reference: &str) -> Result<VideoFrame, VideoError> {
    let rest = reference.strip_prefix("data:").ok_or(VideoError::NotDataUri)?;
    let (meta, data) = rest.split_once(',').ok_or(VideoError::NotDataUri)?;
    if !meta.ends_with(";base64") {
        return Err(VideoError::NotBase64);
    }

    let bytes = STANDARD.decode(data.trim())?;
    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = (rgba.width() as usize, rgba.height() as usize);
    let pixels = rgba
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
        })
        .collect();

    Ok(VideoFrame { width, height, pixels })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_uri(img: &RgbaImage) -> String {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&bytes))
    }

    #[test]
    fn decodes_png_data_uri() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 255, 255]));

        let frame = decode_data_uri(&png_uri(&img)).unwrap();
        assert_eq!((frame.width, frame.height), (2, 1));
        assert_eq!(frame.pixels, vec![0xFFFF0000, 0xFF0000FF]);
    }

    #[test]
    fn rejects_non_data_references() {
        assert!(matches!(decode_data_uri("http://cam/frame.jpg"), Err(VideoError::NotDataUri)));
        assert!(matches!(decode_data_uri("data:image/png"), Err(VideoError::NotDataUri)));
        assert!(matches!(decode_data_uri("data:text/plain,hello"), Err(VideoError::NotBase64)));
    }

    #[test]
    fn rejects_garbage_payloads() {
        assert!(matches!(decode_data_uri("data:image/jpeg;base64,@@@"), Err(VideoError::Base64(_))));
        assert!(matches!(decode_data_uri("data:image/jpeg;base64,AAAA"), Err(VideoError::Image(_))));
    }

    #[test]
    fn blit_scales_nearest_neighbour() {
        let frame = VideoFrame { width: 2, height: 1, pixels: vec![1, 2] };
        let mut dst = vec![0u32; 4 * 2];
        frame.blit_scaled(&mut dst, 4, 2);
        assert_eq!(dst, vec![1, 1, 2, 2, 1, 1, 2, 2]);
    }
}
