//! QR decoding of captured frames.
//!
//! A decoder is a pure function from an RGBA pixel buffer to an optional
//! payload. Returning `None` is the expected outcome for most frames.

/// Maps an RGBA8 pixel buffer to a decoded payload.
pub trait Decoder {
    /// Decode the first readable code in the buffer.
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<String>;
}

/// QR decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<String> {
        let (w, h) = (width as usize, height as usize);
        let expected = w.checked_mul(h).and_then(|n| n.checked_mul(4));
        if w == 0 || h == 0 || expected != Some(pixels.len()) {
            log::debug!(
                "Ignoring {}x{} frame with {} bytes of pixel data",
                width,
                height,
                pixels.len()
            );
            return None;
        }

        let luma = to_luma(pixels);
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(w, h, |x, y| luma[y * w + x]);

        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_meta, content)) => return Some(content),
                Err(err) => log::trace!("QR grid found but not decodable: {}", err),
            }
        }
        None
    }
}

/// Convert RGBA8 pixels to 8-bit luma (ITU-R BT.601 weights, alpha ignored).
#[must_use]
pub fn to_luma(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .map(|px| {
            let y = u32::from(px[0]) * 299 + u32::from(px[1]) * 587 + u32::from(px[2]) * 114;
            (y / 1000) as u8
        })
        .collect()
}
