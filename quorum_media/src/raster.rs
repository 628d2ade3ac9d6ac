use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::size_kb;

const RESIZE_STEP: f64 = 0.95;

/// Resizes by 5% per round and re-encodes as JPEG until the result is
/// strictly below `max_kb`. Inputs already under budget come back untouched.
pub(crate) fn shrink_to_budget(bytes: &[u8], max_kb: usize) -> Result<Vec<u8>> {
    if size_kb(bytes) < max_kb {
        return Ok(bytes.to_vec());
    }

    let original_format = image::guess_format(bytes).context("unrecognized image format")?;
    let mut current = image::load_from_memory_with_format(bytes, original_format)
        .context("failed to decode image")?;

    loop {
        let width = (current.width() as f64 * RESIZE_STEP) as u32;
        let height = (current.height() as f64 * RESIZE_STEP) as u32;
        if width == 0 || height == 0 {
            bail!("image cannot be shrunk below {max_kb} kb");
        }
        current = current.resize_exact(width, height, FilterType::Triangle);
        let encoded = encode(&current, original_format)?;
        tracing::trace!(width, height, kb = size_kb(&encoded), "re-encoded image");
        if size_kb(&encoded) < max_kb {
            return Ok(encoded);
        }
    }
}

fn encode(image: &DynamicImage, fallback: ImageFormat) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    match DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut out, ImageFormat::Jpeg) {
        Ok(()) => Ok(out.into_inner()),
        Err(err) => {
            tracing::debug!(
                error = %err,
                ?fallback,
                "jpeg re-encode failed, keeping original format"
            );
            let mut out = Cursor::new(Vec::new());
            image
                .write_to(&mut out, fallback)
                .with_context(|| format!("failed to re-encode image as {fallback:?}"))?;
            Ok(out.into_inner())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn noise_png(width: u32, height: u32) -> Vec<u8> {
        let mut seed: u32 = 0x2545_f491;
        let img = RgbImage::from_fn(width, height, |_, _| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let [r, g, b, _] = seed.to_le_bytes();
            image::Rgb([r, g, b])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn small_images_are_returned_unchanged() {
        let png = noise_png(8, 8);
        let shrunk = shrink_to_budget(&png, 200).expect("shrink");
        assert_eq!(shrunk, png);
    }

    #[test]
    fn large_images_end_up_under_budget_as_jpeg() {
        let png = noise_png(400, 400);
        assert!(size_kb(&png) >= 50);

        let shrunk = shrink_to_budget(&png, 50).expect("shrink");
        assert!(size_kb(&shrunk) < 50);
        assert_eq!(
            image::guess_format(&shrunk).expect("format"),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let bytes = vec![0u8; 4096];
        assert!(shrink_to_budget(&bytes, 1).is_err());
    }
}
