use anyhow::{bail, Context, Result};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, Frame};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::size_kb;

const START_SCALE: f64 = 0.9;
const SCALE_STEP: f64 = 0.05;
const MAX_ROUNDS: u32 = 18;
const ENCODE_SPEED: i32 = 10;

/// Rescales every frame of a GIF until the file is strictly below `max_kb`.
///
/// Each round shrinks the previous round's output, starting at 90% and
/// taking five more points off the factor every time. Unless `in_place`
/// is set the result goes to a `{stem}-zip.gif` sibling of `path`.
pub(crate) fn shrink_animated_to_budget(
    path: &Path,
    max_kb: usize,
    in_place: bool,
) -> Result<Vec<u8>> {
    let mut current =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if size_kb(&current) < max_kb {
        return Ok(current);
    }

    let destination = if in_place {
        path.to_path_buf()
    } else {
        sibling_path(path)
    };

    for round in 0..MAX_ROUNDS {
        let scale = START_SCALE - SCALE_STEP * f64::from(round);
        current = rescale_gif(&current, scale)?;
        fs::write(&destination, &current)
            .with_context(|| format!("failed to write {}", destination.display()))?;
        tracing::debug!(scale, kb = size_kb(&current), "rescaled gif");
        if size_kb(&current) < max_kb {
            return Ok(current);
        }
    }

    bail!(
        "{} cannot be shrunk below {max_kb} kb",
        path.display()
    )
}

fn sibling_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("image");
    path.with_file_name(format!("{stem}-zip.gif"))
}

fn rescale_gif(bytes: &[u8], scale: f64) -> Result<Vec<u8>> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).context("failed to decode gif")?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .context("failed to read gif frames")?;

    let mut resized = Vec::with_capacity(frames.len());
    for frame in frames {
        let left = scaled(frame.left(), scale);
        let top = scaled(frame.top(), scale);
        let delay = frame.delay();
        let buffer = frame.into_buffer();
        let width = scaled(buffer.width(), scale);
        let height = scaled(buffer.height(), scale);
        if width == 0 || height == 0 {
            bail!("gif frames collapsed to zero size");
        }
        let buffer = imageops::resize(&buffer, width, height, FilterType::Triangle);
        resized.push(Frame::from_parts(buffer, left, top, delay));
    }

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, ENCODE_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .context("failed to configure gif encoder")?;
        encoder
            .encode_frames(resized)
            .context("failed to encode gif")?;
    }
    Ok(out)
}

fn scaled(value: u32, scale: f64) -> u32 {
    (f64::from(value) * scale) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Delay, RgbaImage};
    use tempfile::tempdir;

    fn noise_gif(size: u32, frames: u32) -> Vec<u8> {
        let mut seed: u32 = 0x9e37_79b9;
        let frames = (0..frames)
            .map(|_| {
                let buffer = RgbaImage::from_fn(size, size, |_, _| {
                    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    let [r, g, b, _] = seed.to_le_bytes();
                    image::Rgba([r, g, b, 255])
                });
                Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(100, 1))
            })
            .collect::<Vec<_>>();
        let mut out = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.encode_frames(frames).expect("encode gif");
        }
        out
    }

    #[test]
    fn copy_is_written_next_to_the_original() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("dance.gif");
        let original = noise_gif(160, 3);
        fs::write(&path, &original).expect("write gif");
        let budget = (size_kb(&original) / 2).max(1);

        let shrunk = shrink_animated_to_budget(&path, budget, false).expect("shrink");

        assert!(size_kb(&shrunk) < budget);
        assert_eq!(fs::read(&path).expect("original"), original);
        let copy = fs::read(dir.path().join("dance-zip.gif")).expect("copy");
        assert_eq!(copy, shrunk);
    }

    #[test]
    fn in_place_overwrites_the_source() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("loop.gif");
        let original = noise_gif(160, 2);
        fs::write(&path, &original).expect("write gif");
        let budget = (size_kb(&original) / 2).max(1);

        let shrunk = shrink_animated_to_budget(&path, budget, true).expect("shrink");

        assert_eq!(fs::read(&path).expect("rewritten"), shrunk);
        assert!(!dir.path().join("loop-zip.gif").exists());
    }

    #[test]
    fn under_budget_gif_is_read_back_as_is() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("tiny.gif");
        let original = noise_gif(4, 1);
        fs::write(&path, &original).expect("write gif");

        let bytes = shrink_animated_to_budget(&path, 200, false).expect("shrink");
        assert_eq!(bytes, original);
        assert!(!dir.path().join("tiny-zip.gif").exists());
    }
}
