//! Turns caller-supplied pictures into size-bounded `image` entries.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use quorum_media::{sniff, MediaCodec};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ImageLimits;
use crate::error::{ClientError, Result};
use crate::utils::today;

/// One picture to attach to a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// A file on disk. Animated GIFs are shrunk next to the original.
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// Base64-encoded bytes.
    Base64(String),
    /// Already encoded; sent as given without recompression.
    Packed {
        content: String,
        name: Option<String>,
        media_type: Option<String>,
    },
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        ImageInput::Path(path)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        ImageInput::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        ImageInput::Bytes(bytes)
    }
}

impl From<PackedImage> for ImageInput {
    fn from(image: PackedImage) -> Self {
        ImageInput::Packed {
            content: image.content,
            name: Some(image.name),
            media_type: Some(image.media_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedImage {
    pub name: String,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    /// Base64 of the image bytes.
    pub content: String,
}

/// Packs up to `limits.max_count` images, splitting `limits.max_total_kb`
/// evenly between them. Extra inputs are dropped.
pub(crate) fn pack_images(
    codec: &dyn MediaCodec,
    limits: &ImageLimits,
    images: &[ImageInput],
) -> Result<Vec<PackedImage>> {
    if images.is_empty() {
        return Ok(Vec::new());
    }
    let kept = &images[..images.len().min(limits.max_count.max(1))];
    let budget_kb = limits.per_image_kb(kept.len());
    kept.iter()
        .map(|image| pack_one(codec, image, budget_kb))
        .collect()
}

pub(crate) fn pack_one(
    codec: &dyn MediaCodec,
    image: &ImageInput,
    budget_kb: usize,
) -> Result<PackedImage> {
    match image {
        ImageInput::Packed {
            content,
            name,
            media_type,
        } => pack_prepared(content, name.as_deref(), media_type.as_deref()),
        ImageInput::Path(path) => {
            let raw = fs::read(path).map_err(|err| {
                ClientError::invalid(format!("cannot read image {}: {err}", path.display()))
            })?;
            let animated = sniff(&raw).is_some_and(|kind| kind.is_gif());
            let shrunk = if animated {
                codec.shrink_animated_to_budget(path, budget_kb, false)
            } else {
                codec.shrink_to_budget(&raw, budget_kb)
            }
            .map_err(ClientError::Media)?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            encode(shrunk, name)
        }
        ImageInput::Bytes(raw) => {
            let shrunk = codec
                .shrink_to_budget(raw, budget_kb)
                .map_err(ClientError::Media)?;
            encode(shrunk, None)
        }
        ImageInput::Base64(encoded) => {
            let raw = decode_base64(encoded)?;
            let shrunk = codec
                .shrink_to_budget(&raw, budget_kb)
                .map_err(ClientError::Media)?;
            encode(shrunk, None)
        }
    }
}

fn pack_prepared(
    content: &str,
    name: Option<&str>,
    media_type: Option<&str>,
) -> Result<PackedImage> {
    if content.is_empty() {
        return Err(ClientError::invalid("image content got null"));
    }
    let (name, media_type) = match (name, media_type) {
        (Some(name), Some(media_type)) => (name.to_string(), media_type.to_string()),
        _ => {
            let raw = decode_base64(content)?;
            (
                name.map(str::to_string).map_or_else(|| generated_name(&raw), Ok)?,
                media_type.map(str::to_string).map_or_else(|| mime_of(&raw), Ok)?,
            )
        }
    };
    Ok(PackedImage {
        name,
        media_type,
        content: content.to_string(),
    })
}

fn encode(bytes: Vec<u8>, name: Option<String>) -> Result<PackedImage> {
    let name = match name {
        Some(name) => name,
        None => generated_name(&bytes)?,
    };
    Ok(PackedImage {
        name,
        media_type: mime_of(&bytes)?,
        content: BASE64.encode(&bytes),
    })
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded.trim())
        .map_err(|err| ClientError::invalid(format!("image is not valid base64: {err}")))
}

/// `{uuid}-{YYYY-MM-DD}.{ext}` with the extension sniffed from `bytes`.
fn generated_name(bytes: &[u8]) -> Result<String> {
    let kind = sniff(bytes).ok_or_else(|| ClientError::invalid("unrecognized image format"))?;
    Ok(format!("{}-{}.{}", Uuid::new_v4(), today(), kind.extension))
}

pub(crate) fn mime_of(bytes: &[u8]) -> Result<String> {
    sniff(bytes)
        .map(|kind| kind.mime.to_string())
        .ok_or_else(|| ClientError::invalid("unrecognized image format"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    pub(crate) const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
    pub(crate) const GIF_HEADER: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";

    /// Returns its input unchanged and remembers every budget it was given.
    #[derive(Default)]
    pub(crate) struct RecordingCodec {
        pub calls: Mutex<Vec<(&'static str, usize)>>,
    }

    impl MediaCodec for RecordingCodec {
        fn shrink_to_budget(&self, bytes: &[u8], max_kb: usize) -> anyhow::Result<Vec<u8>> {
            self.calls.lock().unwrap().push(("static", max_kb));
            Ok(bytes.to_vec())
        }

        fn shrink_animated_to_budget(
            &self,
            path: &Path,
            max_kb: usize,
            in_place: bool,
        ) -> anyhow::Result<Vec<u8>> {
            assert!(!in_place);
            self.calls.lock().unwrap().push(("animated", max_kb));
            Ok(fs::read(path)?)
        }
    }

    fn png() -> ImageInput {
        ImageInput::Bytes(PNG_HEADER.to_vec())
    }

    #[test]
    fn only_the_first_images_are_packed_with_split_budget() {
        let codec = RecordingCodec::default();
        let inputs = vec![png(), png(), png(), png(), png()];
        let packed = pack_images(&codec, &ImageLimits::default(), &inputs).unwrap();

        assert_eq!(packed.len(), 4);
        assert_eq!(*codec.calls.lock().unwrap(), vec![("static", 50); 4]);
        for image in &packed {
            assert_eq!(image.media_type, "image/png");
            assert!(image.name.ends_with(&format!("-{}.png", today())));
            assert_eq!(BASE64.decode(&image.content).unwrap(), PNG_HEADER);
        }
    }

    #[test]
    fn single_image_gets_the_whole_budget() {
        let codec = RecordingCodec::default();
        let limits = ImageLimits {
            max_total_kb: 120,
            max_count: 4,
        };
        pack_images(&codec, &limits, &[png()]).unwrap();
        assert_eq!(*codec.calls.lock().unwrap(), vec![("static", 120)]);
    }

    #[test]
    fn gif_files_go_through_the_animated_path_and_keep_their_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.gif");
        fs::write(&path, GIF_HEADER).unwrap();

        let codec = RecordingCodec::default();
        let packed = pack_images(&codec, &ImageLimits::default(), &[path.into()]).unwrap();

        assert_eq!(packed[0].name, "wave.gif");
        assert_eq!(packed[0].media_type, "image/gif");
        assert_eq!(*codec.calls.lock().unwrap(), vec![("animated", 200)]);
    }

    #[test]
    fn gif_bytes_are_treated_as_static() {
        let codec = RecordingCodec::default();
        let input = ImageInput::Base64(BASE64.encode(GIF_HEADER));
        pack_images(&codec, &ImageLimits::default(), &[input]).unwrap();
        assert_eq!(*codec.calls.lock().unwrap(), vec![("static", 200)]);
    }

    #[test]
    fn prepared_images_skip_the_codec() {
        let codec = RecordingCodec::default();
        let input = ImageInput::Packed {
            content: BASE64.encode(PNG_HEADER),
            name: Some("cover.png".into()),
            media_type: None,
        };
        let packed = pack_images(&codec, &ImageLimits::default(), &[input]).unwrap();
        assert_eq!(packed[0].name, "cover.png");
        assert_eq!(packed[0].media_type, "image/png");
        assert!(codec.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn prepared_image_without_content_is_rejected() {
        let input = ImageInput::Packed {
            content: String::new(),
            name: None,
            media_type: None,
        };
        let err = pack_images(&RecordingCodec::default(), &ImageLimits::default(), &[input])
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        let input = ImageInput::Bytes(b"not an image".to_vec());
        let err = pack_images(&RecordingCodec::default(), &ImageLimits::default(), &[input])
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }
}
