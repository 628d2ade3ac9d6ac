/// File type detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileKind {
    pub extension: &'static str,
    pub mime: &'static str,
}

impl FileKind {
    pub fn is_gif(&self) -> bool {
        self.extension == "gif"
    }
}

/// Guesses the file type of `bytes`, returning `None` for unknown formats.
pub fn sniff(bytes: &[u8]) -> Option<FileKind> {
    infer::get(bytes).map(|kind| FileKind {
        extension: kind.extension(),
        mime: kind.mime_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_image_headers() {
        let png = sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").expect("png");
        assert_eq!(png.extension, "png");
        assert_eq!(png.mime, "image/png");

        let gif = sniff(b"GIF89a\x01\x00\x01\x00").expect("gif");
        assert!(gif.is_gif());

        let jpeg = sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).expect("jpeg");
        assert_eq!(jpeg.mime, "image/jpeg");
    }

    #[test]
    fn unknown_bytes_have_no_kind() {
        assert_eq!(sniff(b"plain text"), None);
    }
}
