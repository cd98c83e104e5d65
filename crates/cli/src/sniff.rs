//! Content-type detection for uploads
//!
//! Looks at the first 512 bytes of the file: known magic numbers first, then
//! a text/binary check, then the file extension.

use std::io::Read;
use std::path::Path;

use objstor_core::{Error, Result, ResultExt};

/// Only this many leading bytes are inspected
const SNIFF_LEN: usize = 512;

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Signatures matched at offset 0
const MAGIC: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
    (b"BZh", "application/x-bzip2"),
    (b"\xfd7zXZ\x00", "application/x-xz"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"<?xml", "text/xml; charset=utf-8"),
];

/// Determine the content type of a local file
pub fn content_type(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)
        .map_err(Error::from)
        .context("open", path.display().to_string())?;

    let mut buffer = Vec::with_capacity(SNIFF_LEN);
    (&mut file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut buffer)
        .map_err(Error::from)
        .context("read", path.display().to_string())?;

    let detected = detect(&buffer)
        .map(str::to_string)
        .or_else(|| {
            mime_guess::from_path(path)
                .first()
                .map(|m| m.essence_str().to_string())
        })
        .unwrap_or_else(|| OCTET_STREAM.to_string());

    tracing::debug!(path = %path.display(), content_type = %detected, "sniffed content type");
    Ok(detected)
}

/// Content type from leading bytes, or `None` for unrecognised binary data
pub fn detect(data: &[u8]) -> Option<&'static str> {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some((_, mime)) = MAGIC.iter().find(|(magic, _)| data.starts_with(magic)) {
        return Some(*mime);
    }

    if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    // tar keeps its magic in the header block, past the file name
    if data.len() >= 262 && &data[257..262] == b"ustar" {
        return Some("application/x-tar");
    }

    if is_html(data) {
        return Some("text/html; charset=utf-8");
    }

    if !data.iter().any(|&b| is_binary_byte(b)) {
        return Some(TEXT_PLAIN);
    }

    None
}

fn is_html(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let data = &data[start..];

    ["<!doctype html", "<html", "<head", "<body"]
        .iter()
        .any(|tag| {
            data.len() >= tag.len() && data[..tag.len()].eq_ignore_ascii_case(tag.as_bytes())
        })
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_magic() {
        assert_eq!(detect(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), Some("image/png"));
        assert_eq!(detect(b"%PDF-1.7\n"), Some("application/pdf"));
        assert_eq!(detect(b"\x1f\x8b\x08\x00\x00"), Some("application/x-gzip"));
        assert_eq!(detect(b"RIFF\x10\0\0\0WEBPVP8 "), Some("image/webp"));
    }

    #[test]
    fn test_detect_tar() {
        let mut header = vec![0u8; 512];
        header[..5].copy_from_slice(b"a.txt");
        header[257..262].copy_from_slice(b"ustar");
        assert_eq!(detect(&header), Some("application/x-tar"));
    }

    #[test]
    fn test_detect_text_and_html() {
        assert_eq!(detect(b"hello world\n"), Some(TEXT_PLAIN));
        assert_eq!(detect(b""), Some(TEXT_PLAIN));
        assert_eq!(
            detect(b"  \n<!DOCTYPE html><html></html>"),
            Some("text/html; charset=utf-8")
        );
    }

    #[test]
    fn test_detect_unknown_binary() {
        assert_eq!(detect(&[0x00, 0x01, 0x02, 0xfe]), None);
    }

    #[test]
    fn test_content_type_from_file() {
        let dir = tempfile::tempdir().unwrap();

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "backup log\n").unwrap();
        assert_eq!(content_type(&text).unwrap(), TEXT_PLAIN);

        let blob = dir.path().join("data.bin");
        let mut file = std::fs::File::create(&blob).unwrap();
        file.write_all(&[0x00, 0x13, 0x37, 0x00]).unwrap();
        drop(file);
        assert_eq!(content_type(&blob).unwrap(), OCTET_STREAM);
    }

    #[test]
    fn test_content_type_falls_back_to_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.7z");
        std::fs::write(&path, [0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c, 0x00, 0x04]).unwrap();
        assert_eq!(content_type(&path).unwrap(), "application/x-7z-compressed");
    }

    #[test]
    fn test_content_type_missing_file() {
        let err = content_type(Path::new("/nonexistent/objstor-sniff")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/objstor-sniff"));
        assert_eq!(err.exit_code(), 1);
    }
}
