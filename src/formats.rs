//! Static extension ↔ MIME registry.
//!
//! The table is the single list of source formats the tool advertises (the
//! `GET /formats` endpoint and the file scanner both read it). Lookups are
//! case-insensitive and never fail: anything unknown maps to
//! [`OCTET_STREAM`].

use serde::Serialize;
use std::path::Path;

/// Generic binary MIME type used for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// One registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    #[serde(rename = "ext")]
    pub extension: &'static str,
    #[serde(rename = "mime")]
    pub mime_type: &'static str,
}

const fn entry(extension: &'static str, mime_type: &'static str) -> FormatDescriptor {
    FormatDescriptor {
        extension,
        mime_type,
    }
}

static REGISTRY: &[FormatDescriptor] = &[
    entry("pdf", "application/pdf"),
    entry(
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    entry(
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    entry(
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    entry("doc", "application/msword"),
    entry("ppt", "application/vnd.ms-powerpoint"),
    entry("xls", "application/vnd.ms-excel"),
    entry("odt", "application/vnd.oasis.opendocument.text"),
    entry("odp", "application/vnd.oasis.opendocument.presentation"),
    entry("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    entry("rtf", "application/rtf"),
    entry("epub", "application/epub+zip"),
    entry("csv", "text/csv"),
    entry("tsv", "text/tab-separated-values"),
    entry("html", "text/html"),
    entry("xml", "application/xml"),
    entry("txt", "text/plain"),
    entry("md", "text/markdown"),
    entry("eml", "message/rfc822"),
    entry("png", "image/png"),
    entry("jpg", "image/jpeg"),
    entry("jpeg", "image/jpeg"),
    entry("tiff", "image/tiff"),
    entry("bmp", "image/bmp"),
    entry("gif", "image/gif"),
    entry("webp", "image/webp"),
];

/// Stable enumeration of the registry, in declaration order.
pub fn supported_formats() -> &'static [FormatDescriptor] {
    REGISTRY
}

/// MIME type registered for `extension` (without the dot), if any.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    REGISTRY
        .iter()
        .find(|d| d.extension.eq_ignore_ascii_case(extension))
        .map(|d| d.mime_type)
}

/// `true` if `extension` appears in the registry.
pub fn is_supported_extension(extension: &str) -> bool {
    mime_for_extension(extension).is_some()
}

/// MIME type for a file name, derived from its final extension.
///
/// Unmapped or missing extensions yield [`OCTET_STREAM`].
pub fn mime_for(filename: impl AsRef<Path>) -> &'static str {
    filename
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension)
        .unwrap_or(OCTET_STREAM)
}

/// `true` iff the MIME type's primary category is `image`.
pub fn is_image(mime_type: &str) -> bool {
    mime_type
        .split('/')
        .next()
        .is_some_and(|primary| primary.trim().eq_ignore_ascii_case("image"))
}

/// Strip parameters (`; charset=…`) from a `Content-Type` value.
pub fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

/// Best MIME type for an upload.
///
/// Uses the client-supplied type when it is specific, then the file name,
/// then the leading bytes (image magic numbers only).
pub fn detect_mime(declared: Option<&str>, filename: Option<&str>, bytes: &[u8]) -> String {
    if let Some(declared) = declared
        .map(|m| essence(m).to_ascii_lowercase())
        .filter(|m| !m.is_empty())
    {
        if declared != OCTET_STREAM {
            return declared;
        }
    }
    if let Some(name) = filename {
        let by_name = mime_for(name);
        if by_name != OCTET_STREAM {
            return by_name.to_string();
        }
    }
    sniff_image(bytes)
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// MIME type of an image recognised by its magic bytes.
pub fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_registered_extension_maps_to_its_mime() {
        for d in supported_formats() {
            assert_eq!(mime_for(format!("file.{}", d.extension)), d.mime_type);
            let upper = format!("FILE.{}", d.extension.to_uppercase());
            assert_eq!(mime_for(upper), d.mime_type);
        }
    }

    #[test]
    fn unknown_or_missing_extension_is_octet_stream() {
        assert_eq!(mime_for("archive.xyz"), OCTET_STREAM);
        assert_eq!(mime_for("Makefile"), OCTET_STREAM);
        assert_eq!(mime_for(""), OCTET_STREAM);
    }

    #[test]
    fn only_final_extension_counts() {
        assert_eq!(mime_for("report.pdf.txt"), "text/plain");
        assert_eq!(mime_for("photo.tar.png"), "image/png");
    }

    #[test]
    fn extensions_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for d in supported_formats() {
            assert!(seen.insert(d.extension), "duplicate {}", d.extension);
        }
    }

    #[test]
    fn image_classification() {
        assert!(is_image("image/png"));
        assert!(is_image("IMAGE/webp"));
        assert!(!is_image("application/pdf"));
        assert!(!is_image("imagex/foo"));
        assert!(!is_image(""));
    }

    #[test]
    fn essence_strips_parameters() {
        assert_eq!(essence("text/html; charset=utf-8"), "text/html");
        assert_eq!(essence(""), "");
    }

    #[test]
    fn detect_prefers_declared_then_name_then_bytes() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_mime(Some("application/pdf"), Some("x.png"), &png), "application/pdf");
        assert_eq!(detect_mime(Some(OCTET_STREAM), Some("x.csv"), b"a,b"), "text/csv");
        assert_eq!(detect_mime(None, Some("clipboard-file"), &png), "image/png");
        assert_eq!(detect_mime(None, None, b"plain"), OCTET_STREAM);
    }

    #[test]
    fn declared_octet_stream_is_generic_in_any_case() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(
            detect_mime(Some("Application/Octet-Stream"), Some("scan"), &png),
            "image/png"
        );
        assert_eq!(detect_mime(Some("Text/HTML; charset=utf-8"), None, b""), "text/html");
    }
}
