/// Content sniffing for uploaded files.
///
/// Uploads are checked by magic bytes, never by the client-supplied
/// filename or MIME type. Returns the canonical extension used when
/// storing the file.
pub fn sniff_image(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(b"\xff\xd8\xff") {
        Some("jpg")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Recognizes gzip, zip, and plain tar archives.
pub fn sniff_archive(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x1f\x8b") {
        Some("tar.gz")
    } else if data.starts_with(b"PK\x03\x04") {
        Some("zip")
    } else if data.len() > 262 && &data[257..262] == b"ustar" {
        Some("tar")
    } else {
        None
    }
}
