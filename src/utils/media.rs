use std::path::Path;

pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".wmv", ".webm"];

pub const HEIF_EXTENSIONS: &[&str] = &[".heic", ".heif"];

/// Static image extensions shown by the asset listing.
pub const LISTABLE_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg"];

/// Lowercased extension including the leading dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

pub fn is_video_extension(extension: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&extension)
}

pub fn is_heif_extension(extension: &str) -> bool {
    HEIF_EXTENSIONS.contains(&extension)
}

pub fn is_listable_image(filename: &str) -> bool {
    LISTABLE_IMAGE_EXTENSIONS.contains(&extension_of(filename).as_str())
}

/// Content-Type served for a stored filename. HEIC/HEIF is reported as JPEG.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".heic" | ".heif" => "image/jpeg",
        ".bmp" => "image/bmp",
        ".svg" => "image/svg+xml",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        ".avi" => "video/x-msvideo",
        ".wmv" => "video/x-ms-wmv",
        ".webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// True when the name is a single path component that cannot escape a storage root.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}

/// Sniffs whether the bytes are a HEIF container regardless of the declared name.
pub fn looks_like_heif(data: &[u8]) -> bool {
    matches!(
        infer::get(data).map(|t| t.mime_type()),
        Some("image/heif") | Some("image/heic")
    )
}
