use std::path::Path;
use thiserror::Error;

use crate::utils::media::extension_of;

/// Extensions accepted regardless of the declared content-type.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".heic", ".heif", ".mp4", ".mov", ".avi", ".wmv",
    ".webm",
];

#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub fn file_too_large(max_size: usize) -> ValidationError {
    ValidationError::new(
        "FILE_TOO_LARGE",
        format!(
            "File size exceeds maximum allowed {} bytes ({} MB)",
            max_size,
            max_size / 1024 / 1024
        ),
    )
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(file_too_large(max_size));
    }
    Ok(())
}

/// Exactly one file per request
pub fn validate_file_count(count: usize) -> Result<(), ValidationError> {
    match count {
        0 => Err(ValidationError::new("NO_FILE", "No file uploaded")),
        1 => Ok(()),
        _ => Err(ValidationError::new(
            "TOO_MANY_FILES",
            "Only one file may be uploaded per request",
        )),
    }
}

/// Accepts allow-listed extensions or any declared image/video content-type
pub fn validate_media_type(filename: &str, content_type: Option<&str>) -> Result<(), ValidationError> {
    let extension = extension_of(filename);
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(());
    }

    let declared = content_type
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if declared.starts_with("image/") || declared.starts_with("video/") {
        return Ok(());
    }

    Err(ValidationError::new(
        "INVALID_FILE_TYPE",
        "Only image and video files are allowed",
    ))
}

/// Reduces a client-supplied filename to its final path component
pub fn original_name(filename: &str) -> Result<String, ValidationError> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or("");
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .trim();

    if name.is_empty() {
        return Err(ValidationError::new(
            "INVALID_FILENAME",
            "Filename cannot be empty",
        ));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from uploaded filename: {}", filename);
    }

    Ok(name.to_string())
}

/// Full validation for a single uploaded file. Pure; touches no storage.
pub fn validate_upload(
    filename: &str,
    content_type: Option<&str>,
    size: usize,
    max_size: usize,
) -> Result<String, ValidationError> {
    // 1. Size check
    validate_file_size(size, max_size)?;

    // 2. Filename
    let name = original_name(filename)?;

    // 3. Type check
    validate_media_type(&name, content_type)?;

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_FILE_SIZE;

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, DEFAULT_MAX_FILE_SIZE).is_ok());
        assert!(validate_file_size(DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILE_SIZE).is_ok());
        let err = validate_file_size(DEFAULT_MAX_FILE_SIZE + 1, DEFAULT_MAX_FILE_SIZE).unwrap_err();
        assert_eq!(err.code, "FILE_TOO_LARGE");
    }

    #[test]
    fn test_validate_file_count() {
        assert_eq!(validate_file_count(0).unwrap_err().code, "NO_FILE");
        assert!(validate_file_count(1).is_ok());
        assert_eq!(validate_file_count(2).unwrap_err().code, "TOO_MANY_FILES");
    }

    #[test]
    fn test_validate_media_type() {
        // Allow-listed extensions pass without a content-type
        assert!(validate_media_type("photo.heic", None).is_ok());
        assert!(validate_media_type("CLIP.MOV", Some("application/octet-stream")).is_ok());

        // Declared image/video types pass with unknown extensions
        assert!(validate_media_type("scan.bmp", Some("image/bmp")).is_ok());
        assert!(validate_media_type("movie.mkv", Some("video/x-matroska")).is_ok());

        // Neither
        let err = validate_media_type("notes.txt", Some("text/plain")).unwrap_err();
        assert_eq!(err.code, "INVALID_FILE_TYPE");
        assert!(validate_media_type("payload.exe", None).is_err());
    }

    #[test]
    fn test_original_name() {
        assert_eq!(original_name("photo.jpg").unwrap(), "photo.jpg");
        assert_eq!(original_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(original_name("C:\\Users\\me\\cat.png").unwrap(), "cat.png");
        assert!(original_name("").is_err());
        assert!(original_name("dir/").is_err());
    }

    #[test]
    fn test_validate_upload_checks_size_first() {
        let err = validate_upload("notes.txt", Some("text/plain"), 100, 10).unwrap_err();
        assert_eq!(err.code, "FILE_TOO_LARGE");
        assert_eq!(
            validate_upload("photo.png", Some("image/png"), 10, 100).unwrap(),
            "photo.png"
        );
    }
}
