//! Picture upload rules shared by the presign and attach paths.

use std::path::Path;

use crate::constants::MAX_FILE_NAME_LENGTH;
use crate::error::AppError;

/// Image types accepted unless `ALLOWED_IMAGE_TYPES` overrides them.
pub const DEFAULT_ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Why a presign request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureRejection {
    UnsupportedType(String),
    TypeMismatch { extension: String, content_type: String },
}

impl From<PictureRejection> for AppError {
    fn from(rejection: PictureRejection) -> Self {
        match rejection {
            PictureRejection::UnsupportedType(content_type) => {
                AppError::UnsupportedType(format!("Unsupported image type: {}", content_type))
            }
            PictureRejection::TypeMismatch {
                extension,
                content_type,
            } => AppError::TypeMismatch(format!(
                "File extension '{}' does not match content type {}",
                extension, content_type
            )),
        }
    }
}

/// Canonical MIME type for a file name's extension, if the extension is known.
pub fn mime_for_file_name(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

pub fn is_allowed_type(allowed: &[String], content_type: &str) -> bool {
    allowed.iter().any(|t| t == content_type)
}

/// Reject unsupported content types, then names whose extension is unknown or implies a
/// different type than the one declared.
pub fn check_presign(
    allowed: &[String],
    file_name: &str,
    content_type: &str,
) -> Result<(), PictureRejection> {
    if !is_allowed_type(allowed, content_type) {
        return Err(PictureRejection::UnsupportedType(content_type.to_string()));
    }

    let safe_name = sanitize_file_name(file_name);
    match mime_for_file_name(&safe_name) {
        Some(expected) if expected == content_type => Ok(()),
        _ => {
            let extension = Path::new(&safe_name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_lowercase();
            Err(PictureRejection::TypeMismatch {
                extension,
                content_type: content_type.to_string(),
            })
        }
    }
}

/// Reduce a client-supplied name to something safe inside an object key: basename only,
/// anything outside `[A-Za-z0-9._-]` becomes `_`, and only the last characters are kept.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: Vec<char> = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let start = cleaned.len().saturating_sub(MAX_FILE_NAME_LENGTH);
    let name: String = cleaned[start..].iter().collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        DEFAULT_ALLOWED_IMAGE_TYPES
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_pdf_is_unsupported() {
        assert_eq!(
            check_presign(&allowed(), "offer.pdf", "application/pdf"),
            Err(PictureRejection::UnsupportedType("application/pdf".to_string()))
        );
    }

    #[test]
    fn test_png_name_declared_as_jpeg_is_mismatch() {
        let err = check_presign(&allowed(), "a.png", "image/jpeg").unwrap_err();
        assert!(matches!(err, PictureRejection::TypeMismatch { .. }));
        let app: AppError = err.into();
        assert_eq!(app.error_type(), "TypeMismatch");
    }

    #[test]
    fn test_content_type_must_match_case_exactly() {
        assert_eq!(
            check_presign(&allowed(), "a.jpg", "IMAGE/JPEG"),
            Err(PictureRejection::UnsupportedType("IMAGE/JPEG".to_string()))
        );
        assert!(!is_allowed_type(&allowed(), "Image/Png"));
    }

    #[test]
    fn test_matching_names_pass() {
        assert!(check_presign(&allowed(), "IMG_0001.JPG", "image/jpeg").is_ok());
        assert!(check_presign(&allowed(), "photo.jpeg", "image/jpeg").is_ok());
        assert!(check_presign(&allowed(), "Scan 2.heic", "image/heic").is_ok());
    }

    #[test]
    fn test_unknown_extension_is_mismatch() {
        assert!(matches!(
            check_presign(&allowed(), "capture", "image/heic"),
            Err(PictureRejection::TypeMismatch { .. })
        ));
        assert!(matches!(
            check_presign(&allowed(), "photo.gif", "image/png"),
            Err(PictureRejection::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_sanitize_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/pass wd.jpg"), "pass_wd.jpg");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\Föto 1.png"), "F_to_1.png");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name(".."), "file");
    }

    #[test]
    fn test_sanitize_keeps_tail_of_long_names() {
        let long = format!("{}.jpg", "a".repeat(150));
        let sanitized = sanitize_file_name(&long);
        assert_eq!(sanitized.len(), MAX_FILE_NAME_LENGTH);
        assert!(sanitized.ends_with(".jpg"));
    }
}
