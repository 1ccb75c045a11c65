//! Validation modules

pub mod lead_form;
pub mod picture;

pub use lead_form::{FieldErrors, LeadForm};
pub use picture::{
    check_presign, is_allowed_type, mime_for_file_name, sanitize_file_name, PictureRejection,
    DEFAULT_ALLOWED_IMAGE_TYPES,
};
