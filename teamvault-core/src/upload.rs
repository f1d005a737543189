//! Upload payloads and filename validation.

use crate::error::{VaultError, VaultResult};
use std::io::Read;

/// One file part of a multipart upload.
pub struct UploadPart {
    pub filename: String,
    pub content_type: String,
    pub content: Box<dyn Read>,
}

/// A parsed multipart upload body.
///
/// Only the first file is processed; extra parts are ignored. This
/// matches existing client behavior and is a deliberate simplification.
pub struct UploadPayload {
    pub parts: Vec<UploadPart>,
}

impl UploadPayload {
    pub fn first_part(self) -> VaultResult<UploadPart> {
        self.parts
            .into_iter()
            .next()
            .ok_or_else(|| VaultError::InvalidProperty("no file in upload payload".to_string()))
    }
}

const IMAGE_EXTENSIONS: [&str; 4] = [".png", ".jpg", ".jpeg", ".gif"];

/// Rejects empty filenames, and non-image extensions when the upload
/// context (avatar, logo) requires an image.
pub fn check_file_name(filename: &str, image_required: bool) -> VaultResult<()> {
    if filename.is_empty() {
        return Err(VaultError::InvalidFileType("empty file name".to_string()));
    }
    if !image_required {
        return Ok(());
    }
    let lower = filename.to_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Ok(())
    } else {
        Err(VaultError::InvalidFileType(format!(
            "not an allowed image file: {filename}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_allowed_case_insensitively() {
        for name in ["a.png", "b.JPG", "c.jpeg", "d.Gif"] {
            assert!(check_file_name(name, true).is_ok(), "{name}");
        }
    }

    #[test]
    fn non_image_rejected_when_image_required() {
        assert!(check_file_name("doc.pdf", true).is_err());
        assert!(check_file_name("doc.pdf", false).is_ok());
    }

    #[test]
    fn empty_name_always_rejected() {
        assert!(check_file_name("", false).is_err());
        assert!(check_file_name("", true).is_err());
    }
}
