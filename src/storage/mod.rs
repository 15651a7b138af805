// Storage abstraction for uploaded item documents

pub mod local;

pub use local::LocalDiskStorage;

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::IncomingDocument;

/// Content types accepted for item documents.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "image/jpeg",
    "image/png",
    "image/gif",
    "text/plain",
];

pub fn is_allowed_mime(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// Rejects files with a disallowed type, no content, or more than `max_bytes`.
pub fn check_upload(doc: &IncomingDocument, max_bytes: usize) -> AppResult<()> {
    if !is_allowed_mime(&doc.mime_type) {
        return Err(AppError::InvalidInput(
            "Invalid file type. Only PDF, Word, Excel, images, and text files are allowed."
                .into(),
        ));
    }
    if doc.data.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "File '{}' is empty",
            doc.original_filename
        )));
    }
    if doc.data.len() > max_bytes {
        return Err(AppError::PayloadTooLarge {
            size: doc.data.len(),
            max: max_bytes,
        });
    }
    Ok(())
}

/// Randomized on-disk name: `documents-<millis>-<uuid><.ext>`.
///
/// Only the extension of the client's filename survives, and only when it is
/// plain alphanumeric.
pub fn stored_filename(original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!(
        "documents-{}-{}{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        ext
    )
}

/// Backend holding document bytes, addressed by stored filename.
#[async_trait::async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Writes the file and returns its storage path.
    async fn save(&self, name: &str, data: &[u8]) -> AppResult<String>;

    /// Reads the file, `None` when it does not exist.
    async fn read(&self, name: &str) -> AppResult<Option<Vec<u8>>>;

    /// Removes the file; returns whether it existed.
    async fn delete(&self, name: &str) -> AppResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(mime: &str, len: usize) -> IncomingDocument {
        IncomingDocument {
            original_filename: "invoice.pdf".into(),
            mime_type: mime.into(),
            data: vec![1; len],
        }
    }

    #[test]
    fn test_mime_allow_list() {
        assert!(is_allowed_mime("application/pdf"));
        assert!(is_allowed_mime("text/plain; charset=utf-8"));
        assert!(is_allowed_mime("IMAGE/PNG"));
        assert!(!is_allowed_mime("application/x-msdownload"));
        assert!(!is_allowed_mime("text/html"));
    }

    #[test]
    fn test_check_upload() {
        check_upload(&doc("application/pdf", 10), 10).unwrap();
        assert!(matches!(
            check_upload(&doc("application/pdf", 11), 10),
            Err(AppError::PayloadTooLarge { size: 11, max: 10 })
        ));
        assert!(matches!(
            check_upload(&doc("application/zip", 1), 10),
            Err(AppError::InvalidInput(_))
        ));
        assert!(check_upload(&doc("application/pdf", 0), 10).is_err());
    }

    #[test]
    fn test_stored_filename() {
        let name = stored_filename("Scan 01.JPG");
        assert!(name.starts_with("documents-"));
        assert!(name.ends_with(".jpg"));
        assert!(!name.contains(' '));

        let sneaky = stored_filename("../../etc/passwd");
        assert!(!sneaky.contains('/'));
        assert!(!sneaky.contains(".."));

        assert_ne!(stored_filename("a.pdf"), stored_filename("a.pdf"));
    }
}
