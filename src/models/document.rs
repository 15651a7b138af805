use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentModel {
    pub document_id: i64,
    pub item_id: i64,
    pub original_filename: String,
    pub stored_filename: String,
    #[serde(skip_serializing)]
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_by_user_id: Option<i64>,
    pub uploaded_by_username: Option<String>,
    pub upload_date: Option<NaiveDateTime>,
    pub description: Option<String>,
}

/// A file accepted from a multipart upload, before it is stored.
#[derive(Debug, Clone)]
pub struct IncomingDocument {
    pub original_filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadedDocument {
    pub document_id: i64,
    pub original_filename: String,
    pub file_size: i64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionReq {
    #[serde(default)]
    pub description: Option<String>,
}
