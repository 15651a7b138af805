use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde_json::json;

use super::{message, AppState};
use crate::error::{AppError, AppResult};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::AuthenticatedUser;
use crate::models::{DescriptionReq, DocumentModel, IncomingDocument, Permission, UploadedDocument};
use crate::storage::{check_upload, stored_filename};

const FILE_FIELD: &str = "documents";

const DOCUMENT_SELECT: &str = "SELECT d.document_id, d.item_id, d.original_filename, \
     d.stored_filename, d.file_path, d.file_size, d.mime_type, d.uploaded_by_user_id, \
     u.username AS uploaded_by_username, d.upload_date, d.description \
     FROM item_documents d LEFT JOIN users u ON d.uploaded_by_user_id = u.user_id";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items/{item_id}/documents",
            get(list_documents).post(upload_documents),
        )
        .route("/documents/{document_id}", delete(delete_document))
        .route("/documents/{document_id}/download", get(download_document))
        .route("/documents/{document_id}/description", put(update_description))
}

/// A parsed upload form.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<IncomingDocument>,
    description: Option<String>,
}

async fn read_form(
    mut multipart: Multipart,
    max_bytes: usize,
    max_files: usize,
) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                if form.files.len() >= max_files {
                    return Err(AppError::InvalidInput(format!(
                        "Too many files. At most {} documents per upload.",
                        max_files
                    )));
                }
                let doc = read_file(field, max_bytes).await?;
                check_upload(&doc, max_bytes)?;
                form.files.push(doc);
            }
            Some("description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read field: {}", e)))?;
                form.description = Some(text).filter(|t| !t.trim().is_empty());
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }
    Ok(form)
}

/// Reads one file part, giving up as soon as it grows past `max_bytes`.
async fn read_file(mut field: Field<'_>, max_bytes: usize) -> AppResult<IncomingDocument> {
    let original_filename = field
        .file_name()
        .map(str::to_string)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "document".to_string());
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read file: {}", e)))?
    {
        if data.len() + chunk.len() > max_bytes {
            return Err(AppError::PayloadTooLarge {
                size: data.len() + chunk.len(),
                max: max_bytes,
            });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(IncomingDocument {
        original_filename,
        mime_type,
        data,
    })
}

async fn upload_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(item_id): ValidPath<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    user.require(Permission::ManageDocuments)?;
    let multipart =
        multipart.map_err(|e| AppError::InvalidInput(format!("Multipart error: {}", e)))?;
    let form = read_form(
        multipart,
        state.config.max_upload_bytes,
        state.config.max_files_per_upload,
    )
    .await?;
    if form.files.is_empty() {
        return Err(AppError::InvalidInput("No files uploaded".into()));
    }

    let item: Option<i64> = sqlx::query_scalar("SELECT item_id FROM items WHERE item_id = ?")
        .bind(item_id)
        .fetch_optional(&state.pool)
        .await?;
    if item.is_none() {
        return Err(AppError::NotFound("Item not found".into()));
    }

    let mut written: Vec<String> = Vec::with_capacity(form.files.len());
    let result = store_documents(&state, &user, item_id, &form, &mut written).await;
    match result {
        Ok(uploaded) => {
            tracing::info!(item_id, count = uploaded.len(), "Documents uploaded");
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "message": format!("{} document(s) uploaded successfully", uploaded.len()),
                    "documents": uploaded,
                })),
            ))
        }
        Err(e) => {
            for name in &written {
                if let Err(cleanup) = state.storage.delete(name).await {
                    tracing::warn!("Failed to remove {} after failed upload: {}", name, cleanup);
                }
            }
            Err(e)
        }
    }
}

/// Writes the files, then inserts all rows in one transaction.
async fn store_documents(
    state: &AppState,
    user: &AuthenticatedUser,
    item_id: i64,
    form: &UploadForm,
    written: &mut Vec<String>,
) -> AppResult<Vec<UploadedDocument>> {
    let mut paths = Vec::with_capacity(form.files.len());
    for doc in &form.files {
        let name = stored_filename(&doc.original_filename);
        let path = state.storage.save(&name, &doc.data).await?;
        written.push(name.clone());
        paths.push((name, path));
    }

    let mut tx = state.pool.begin().await?;
    let mut uploaded = Vec::with_capacity(form.files.len());
    for (doc, (name, path)) in form.files.iter().zip(&paths) {
        let result = sqlx::query(
            "INSERT INTO item_documents (item_id, original_filename, stored_filename, file_path, \
             file_size, mime_type, uploaded_by_user_id, description) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(item_id)
        .bind(&doc.original_filename)
        .bind(name)
        .bind(path)
        .bind(doc.data.len() as i64)
        .bind(&doc.mime_type)
        .bind(user.user_id)
        .bind(form.description.as_deref())
        .execute(&mut *tx)
        .await?;
        uploaded.push(UploadedDocument {
            document_id: result.last_insert_id() as i64,
            original_filename: doc.original_filename.clone(),
            file_size: doc.data.len() as i64,
            mime_type: doc.mime_type.clone(),
        });
    }
    tx.commit().await?;
    Ok(uploaded)
}

async fn list_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(item_id): ValidPath<i64>,
) -> AppResult<Json<Vec<DocumentModel>>> {
    user.require(Permission::ManageDocuments)?;
    let docs = sqlx::query_as::<_, DocumentModel>(&format!(
        "{} WHERE d.item_id = ? ORDER BY d.upload_date DESC, d.document_id DESC",
        DOCUMENT_SELECT
    ))
    .bind(item_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(Json(docs))
}

async fn find_document(state: &AppState, document_id: i64) -> AppResult<DocumentModel> {
    sqlx::query_as::<_, DocumentModel>(&format!("{} WHERE d.document_id = ?", DOCUMENT_SELECT))
        .bind(document_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}

async fn download_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(document_id): ValidPath<i64>,
) -> AppResult<Response> {
    user.require(Permission::ManageDocuments)?;
    let doc = find_document(&state, document_id).await?;
    let data = state
        .storage
        .read(&doc.stored_filename)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found on server".into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, doc.mime_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&doc.original_filename),
            ),
        ],
        data,
    )
        .into_response())
}

/// `attachment` disposition with a header-safe rendition of `filename`.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

async fn delete_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(document_id): ValidPath<i64>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageDocuments)?;
    let doc = find_document(&state, document_id).await?;

    let mut tx = state.pool.begin().await?;
    sqlx::query("DELETE FROM item_documents WHERE document_id = ?")
        .bind(document_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    match state.storage.delete(&doc.stored_filename).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(document_id, "Document file was already missing"),
        Err(e) => tracing::warn!(document_id, "Failed to remove document file: {}", e),
    }

    tracing::info!(document_id, deleted_by = user.user_id, "Document deleted");
    Ok(message("Document deleted successfully"))
}

async fn update_description(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidPath(document_id): ValidPath<i64>,
    ValidJson(req): ValidJson<DescriptionReq>,
) -> AppResult<Json<serde_json::Value>> {
    user.require(Permission::ManageDocuments)?;
    find_document(&state, document_id).await?;
    let description = req.description.as_deref().map(str::trim).filter(|d| !d.is_empty());
    sqlx::query("UPDATE item_documents SET description = ? WHERE document_id = ?")
        .bind(description)
        .bind(document_id)
        .execute(&state.pool)
        .await?;
    Ok(message("Document description updated successfully"))
}
