/// Media handlers - image upload and serving
use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use futures_util::stream::StreamExt;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::{UserId, Viewer};
use crate::response::created;
use crate::services::MediaService;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/v1/media
///
/// Reads the `file` part into memory, aborting as soon as it exceeds the
/// configured size limit. Other parts are drained and ignored.
pub async fn upload_media(
    state: web::Data<AppState>,
    user_id: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let max_bytes = state.media.max_bytes();
    let mut upload: Option<(Option<mime::Mime>, Vec<u8>)> = None;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?;

        let is_file = field.name() == Some(FILE_FIELD) && upload.is_none();
        let declared = field.content_type().cloned();
        let mut data = Vec::new();

        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Upload read error: {e}")))?;
            if !is_file {
                continue;
            }
            if data.len() + chunk.len() > max_bytes {
                tracing::warn!(user_id = %user_id.0, max_bytes, "upload rejected: too large");
                return Err(state.media.too_large());
            }
            data.extend_from_slice(&chunk);
        }

        if is_file {
            upload = Some((declared, data));
        }
    }

    let (declared, data) = upload.ok_or_else(|| {
        AppError::BadRequest(format!("Multipart field '{FILE_FIELD}' is required"))
    })?;

    let item = MediaService::new(state.db.clone(), state.media.clone())
        .upload(user_id.0, declared.as_ref(), &data)
        .await?;
    Ok(created("Media uploaded", item))
}

/// GET /api/v1/media/{id}
pub async fn get_media(
    state: web::Data<AppState>,
    viewer: Viewer,
    media_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let (content_type, bytes) = MediaService::new(state.db.clone(), state.media.clone())
        .open(viewer.0, *media_id)
        .await?;

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((header::CACHE_CONTROL, "private, max-age=3600"))
        .body(bytes))
}
