use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
    Extension,
};
use axum_extra::extract::Multipart;
use serde_json::json;
use tokio::fs;

use infra::repos::ProfileRepo;

use crate::auth::Claims;
use crate::error::AppError;
use crate::state::AppState;

const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// Content types we accept, with the extension each one stores as.
const ALLOWED_TYPES: [(&str, &str); 3] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// POST /api/avatars. One image part, stored as `{user_id}.{ext}` under
/// the avatar directory; replaces any previous avatar.
pub async fn upload(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some(Extension(claims)) = claims else {
        return Err(AppError::Unauthorized("Authentication required".to_string()));
    };
    let user_id = claims.user_id()?;

    let mut image: Option<(Vec<u8>, &'static str)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let content_type = field.content_type().unwrap_or("").to_string();
        let Some(&(_, ext)) = ALLOWED_TYPES.iter().find(|(ct, _)| *ct == content_type) else {
            return Err(AppError::BadRequest(
                "Avatar must be a JPEG, PNG or WebP image".to_string(),
            ));
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        if data.len() > MAX_AVATAR_BYTES {
            return Err(AppError::TooLarge("Avatar is limited to 2MB".to_string()));
        }

        image = Some((data.to_vec(), ext));
    }

    let Some((data, ext)) = image else {
        return Err(AppError::BadRequest("No image provided".to_string()));
    };

    let dir = state.avatar_dir();
    fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let file_name = format!("{}.{}", user_id, ext);
    fs::write(dir.join(&file_name), &data)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // Drop stale files left over from an earlier upload with a
    // different extension.
    for (_, other) in ALLOWED_TYPES.iter().filter(|(_, e)| *e != ext) {
        let _ = fs::remove_file(dir.join(format!("{}.{}", user_id, other))).await;
    }

    let avatar_url = format!("/api/avatars/{}", file_name);
    let repo = ProfileRepo::new(state.db.clone());
    if repo.set_avatar_url(user_id, Some(&avatar_url)).await?.is_none() {
        return Err(AppError::NotFound("Player not found".to_string()));
    }

    Ok(Json(json!({ "avatar_url": avatar_url })))
}

/// GET /api/avatars/:file_name.
pub async fn serve(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, AppError> {
    if file_name.contains('/') || file_name.contains("..") {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let content_type = match file_name.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => return Err(AppError::BadRequest("Invalid file name".to_string())),
    };

    let data = fs::read(state.avatar_dir().join(&file_name))
        .await
        .map_err(|_| AppError::NotFound("Avatar not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// DELETE /api/avatars. Removes the file and clears the profile column.
pub async fn remove(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some(Extension(claims)) = claims else {
        return Err(AppError::Unauthorized("Authentication required".to_string()));
    };
    let user_id = claims.user_id()?;

    for (_, ext) in ALLOWED_TYPES {
        let _ = fs::remove_file(state.avatar_dir().join(format!("{}.{}", user_id, ext))).await;
    }

    let repo = ProfileRepo::new(state.db.clone());
    if repo.set_avatar_url(user_id, None).await?.is_none() {
        return Err(AppError::NotFound("Player not found".to_string()));
    }

    Ok(Json(json!({ "avatar_url": null })))
}
