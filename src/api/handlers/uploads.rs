// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::storage::{is_accepted_image_type, MAX_IMAGE_BYTES};
use crate::state::AppState;

/// Pull the `file` field out of a multipart body and validate it against
/// the accepted image types and size limit.
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .ok_or_else(|| ApiError::Validation("Missing file content type".to_string()))?
            .to_string();

        if !is_accepted_image_type(&content_type) {
            return Err(ApiError::Validation(
                "Invalid file type. Only JPEG and PNG images are allowed".to_string(),
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(ApiError::Validation("Uploaded file is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::Validation(
                "File too large. Maximum size is 2MB".to_string(),
            ));
        }

        return Ok((content_type, bytes.to_vec()));
    }

    Err(ApiError::Validation("Missing file field".to_string()))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        _ => "jpg",
    }
}

fn object_path(user_id: Uuid, content_type: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        user_id,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension_for(content_type)
    )
}

async fn store_image(
    state: &AppState,
    viewer_id: Uuid,
    bucket: &str,
    multipart: &mut Multipart,
) -> ApiResult<String> {
    let (content_type, bytes) = read_image_field(multipart).await?;
    let path = object_path(viewer_id, &content_type);

    debug!(
        "Storing {} byte {} upload for {} in {}",
        bytes.len(),
        content_type,
        viewer_id,
        bucket
    );

    let url = state
        .storage
        .store(bucket, &path, &content_type, bytes)
        .await?;

    Ok(url)
}

/// Upload a post image; returns the public URL to reference from a post
pub async fn upload_post_image(
    State(state): State<AppState>,
    viewer: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let url = store_image(&state, viewer.id, "posts", &mut multipart).await?;
    Ok(Json(json!({ "image_url": url })))
}

/// Upload an avatar image; the caller then saves the URL via profile update
pub async fn upload_avatar(
    State(state): State<AppState>,
    viewer: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let url = store_image(&state, viewer.id, "avatars", &mut multipart).await?;
    Ok(Json(json!({ "avatar_url": url })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_carries_owner_and_extension() {
        let user = Uuid::new_v4();
        let path = object_path(user, "image/png");
        assert!(path.starts_with(&user.to_string()));
        assert!(path.ends_with(".png"));

        let path = object_path(user, "image/jpeg");
        assert!(path.ends_with(".jpg"));
    }
}
