// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Maximum accepted image upload size (2 MiB).
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Accepted image content types for uploads.
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

pub fn is_accepted_image_type(content_type: &str) -> bool {
    ACCEPTED_IMAGE_TYPES.contains(&content_type)
}

/// External object storage collaborator. Accepts image bytes and returns a
/// public URL; the core only ever persists the URL string.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn store(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String>;
}

/// Object storage backed by an HTTP bucket API.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpObjectStorage {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            path
        )
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            path
        )
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn store(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let url = self.object_url(bucket, path);
        debug!("Uploading {} bytes to {}", bytes.len(), url);

        self.client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .context("storage request failed")?
            .error_for_status()
            .context("storage rejected upload")?;

        Ok(self.public_url(bucket, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_types_are_jpeg_and_png_only() {
        assert!(is_accepted_image_type("image/jpeg"));
        assert!(is_accepted_image_type("image/jpg"));
        assert!(is_accepted_image_type("image/png"));
        assert!(!is_accepted_image_type("image/gif"));
        assert!(!is_accepted_image_type("application/pdf"));
    }

    #[test]
    fn public_url_shape() {
        let storage = HttpObjectStorage::new("http://storage.local/", "key");
        assert_eq!(
            storage.public_url("posts", "abc.png"),
            "http://storage.local/storage/v1/object/public/posts/abc.png"
        );
    }
}
