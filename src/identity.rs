// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::account::Role;

/// Claims resolved from a bearer credential by the identity service.
#[derive(Debug, Clone)]
pub struct Claims {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid or expired credential")]
    InvalidCredential,
    #[error("identity service unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// External identity collaborator. The core never validates credentials
/// itself; it hands the bearer token to this service and treats the result
/// as given context.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, bearer_token: &str) -> Result<Claims, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    id: Uuid,
    #[serde(default)]
    role: Option<String>,
}

/// Identity provider backed by an HTTP token-introspection endpoint.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn resolve(&self, bearer_token: &str) -> Result<Claims, IdentityError> {
        let url = format!("{}/auth/v1/user", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.into()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(IdentityError::InvalidCredential);
        }

        let response = response
            .error_for_status()
            .map_err(|e| IdentityError::Unavailable(e.into()))?;

        let body: IdentityResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.into()))?;

        debug!("Resolved identity for user {}", body.id);

        Ok(Claims {
            user_id: body.id,
            role: Role::parse(body.role.as_deref().unwrap_or("user")),
        })
    }
}
