// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::ops::Deref;
use tracing::debug;

use crate::error::ApiError;
use crate::identity::{Claims, IdentityError};
use crate::models::account::Account;
use crate::schema::accounts;
use crate::state::AppState;

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    let token = header_value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

async fn resolve_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let header_value = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = extract_bearer(header_value).ok_or(ApiError::Unauthorized)?;

    state.identity.resolve(token).await.map_err(|e| match e {
        IdentityError::InvalidCredential => ApiError::Unauthorized,
        IdentityError::Unavailable(inner) => ApiError::Internal(inner),
    })
}

/// Request-scoped principal: the identity-service claims, before any account
/// lookup. Used by account registration, where no row exists yet.
#[derive(Debug, Clone)]
pub struct Principal(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = resolve_claims(parts, state).await?;
        Ok(Principal(claims))
    }
}

/// The authenticated account behind the current request. Resolving this
/// extractor loads the account row, so the role and active flag reflect the
/// database, not just the token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Account);

impl Deref for CurrentUser {
    type Target = Account;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = resolve_claims(parts, state).await?;

        let mut conn = state.db.get_connection().await?;
        let account = accounts::table
            .find(claims.user_id)
            .first::<Account>(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| ApiError::Forbidden("Account is not registered".to_string()))?;

        if !account.is_active {
            debug!("Rejected request from deactivated account {}", account.id);
            return Err(ApiError::Forbidden("Account is deactivated".to_string()));
        }

        Ok(CurrentUser(account))
    }
}

/// An authenticated account that must hold the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Account);

impl Deref for AdminUser {
    type Target = Account;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(account) = CurrentUser::from_request_parts(parts, state).await?;

        if !account.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("bearer abc123"), None);
        assert_eq!(extract_bearer("Basic dXNlcjpwdw=="), None);
        assert_eq!(extract_bearer(""), None);
    }
}
