// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::accounts;

/// Account role. Transitions are one-directional: user -> admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            _ => Role::User,
        }
    }
}

/// Per-account visibility mode controlling who may see the account's posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    FollowersOnly,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::FollowersOnly => "followers_only",
        }
    }

    pub fn parse(s: &str) -> Option<Visibility> {
        match s {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "followers_only" => Some(Visibility::FollowersOnly),
            _ => None,
        }
    }
}

/// Model for an account row
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub role: String,
    pub profile_visibility: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    /// Visibility mode; unknown values fall back to public, which matches
    /// the column default.
    pub fn visibility(&self) -> Visibility {
        Visibility::parse(&self.profile_visibility).unwrap_or(Visibility::Public)
    }
}

/// DTO for creating a new account row
#[derive(Debug, Insertable)]
#[diesel(table_name = accounts)]
pub struct NewAccount {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: String,
    pub profile_visibility: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for profile updates (settings page)
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = accounts)]
pub struct AccountChanges {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub profile_visibility: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub const MAX_USERNAME_CHARS: usize = 64;
pub const MAX_EMAIL_CHARS: usize = 255;

/// Validate a username at registration. Bounds match the column width, so
/// bad input is rejected before the insert rather than surfacing as a
/// constraint failure.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty()
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username must contain only letters, numbers, and underscores".to_string());
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_CHARS
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if !email.contains('@') || email.chars().count() > MAX_EMAIL_CHARS {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

/// Public account summary embedded in follow lists, posts and notifications
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_defaults_to_user() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("superuser"), Role::User);
    }

    #[test]
    fn username_bounds() {
        assert!(validate_username("alice_01").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_CHARS)).is_ok());
        // Over the column width: rejected up front, not by the database.
        assert!(validate_username(&"a".repeat(MAX_USERNAME_CHARS + 1)).is_err());
    }

    #[test]
    fn email_bounds() {
        assert!(validate_email("a@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        let long = format!("{}@example.com", "a".repeat(MAX_EMAIL_CHARS));
        assert!(validate_email(&long).is_err());
    }

    #[test]
    fn visibility_round_trips() {
        for v in [Visibility::Public, Visibility::Private, Visibility::FollowersOnly] {
            assert_eq!(Visibility::parse(v.as_str()), Some(v));
        }
        assert_eq!(Visibility::parse("hidden"), None);
    }
}
