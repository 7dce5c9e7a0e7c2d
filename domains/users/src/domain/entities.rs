//! User entities and request bodies

use chrono::{DateTime, Utc};
use greenlight_auth::AuthIdentity;
use greenlight_common::Versioned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered account.
///
/// The password hash and version never leave the server.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: i32,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// The slice of the account the auth pipeline works with
    pub fn identity(&self) -> AuthIdentity {
        AuthIdentity {
            id: self.id,
            email: self.email.clone(),
            is_active: self.is_active,
            version: self.version,
        }
    }
}

impl Versioned for User {
    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Field values for an account that does not exist yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: String,
    pub password_hash: String,
}

/// Body of `POST /v1/users`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterUserRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: String,
    pub password: String,
}

/// Body of `PUT /v1/users/activated`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivateUserRequest {
    pub token: String,
}

/// Body of `POST /v1/tokens/authentication`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CredentialsRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must be provided"))]
    pub password: String,
}

/// Body of `POST /v1/tokens/activation`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ActivationTokenRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Body of `PATCH /v1/users/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
}

impl UpdateUserRequest {
    pub fn apply(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(username) = self.username {
            user.username = Some(username);
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(is_staff) = self.is_staff {
            user.is_staff = is_staff;
        }
        if let Some(is_superuser) = self.is_superuser {
            user.is_superuser = is_superuser;
        }
    }
}

/// Body of `POST /v1/users/{id}/permissions`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GrantPermissionsRequest {
    #[validate(length(min = 1, message = "must contain at least 1 permission code"))]
    pub codes: Vec<String>,
}

/// Body of `POST /v1/users/{id}/roles`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct AssignRolesRequest {
    #[validate(length(min = 1, message = "must contain at least 1 role"))]
    pub roles: Vec<String>,
}
