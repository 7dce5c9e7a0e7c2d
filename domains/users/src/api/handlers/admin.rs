//! User administration handlers
//!
//! Implements account management for operators:
//! - **GET /v1/users** - Filtered, paged listing (`users:read`)
//! - **GET /v1/users/{id}** - Show one account (`users:read`)
//! - **PATCH /v1/users/{id}** - Version-guarded profile and flag update (`users:write`)
//! - **DELETE /v1/users/{id}** - Version-guarded soft delete (`users:write`)
//! - **GET /v1/users/{id}/permissions** - Effective permissions and roles (`users:read`)
//! - **POST /v1/users/{id}/permissions** - Grant permissions directly (`users:write`)
//! - **POST /v1/users/{id}/roles** - Add role memberships (`users:write`)

use axum::{
    extract::{Query, State},
    Json,
};
use greenlight_auth::permission::{is_known_permission, is_known_role};
use greenlight_auth::{Permissions, RequirePermission, UsersRead, UsersWrite};
use greenlight_common::{
    read_int, Error, ExpectedVersion, FilterParams, Filters, JsonBody, Metadata,
    RepositoryError, Result, UuidParam, ValidatedJson, Validator,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::UserResponse;
use crate::api::state::UsersState;
use crate::domain::entities::{AssignRolesRequest, GrantPermissionsRequest, UpdateUserRequest, User};
use crate::domain::validation::{validate_user, DUPLICATE_EMAIL_MESSAGE};
use crate::repository::{UserQuery, USER_SORT_SAFELIST};

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub permissions: Permissions,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Query string of `GET /v1/users`
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

async fn load_user(state: &UsersState, id: Uuid) -> Result<User> {
    state.users.get(id).await?.ok_or_else(Error::not_found)
}

async fn access_for(state: &UsersState, id: Uuid) -> Result<AccessResponse> {
    Ok(AccessResponse {
        permissions: state.access.effective_permissions(id).await?,
        roles: state.access.roles_for(id).await?,
    })
}

/// GET /v1/users
pub async fn list_users(
    _: RequirePermission<UsersRead>,
    State(state): State<UsersState>,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<UserListResponse>> {
    let mut v = Validator::new();

    let filter_params = FilterParams {
        page: read_int(&mut v, "page", params.page.as_deref()),
        page_size: read_int(&mut v, "page_size", params.page_size.as_deref()),
        sort: params.sort,
    };
    let filters = Filters::new(filter_params, "id", USER_SORT_SAFELIST);
    filters.validate(&mut v);
    v.into_result()?;

    let query = UserQuery {
        first_name: params.first_name.unwrap_or_default(),
        last_name: params.last_name.unwrap_or_default(),
        username: params.username.unwrap_or_default(),
        email: params.email.unwrap_or_default(),
        filters,
    };

    let (users, total) = state.users.list(&query).await?;
    let metadata = Metadata::calculate(total, query.filters.page, query.filters.page_size);

    Ok(Json(UserListResponse { users, metadata }))
}

/// GET /v1/users/{id}
pub async fn show_user(
    _: RequirePermission<UsersRead>,
    State(state): State<UsersState>,
    UuidParam(id): UuidParam,
) -> Result<Json<UserResponse>> {
    let user = load_user(&state, id).await?;
    Ok(Json(UserResponse { user }))
}

/// PATCH /v1/users/{id}
pub async fn update_user(
    _: RequirePermission<UsersWrite>,
    State(state): State<UsersState>,
    UuidParam(id): UuidParam,
    ExpectedVersion(expected): ExpectedVersion,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let mut user = load_user(&state, id).await?;
    let expected_version = expected.unwrap_or(user.version);

    request.apply(&mut user);

    let mut v = Validator::new();
    validate_user(&mut v, &user);
    v.into_result()?;

    user.version = match state.users.update(&user, expected_version).await {
        Err(RepositoryError::AlreadyExists) => {
            return Err(Error::invalid_field("email", DUPLICATE_EMAIL_MESSAGE));
        }
        other => other?,
    };

    tracing::info!(user_id = %user.id, version = user.version, "User updated");
    Ok(Json(UserResponse { user }))
}

/// DELETE /v1/users/{id}
pub async fn delete_user(
    RequirePermission(operator, _): RequirePermission<UsersWrite>,
    State(state): State<UsersState>,
    UuidParam(id): UuidParam,
    ExpectedVersion(expected): ExpectedVersion,
) -> Result<Json<MessageResponse>> {
    let expected_version = match expected {
        Some(version) => version,
        None => load_user(&state, id).await?.version,
    };

    state.users.delete(id, expected_version).await?;
    tracing::info!(user_id = %id, operator_id = %operator.id, "User deleted");

    Ok(Json(MessageResponse {
        message: "user successfully deleted",
    }))
}

/// GET /v1/users/{id}/permissions
pub async fn show_permissions(
    _: RequirePermission<UsersRead>,
    State(state): State<UsersState>,
    UuidParam(id): UuidParam,
) -> Result<Json<AccessResponse>> {
    load_user(&state, id).await?;
    Ok(Json(access_for(&state, id).await?))
}

/// POST /v1/users/{id}/permissions
pub async fn grant_permissions(
    _: RequirePermission<UsersWrite>,
    State(state): State<UsersState>,
    UuidParam(id): UuidParam,
    ValidatedJson(request): ValidatedJson<GrantPermissionsRequest>,
) -> Result<Json<AccessResponse>> {
    if !request.codes.iter().all(|c| is_known_permission(c)) {
        return Err(Error::invalid_field(
            "codes",
            "must only contain known permission codes",
        ));
    }

    load_user(&state, id).await?;
    state.access.grant_permissions(id, &request.codes).await?;

    Ok(Json(access_for(&state, id).await?))
}

/// POST /v1/users/{id}/roles
pub async fn assign_roles(
    _: RequirePermission<UsersWrite>,
    State(state): State<UsersState>,
    UuidParam(id): UuidParam,
    ValidatedJson(request): ValidatedJson<AssignRolesRequest>,
) -> Result<Json<AccessResponse>> {
    if !request.roles.iter().all(|r| is_known_role(r)) {
        return Err(Error::invalid_field("roles", "must only contain known roles"));
    }

    load_user(&state, id).await?;
    state.access.assign_roles(id, &request.roles).await?;

    Ok(Json(access_for(&state, id).await?))
}
