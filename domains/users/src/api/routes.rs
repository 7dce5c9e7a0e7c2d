//! Route definitions for Users domain API

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{admin, tokens, users};
use super::state::UsersState;

/// Create all Users domain API routes
pub fn routes() -> Router<UsersState> {
    Router::new()
        // Registration and activation
        .route("/v1/users", post(users::register_user).get(admin::list_users))
        .route("/v1/users/activated", put(users::activate_user))
        // Tokens
        .route(
            "/v1/tokens/authentication",
            post(tokens::create_authentication_token).delete(tokens::revoke_authentication_tokens),
        )
        .route("/v1/tokens/activation", post(tokens::create_activation_token))
        // Administration
        .route(
            "/v1/users/{id}",
            get(admin::show_user)
                .patch(admin::update_user)
                .delete(admin::delete_user),
        )
        .route(
            "/v1/users/{id}/permissions",
            get(admin::show_permissions).post(admin::grant_permissions),
        )
        .route("/v1/users/{id}/roles", post(admin::assign_roles))
}
