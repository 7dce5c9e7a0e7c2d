//! Route definitions for Movies domain API

use axum::{routing::get, Router};

use super::handlers::movies;
use super::state::MoviesState;

/// Create all Movies domain API routes
pub fn routes() -> Router<MoviesState> {
    Router::new()
        .route(
            "/v1/movies",
            get(movies::list_movies).post(movies::create_movie),
        )
        .route(
            "/v1/movies/{id}",
            get(movies::show_movie)
                .patch(movies::update_movie)
                .delete(movies::delete_movie),
        )
}
