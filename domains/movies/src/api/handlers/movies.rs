//! Movie API handlers
//!
//! Implements the movie catalogue endpoints:
//! - **GET /v1/movies** - Filtered, paged listing (`movies:read`)
//! - **POST /v1/movies** - Create a movie (`movies:write`)
//! - **GET /v1/movies/{id}** - Show one movie (`movies:read`)
//! - **PATCH /v1/movies/{id}** - Partial, version-guarded update (`movies:write`)
//! - **DELETE /v1/movies/{id}** - Version-guarded soft delete (`movies:write`)
//!
//! Writes use the `X-Expected-Version` header when present, otherwise the
//! version read at the start of the request.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use greenlight_auth::{MoviesRead, MoviesWrite, RequirePermission};
use greenlight_common::{
    read_csv, read_int, Error, ExpectedVersion, FilterParams, Filters, JsonBody, Metadata,
    ResourceId, Result, Validator,
};
use serde::{Deserialize, Serialize};

use crate::api::state::MoviesState;
use crate::domain::entities::{CreateMovieRequest, Movie, UpdateMovieRequest};
use crate::domain::validation::validate_movie;
use crate::repository::{MovieQuery, MOVIE_SORT_SAFELIST};

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie: Movie,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    pub movies: Vec<Movie>,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Query string of `GET /v1/movies`
#[derive(Debug, Default, Deserialize)]
pub struct ListMoviesParams {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

async fn load_movie(state: &MoviesState, id: i64) -> Result<Movie> {
    state.movies.get(id).await?.ok_or_else(Error::not_found)
}

/// GET /v1/movies
pub async fn list_movies(
    _: RequirePermission<MoviesRead>,
    State(state): State<MoviesState>,
    Query(params): Query<ListMoviesParams>,
) -> Result<Json<MovieListResponse>> {
    let mut v = Validator::new();

    let filter_params = FilterParams {
        page: read_int(&mut v, "page", params.page.as_deref()),
        page_size: read_int(&mut v, "page_size", params.page_size.as_deref()),
        sort: params.sort,
    };
    let filters = Filters::new(filter_params, "id", MOVIE_SORT_SAFELIST);
    filters.validate(&mut v);
    v.into_result()?;

    let query = MovieQuery {
        title: params.title.unwrap_or_default(),
        genres: read_csv(params.genres.as_deref()),
        filters,
    };

    let (movies, total) = state.movies.list(&query).await?;
    let metadata = Metadata::calculate(total, query.filters.page, query.filters.page_size);

    Ok(Json(MovieListResponse { movies, metadata }))
}

/// POST /v1/movies
pub async fn create_movie(
    RequirePermission(identity, _): RequirePermission<MoviesWrite>,
    State(state): State<MoviesState>,
    JsonBody(request): JsonBody<CreateMovieRequest>,
) -> Result<impl IntoResponse> {
    let new_movie = request.into_new_movie();

    let mut v = Validator::new();
    validate_movie(
        &mut v,
        &new_movie.title,
        new_movie.year,
        new_movie.runtime,
        &new_movie.genres,
    );
    v.into_result()?;

    let movie = state.movies.insert(new_movie).await?;
    tracing::info!(movie_id = movie.id, user_id = %identity.id, "Movie created");

    let location = format!("/v1/movies/{}", movie.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(MovieResponse { movie }),
    ))
}

/// GET /v1/movies/{id}
pub async fn show_movie(
    _: RequirePermission<MoviesRead>,
    State(state): State<MoviesState>,
    ResourceId(id): ResourceId,
) -> Result<Json<MovieResponse>> {
    let movie = load_movie(&state, id).await?;
    Ok(Json(MovieResponse { movie }))
}

/// PATCH /v1/movies/{id}
pub async fn update_movie(
    _: RequirePermission<MoviesWrite>,
    State(state): State<MoviesState>,
    ResourceId(id): ResourceId,
    ExpectedVersion(expected): ExpectedVersion,
    JsonBody(request): JsonBody<UpdateMovieRequest>,
) -> Result<Json<MovieResponse>> {
    let mut movie = load_movie(&state, id).await?;
    let expected_version = expected.unwrap_or(movie.version);

    request.apply(&mut movie);

    let mut v = Validator::new();
    validate_movie(&mut v, &movie.title, movie.year, movie.runtime, &movie.genres);
    v.into_result()?;

    movie.version = state.movies.update(&movie, expected_version).await?;
    Ok(Json(MovieResponse { movie }))
}

/// DELETE /v1/movies/{id}
pub async fn delete_movie(
    RequirePermission(identity, _): RequirePermission<MoviesWrite>,
    State(state): State<MoviesState>,
    ResourceId(id): ResourceId,
    ExpectedVersion(expected): ExpectedVersion,
) -> Result<Json<MessageResponse>> {
    let expected_version = match expected {
        Some(version) => version,
        None => load_movie(&state, id).await?.version,
    };

    state.movies.delete(id, expected_version).await?;
    tracing::info!(movie_id = id, user_id = %identity.id, "Movie deleted");

    Ok(Json(MessageResponse {
        message: "movie successfully deleted",
    }))
}
