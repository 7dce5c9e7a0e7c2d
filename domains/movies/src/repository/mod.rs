//! Movie storage
//!
//! Every mutation is version-guarded; see `greenlight_common::concurrency`.

pub mod memory;
pub mod movies;

use async_trait::async_trait;
use greenlight_common::{Filters, RepositoryError};

use crate::domain::entities::{Movie, NewMovie};

pub use memory::MemoryMovieStore;
pub use movies::PgMovieRepository;

/// Columns `GET /v1/movies` may sort by
pub const MOVIE_SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Search and paging for a movie listing
#[derive(Debug, Clone)]
pub struct MovieQuery {
    /// Full-text match on the title; empty matches everything
    pub title: String,
    /// Every listed genre must be present; empty matches everything
    pub genres: Vec<String>,
    pub filters: Filters,
}

#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Store a new movie at the initial version
    async fn insert(&self, movie: NewMovie) -> Result<Movie, RepositoryError>;

    /// Live movie by id
    async fn get(&self, id: i64) -> Result<Option<Movie>, RepositoryError>;

    /// Write `movie`'s fields if the stored version still equals
    /// `expected_version`; returns the new version.
    async fn update(&self, movie: &Movie, expected_version: i32) -> Result<i32, RepositoryError>;

    /// Soft-delete under the same guard as `update`
    async fn delete(&self, id: i64, expected_version: i32) -> Result<(), RepositoryError>;

    /// Matching page of movies and the total number of matches
    async fn list(&self, query: &MovieQuery) -> Result<(Vec<Movie>, i64), RepositoryError>;
}
