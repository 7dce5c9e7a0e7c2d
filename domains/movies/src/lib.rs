//! Movies domain: versioned movie catalogue with filtered listing

pub mod api;
pub mod domain;
pub mod repository;

pub use domain::entities::{CreateMovieRequest, Movie, NewMovie, Runtime, UpdateMovieRequest};
pub use repository::{MemoryMovieStore, MovieQuery, MovieStore, PgMovieRepository};

pub use api::routes;
pub use api::MoviesState;
