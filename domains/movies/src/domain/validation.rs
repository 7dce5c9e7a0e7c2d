//! Movie field rules

use chrono::{Datelike, Utc};
use greenlight_common::validation::unique;
use greenlight_common::Validator;

use super::entities::Runtime;

pub const MAX_TITLE_BYTES: usize = 500;
pub const FIRST_FILM_YEAR: i32 = 1888;
pub const MAX_GENRES: usize = 5;

/// Record every rule a movie's fields break
pub fn validate_movie(v: &mut Validator, title: &str, year: i32, runtime: Runtime, genres: &[String]) {
    v.check(!title.is_empty(), "title", "must be provided");
    v.check(
        title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    v.check(year != 0, "year", "must be provided");
    v.check(year >= FIRST_FILM_YEAR, "year", "must be greater than 1888");
    v.check(year <= Utc::now().year(), "year", "must not be in the future");

    v.check(runtime.0 != 0, "runtime", "must be provided");
    v.check(runtime.0 > 0, "runtime", "must be a positive integer");

    v.check(!genres.is_empty(), "genres", "must contain at least 1 genre");
    v.check(
        genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(unique(genres), "genres", "must not contain duplicate values");
}
