//! Movie entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use greenlight_common::Versioned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Running time in minutes.
///
/// Appears on the wire as `"<n> mins"` and in the database as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Runtime(pub i32);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (minutes, unit) = s.split_once(' ').ok_or(InvalidRuntimeFormat)?;
        if unit != "mins" {
            return Err(InvalidRuntimeFormat);
        }
        minutes.parse().map(Runtime).map_err(|_| InvalidRuntimeFormat)
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A movie in the catalogue
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i32,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Versioned for Movie {
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

/// Field values for a movie that does not exist yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

/// Body of `POST /v1/movies`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMovieRequest {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl CreateMovieRequest {
    /// Missing fields become zero values so validation reports them
    pub fn into_new_movie(self) -> NewMovie {
        NewMovie {
            title: self.title.unwrap_or_default(),
            year: self.year.unwrap_or_default(),
            runtime: self.runtime.unwrap_or(Runtime(0)),
            genres: self.genres.unwrap_or_default(),
        }
    }
}

/// Body of `PATCH /v1/movies/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

impl UpdateMovieRequest {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}
