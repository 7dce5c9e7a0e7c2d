//! In-memory movie store for tests and local development

use std::cmp::Ordering;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use greenlight_common::{RepositoryError, SortDirection, VersionedTable, INITIAL_VERSION};

use super::{MovieQuery, MovieStore};
use crate::domain::entities::{Movie, NewMovie};

#[derive(Debug, Default)]
pub struct MemoryMovieStore {
    table: VersionedTable<i64, Movie>,
    next_id: AtomicI64,
}

impl MemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Every search word appears as a whole word of the title, ignoring case
fn title_matches(title: &str, search: &str) -> bool {
    let words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    search
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .all(|term| words.contains(&term.to_lowercase()))
}

fn compare(a: &Movie, b: &Movie, column: &str) -> Ordering {
    match column {
        "title" => a.title.cmp(&b.title),
        "year" => a.year.cmp(&b.year),
        "runtime" => a.runtime.cmp(&b.runtime),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn insert(&self, movie: NewMovie) -> Result<Movie, RepositoryError> {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let row = Movie {
            id,
            created_at: Utc::now(),
            title: movie.title,
            year: movie.year,
            runtime: movie.runtime,
            genres: movie.genres,
            version: INITIAL_VERSION,
            deleted_at: None,
        };
        Ok(self.table.insert(id, row))
    }

    async fn get(&self, id: i64) -> Result<Option<Movie>, RepositoryError> {
        Ok(self.table.get(&id))
    }

    async fn update(&self, movie: &Movie, expected_version: i32) -> Result<i32, RepositoryError> {
        self.table
            .write(&movie.id, expected_version, |row| {
                row.title = movie.title.clone();
                row.year = movie.year;
                row.runtime = movie.runtime;
                row.genres = movie.genres.clone();
            })
            .into_result()
    }

    async fn delete(&self, id: i64, expected_version: i32) -> Result<(), RepositoryError> {
        self.table
            .write(&id, expected_version, |row| row.deleted_at = Some(Utc::now()))
            .into_result()
            .map(|_| ())
    }

    async fn list(&self, query: &MovieQuery) -> Result<(Vec<Movie>, i64), RepositoryError> {
        let mut matches = self.table.filter(|movie| {
            title_matches(&movie.title, &query.title)
                && query.genres.iter().all(|g| movie.genres.contains(g))
        });

        let column = query.filters.sort_column();
        let direction = query.filters.sort_direction();
        matches.sort_by(|a, b| {
            let primary = compare(a, b, column);
            let primary = match direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(query.filters.offset().max(0) as usize)
            .take(query.filters.limit().max(0) as usize)
            .collect();

        Ok((page, total))
    }
}
