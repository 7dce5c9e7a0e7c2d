//! Movie repository

use async_trait::async_trait;
use greenlight_common::{GuardedWrite, RepositoryError};
use sqlx::PgPool;

use super::{MovieQuery, MovieStore};
use crate::domain::entities::{Movie, NewMovie};

#[derive(sqlx::FromRow)]
struct MovieListRow {
    total_records: i64,
    #[sqlx(flatten)]
    movie: Movie,
}

#[derive(Clone)]
pub struct PgMovieRepository {
    pool: PgPool,
}

impl PgMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieStore for PgMovieRepository {
    async fn insert(&self, movie: NewMovie) -> Result<Movie, RepositoryError> {
        let created: Movie = sqlx::query_as(
            r#"
            INSERT INTO movies (title, year, runtime, genres)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, title, year, runtime, genres, version, deleted_at
            "#,
        )
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime)
        .bind(&movie.genres)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, title = %movie.title, "Failed to insert movie");
            RepositoryError::Connection(e)
        })?;

        Ok(created)
    }

    async fn get(&self, id: i64) -> Result<Option<Movie>, RepositoryError> {
        let movie: Option<Movie> = sqlx::query_as(
            r#"
            SELECT id, created_at, title, year, runtime, genres, version, deleted_at
            FROM movies
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, movie_id = id, "Failed to load movie");
            RepositoryError::Connection(e)
        })?;

        Ok(movie)
    }

    async fn update(&self, movie: &Movie, expected_version: i32) -> Result<i32, RepositoryError> {
        let written: GuardedWrite = sqlx::query_as(
            r#"
            WITH written AS (
                UPDATE movies
                SET title = $3, year = $4, runtime = $5, genres = $6, version = version + 1
                WHERE id = $1 AND version = $2 AND deleted_at IS NULL
                RETURNING version
            )
            SELECT (SELECT version FROM written) AS new_version,
                   EXISTS (SELECT 1 FROM movies WHERE id = $1 AND deleted_at IS NULL) AS present
            "#,
        )
        .bind(movie.id)
        .bind(expected_version)
        .bind(&movie.title)
        .bind(movie.year)
        .bind(movie.runtime)
        .bind(&movie.genres)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, movie_id = movie.id, "Failed to update movie");
            RepositoryError::Connection(e)
        })?;

        written.outcome().into_result()
    }

    async fn delete(&self, id: i64, expected_version: i32) -> Result<(), RepositoryError> {
        let written: GuardedWrite = sqlx::query_as(
            r#"
            WITH written AS (
                UPDATE movies
                SET deleted_at = NOW(), version = version + 1
                WHERE id = $1 AND version = $2 AND deleted_at IS NULL
                RETURNING version
            )
            SELECT (SELECT version FROM written) AS new_version,
                   EXISTS (SELECT 1 FROM movies WHERE id = $1 AND deleted_at IS NULL) AS present
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, movie_id = id, "Failed to delete movie");
            RepositoryError::Connection(e)
        })?;

        written.outcome().into_result().map(|_| ())
    }

    async fn list(&self, query: &MovieQuery) -> Result<(Vec<Movie>, i64), RepositoryError> {
        // Column and direction come from the safelist, never from raw input
        let sql = format!(
            r#"
            SELECT count(*) OVER() AS total_records,
                   id, created_at, title, year, runtime, genres, version, deleted_at
            FROM movies
            WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
              AND (genres @> $2 OR $2 = '{{}}')
              AND deleted_at IS NULL
            ORDER BY {} {}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            query.filters.sort_column(),
            query.filters.sort_direction().as_sql(),
        );

        let rows: Vec<MovieListRow> = sqlx::query_as(&sql)
            .bind(&query.title)
            .bind(&query.genres)
            .bind(query.filters.limit())
            .bind(query.filters.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to list movies");
                RepositoryError::Connection(e)
            })?;

        let total = rows.first().map(|r| r.total_records).unwrap_or(0);
        Ok((rows.into_iter().map(|r| r.movie).collect(), total))
    }
}
