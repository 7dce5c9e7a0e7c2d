//! Optimistic concurrency integration tests
//!
//! Racing writers that observed the same version: exactly one wins, the
//! rest see 409, and the stored version moves by exactly one.

use std::sync::Arc;

use axum::http::StatusCode;
use greenlight_common::{error::EDIT_CONFLICT_MESSAGE, RepositoryError};
use serde_json::json;
use tokio::task::JoinSet;

use crate::common::{assertions::assert_error, create_movie, TestApp, TestRequest, UserFixture};

const WRITERS: usize = 10;

mod test_racing_writers {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_exactly_one_concurrent_update_wins() {
        let app = Arc::new(TestApp::new());
        let manager = UserFixture::with_roles(&app, &["manager"]).await.unwrap();
        let id = create_movie(&app, &manager, "Moana").await;

        let mut writers = JoinSet::new();
        for n in 0..WRITERS {
            let app = app.clone();
            let bearer = manager.bearer().to_string();
            writers.spawn(async move {
                app.send(
                    TestRequest::patch(format!("/v1/movies/{id}"), json!({"year": 2000 + n}))
                        .header("x-expected-version", "1")
                        .bearer(bearer),
                )
                .await
            });
        }

        let mut won = 0;
        let mut conflicted = 0;
        while let Some(joined) = writers.join_next().await {
            let response = joined.unwrap();
            match response.status {
                StatusCode::OK => {
                    assert_eq!(response.body["movie"]["version"], 2);
                    won += 1;
                }
                StatusCode::CONFLICT => {
                    assert_error(&response, StatusCode::CONFLICT, EDIT_CONFLICT_MESSAGE);
                    conflicted += 1;
                }
                other => panic!("unexpected status {other}: {}", response.body),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(conflicted, WRITERS - 1);

        let stored = app.state.movies.get(id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_store_level_race_increments_once() {
        let app = Arc::new(TestApp::new());
        let manager = UserFixture::with_roles(&app, &["manager"]).await.unwrap();
        let id = create_movie(&app, &manager, "Arrival").await;
        let observed = app.state.movies.get(id).await.unwrap().unwrap();
        let expected = observed.version;

        let mut writers = JoinSet::new();
        for n in 0..WRITERS {
            let app = app.clone();
            let mut movie = observed.clone();
            movie.year = 1990 + n as i32;
            writers.spawn(async move { app.state.movies.update(&movie, expected).await });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = writers.join_next().await {
            outcomes.push(joined.unwrap());
        }

        let winners: Vec<i32> = outcomes.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        assert_eq!(winners, vec![expected + 1]);
        assert_eq!(
            outcomes
                .iter()
                .filter(|r| matches!(r, Err(RepositoryError::EditConflict)))
                .count(),
            WRITERS - 1
        );
    }
}

mod test_version_discipline {
    use super::*;

    #[tokio::test]
    async fn test_sequential_updates_advance_one_at_a_time() {
        let app = TestApp::new();
        let manager = UserFixture::with_roles(&app, &["manager"]).await.unwrap();
        let id = create_movie(&app, &manager, "Moana").await;

        for expected in 1..=3 {
            let response = app
                .send(
                    TestRequest::patch(format!("/v1/movies/{id}"), json!({"year": 2010 + expected}))
                        .header("x-expected-version", expected.to_string())
                        .bearer(manager.bearer()),
                )
                .await;
            assert_eq!(response.status, StatusCode::OK, "{}", response.body);
            assert_eq!(response.body["movie"]["version"], expected + 1);
        }

        // A writer still holding version 1 is refused
        let response = app
            .send(
                TestRequest::patch(format!("/v1/movies/{id}"), json!({"title": "Stale"}))
                    .header("x-expected-version", "1")
                    .bearer(manager.bearer()),
            )
            .await;
        assert_eq!(response.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_delete_is_version_guarded() {
        let app = TestApp::new();
        let manager = UserFixture::with_roles(&app, &["manager"]).await.unwrap();
        let id = create_movie(&app, &manager, "Moana").await;

        let response = app
            .send(
                TestRequest::delete(format!("/v1/movies/{id}"))
                    .header("x-expected-version", "7")
                    .bearer(manager.bearer()),
            )
            .await;
        assert_eq!(response.status, StatusCode::CONFLICT);

        let response = app
            .send(
                TestRequest::delete(format!("/v1/movies/{id}"))
                    .header("x-expected-version", "1")
                    .bearer(manager.bearer()),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["message"], "movie successfully deleted");

        // The removed movie is gone for every later write, stale or not
        for version in ["1", "2"] {
            let response = app
                .send(
                    TestRequest::patch(format!("/v1/movies/{id}"), json!({"year": 2001}))
                        .header("x-expected-version", version)
                        .bearer(manager.bearer()),
                )
                .await;
            assert_eq!(response.status, StatusCode::NOT_FOUND);
        }
    }
}
