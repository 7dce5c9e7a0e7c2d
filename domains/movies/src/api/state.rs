//! Movies domain state

use std::sync::Arc;

use axum::extract::FromRef;
use greenlight_auth::AccessController;

use crate::repository::MovieStore;

#[derive(Clone)]
pub struct MoviesState {
    pub movies: Arc<dyn MovieStore>,
    pub access: AccessController,
}

impl FromRef<MoviesState> for AccessController {
    fn from_ref(state: &MoviesState) -> Self {
        state.access.clone()
    }
}
