//! Users domain: registration, activation, credentials, user administration

pub mod api;
pub mod domain;
pub mod repository;

pub use domain::entities::{NewUser, User};
pub use domain::password::{hash_password, verify_password, PasswordError};
pub use repository::{MemoryUserStore, PgUserRepository, UserQuery, UserStore};

pub use api::routes;
pub use api::UsersState;
