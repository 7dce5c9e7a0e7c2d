//! In-memory user store for tests and local development
//!
//! Every write is mirrored into a [`MemoryAuthStore`] so token lookups see
//! the same activation state and deletions as the user table, the way the
//! PostgreSQL token query joins `users`.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greenlight_auth::MemoryAuthStore;
use greenlight_common::{RepositoryError, SortDirection, VersionedTable, INITIAL_VERSION};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{UserQuery, UserStore};
use crate::domain::entities::{NewUser, User};

pub struct MemoryUserStore {
    table: VersionedTable<Uuid, User>,
    auth: Arc<MemoryAuthStore>,
    /// Serializes each identity write with its email check and its mirror
    write_guard: Mutex<()>,
}

impl MemoryUserStore {
    pub fn new(auth: Arc<MemoryAuthStore>) -> Self {
        Self {
            table: VersionedTable::new(),
            auth,
            write_guard: Mutex::new(()),
        }
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        !self
            .table
            .filter(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
            .is_empty()
    }

    /// Caller holds `write_guard`
    fn mirror(&self, id: Uuid) {
        match self.table.get(&id) {
            Some(user) => self.auth.put_identity(user.identity()),
            None => self.auth.remove_identity(id),
        }
    }
}

fn contains_ignore_case(value: Option<&str>, needle: &str) -> bool {
    needle.is_empty()
        || value
            .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
}

/// `None` sorts after every value, like NULL in an ascending SQL sort
fn compare_optional(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &User, b: &User, column: &str) -> Ordering {
    match column {
        "username" => compare_optional(&a.username, &b.username),
        "email" => a.email.cmp(&b.email),
        "first_name" => a.first_name.cmp(&b.first_name),
        "last_name" => compare_optional(&a.last_name, &b.last_name),
        _ => a.id.cmp(&b.id),
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let _guard = self.write_guard.lock();
        if self.email_taken(&user.email, None) {
            return Err(RepositoryError::AlreadyExists);
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        let created = self.table.insert(
            id,
            User {
                id,
                first_name: user.first_name,
                last_name: user.last_name,
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                is_active: false,
                is_staff: false,
                is_superuser: false,
                last_login: None,
                created_at: now,
                updated_at: now,
                version: INITIAL_VERSION,
                deleted_at: None,
            },
        );

        self.mirror(created.id);
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.table.get(&id))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .table
            .filter(|u| u.email.eq_ignore_ascii_case(email))
            .into_iter()
            .next())
    }

    async fn update(&self, user: &User, expected_version: i32) -> Result<i32, RepositoryError> {
        let _guard = self.write_guard.lock();
        if self.email_taken(&user.email, Some(user.id)) {
            return Err(RepositoryError::AlreadyExists);
        }

        let version = self
            .table
            .write(&user.id, expected_version, |row| {
                row.first_name = user.first_name.clone();
                row.last_name = user.last_name.clone();
                row.username = user.username.clone();
                row.email = user.email.clone();
                row.password_hash = user.password_hash.clone();
                row.is_active = user.is_active;
                row.is_staff = user.is_staff;
                row.is_superuser = user.is_superuser;
                row.updated_at = Utc::now();
            })
            .into_result()?;

        self.mirror(user.id);
        Ok(version)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.table.modify(&id, |row| row.last_login = Some(at));
        Ok(())
    }

    async fn delete(&self, id: Uuid, expected_version: i32) -> Result<(), RepositoryError> {
        let _guard = self.write_guard.lock();
        self.table
            .write(&id, expected_version, |row| {
                let now = Utc::now();
                row.deleted_at = Some(now);
                row.updated_at = now;
            })
            .into_result()?;

        self.mirror(id);
        Ok(())
    }

    async fn list(&self, query: &UserQuery) -> Result<(Vec<User>, i64), RepositoryError> {
        let mut matches = self.table.filter(|u| {
            contains_ignore_case(Some(&u.first_name), &query.first_name)
                && contains_ignore_case(u.last_name.as_deref(), &query.last_name)
                && contains_ignore_case(u.username.as_deref(), &query.username)
                && contains_ignore_case(Some(&u.email), &query.email)
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
