//! Optimistic concurrency control for versioned entities
//!
//! Every mutation of a versioned row is a single conditional write whose
//! predicate carries both the row identity and the version the caller last
//! observed. PostgreSQL repositories express it as one statement:
//!
//! ```sql
//! WITH written AS (
//!     UPDATE movies SET ..., version = version + 1
//!     WHERE id = $1 AND version = $2 AND deleted_at IS NULL
//!     RETURNING version
//! )
//! SELECT (SELECT version FROM written) AS new_version,
//!        EXISTS (SELECT 1 FROM movies WHERE id = $1 AND deleted_at IS NULL) AS present
//! ```
//!
//! and decode the row with [`GuardedWrite`]. The in-memory [`VersionedTable`]
//! gives the same guarantees under a single lock.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::db::RepositoryError;

/// Version assigned to freshly inserted rows
pub const INITIAL_VERSION: i32 = 1;

/// Result row of a version-guarded statement
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct GuardedWrite {
    /// Version after the write, `None` when no row matched the predicate
    pub new_version: Option<i32>,
    /// Whether a live row with the same identity exists
    pub present: bool,
}

impl GuardedWrite {
    pub fn outcome(self) -> WriteOutcome {
        match (self.new_version, self.present) {
            (Some(version), _) => WriteOutcome::Applied { version },
            (None, true) => WriteOutcome::Conflict,
            (None, false) => WriteOutcome::Missing,
        }
    }
}

/// Classified result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Exactly one row matched; `version` is the caller's new baseline
    Applied { version: i32 },
    /// The row exists but another writer moved its version
    Conflict,
    /// No live row with that identity
    Missing,
}

impl WriteOutcome {
    pub fn into_result(self) -> Result<i32, RepositoryError> {
        match self {
            WriteOutcome::Applied { version } => Ok(version),
            WriteOutcome::Conflict => Err(RepositoryError::EditConflict),
            WriteOutcome::Missing => Err(RepositoryError::NotFound),
        }
    }
}

/// Entity carrying a version stamp and a soft-delete marker
pub trait Versioned {
    fn version(&self) -> i32;
    fn set_version(&mut self, version: i32);
    fn is_deleted(&self) -> bool;
}

/// In-memory table with compare-and-swap writes.
///
/// Backs the in-memory repositories; the write lock is held only for the
/// duration of one check-and-apply.
#[derive(Debug)]
pub struct VersionedTable<K, T> {
    rows: RwLock<HashMap<K, T>>,
}

impl<K, T> Default for VersionedTable<K, T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, T> VersionedTable<K, T>
where
    K: Eq + Hash + Clone,
    T: Versioned + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new row at [`INITIAL_VERSION`]
    pub fn insert(&self, key: K, mut row: T) -> T {
        row.set_version(INITIAL_VERSION);
        self.rows.write().insert(key, row.clone());
        row
    }

    /// Live row by key
    pub fn get(&self, key: &K) -> Option<T> {
        self.rows
            .read()
            .get(key)
            .filter(|row| !row.is_deleted())
            .cloned()
    }

    /// Every live row matching `predicate`
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .read()
            .values()
            .filter(|row| !row.is_deleted() && predicate(row))
            .cloned()
            .collect()
    }

    /// Apply `mutate` when the stored version equals `expected_version`.
    ///
    /// Soft deletes go through here as well: `mutate` sets the removal marker
    /// and the version is bumped like any other write.
    pub fn write(
        &self,
        key: &K,
        expected_version: i32,
        mutate: impl FnOnce(&mut T),
    ) -> WriteOutcome {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(key).filter(|row| !row.is_deleted()) else {
            return WriteOutcome::Missing;
        };

        if row.version() != expected_version {
            return WriteOutcome::Conflict;
        }

        mutate(row);
        let version = expected_version + 1;
        row.set_version(version);
        WriteOutcome::Applied { version }
    }

    /// Unguarded bookkeeping write that leaves the version alone.
    ///
    /// Returns `false` when there is no live row.
    pub fn modify(&self, key: &K, mutate: impl FnOnce(&mut T)) -> bool {
        let mut rows = self.rows.write();
        match rows.get_mut(key).filter(|row| !row.is_deleted()) {
            Some(row) => {
                mutate(row);
                true
            }
            None => false,
        }
    }
}
