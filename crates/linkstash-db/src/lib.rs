pub mod bucket;
pub mod document;
pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod shared;
pub mod store;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub use document::{DocumentStore, MemoryDocuments};
pub use error::{StoreError, StoreResult};
pub use models::Credential;
pub use shared::DocumentBackend;
pub use store::{CredentialStore, HealthCheck, LinkPolicy, LinkStore};

/// SQLite database. Serves both as the relational backend (per-user link
/// rows) and as a versioned document store for `DocumentBackend`.
pub struct Database {
    conn: Mutex<Connection>,
    policy: LinkPolicy,
}

impl Database {
    pub fn open(path: &Path, policy: LinkPolicy) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            policy,
        })
    }

    pub fn open_in_memory(policy: LinkPolicy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            policy,
        })
    }

    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }

    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("DB lock poisoned: {}", e)))?;
        f(&mut conn)
    }
}
