//! Storage seams. The API layer only ever talks to these traits, so the
//! relational and document backends are interchangeable.

use linkstash_types::{Link, NewLink};

use crate::error::StoreResult;
use crate::models::Credential;

/// Options shared by every link store.
#[derive(Debug, Clone, Copy)]
pub struct LinkPolicy {
    /// Reject a second link with the same URL inside one user's bucket.
    pub reject_duplicate_urls: bool,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            reject_duplicate_urls: true,
        }
    }
}

/// Username → credential record.
pub trait CredentialStore: Send + Sync {
    fn get_credential(&self, username: &str) -> StoreResult<Option<Credential>>;

    /// Fails with `DuplicateUser` if the username is taken.
    fn insert_credential(&self, credential: &Credential) -> StoreResult<()>;

    /// Overwrite an existing record. Fails with `UserNotFound` if absent.
    fn update_credential(&self, credential: &Credential) -> StoreResult<()>;
}

/// userHash → that user's links. Implementations must never touch another
/// user's bucket when mutating one.
pub trait LinkStore: Send + Sync {
    /// Newest first. A user with no bucket yet gets an empty list.
    fn list_links(&self, user_hash: &str) -> StoreResult<Vec<Link>>;

    fn add_link(&self, user_hash: &str, username: &str, link: NewLink) -> StoreResult<Link>;

    fn remove_link(&self, user_hash: &str, id: &str) -> StoreResult<()>;

    fn set_read(&self, user_hash: &str, id: &str, is_read: bool) -> StoreResult<Link>;

    fn set_favorite(&self, user_hash: &str, id: &str, is_favorite: bool) -> StoreResult<Link>;
}

/// Liveness probe for the health endpoint.
pub trait HealthCheck: Send + Sync {
    fn backend_name(&self) -> &'static str;

    fn ping(&self) -> StoreResult<()>;
}
