use std::sync::Arc;

use linkstash_crypto::Hasher;
use linkstash_db::{CredentialStore, HealthCheck, LinkStore};
use tracing::error;

use crate::accounts::Accounts;
use crate::error::ApiError;
use crate::middleware::TokenKeys;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub accounts: Accounts,
    pub links: Arc<dyn LinkStore>,
    pub health: Arc<dyn HealthCheck>,
    pub tokens: TokenKeys,
    pub environment: String,
}

impl AppStateInner {
    /// Wire every store slot to one backend.
    pub fn with_backend<B>(
        backend: Arc<B>,
        hasher: Hasher,
        tokens: TokenKeys,
        environment: impl Into<String>,
    ) -> AppState
    where
        B: CredentialStore + LinkStore + HealthCheck + 'static,
    {
        Arc::new(Self {
            accounts: Accounts::new(backend.clone(), hasher),
            links: backend.clone(),
            health: backend,
            tokens,
            environment: environment.into(),
        })
    }
}

/// Run blocking store or hashing work off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.to_string())
    })?
}
