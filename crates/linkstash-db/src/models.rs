use chrono::{DateTime, Utc};
use linkstash_crypto::HashScheme;
use serde::{Deserialize, Serialize};

/// One account. `user_hash` is assigned at registration and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password_hash: String,
    pub hash_version: HashScheme,
    pub user_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// A credential as stored in the `users` document, keyed by username.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    pub password_hash: String,
    pub user_hash: String,
    pub hash_version: HashScheme,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl CredentialEntry {
    pub fn into_credential(self, username: &str) -> Credential {
        Credential {
            username: username.to_string(),
            password_hash: self.password_hash,
            hash_version: self.hash_version,
            user_hash: self.user_hash,
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

impl From<&Credential> for CredentialEntry {
    fn from(c: &Credential) -> Self {
        Self {
            password_hash: c.password_hash.clone(),
            user_hash: c.user_hash.clone(),
            hash_version: c.hash_version,
            created_at: c.created_at,
            last_login: c.last_login,
        }
    }
}
