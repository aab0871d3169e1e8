use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Width of a generated user hash in hex characters.
pub const USER_HASH_LEN: usize = 32;

/// Generate a fresh bucket key for a new account.
///
/// Mixes the username with a random nonce and the wall clock so two accounts
/// never share a bucket, even if a username is re-registered after manual
/// cleanup. The result is pinned on the credential record and never derived
/// again.
pub fn generate_user_hash(username: &str) -> String {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(nanos.to_le_bytes());
    let mut hash = hex::encode(hasher.finalize());
    hash.truncate(USER_HASH_LEN);
    hash
}
