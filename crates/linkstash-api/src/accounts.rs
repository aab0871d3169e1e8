use std::sync::Arc;

use chrono::Utc;
use linkstash_crypto::{HashScheme, Hasher, generate_user_hash};
use linkstash_db::{Credential, CredentialStore};
use tracing::{info, warn};

use crate::error::ApiError;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;

/// Credential handling: registration, login with opportunistic hash
/// upgrade, password reset.
pub struct Accounts {
    store: Arc<dyn CredentialStore>,
    hasher: Hasher,
}

impl Accounts {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Hasher) -> Self {
        Self { store, hasher }
    }

    pub fn register(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        validate_username(username)?;
        validate_password(password)?;

        if self.store.get_credential(username)?.is_some() {
            return Err(ApiError::DuplicateUser);
        }

        let credential = Credential {
            username: username.to_string(),
            password_hash: self.hash(password)?,
            hash_version: HashScheme::PREFERRED,
            user_hash: generate_user_hash(username),
            created_at: Utc::now(),
            last_login: None,
        };
        self.store.insert_credential(&credential)?;

        info!("Registered user {}", username);
        Ok(credential)
    }

    /// Verify a password. On success with an outdated scheme the password is
    /// re-hashed with the preferred one; that write and the `last_login`
    /// stamp never fail the login.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Username and password are required".into(),
            ));
        }

        let stored = self
            .store
            .get_credential(username)?
            .ok_or(ApiError::UserNotFound)?;

        let valid = self
            .hasher
            .verify(stored.hash_version, password, &stored.password_hash)
            .map_err(|e| ApiError::Internal(format!("verifying {}: {}", username, e)))?;
        if !valid {
            return Err(ApiError::InvalidCredentials);
        }

        let mut updated = stored.clone();
        updated.last_login = Some(Utc::now());
        if !stored.hash_version.is_preferred() {
            match self.hasher.hash(password) {
                Ok(hash) => {
                    updated.password_hash = hash;
                    updated.hash_version = HashScheme::PREFERRED;
                }
                Err(e) => warn!("Could not re-hash password for {}: {}", username, e),
            }
        }

        match self.store.update_credential(&updated) {
            Ok(()) => {
                if updated.hash_version != stored.hash_version {
                    info!(
                        "Upgraded password hash for {} from {} to {}",
                        username, stored.hash_version, updated.hash_version
                    );
                }
                Ok(updated)
            }
            Err(e) => {
                warn!("Login bookkeeping for {} not persisted: {}", username, e);
                Ok(stored)
            }
        }
    }

    /// Replace the password. The bucket key and creation time are kept.
    pub fn reset_password(&self, username: &str, new_password: &str) -> Result<Credential, ApiError> {
        validate_password(new_password)?;

        let mut credential = self
            .store
            .get_credential(username)?
            .ok_or(ApiError::UserNotFound)?;
        credential.password_hash = self.hash(new_password)?;
        credential.hash_version = HashScheme::PREFERRED;
        self.store.update_credential(&credential)?;

        info!("Password reset for {}", username);
        Ok(credential)
    }

    pub fn exists(&self, username: &str) -> Result<bool, ApiError> {
        Ok(self.store.get_credential(username)?.is_some())
    }

    pub fn find(&self, username: &str) -> Result<Option<Credential>, ApiError> {
        Ok(self.store.get_credential(username)?)
    }

    fn hash(&self, password: &str) -> Result<String, ApiError> {
        self.hasher
            .hash(password)
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ApiError::Validation(format!(
            "Username must be {}-{} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::Validation(
            "Username may only contain letters, digits, '_' and '-'".into(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at most {} characters",
            PASSWORD_MAX_LEN
        )));
    }
    Ok(())
}
