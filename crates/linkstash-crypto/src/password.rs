use std::fmt;
use std::str::FromStr;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::{self, SaltString},
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Fixed salt appended by the legacy scheme. Every legacy hash shares it.
const LEGACY_SALT: &str = "linkstash-salt";

/// Default bcrypt cost factor.
pub const BCRYPT_COST: u32 = 12;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("Unknown hash scheme: {0}")]
    UnknownScheme(String),

    #[error("Stored hash is malformed: {0}")]
    Malformed(String),

    #[error("Hashing failed: {0}")]
    Backend(String),
}

/// Tag stored next to every password hash, selecting the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// Unsalted SHA-256 over password + a fixed app salt.
    Legacy,
    /// SHA-256 over a per-user random salt + password, stored as `salt:digest`.
    Sha256,
    Bcrypt,
    Argon2id,
}

impl HashScheme {
    /// Scheme used for every new hash.
    pub const PREFERRED: HashScheme = HashScheme::Argon2id;

    pub fn is_preferred(&self) -> bool {
        *self == Self::PREFERRED
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashScheme::Legacy => "legacy",
            HashScheme::Sha256 => "sha256",
            HashScheme::Bcrypt => "bcrypt",
            HashScheme::Argon2id => "argon2id",
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashScheme {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(HashScheme::Legacy),
            "sha256" => Ok(HashScheme::Sha256),
            "bcrypt" => Ok(HashScheme::Bcrypt),
            "argon2id" => Ok(HashScheme::Argon2id),
            other => Err(HashError::UnknownScheme(other.to_string())),
        }
    }
}

/// Hashes and verifies passwords for every supported scheme.
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
    bcrypt_cost: u32,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Production parameters: Argon2id defaults and bcrypt cost 12.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
            bcrypt_cost: BCRYPT_COST,
        }
    }

    /// Deliberately cheap parameters for tests and local development.
    pub fn fast() -> Self {
        let params = Params::new(256, 1, 1, None).unwrap_or_default();
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            bcrypt_cost: 4,
        }
    }

    /// Hash with the preferred scheme.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        self.hash_with(HashScheme::PREFERRED, password)
    }

    pub fn hash_with(&self, scheme: HashScheme, password: &str) -> Result<String, HashError> {
        match scheme {
            HashScheme::Legacy => Ok(legacy_digest(password)),
            HashScheme::Sha256 => {
                let salt: [u8; 16] = rand::random();
                Ok(format!(
                    "{}:{}",
                    hex::encode(salt),
                    salted_digest(&salt, password)
                ))
            }
            HashScheme::Bcrypt => bcrypt::hash(password, self.bcrypt_cost)
                .map_err(|e| HashError::Backend(e.to_string())),
            HashScheme::Argon2id => {
                let salt = SaltString::generate(&mut OsRng);
                self.argon2
                    .hash_password(password.as_bytes(), &salt)
                    .map(|h| h.to_string())
                    .map_err(|e| HashError::Backend(e.to_string()))
            }
        }
    }

    /// Check `password` against a hash produced by `scheme`.
    ///
    /// `Ok(false)` means the password is wrong; `Err` means the stored hash
    /// could not be interpreted.
    pub fn verify(
        &self,
        scheme: HashScheme,
        password: &str,
        stored: &str,
    ) -> Result<bool, HashError> {
        match scheme {
            HashScheme::Legacy => Ok(legacy_digest(password) == stored),
            HashScheme::Sha256 => {
                let (salt_hex, digest) = stored
                    .split_once(':')
                    .ok_or_else(|| HashError::Malformed("missing salt separator".into()))?;
                let salt =
                    hex::decode(salt_hex).map_err(|e| HashError::Malformed(e.to_string()))?;
                Ok(salted_digest(&salt, password) == digest)
            }
            HashScheme::Bcrypt => bcrypt::verify(password, stored)
                .map_err(|e| HashError::Malformed(e.to_string())),
            HashScheme::Argon2id => {
                let parsed =
                    PasswordHash::new(stored).map_err(|e| HashError::Malformed(e.to_string()))?;
                match self.argon2.verify_password(password.as_bytes(), &parsed) {
                    Ok(()) => Ok(true),
                    Err(password_hash::Error::Password) => Ok(false),
                    Err(e) => Err(HashError::Malformed(e.to_string())),
                }
            }
        }
    }
}

fn legacy_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(LEGACY_SALT.as_bytes());
    hex::encode(hasher.finalize())
}

fn salted_digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMES: [HashScheme; 4] = [
        HashScheme::Legacy,
        HashScheme::Sha256,
        HashScheme::Bcrypt,
        HashScheme::Argon2id,
    ];

    #[test]
    fn every_scheme_verifies_its_own_hashes() {
        let hasher = Hasher::fast();
        for scheme in SCHEMES {
            let hash = hasher.hash_with(scheme, "correct horse").unwrap();
            assert!(hasher.verify(scheme, "correct horse", &hash).unwrap(), "{}", scheme);
            assert!(!hasher.verify(scheme, "wrong horse", &hash).unwrap(), "{}", scheme);
        }
    }

    #[test]
    fn legacy_hash_is_deterministic() {
        let hasher = Hasher::fast();
        let a = hasher.hash_with(HashScheme::Legacy, "secret").unwrap();
        let b = hasher.hash_with(HashScheme::Legacy, "secret").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn salted_sha256_uses_fresh_salt() {
        let hasher = Hasher::fast();
        let a = hasher.hash_with(HashScheme::Sha256, "secret").unwrap();
        let b = hasher.hash_with(HashScheme::Sha256, "secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn only_argon2id_is_preferred() {
        assert!(HashScheme::Argon2id.is_preferred());
        assert!(!HashScheme::Legacy.is_preferred());
        assert!(!HashScheme::Sha256.is_preferred());
        assert!(!HashScheme::Bcrypt.is_preferred());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        let hasher = Hasher::fast();
        assert!(hasher.verify(HashScheme::Sha256, "x", "no-separator").is_err());
        assert!(hasher.verify(HashScheme::Argon2id, "x", "garbage").is_err());
    }

    #[test]
    fn scheme_names_round_trip() {
        for scheme in SCHEMES {
            assert_eq!(scheme.as_str().parse::<HashScheme>().unwrap(), scheme);
        }
        assert!("md5".parse::<HashScheme>().is_err());
    }
}
