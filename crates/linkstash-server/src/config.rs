use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};

/// JWT secrets that must never reach production.
pub const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const DEV_SECRET: &str = "dev-secret-change-me";

/// Accepted token lifetimes, in days.
pub const TOKEN_TTL_DAYS: RangeInclusive<i64> = 1..=3650;

/// Which adapter backs credentials and links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Relational tables, one row per link.
    Sqlite,
    /// Shared `users` / `links` documents persisted in SQLite.
    Document,
    /// Shared documents held in process memory.
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "document" => Ok(StoreKind::Document),
            "memory" => Ok(StoreKind::Memory),
            other => bail!("unknown LINKSTASH_STORE {:?} (expected sqlite, document or memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub environment: String,
    pub store: StoreKind,
    pub db_path: PathBuf,
    pub token_ttl_days: i64,
    pub reject_duplicate_urls: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let environment = var("LINKSTASH_ENV", "development");
        let mut jwt_secret = get("LINKSTASH_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            if environment != "development" {
                bail!("LINKSTASH_JWT_SECRET is unset or still a placeholder");
            }
            jwt_secret = DEV_SECRET.to_string();
        }

        Ok(Self {
            host: var("LINKSTASH_HOST", "0.0.0.0"),
            port: var("LINKSTASH_PORT", "3000")
                .parse()
                .context("LINKSTASH_PORT")?,
            jwt_secret,
            environment,
            store: var("LINKSTASH_STORE", "sqlite").parse()?,
            db_path: var("LINKSTASH_DB_PATH", "linkstash.db").into(),
            token_ttl_days: parse_ttl_days(&var("LINKSTASH_TOKEN_TTL_DAYS", "30"))
                .context("LINKSTASH_TOKEN_TTL_DAYS")?,
            reject_duplicate_urls: parse_bool(&var("LINKSTASH_REJECT_DUPLICATE_URLS", "true"))
                .context("LINKSTASH_REJECT_DUPLICATE_URLS")?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn uses_dev_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

fn parse_ttl_days(value: &str) -> anyhow::Result<i64> {
    let days: i64 = value.trim().parse()?;
    if !TOKEN_TTL_DAYS.contains(&days) {
        bail!(
            "{} is outside {}..={}",
            days,
            TOKEN_TTL_DAYS.start(),
            TOKEN_TTL_DAYS.end()
        );
    }
    Ok(days)
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.port, 3000);
        assert_eq!(c.store, StoreKind::Sqlite);
        assert_eq!(c.db_path, PathBuf::from("linkstash.db"));
        assert_eq!(c.token_ttl_days, 30);
        assert!(c.reject_duplicate_urls);
        assert!(c.is_development());
        assert!(c.uses_dev_secret());
    }

    #[test]
    fn placeholder_secret_rejected_outside_development() {
        assert!(config(&[("LINKSTASH_ENV", "production")]).is_err());
        assert!(
            config(&[
                ("LINKSTASH_ENV", "production"),
                ("LINKSTASH_JWT_SECRET", "change-me-to-a-random-string"),
            ])
            .is_err()
        );

        let c = config(&[
            ("LINKSTASH_ENV", "production"),
            ("LINKSTASH_JWT_SECRET", "a-real-secret"),
        ])
        .unwrap();
        assert!(!c.uses_dev_secret());
    }

    #[test]
    fn overrides_are_parsed() {
        let c = config(&[
            ("LINKSTASH_PORT", "8080"),
            ("LINKSTASH_STORE", "Document"),
            ("LINKSTASH_REJECT_DUPLICATE_URLS", "false"),
            ("LINKSTASH_TOKEN_TTL_DAYS", "7"),
        ])
        .unwrap();
        assert_eq!(c.port, 8080);
        assert_eq!(c.store, StoreKind::Document);
        assert!(!c.reject_duplicate_urls);
        assert_eq!(c.token_ttl_days, 7);

        assert!(config(&[("LINKSTASH_STORE", "redis")]).is_err());
        assert!(config(&[("LINKSTASH_PORT", "http")]).is_err());
        assert!(config(&[("LINKSTASH_REJECT_DUPLICATE_URLS", "maybe")]).is_err());
    }

    #[test]
    fn token_ttl_must_be_in_range() {
        for bad in ["0", "-1", "3651", "100000000", "9223372036854775807"] {
            assert!(
                config(&[("LINKSTASH_TOKEN_TTL_DAYS", bad)]).is_err(),
                "accepted {}",
                bad
            );
        }
        let c = config(&[("LINKSTASH_TOKEN_TTL_DAYS", "3650")]).unwrap();
        assert_eq!(c.token_ttl_days, 3650);
    }
}
