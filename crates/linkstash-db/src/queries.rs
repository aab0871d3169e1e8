use std::collections::HashSet;

use chrono::{DateTime, Utc};
use linkstash_types::models::sort_newest_first;
use linkstash_types::{Category, Link, NewLink};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;
use tracing::debug;

use crate::Database;
use crate::bucket::next_link_id;
use crate::document::{DocumentStore, Versioned};
use crate::error::{StoreError, StoreResult};
use crate::models::Credential;
use crate::store::{CredentialStore, HealthCheck, LinkStore};

const LINK_COLUMNS: &str =
    "id, url, title, category, domain, date_added, is_read, is_favorite";

impl CredentialStore for Database {
    fn get_credential(&self, username: &str) -> StoreResult<Option<Credential>> {
        self.with_conn(|conn| query_credential(conn, username))
    }

    fn insert_credential(&self, c: &Credential) -> StoreResult<()> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO credentials
                    (username, password_hash, hash_version, user_hash, created_at, last_login)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    c.username,
                    c.password_hash,
                    c.hash_version.as_str(),
                    c.user_hash,
                    c.created_at.to_rfc3339(),
                    c.last_login.map(|t| t.to_rfc3339()),
                ],
            )?;
            if inserted == 0 {
                return Err(StoreError::DuplicateUser(c.username.clone()));
            }
            Ok(())
        })
    }

    fn update_credential(&self, c: &Credential) -> StoreResult<()> {
        self.with_conn(|conn| {
            // user_hash and created_at are never rewritten
            let updated = conn.execute(
                "UPDATE credentials
                 SET password_hash = ?2, hash_version = ?3, last_login = ?4
                 WHERE username = ?1",
                params![
                    c.username,
                    c.password_hash,
                    c.hash_version.as_str(),
                    c.last_login.map(|t| t.to_rfc3339()),
                ],
            )?;
            if updated == 0 {
                return Err(StoreError::UserNotFound(c.username.clone()));
            }
            Ok(())
        })
    }
}

impl LinkStore for Database {
    fn list_links(&self, user_hash: &str) -> StoreResult<Vec<Link>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM links WHERE user_hash = ?1
                 ORDER BY date_added DESC, id DESC",
                LINK_COLUMNS
            ))?;
            let rows = stmt
                .query_map([user_hash], |row| Ok(read_link(row)))?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            let mut links = rows.into_iter().collect::<StoreResult<Vec<Link>>>()?;
            // SQL orders ids as text; collision suffixes need numeric order.
            sort_newest_first(&mut links);
            Ok(links)
        })
    }

    fn add_link(&self, user_hash: &str, username: &str, link: NewLink) -> StoreResult<Link> {
        let policy = self.policy();
        let link = self.with_conn(|conn| {
            let tx = conn.transaction()?;

            if policy.reject_duplicate_urls {
                let exists: Option<String> = tx
                    .query_row(
                        "SELECT id FROM links WHERE user_hash = ?1 AND url = ?2",
                        params![user_hash, link.url],
                        |row| row.get(0),
                    )
                    .optional()?;
                if exists.is_some() {
                    return Err(StoreError::DuplicateUrl(link.url));
                }
            }

            let now = Utc::now();
            let base = now.timestamp_millis().to_string();
            let taken: HashSet<String> = {
                let mut stmt = tx.prepare(
                    "SELECT id FROM links WHERE user_hash = ?1 AND (id = ?2 OR id LIKE ?2 || '-%')",
                )?;
                let ids = stmt
                    .query_map(params![user_hash, base], |row| row.get(0))?
                    .collect::<Result<HashSet<String>, rusqlite::Error>>()?;
                ids
            };
            let id = next_link_id(now, |candidate| taken.contains(candidate));
            let link = Link::from_new(id, link, now);

            tx.execute(
                "INSERT INTO links
                    (user_hash, id, url, title, category, domain, date_added, is_read, is_favorite)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0)",
                params![
                    user_hash,
                    link.id,
                    link.url,
                    link.title,
                    link.category.as_str(),
                    link.domain,
                    link.date_added.to_rfc3339(),
                ],
            )
            .map_err(|e| match e {
                // user_hash must belong to a credential row
                rusqlite::Error::SqliteFailure(ref err, _)
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
                {
                    StoreError::UserNotFound(username.to_string())
                }
                other => StoreError::from(other),
            })?;
            tx.commit()?;
            Ok(link)
        })?;
        debug!("Added link {} for {}", link.id, username);
        Ok(link)
    }

    fn remove_link(&self, user_hash: &str, id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM links WHERE user_hash = ?1 AND id = ?2",
                params![user_hash, id],
            )?;
            if removed == 0 {
                return Err(StoreError::LinkNotFound(id.to_string()));
            }
            Ok(())
        })
    }

    fn set_read(&self, user_hash: &str, id: &str, is_read: bool) -> StoreResult<Link> {
        self.with_conn(|conn| update_flag(conn, user_hash, id, "is_read", is_read))
    }

    fn set_favorite(&self, user_hash: &str, id: &str, is_favorite: bool) -> StoreResult<Link> {
        self.with_conn(|conn| update_flag(conn, user_hash, id, "is_favorite", is_favorite))
    }
}

impl HealthCheck for Database {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn ping(&self) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }
}

impl DocumentStore for Database {
    fn load(&self, name: &str) -> StoreResult<Versioned> {
        self.with_conn(|conn| {
            let row: Option<(i64, String)> = conn
                .query_row(
                    "SELECT version, body FROM documents WHERE name = ?1",
                    [name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            match row {
                Some((version, body)) => Ok(Versioned {
                    version: version as u64,
                    body: serde_json::from_str(&body)?,
                }),
                None => Ok(Versioned {
                    version: 0,
                    body: Value::Null,
                }),
            }
        })
    }

    fn save(&self, name: &str, body: &Value, expected: u64) -> StoreResult<u64> {
        let text = serde_json::to_string(body)?;
        let next = expected + 1;
        self.with_conn(|conn| {
            let written = if expected == 0 {
                conn.execute(
                    "INSERT OR IGNORE INTO documents (name, version, body) VALUES (?1, ?2, ?3)",
                    params![name, next as i64, text],
                )?
            } else {
                conn.execute(
                    "UPDATE documents
                     SET body = ?2, version = ?3, updated_at = datetime('now')
                     WHERE name = ?1 AND version = ?4",
                    params![name, text, next as i64, expected as i64],
                )?
            };
            if written == 0 {
                return Err(StoreError::Conflict(name.to_string()));
            }
            Ok(next)
        })
    }
}

fn query_credential(conn: &Connection, username: &str) -> StoreResult<Option<Credential>> {
    let row: Option<(String, String, String, String, String, Option<String>)> = conn
        .query_row(
            "SELECT username, password_hash, hash_version, user_hash, created_at, last_login
             FROM credentials WHERE username = ?1",
            [username],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .optional()?;

    let Some((username, password_hash, hash_version, user_hash, created_at, last_login)) = row
    else {
        return Ok(None);
    };

    Ok(Some(Credential {
        username,
        password_hash,
        hash_version: hash_version.parse()?,
        user_hash,
        created_at: parse_time(&created_at)?,
        last_login: last_login.as_deref().map(parse_time).transpose()?,
    }))
}

fn update_flag(
    conn: &Connection,
    user_hash: &str,
    id: &str,
    column: &str,
    value: bool,
) -> StoreResult<Link> {
    let updated = conn.execute(
        &format!(
            "UPDATE links SET {} = ?3 WHERE user_hash = ?1 AND id = ?2",
            column
        ),
        params![user_hash, id, value as i64],
    )?;
    if updated == 0 {
        return Err(StoreError::LinkNotFound(id.to_string()));
    }
    conn.query_row(
        &format!(
            "SELECT {} FROM links WHERE user_hash = ?1 AND id = ?2",
            LINK_COLUMNS
        ),
        params![user_hash, id],
        |row| Ok(read_link(row)),
    )?
}

/// Decode a `LINK_COLUMNS` row. Row access errors are surfaced by rusqlite;
/// the inner result carries text-to-type conversion failures.
fn read_link(row: &Row<'_>) -> StoreResult<Link> {
    let category: String = row.get(3)?;
    let date_added: String = row.get(5)?;
    Ok(Link {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        category: category
            .parse::<Category>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        domain: row.get(4)?,
        date_added: parse_time(&date_added)?,
        is_read: row.get::<_, i64>(6)? != 0,
        is_favorite: row.get::<_, i64>(7)? != 0,
    })
}

fn parse_time(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkstash_crypto::HashScheme;

    use crate::LinkPolicy;
    use crate::shared::DocumentBackend;

    fn db() -> Database {
        Database::open_in_memory(LinkPolicy::default()).unwrap()
    }

    fn credential(username: &str, user_hash: &str) -> Credential {
        Credential {
            username: username.into(),
            password_hash: "hash".into(),
            hash_version: HashScheme::Sha256,
            user_hash: user_hash.into(),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn new_link(url: &str) -> NewLink {
        NewLink::parse(url, None, None).unwrap()
    }

    #[test]
    fn credential_round_trip_and_update() {
        let db = db();
        let mut cred = credential("alice", "h-alice");
        db.insert_credential(&cred).unwrap();
        assert!(matches!(
            db.insert_credential(&cred),
            Err(StoreError::DuplicateUser(_))
        ));

        cred.password_hash = "new".into();
        cred.hash_version = HashScheme::Argon2id;
        cred.last_login = Some(Utc::now());
        db.update_credential(&cred).unwrap();

        let stored = db.get_credential("alice").unwrap().unwrap();
        assert_eq!(stored.password_hash, "new");
        assert_eq!(stored.hash_version, HashScheme::Argon2id);
        assert_eq!(stored.user_hash, "h-alice");
        assert!(stored.last_login.is_some());

        assert!(matches!(
            db.update_credential(&credential("bob", "x")),
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[test]
    fn links_are_scoped_to_their_owner() {
        let db = db();
        db.insert_credential(&credential("alice", "ha")).unwrap();
        db.insert_credential(&credential("bob", "hb")).unwrap();

        let a = db.add_link("ha", "alice", new_link("https://a.com")).unwrap();
        db.add_link("hb", "bob", new_link("https://b.com")).unwrap();

        assert_eq!(db.list_links("ha").unwrap(), vec![a.clone()]);
        assert!(matches!(
            db.remove_link("hb", &a.id),
            Err(StoreError::LinkNotFound(_))
        ));
        assert_eq!(db.list_links("hb").unwrap().len(), 1);
    }

    #[test]
    fn flags_and_duplicates() {
        let db = db();
        db.insert_credential(&credential("alice", "ha")).unwrap();
        let link = db.add_link("ha", "alice", new_link("https://a.com")).unwrap();

        assert!(db.set_read("ha", &link.id, true).unwrap().is_read);
        assert!(db.set_read("ha", &link.id, true).unwrap().is_read);
        assert!(db.set_favorite("ha", &link.id, true).unwrap().is_favorite);
        assert!(matches!(
            db.set_read("ha", "nope", true),
            Err(StoreError::LinkNotFound(_))
        ));
        assert!(matches!(
            db.add_link("ha", "alice", new_link("https://a.com")),
            Err(StoreError::DuplicateUrl(_))
        ));
    }

    #[test]
    fn link_for_unknown_owner_is_user_not_found() {
        let db = db();
        assert!(matches!(
            db.add_link("ghost", "ghost", new_link("https://a.com")),
            Err(StoreError::UserNotFound(_))
        ));
    }

    #[test]
    fn unknown_stored_category_is_corrupt() {
        let db = db();
        db.insert_credential(&credential("alice", "ha")).unwrap();
        let link = db.add_link("ha", "alice", new_link("https://a.com")).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE links SET category = 'recipes' WHERE id = ?1",
                [&link.id],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(db.list_links("ha"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn listing_is_newest_first() {
        let db = db();
        db.insert_credential(&credential("alice", "ha")).unwrap();
        let first = db.add_link("ha", "alice", new_link("https://a.com")).unwrap();
        let second = db.add_link("ha", "alice", new_link("https://b.com")).unwrap();

        let ids: Vec<_> = db.list_links("ha").unwrap().into_iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn sqlite_documents_enforce_versions() {
        let db = db();
        assert_eq!(db.load("links").unwrap().version, 0);
        assert_eq!(db.save("links", &serde_json::json!({}), 0).unwrap(), 1);
        assert!(matches!(
            db.save("links", &serde_json::json!({"x": 1}), 0),
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(db.save("links", &serde_json::json!({"x": 1}), 1).unwrap(), 2);
        assert_eq!(db.load("links").unwrap().body, serde_json::json!({"x": 1}));
    }

    #[test]
    fn document_backend_runs_on_sqlite() {
        let backend = DocumentBackend::new(db(), LinkPolicy::default());
        let link = backend.add_link("h", "alice", new_link("https://a.com")).unwrap();
        assert_eq!(backend.list_links("h").unwrap(), vec![link]);
    }
}
