use std::collections::BTreeMap;

use chrono::Utc;
use linkstash_types::{Link, NewLink};
use tracing::debug;

use crate::bucket::Bucket;
use crate::document::{DocumentStore, read_document, update_document};
use crate::error::{StoreError, StoreResult};
use crate::models::{Credential, CredentialEntry};
use crate::store::{CredentialStore, HealthCheck, LinkPolicy, LinkStore};

pub const LINKS_DOCUMENT: &str = "links";
pub const USERS_DOCUMENT: &str = "users";

/// `{ userHash: { username, links, lastUpdated } }`
pub type LinksDocument = BTreeMap<String, Bucket>;

/// `{ username: { passwordHash, userHash, hashVersion, createdAt, lastLogin } }`
pub type UsersDocument = BTreeMap<String, CredentialEntry>;

/// Credential and link storage on top of two shared JSON documents.
pub struct DocumentBackend<D> {
    docs: D,
    policy: LinkPolicy,
}

impl<D: DocumentStore> DocumentBackend<D> {
    pub fn new(docs: D, policy: LinkPolicy) -> Self {
        Self { docs, policy }
    }

    pub fn documents(&self) -> &D {
        &self.docs
    }

    fn update_bucket<R, F>(&self, user_hash: &str, mut f: F) -> StoreResult<R>
    where
        F: FnMut(&mut Bucket) -> StoreResult<(R, bool)>,
    {
        update_document(&self.docs, LINKS_DOCUMENT, |doc: &mut LinksDocument| {
            // Only this user's entry is touched; every other bucket is written
            // back exactly as read.
            match doc.get_mut(user_hash) {
                Some(bucket) => f(bucket),
                None => {
                    let mut bucket = Bucket::default();
                    let (result, dirty) = f(&mut bucket)?;
                    if dirty {
                        doc.insert(user_hash.to_string(), bucket);
                    }
                    Ok((result, dirty))
                }
            }
        })
    }
}

impl<D: DocumentStore> CredentialStore for DocumentBackend<D> {
    fn get_credential(&self, username: &str) -> StoreResult<Option<Credential>> {
        let users: UsersDocument = read_document(&self.docs, USERS_DOCUMENT)?;
        Ok(users
            .get(username)
            .cloned()
            .map(|entry| entry.into_credential(username)))
    }

    fn insert_credential(&self, credential: &Credential) -> StoreResult<()> {
        update_document(&self.docs, USERS_DOCUMENT, |users: &mut UsersDocument| {
            if users.contains_key(&credential.username) {
                return Err(StoreError::DuplicateUser(credential.username.clone()));
            }
            users.insert(credential.username.clone(), CredentialEntry::from(credential));
            Ok(((), true))
        })
    }

    fn update_credential(&self, credential: &Credential) -> StoreResult<()> {
        update_document(&self.docs, USERS_DOCUMENT, |users: &mut UsersDocument| {
            let entry = users
                .get_mut(&credential.username)
                .ok_or_else(|| StoreError::UserNotFound(credential.username.clone()))?;
            *entry = CredentialEntry::from(credential);
            Ok(((), true))
        })
    }
}

impl<D: DocumentStore> LinkStore for DocumentBackend<D> {
    fn list_links(&self, user_hash: &str) -> StoreResult<Vec<Link>> {
        let doc: LinksDocument = read_document(&self.docs, LINKS_DOCUMENT)?;
        Ok(doc.get(user_hash).map(Bucket::sorted).unwrap_or_default())
    }

    fn add_link(&self, user_hash: &str, username: &str, link: NewLink) -> StoreResult<Link> {
        let policy = self.policy;
        let link = self.update_bucket(user_hash, |bucket| {
            if bucket.username.is_empty() {
                bucket.username = username.to_string();
            }
            let added = bucket.insert(link.clone(), Utc::now(), policy)?;
            Ok((added, true))
        })?;
        debug!("Added link {} for {}", link.id, username);
        Ok(link)
    }

    fn remove_link(&self, user_hash: &str, id: &str) -> StoreResult<()> {
        self.update_bucket(user_hash, |bucket| {
            bucket.remove(id, Utc::now())?;
            Ok(((), true))
        })
    }

    fn set_read(&self, user_hash: &str, id: &str, is_read: bool) -> StoreResult<Link> {
        self.update_bucket(user_hash, |bucket| bucket.set_read(id, is_read, Utc::now()))
    }

    fn set_favorite(&self, user_hash: &str, id: &str, is_favorite: bool) -> StoreResult<Link> {
        self.update_bucket(user_hash, |bucket| {
            bucket.set_favorite(id, is_favorite, Utc::now())
        })
    }
}

impl<D: DocumentStore> HealthCheck for DocumentBackend<D> {
    fn backend_name(&self) -> &'static str {
        "document"
    }

    fn ping(&self) -> StoreResult<()> {
        self.docs.load(USERS_DOCUMENT).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use crate::document::MemoryDocuments;

    fn backend() -> DocumentBackend<MemoryDocuments> {
        DocumentBackend::new(MemoryDocuments::new(), LinkPolicy::default())
    }

    fn new_link(url: &str) -> NewLink {
        NewLink::parse(url, None, None).unwrap()
    }

    #[test]
    fn list_of_unknown_user_is_empty() {
        assert!(backend().list_links("nobody").unwrap().is_empty());
    }

    #[test]
    fn add_then_remove_first() {
        let store = backend();
        let a = store.add_link("h1", "alice", new_link("https://a.com")).unwrap();
        let b = store.add_link("h1", "alice", new_link("https://b.com")).unwrap();
        store.remove_link("h1", &a.id).unwrap();

        let links = store.list_links("h1").unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, b.id);
        assert_eq!(links[0].domain, "b.com");
    }

    #[test]
    fn failed_mutation_leaves_bucket_untouched() {
        let store = backend();
        store.add_link("h1", "alice", new_link("https://a.com")).unwrap();
        let before = store.documents().load(LINKS_DOCUMENT).unwrap();

        assert!(matches!(
            store.remove_link("h1", "missing"),
            Err(StoreError::LinkNotFound(_))
        ));
        assert!(matches!(
            store.add_link("h1", "alice", new_link("https://a.com")),
            Err(StoreError::DuplicateUrl(_))
        ));

        let after = store.documents().load(LINKS_DOCUMENT).unwrap();
        assert_eq!(before.version, after.version);
        assert_eq!(before.body, after.body);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let store = backend();
        let link = store.add_link("h1", "alice", new_link("https://a.com")).unwrap();
        store.set_read("h1", &link.id, true).unwrap();
        let version = store.documents().load(LINKS_DOCUMENT).unwrap().version;

        let again = store.set_read("h1", &link.id, true).unwrap();
        assert!(again.is_read);
        assert_eq!(store.documents().load(LINKS_DOCUMENT).unwrap().version, version);
    }

    #[test]
    fn bucket_records_username() {
        let store = backend();
        store.add_link("h1", "alice", new_link("https://a.com")).unwrap();
        let doc: LinksDocument = read_document(store.documents(), LINKS_DOCUMENT).unwrap();
        assert_eq!(doc["h1"].username, "alice");
        assert!(doc["h1"].last_updated.is_some());
    }

    #[test]
    fn concurrent_writers_to_different_buckets_keep_both() {
        let store = Arc::new(backend());
        let per_user = 25;

        let handles: Vec<_> = ["alice", "bob"]
            .into_iter()
            .map(|user| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..per_user {
                        let url = format!("https://{}.example.com/{}", user, i);
                        store.add_link(user, user, new_link(&url)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        for user in ["alice", "bob"] {
            let links = store.list_links(user).unwrap();
            assert_eq!(links.len(), per_user, "{} lost writes", user);
            assert!(links.iter().all(|l| l.domain == format!("{}.example.com", user)));
        }
    }

    #[test]
    fn credentials_are_unique_by_username() {
        let store = backend();
        let cred = Credential {
            username: "alice".into(),
            password_hash: "h".into(),
            hash_version: linkstash_crypto::HashScheme::Legacy,
            user_hash: "abc".into(),
            created_at: Utc::now(),
            last_login: None,
        };
        store.insert_credential(&cred).unwrap();
        assert!(matches!(
            store.insert_credential(&cred),
            Err(StoreError::DuplicateUser(_))
        ));
        assert_eq!(store.get_credential("alice").unwrap(), Some(cred));
        assert_eq!(store.get_credential("bob").unwrap(), None);
    }
}
