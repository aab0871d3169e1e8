use chrono::{DateTime, Utc};
use linkstash_types::models::sort_newest_first;
use linkstash_types::{Link, NewLink};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::store::LinkPolicy;

/// One user's slice of the shared `links` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Bucket {
    pub fn sorted(&self) -> Vec<Link> {
        let mut links = self.links.clone();
        sort_newest_first(&mut links);
        links
    }

    pub fn insert(
        &mut self,
        new: NewLink,
        now: DateTime<Utc>,
        policy: LinkPolicy,
    ) -> StoreResult<Link> {
        if policy.reject_duplicate_urls && self.links.iter().any(|l| l.url == new.url) {
            return Err(StoreError::DuplicateUrl(new.url));
        }

        let id = next_link_id(now, |candidate| self.links.iter().any(|l| l.id == candidate));
        let link = Link::from_new(id, new, now);
        self.links.push(link.clone());
        self.last_updated = Some(now);
        Ok(link)
    }

    pub fn remove(&mut self, id: &str, now: DateTime<Utc>) -> StoreResult<Link> {
        let idx = self
            .links
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| StoreError::LinkNotFound(id.to_string()))?;
        self.last_updated = Some(now);
        Ok(self.links.remove(idx))
    }

    /// Returns the link and whether anything changed.
    pub fn set_read(&mut self, id: &str, is_read: bool, now: DateTime<Utc>) -> StoreResult<(Link, bool)> {
        self.update(id, now, |l| std::mem::replace(&mut l.is_read, is_read) != is_read)
    }

    pub fn set_favorite(
        &mut self,
        id: &str,
        is_favorite: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<(Link, bool)> {
        self.update(id, now, |l| {
            std::mem::replace(&mut l.is_favorite, is_favorite) != is_favorite
        })
    }

    fn update<F>(&mut self, id: &str, now: DateTime<Utc>, f: F) -> StoreResult<(Link, bool)>
    where
        F: FnOnce(&mut Link) -> bool,
    {
        let link = self
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| StoreError::LinkNotFound(id.to_string()))?;
        let changed = f(link);
        let link = link.clone();
        if changed {
            self.last_updated = Some(now);
        }
        Ok((link, changed))
    }
}

/// Millisecond timestamp id, suffixed with `-n` if that id is already taken
/// in the bucket.
pub fn next_link_id<F>(now: DateTime<Utc>, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = now.timestamp_millis().to_string();
    if !taken(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn new_link(url: &str) -> NewLink {
        NewLink::parse(url, None, None).unwrap()
    }

    #[test]
    fn add_add_remove_leaves_survivor() {
        let mut bucket = Bucket::default();
        let a = bucket.insert(new_link("https://a.com"), at(0), LinkPolicy::default()).unwrap();
        let b = bucket.insert(new_link("https://b.com"), at(1), LinkPolicy::default()).unwrap();
        bucket.remove(&a.id, at(2)).unwrap();

        let listed = bucket.sorted();
        assert_eq!(listed, vec![b]);
    }

    #[test]
    fn same_millisecond_inserts_get_distinct_ids() {
        let mut bucket = Bucket::default();
        let policy = LinkPolicy { reject_duplicate_urls: false };
        let first = bucket.insert(new_link("https://a.com"), at(0), policy).unwrap();
        let second = bucket.insert(new_link("https://a.com"), at(0), policy).unwrap();
        let third = bucket.insert(new_link("https://a.com"), at(0), policy).unwrap();

        assert_eq!(second.id, format!("{}-1", first.id));
        assert_eq!(third.id, format!("{}-2", first.id));
    }

    #[test]
    fn duplicate_policy_is_honored() {
        let mut bucket = Bucket::default();
        bucket.insert(new_link("https://a.com"), at(0), LinkPolicy::default()).unwrap();
        let err = bucket
            .insert(new_link("https://a.com/"), at(1), LinkPolicy::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUrl(_)));
        assert_eq!(bucket.links.len(), 1);

        let lenient = LinkPolicy { reject_duplicate_urls: false };
        bucket.insert(new_link("https://a.com"), at(2), lenient).unwrap();
        assert_eq!(bucket.links.len(), 2);
    }

    #[test]
    fn set_read_twice_reports_no_change() {
        let mut bucket = Bucket::default();
        let link = bucket.insert(new_link("https://a.com"), at(0), LinkPolicy::default()).unwrap();

        let (_, changed) = bucket.set_read(&link.id, true, at(1)).unwrap();
        assert!(changed);
        let (updated, changed) = bucket.set_read(&link.id, true, at(2)).unwrap();
        assert!(!changed);
        assert!(updated.is_read);
        assert_eq!(bucket.last_updated, Some(at(1)));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut bucket = Bucket::default();
        assert!(matches!(
            bucket.remove("nope", at(0)),
            Err(StoreError::LinkNotFound(_))
        ));
        assert!(matches!(
            bucket.set_favorite("nope", true, at(0)),
            Err(StoreError::LinkNotFound(_))
        ));
    }
}
