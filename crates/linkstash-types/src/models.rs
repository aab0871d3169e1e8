use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// The fixed set of categories a link can be filed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Article,
    Video,
    Tutorial,
    Tool,
    Reference,
    News,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::General,
        Category::Article,
        Category::Video,
        Category::Tutorial,
        Category::Tool,
        Category::Reference,
        Category::News,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Article => "article",
            Category::Video => "video",
            Category::Tutorial => "tutorial",
            Category::Tool => "tool",
            Category::Reference => "reference",
            Category::News => "news",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = LinkInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| LinkInputError::InvalidCategory(s.to_string()))
    }
}

/// A bookmark as stored in a user's bucket and sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub category: Category,
    pub domain: String,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Link {
    /// Materialize a validated link under the given id.
    pub fn from_new(id: String, new: NewLink, date_added: DateTime<Utc>) -> Self {
        Self {
            id,
            url: new.url,
            title: new.title,
            category: new.category,
            domain: new.domain,
            date_added,
            is_read: false,
            is_favorite: false,
        }
    }

    /// Ordering used for every listing: newest first, ties broken by id descending.
    pub fn newest_first(a: &Link, b: &Link) -> Ordering {
        b.date_added
            .cmp(&a.date_added)
            .then_with(|| compare_ids(&b.id, &a.id))
    }
}

/// Ids are `<millis>` or `<millis>-<n>`; both parts compare numerically.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    fn parts(id: &str) -> (&str, Option<u64>) {
        match id.split_once('-') {
            Some((base, n)) => (base, n.parse().ok()),
            None => (id, Some(0)),
        }
    }
    let (a_base, a_n) = parts(a);
    let (b_base, b_n) = parts(b);
    a_base
        .len()
        .cmp(&b_base.len())
        .then_with(|| a_base.cmp(b_base))
        .then_with(|| a_n.cmp(&b_n))
        .then_with(|| a.cmp(b))
}

pub fn sort_newest_first(links: &mut [Link]) {
    links.sort_by(Link::newest_first);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkInputError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),
}

/// A link that passed validation but has no id or timestamp yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub url: String,
    pub title: String,
    pub category: Category,
    pub domain: String,
}

impl NewLink {
    /// Validate raw user input. Blank titles and categories fall back to defaults.
    pub fn parse(
        url: &str,
        title: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self, LinkInputError> {
        let parsed = Url::parse(url.trim())
            .map_err(|_| LinkInputError::InvalidUrl(url.to_string()))?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| LinkInputError::InvalidUrl(url.to_string()))?;

        let domain = bare_domain(host);

        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => default_title(&domain),
        };

        let category = match category.map(str::trim) {
            Some(c) if !c.is_empty() => c.parse()?,
            _ => Category::default(),
        };

        Ok(Self {
            url: parsed.to_string(),
            title,
            category,
            domain,
        })
    }
}

/// Host with any leading `www.` removed.
pub fn bare_domain(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => host,
    }
}

/// Title used when the user gave none: the bare domain, capitalized.
pub fn default_title(domain: &str) -> String {
    let mut chars = domain.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_derives_domain_and_title() {
        let link = NewLink::parse("https://www.github.com/rust-lang", None, None).unwrap();
        assert_eq!(link.domain, "github.com");
        assert_eq!(link.title, "Github.com");
        assert_eq!(link.category, Category::General);
    }

    #[test]
    fn parse_keeps_explicit_title_and_category() {
        let link = NewLink::parse("https://a.com", Some("  A site "), Some("Video")).unwrap();
        assert_eq!(link.title, "A site");
        assert_eq!(link.category, Category::Video);
    }

    #[test]
    fn parse_rejects_relative_and_hostless_urls() {
        assert!(matches!(
            NewLink::parse("not-a-url", None, None),
            Err(LinkInputError::InvalidUrl(_))
        ));
        assert!(NewLink::parse("/just/a/path", None, None).is_err());
        assert!(NewLink::parse("mailto:someone@example.com", None, None).is_err());
    }

    #[test]
    fn parse_rejects_unknown_category() {
        let err = NewLink::parse("https://a.com", None, Some("recipes")).unwrap_err();
        assert_eq!(err, LinkInputError::InvalidCategory("recipes".into()));
    }

    #[test]
    fn newest_first_breaks_ties_on_id() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let new = NewLink::parse("https://a.com", None, None).unwrap();
        let mut links = vec![
            Link::from_new("100".into(), new.clone(), t - chrono::Duration::hours(1)),
            Link::from_new("200".into(), new.clone(), t),
            Link::from_new("201".into(), new, t),
        ];
        sort_newest_first(&mut links);
        let ids: Vec<_> = links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["201", "200", "100"]);
    }

    #[test]
    fn collision_suffixes_order_numerically() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let new = NewLink::parse("https://a.com", None, None).unwrap();
        let mut links: Vec<Link> = ["1714564800000", "1714564800000-9", "1714564800000-10", "999"]
            .into_iter()
            .map(|id| Link::from_new(id.into(), new.clone(), t))
            .collect();
        sort_newest_first(&mut links);
        let ids: Vec<_> = links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(
            ids,
            ["1714564800000-10", "1714564800000-9", "1714564800000", "999"]
        );
    }

    #[test]
    fn link_wire_format_is_camel_case() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let new = NewLink::parse("https://a.com", None, Some("news")).unwrap();
        let json = serde_json::to_value(Link::from_new("1".into(), new, t)).unwrap();
        assert_eq!(json["dateAdded"], "2024-05-01T12:00:00Z");
        assert_eq!(json["isRead"], false);
        assert_eq!(json["category"], "news");
    }
}
