use std::fmt;
use std::str::FromStr;

use linkstash_types::Link;
use linkstash_types::models::sort_newest_first;
use serde::{Deserialize, Serialize};

/// Which subset of the collection is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    Unread,
    Read,
    Favorites,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Unread => "unread",
            Tab::Read => "read",
            Tab::Favorites => "favorites",
        }
    }

    pub fn matches(&self, link: &Link) -> bool {
        match self {
            Tab::All => true,
            Tab::Unread => !link.is_read,
            Tab::Read => link.is_read,
            Tab::Favorites => link.is_favorite,
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Tab::All),
            "unread" => Ok(Tab::Unread),
            "read" => Ok(Tab::Read),
            "favorites" => Ok(Tab::Favorites),
            other => Err(format!("unknown tab: {}", other)),
        }
    }
}

/// The links shown under `tab`, newest first.
pub fn apply_tab_filter(links: &[Link], tab: Tab) -> Vec<Link> {
    let mut visible: Vec<Link> = links.iter().filter(|l| tab.matches(l)).cloned().collect();
    sort_newest_first(&mut visible);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use linkstash_types::Category;

    fn link(id: &str, secs: i64, is_read: bool, is_favorite: bool) -> Link {
        Link {
            id: id.into(),
            url: format!("https://{}.example.com/", id),
            title: id.into(),
            category: Category::General,
            domain: format!("{}.example.com", id),
            date_added: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            is_read,
            is_favorite,
        }
    }

    fn ids(links: &[Link]) -> Vec<&str> {
        links.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn tabs_select_expected_subsets() {
        let links = vec![
            link("a", 0, false, false),
            link("b", 1, true, false),
            link("c", 2, false, true),
            link("d", 3, true, true),
        ];

        assert_eq!(ids(&apply_tab_filter(&links, Tab::All)), ["d", "c", "b", "a"]);
        assert_eq!(ids(&apply_tab_filter(&links, Tab::Unread)), ["c", "a"]);
        assert_eq!(ids(&apply_tab_filter(&links, Tab::Read)), ["d", "b"]);
        assert_eq!(ids(&apply_tab_filter(&links, Tab::Favorites)), ["d", "c"]);
    }

    #[test]
    fn read_and_unread_partition_the_collection() {
        let links: Vec<Link> = (0..10)
            .map(|i| link(&i.to_string(), i, i % 3 == 0, i % 2 == 0))
            .collect();
        let read = apply_tab_filter(&links, Tab::Read);
        let unread = apply_tab_filter(&links, Tab::Unread);
        assert_eq!(read.len() + unread.len(), links.len());
        assert!(read.iter().all(|l| l.is_read));
        assert!(unread.iter().all(|l| !l.is_read));
    }

    #[test]
    fn tab_names_round_trip() {
        for tab in [Tab::All, Tab::Unread, Tab::Read, Tab::Favorites] {
            assert_eq!(tab.as_str().parse::<Tab>().unwrap(), tab);
        }
        assert!("starred".parse::<Tab>().is_err());
    }
}
