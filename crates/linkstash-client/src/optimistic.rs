//! Speculative edits to the local collection. Each edit is captured together
//! with its inverse so a failed request can be undone exactly.

use linkstash_types::Link;

/// One in-place change to the link collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert at `index`, clamped to the end of the collection.
    Insert { index: usize, link: Link },
    Remove { id: String },
    SetRead { id: String, is_read: bool },
    SetFavorite { id: String, is_favorite: bool },
}

impl Mutation {
    /// Returns false if the target link was not found.
    pub fn apply(&self, links: &mut Vec<Link>) -> bool {
        match self {
            Mutation::Insert { index, link } => {
                let index = (*index).min(links.len());
                links.insert(index, link.clone());
                true
            }
            Mutation::Remove { id } => match links.iter().position(|l| &l.id == id) {
                Some(idx) => {
                    links.remove(idx);
                    true
                }
                None => false,
            },
            Mutation::SetRead { id, is_read } => match links.iter_mut().find(|l| &l.id == id) {
                Some(link) => {
                    link.is_read = *is_read;
                    true
                }
                None => false,
            },
            Mutation::SetFavorite { id, is_favorite } => {
                match links.iter_mut().find(|l| &l.id == id) {
                    Some(link) => {
                        link.is_favorite = *is_favorite;
                        true
                    }
                    None => false,
                }
            }
        }
    }
}

/// A forward mutation and the mutation that undoes it.
#[derive(Debug, Clone)]
pub struct Optimistic {
    pub forward: Mutation,
    pub inverse: Mutation,
}

impl Optimistic {
    /// New links go to the head of the collection.
    pub fn add(link: Link) -> Self {
        let id = link.id.clone();
        Self {
            forward: Mutation::Insert { index: 0, link },
            inverse: Mutation::Remove { id },
        }
    }

    /// `None` if `id` is not in `links`.
    pub fn delete(links: &[Link], id: &str) -> Option<Self> {
        let index = links.iter().position(|l| l.id == id)?;
        Some(Self {
            forward: Mutation::Remove { id: id.to_string() },
            inverse: Mutation::Insert {
                index,
                link: links[index].clone(),
            },
        })
    }

    pub fn toggle_read(links: &[Link], id: &str) -> Option<Self> {
        let current = links.iter().find(|l| l.id == id)?.is_read;
        Some(Self {
            forward: Mutation::SetRead {
                id: id.to_string(),
                is_read: !current,
            },
            inverse: Mutation::SetRead {
                id: id.to_string(),
                is_read: current,
            },
        })
    }

    pub fn toggle_favorite(links: &[Link], id: &str) -> Option<Self> {
        let current = links.iter().find(|l| l.id == id)?.is_favorite;
        Some(Self {
            forward: Mutation::SetFavorite {
                id: id.to_string(),
                is_favorite: !current,
            },
            inverse: Mutation::SetFavorite {
                id: id.to_string(),
                is_favorite: current,
            },
        })
    }

    pub fn apply(&self, links: &mut Vec<Link>) -> bool {
        self.forward.apply(links)
    }

    pub fn revert(&self, links: &mut Vec<Link>) -> bool {
        self.inverse.apply(links)
    }
}
