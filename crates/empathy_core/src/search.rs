//! crates/empathy_core/src/search.rs
//!
//! Case-insensitive substring search over already-fetched records.
//! Filtering borrows from the fetched sequence and never reorders or mutates it.

use crate::domain::{Challenge, Story};

/// A record that can be matched by the in-memory search box.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    /// True if any field contains `needle`, which must already be lowercase.
    fn matches_lowercase(&self, needle: &str) -> bool {
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl Searchable for Challenge {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.description.as_str(),
            self.category.as_str(),
            self.difficulty.as_str(),
        ]
    }
}

impl Searchable for Story {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.author_display_name.as_str(), self.text.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }
}

/// The records matching `query`, in their original order. An empty query
/// matches everything.
pub fn filter<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.matches_lowercase(&needle))
        .collect()
}
