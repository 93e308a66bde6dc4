//! Views derived from a collection. Everything here is a pure function of its
//! inputs; nothing is cached.

use crate::model::Resource;

/// Filter key that selects the whole collection.
pub const ALL: &str = "all";

/// The ordered subsequence of `collection` whose classification equals `key`,
/// or all of it for [`ALL`].
pub fn derive_view<'a, R: Resource>(collection: impl IntoIterator<Item = &'a R>, key: &str) -> Vec<&'a R> {
    if key == ALL {
        return collection.into_iter().collect();
    }

    collection
        .into_iter()
        .filter(|resource| resource.classification() == key)
        .collect()
}

/// [`ALL`] followed by each distinct classification in first-seen order.
pub fn filter_keys<'a, R: Resource>(collection: impl IntoIterator<Item = &'a R>) -> Vec<String> {
    let mut keys = vec![ALL.to_string()];
    for resource in collection {
        let class = resource.classification();
        if !keys.iter().any(|k| *k == class) {
            keys.push(class.into_owned());
        }
    }
    keys
}

pub fn has_key<'a, R: Resource>(collection: impl IntoIterator<Item = &'a R>, key: &str) -> bool {
    key == ALL || collection.into_iter().any(|r| r.classification() == key)
}

/// Case-insensitive substring match on the display name. A blank term matches
/// everything.
pub fn search<'a, R: Resource>(collection: impl IntoIterator<Item = &'a R>, term: &str) -> Vec<&'a R> {
    let needle = term.trim().to_lowercase();
    collection
        .into_iter()
        .filter(|r| needle.is_empty() || r.display_name().to_lowercase().contains(&needle))
        .collect()
}
