// src/dictionary/mod.rs
pub mod store;

pub use store::{AliasTable, DictionaryStore};

/// Lowercases and keeps only alphanumeric characters (Unicode-aware).
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Brand/model alias lookup used by title splitting.
///
/// Alias lists are `(alias, canonical)` pairs and include every canonical name as its own alias.
pub trait AliasDictionary: Send + Sync {
    fn brand_aliases(&self, category: &str) -> Vec<(String, String)>;

    fn model_aliases(&self, brand: &str, category: &str) -> Vec<(String, String)>;

    fn find_brand_by_alias(&self, text: &str, category: &str) -> Option<String> {
        lookup(&self.brand_aliases(category), text)
    }

    fn find_model_by_alias(&self, brand: &str, text: &str, category: &str) -> Option<String> {
        lookup(&self.model_aliases(brand, category), text)
    }
}

/// Dictionary with no entries. Title splitting then falls back to positional guesses.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyDictionary;

impl AliasDictionary for EmptyDictionary {
    fn brand_aliases(&self, _category: &str) -> Vec<(String, String)> {
        Vec::new()
    }

    fn model_aliases(&self, _brand: &str, _category: &str) -> Vec<(String, String)> {
        Vec::new()
    }
}

// Exact, then trimmed case-insensitive, then normalized.
pub(crate) fn lookup(pairs: &[(String, String)], text: &str) -> Option<String> {
    if let Some((_, canonical)) = pairs.iter().find(|(alias, _)| alias == text) {
        return Some(canonical.clone());
    }

    let folded = text.trim().to_lowercase();
    if let Some((_, canonical)) = pairs
        .iter()
        .find(|(alias, _)| alias.trim().to_lowercase() == folded)
    {
        return Some(canonical.clone());
    }

    let normalized = normalize(text);
    if normalized.is_empty() {
        return None;
    }
    pairs
        .iter()
        .find(|(alias, _)| normalize(alias) == normalized)
        .map(|(_, canonical)| canonical.clone())
}
