// src/dictionary/store.rs
use crate::dictionary::{lookup, AliasDictionary};
use crate::utils::error::DictionaryError;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct BrandDoc {
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    model_name: serde_yaml::Mapping,
}

#[derive(Debug, Default, Deserialize)]
struct ModelDoc {
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandEntry {
    pub name: String,
    pub aliases: Vec<String>,
    /// `(model name, aliases)` in file order.
    pub models: Vec<(String, Vec<String>)>,
}

/// One category's brands and models, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    pub brands: Vec<BrandEntry>,
}

impl AliasTable {
    /// Parses `{Brand: {aliases: [..], model_name: {Model: {aliases: [..]}}}}`.
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(source)?;
        let root: serde_yaml::Mapping = match value {
            serde_yaml::Value::Null => serde_yaml::Mapping::new(),
            other => serde_yaml::from_value(other)?,
        };

        let mut brands = Vec::with_capacity(root.len());
        for (key, value) in root {
            let Some(name) = yaml_key(&key) else { continue };
            let doc: BrandDoc = if value.is_null() {
                BrandDoc::default()
            } else {
                serde_yaml::from_value(value)?
            };

            let mut models = Vec::with_capacity(doc.model_name.len());
            for (model_key, model_value) in doc.model_name {
                let Some(model) = yaml_key(&model_key) else { continue };
                let model_doc: ModelDoc = if model_value.is_null() {
                    ModelDoc::default()
                } else {
                    serde_yaml::from_value(model_value)?
                };
                models.push((model, model_doc.aliases));
            }

            brands.push(BrandEntry {
                name,
                aliases: doc.aliases,
                models,
            });
        }
        Ok(Self { brands })
    }

    pub fn from_file(path: &Path) -> Result<Self, DictionaryError> {
        let source = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source).map_err(|source| DictionaryError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    fn brand(&self, name: &str) -> Option<&BrandEntry> {
        if let Some(entry) = self.brands.iter().find(|b| b.name == name) {
            return Some(entry);
        }
        let canonical = lookup(&self.brand_pairs(), name)?;
        self.brands.iter().find(|b| b.name == canonical)
    }

    fn brand_pairs(&self) -> Vec<(String, String)> {
        self.brands
            .iter()
            .flat_map(|b| alias_pairs(&b.name, &b.aliases))
            .collect()
    }
}

// Canonical name first, then aliases; blanks and case-insensitive repeats dropped.
fn alias_pairs(canonical: &str, aliases: &[String]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    std::iter::once(canonical)
        .chain(aliases.iter().map(String::as_str))
        .map(str::trim)
        .filter(|alias| !alias.is_empty() && seen.insert(alias.to_lowercase()))
        .map(|alias| (alias.to_string(), canonical.to_string()))
        .collect()
}

fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// YAML-backed alias dictionary, one table per category.
///
/// Files are parsed once per path and shared between categories that register the same file.
#[derive(Debug, Default)]
pub struct DictionaryStore {
    categories: HashMap<String, Arc<AliasTable>>,
    files: HashMap<PathBuf, Arc<AliasTable>>,
}

impl DictionaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, category: impl Into<String>, table: AliasTable) -> Self {
        self.categories.insert(category.into(), Arc::new(table));
        self
    }

    pub fn load_category(
        &mut self,
        category: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), DictionaryError> {
        let path = path.as_ref();
        let table = match self.files.get(path) {
            Some(cached) => {
                tracing::debug!("Dictionary {} already loaded, reusing", path.display());
                Arc::clone(cached)
            }
            None => {
                let table = Arc::new(AliasTable::from_file(path)?);
                tracing::info!(
                    "Loaded alias dictionary {} ({} brands)",
                    path.display(),
                    table.brands.len()
                );
                self.files.insert(path.to_path_buf(), Arc::clone(&table));
                table
            }
        };
        self.categories.insert(category.into(), table);
        Ok(())
    }

    pub fn table(&self, category: &str) -> Option<&AliasTable> {
        self.categories.get(category).map(|t| t.as_ref())
    }
}

impl AliasDictionary for DictionaryStore {
    fn brand_aliases(&self, category: &str) -> Vec<(String, String)> {
        self.table(category)
            .map(AliasTable::brand_pairs)
            .unwrap_or_default()
    }

    fn model_aliases(&self, brand: &str, category: &str) -> Vec<(String, String)> {
        let Some(entry) = self.table(category).and_then(|t| t.brand(brand)) else {
            return Vec::new();
        };
        entry
            .models
            .iter()
            .flat_map(|(model, aliases)| alias_pairs(model, aliases))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCHES: &str = r#"
SEIKO:
  aliases: [セイコー, Seiko, " seiko "]
  model_name:
    Presage:
      aliases: [プレザージュ]
    Prospex:
Grand Seiko:
  aliases: [グランドセイコー]
CASIO:
"#;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "profile_extract_dict_{}_{}",
            tag,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn parses_file_order_and_empty_entries() {
        let table = AliasTable::from_yaml_str(WATCHES).unwrap();
        let names: Vec<_> = table.brands.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["SEIKO", "Grand Seiko", "CASIO"]);
        assert_eq!(table.brands[0].models[1], ("Prospex".to_string(), vec![]));
        assert!(table.brands[2].aliases.is_empty());
    }

    #[test]
    fn brand_aliases_include_canonical_names_once() {
        let store = DictionaryStore::new()
            .with_table("watch", AliasTable::from_yaml_str(WATCHES).unwrap());
        let pairs = store.brand_aliases("watch");
        let seiko: Vec<_> = pairs
            .iter()
            .filter(|(_, c)| c == "SEIKO")
            .map(|(a, _)| a.as_str())
            .collect();
        assert_eq!(seiko, vec!["SEIKO", "セイコー"]);
        assert!(pairs.contains(&("CASIO".to_string(), "CASIO".to_string())));
        assert!(store.brand_aliases("bag").is_empty());
    }

    #[test]
    fn model_aliases_resolve_brand_through_aliases() {
        let store = DictionaryStore::new()
            .with_table("watch", AliasTable::from_yaml_str(WATCHES).unwrap());
        let models = store.model_aliases("セイコー", "watch");
        assert!(models.contains(&("プレザージュ".to_string(), "Presage".to_string())));
        assert_eq!(
            store.find_model_by_alias("SEIKO", "presage", "watch").as_deref(),
            Some("Presage")
        );
        assert!(store.model_aliases("Rolex", "watch").is_empty());
    }

    #[test]
    fn find_brand_by_alias_uses_normalized_fallback() {
        let store = DictionaryStore::new()
            .with_table("watch", AliasTable::from_yaml_str(WATCHES).unwrap());
        assert_eq!(
            store.find_brand_by_alias("GRAND-SEIKO", "watch").as_deref(),
            Some("Grand Seiko")
        );
    }

    #[test]
    fn load_category_caches_by_path() {
        let dir = temp_dir("cache");
        let path = dir.join("watch.yaml");
        std::fs::write(&path, WATCHES).unwrap();

        let mut store = DictionaryStore::new();
        store.load_category("watch", &path).unwrap();
        // Second registration must not touch the filesystem.
        std::fs::remove_file(&path).unwrap();
        store.load_category("watch_parts", &path).unwrap();
        assert_eq!(store.table("watch"), store.table("watch_parts"));

        let missing = DictionaryStore::new().load_category("watch", dir.join("none.yaml"));
        assert!(matches!(missing, Err(DictionaryError::Io { .. })));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
