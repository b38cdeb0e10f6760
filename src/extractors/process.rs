// src/extractors/process.rs
use crate::models::Item;
use crate::transforms::config_str;
use crate::utils::error::ConfigError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

pub const DEFAULT_URL_FIELD: &str = "product_url";

/// A list processing step as written in a profile file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessSpec {
    pub method: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessStep {
    /// Keeps the first item per value of `url_field`; items without that value are dropped.
    DeduplicateByUrl { url_field: String },
}

impl ProcessStep {
    pub fn compile(spec: &ProcessSpec) -> Result<Self, ConfigError> {
        match spec.method.as_str() {
            "deduplicate_by_url" => Ok(ProcessStep::DeduplicateByUrl {
                url_field: config_str(&spec.config, "url_field")
                    .unwrap_or(DEFAULT_URL_FIELD)
                    .to_string(),
            }),
            other => Err(ConfigError::UnknownProcess(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProcessStep::DeduplicateByUrl { .. } => "deduplicate_by_url",
        }
    }

    pub fn run(&self, items: Vec<Item>) -> Vec<Item> {
        match self {
            ProcessStep::DeduplicateByUrl { url_field } => deduplicate_by_url(items, url_field),
        }
    }
}

pub fn compile_all(specs: &[ProcessSpec]) -> Result<Vec<ProcessStep>, ConfigError> {
    specs.iter().map(ProcessStep::compile).collect()
}

/// Applies `steps` in order.
pub fn run_all(steps: &[ProcessStep], mut items: Vec<Item>) -> Vec<Item> {
    for step in steps {
        let before = items.len();
        items = step.run(items);
        tracing::debug!("{}: {} -> {} items", step.name(), before, items.len());
    }
    items
}

fn deduplicate_by_url(items: Vec<Item>, url_field: &str) -> Vec<Item> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = 0usize;
    let mut missing = 0usize;

    let unique: Vec<Item> = items
        .into_iter()
        .filter(|item| match key_of(item, url_field) {
            Some(key) if seen.insert(key.clone()) => true,
            Some(key) => {
                tracing::debug!("Duplicate item for {}={}", url_field, key);
                duplicates += 1;
                false
            }
            None => {
                missing += 1;
                false
            }
        })
        .collect();

    if duplicates > 0 || missing > 0 {
        tracing::info!(
            "deduplicate_by_url removed {} duplicates and {} items without '{}'",
            duplicates,
            missing,
            url_field
        );
    }
    unique
}

// Strings compare as-is; other non-empty values by their JSON rendering.
fn key_of(item: &Item, field: &str) -> Option<String> {
    match item.get(field)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
