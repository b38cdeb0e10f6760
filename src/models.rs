// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A rendered page handed over by the fetcher.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub url: String,
    pub html: String,
    pub status_code: u16,
    /// Binary resources the fetcher saw loading, keyed by URL.
    pub resources: Option<HashMap<String, Vec<u8>>>,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            status_code: 200,
            resources: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_resources(mut self, resources: HashMap<String, Vec<u8>>) -> Self {
        self.resources = Some(resources);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
            strategy: None,
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    /// The URL the bytes were resolved for, kept for file extension lookup downstream.
    pub url: String,
}

/// One row of a list extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub fields: Map<String, Value>,
    pub image: Option<ImageData>,
}

impl Item {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Item map including the internal `_image_url` key. Raw bytes are never serialized.
    pub fn to_internal_map(&self) -> Map<String, Value> {
        let mut map = self.fields.clone();
        if let Some(image) = &self.image {
            map.insert("_image_url".to_string(), Value::String(image.url.clone()));
        }
        map
    }

    /// Item map with every `_`-prefixed key removed.
    pub fn to_external_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Output of one extraction call.
#[derive(Debug, Clone)]
pub struct Record {
    pub url: String,
    pub status_code: u16,
    pub data: Map<String, Value>,
    /// Populated for list profiles only.
    pub items: Option<Vec<Item>>,
    pub errors: Vec<FieldError>,
    pub extracted_at: DateTime<Utc>,
}

impl Record {
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
            data: Map::new(),
            items: None,
            errors: Vec::new(),
            extracted_at: Utc::now(),
        }
    }

    pub fn items(&self) -> &[Item] {
        self.items.as_deref().unwrap_or(&[])
    }

    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// Full record, `data.items` carrying internal keys.
    pub fn to_json(&self) -> Value {
        self.render(Item::to_internal_map, false)
    }

    /// Record as storage/search collaborators should persist it: no `_` keys anywhere in `data`.
    pub fn to_external_json(&self) -> Value {
        self.render(Item::to_external_map, true)
    }

    fn render(&self, item_map: fn(&Item) -> Map<String, Value>, external: bool) -> Value {
        let mut data: Map<String, Value> = self
            .data
            .iter()
            .filter(|(k, _)| !(external && k.starts_with('_')))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(items) = &self.items {
            let rendered = items.iter().map(|i| Value::Object(item_map(i))).collect();
            data.insert("items".to_string(), Value::Array(rendered));
        }

        serde_json::json!({
            "url": self.url,
            "status_code": self.status_code,
            "extracted_at": self.extracted_at.to_rfc3339(),
            "data": data,
            "errors": self.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(pairs: Value, image: Option<ImageData>) -> Item {
        Item {
            fields: pairs.as_object().cloned().unwrap_or_default(),
            image,
        }
    }

    #[test]
    fn external_json_hides_internal_keys() {
        let mut record = Record::new("https://shop.example/list", 200);
        record.items = Some(vec![item(
            json!({"title": "A", "_debug": 1}),
            Some(ImageData {
                bytes: vec![1, 2, 3],
                url: "https://cdn.example/a.jpg".into(),
            }),
        )]);

        let internal = record.to_json();
        assert_eq!(internal["data"]["items"][0]["_image_url"], "https://cdn.example/a.jpg");
        assert_eq!(internal["data"]["items"][0]["_debug"], 1);

        let external = record.to_external_json();
        let first = external["data"]["items"][0].as_object().unwrap();
        assert!(first.keys().all(|k| !k.starts_with('_')));
        assert_eq!(first["title"], "A");
    }

    #[test]
    fn single_mode_record_has_no_items_key() {
        let mut record = Record::new("https://shop.example/p/1", 200);
        record.data.insert("title".into(), json!("Watch"));
        let rendered = record.to_json();
        assert!(rendered["data"].get("items").is_none());
        assert_eq!(rendered["data"]["title"], "Watch");
        assert!(record.items().is_empty());
    }

    #[test]
    fn field_error_omits_missing_strategy() {
        let err = FieldError::new("price", "boom");
        let value = serde_json::to_value(&err).unwrap();
        assert!(value.get("strategy").is_none());
        let err = err.with_strategy("regex");
        assert_eq!(serde_json::to_value(&err).unwrap()["strategy"], "regex");
    }
}
