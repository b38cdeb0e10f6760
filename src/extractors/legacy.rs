// src/extractors/legacy.rs

// Strategy chains for profiles written in the older `fields: {name: [{type, config}]}` format.

use crate::extractors::path::PathQuery;
use crate::extractors::selector::Matched;
use crate::transforms::{build_regex, config_str};
use crate::utils::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::{Map, Value};

static JSONLD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("Failed to compile JSONLD_SELECTOR")
});

#[derive(Debug, Clone, Deserialize)]
pub struct StrategySpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub enum Strategy {
    JsonLd {
        path: Option<String>,
    },
    XPath {
        query: PathQuery,
        attribute: Option<String>,
        strip: bool,
    },
    Regex {
        regex: Regex,
        group: usize,
        strip: bool,
    },
}

impl Strategy {
    pub fn compile(spec: &StrategySpec) -> Result<Self, ConfigError> {
        let config = &spec.config;
        let strip = config.get("strip").and_then(Value::as_bool).unwrap_or(true);

        match spec.kind.as_str() {
            "jsonld" => Ok(Strategy::JsonLd {
                path: config_str(config, "path").map(str::to_string),
            }),
            "xpath" => {
                let source = config_str(config, "xpath").ok_or_else(|| ConfigError::TransformConfig {
                    kind: "xpath",
                    message: "missing 'xpath'".to_string(),
                })?;
                let query = PathQuery::parse(source).map_err(|e| ConfigError::PathQuery {
                    query: source.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Strategy::XPath {
                    query,
                    attribute: config_str(config, "attribute").map(str::to_string),
                    strip,
                })
            }
            "regex" => {
                let pattern = config_str(config, "pattern").ok_or_else(|| ConfigError::TransformConfig {
                    kind: "regex",
                    message: "missing 'pattern'".to_string(),
                })?;
                Ok(Strategy::Regex {
                    regex: build_regex(pattern, config_str(config, "flags").unwrap_or(""))?,
                    group: config.get("group").and_then(Value::as_u64).unwrap_or(0) as usize,
                    strip,
                })
            }
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::JsonLd { .. } => "jsonld",
            Strategy::XPath { .. } => "xpath",
            Strategy::Regex { .. } => "regex",
        }
    }

    /// `Ok(None)` means the strategy found nothing; `Err` carries a message for the field error.
    pub fn extract(&self, html: &str, document: &Html) -> Result<Option<Value>, String> {
        match self {
            Strategy::JsonLd { path } => extract_jsonld(document, path.as_deref()),
            Strategy::XPath {
                query,
                attribute,
                strip,
            } => Ok(extract_xpath(document, query, attribute.as_deref(), *strip).map(Value::String)),
            Strategy::Regex { regex, group, strip } => {
                Ok(extract_regex(html, regex, *group, *strip).map(Value::String))
            }
        }
    }
}

fn extract_jsonld(document: &Html, path: Option<&str>) -> Result<Option<Value>, String> {
    let mut last_error = None;
    for script in document.select(&JSONLD_SELECTOR) {
        let body: String = script.text().collect();
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(data) => {
                let Some(path) = path else {
                    return Ok(Some(data));
                };
                return Ok(Some(nested_value(&data, path).unwrap_or(data)));
            }
            Err(e) => {
                tracing::debug!("Skipping unparsable JSON-LD block: {}", e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(format!("no parsable JSON-LD block: {}", e)),
        None => Ok(None),
    }
}

// Dotted lookup; arrays are searched element by element.
fn nested_value(data: &Value, path: &str) -> Option<Value> {
    if let Value::Array(entries) = data {
        return entries.iter().find_map(|entry| nested_value(entry, path));
    }

    let mut current = data;
    for key in path.split('.') {
        current = current.as_object()?.get(key)?;
        if current.is_null() {
            return None;
        }
    }
    Some(current.clone())
}

fn extract_xpath(
    document: &Html,
    query: &PathQuery,
    attribute: Option<&str>,
    strip: bool,
) -> Option<String> {
    let found = query.evaluate(document.root_element());

    let parts: Vec<String> = match attribute {
        Some(attribute) => found
            .iter()
            .filter_map(Matched::as_element)
            .filter_map(|el| el.value().attr(attribute))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        None => found
            .into_iter()
            .map(|m| match m {
                Matched::Element(el) => el.text().collect::<String>(),
                Matched::Value(v) => v,
            })
            .map(|t| if strip { t.trim().to_string() } else { t })
            .filter(|t| !t.is_empty())
            .collect(),
    };

    if parts.is_empty() {
        return None;
    }
    let joined = parts.join(" ");
    Some(if strip && attribute.is_none() {
        joined.trim().to_string()
    } else {
        joined
    })
}

fn extract_regex(html: &str, regex: &Regex, group: usize, strip: bool) -> Option<String> {
    let caps = regex.captures(html)?;
    let index = if group < caps.len() { group } else { 0 };
    let text = caps.get(index)?.as_str();
    let text = if strip { text.trim() } else { text };
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"
        <html><head>
          <script type="application/ld+json">{ broken json </script>
          <script type="application/ld+json">
            [{"@type": "BreadcrumbList"}, {"@type": "Product", "name": "Seiko 5", "offers": {"price": "32000"}}]
          </script>
        </head><body>
          <h1>  Seiko 5 Sports  </h1>
          <img class="main" src="/a.jpg"><img class="main" src="/b.jpg"><img class="main" src="">
          <span id="sku">SKU: SRPD55K1</span>
        </body></html>
    "#;

    fn strategy(kind: &str, config: Value) -> Strategy {
        Strategy::compile(&StrategySpec {
            kind: kind.to_string(),
            config: config.as_object().cloned().unwrap_or_default(),
        })
        .unwrap()
    }

    fn run(s: &Strategy) -> Result<Option<Value>, String> {
        s.extract(PAGE, &Html::parse_document(PAGE))
    }

    #[test]
    fn xpath_does_not_repeat_nested_matches() {
        let html = r#"<div><div><a>Seiko</a></div></div><div><a>Citizen</a></div>"#;
        let s = strategy("xpath", json!({"xpath": "//div//a"}));
        assert_eq!(
            s.extract(html, &Html::parse_document(html)),
            Ok(Some(json!("Seiko Citizen")))
        );
    }

    #[test]
    fn jsonld_path_searches_arrays_and_falls_back_to_block() {
        assert_eq!(
            run(&strategy("jsonld", json!({"path": "offers.price"}))),
            Ok(Some(json!("32000")))
        );
        let whole = run(&strategy("jsonld", json!({"path": "brand.name"}))).unwrap().unwrap();
        assert!(whole.is_array());
    }

    #[test]
    fn jsonld_reports_unparsable_blocks() {
        let html = r#"<script type="application/ld+json">{nope</script>"#;
        let s = strategy("jsonld", json!({}));
        assert!(s.extract(html, &Html::parse_document(html)).is_err());

        let html = "<p>no scripts</p>";
        assert_eq!(s.extract(html, &Html::parse_document(html)), Ok(None));
    }

    #[test]
    fn xpath_text_and_attributes() {
        assert_eq!(
            run(&strategy("xpath", json!({"xpath": "//h1"}))),
            Ok(Some(json!("Seiko 5 Sports")))
        );
        assert_eq!(
            run(&strategy("xpath", json!({"xpath": "//img[@class='main']", "attribute": "src"}))),
            Ok(Some(json!("/a.jpg /b.jpg")))
        );
        assert_eq!(run(&strategy("xpath", json!({"xpath": "//table"}))), Ok(None));
    }

    #[test]
    fn regex_group_and_strip() {
        assert_eq!(
            run(&strategy("regex", json!({"pattern": "SKU:\\s*(\\w+)", "group": 1}))),
            Ok(Some(json!("SRPD55K1")))
        );
        assert_eq!(
            run(&strategy("regex", json!({"pattern": "sku: \\w+", "flags": "i"}))),
            Ok(Some(json!("SKU: SRPD55K1")))
        );
        assert_eq!(run(&strategy("regex", json!({"pattern": "ZZZ\\d"}))), Ok(None));
    }

    #[test]
    fn compile_errors() {
        let compile = |kind: &str, config: Value| {
            Strategy::compile(&StrategySpec {
                kind: kind.into(),
                config: config.as_object().cloned().unwrap_or_default(),
            })
        };
        assert!(matches!(compile("css", json!({})), Err(ConfigError::UnknownStrategy(_))));
        assert!(matches!(
            compile("xpath", json!({"xpath": "//div["})),
            Err(ConfigError::PathQuery { .. })
        ));
        assert!(compile("regex", json!({})).is_err());
    }
}
