// src/profile/models.rs
use crate::extractors::legacy::{Strategy, StrategySpec};
use crate::extractors::process::{self, ProcessSpec, ProcessStep};
use crate::transforms::{self, Transform, TransformSpec};
use crate::utils::error::ConfigError;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

// --- Documents as written in profile files ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchDoc {
    #[serde(default)]
    pub domains: Option<Vec<String>>,
    #[serde(default)]
    pub url_regex: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDoc {
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub selector_candidates: Option<Vec<String>>,
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub attr_candidates: Option<Vec<String>>,
    #[serde(default)]
    pub text: bool,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseDoc {
    #[serde(rename = "type", default)]
    pub kind: ParseKind,
    #[serde(default)]
    pub item_selector_candidates: Option<Vec<String>>,
    #[serde(default)]
    pub item_selector_pick: ItemPick,
    /// Kept as a mapping so declaration order survives.
    #[serde(default)]
    pub fields: serde_yaml::Mapping,
    #[serde(default)]
    pub pre_list_process: Option<Vec<ProcessSpec>>,
    #[serde(default)]
    pub post_list_process: Option<Vec<ProcessSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileDoc {
    #[serde(default)]
    pub name: Option<String>,
    /// Used when `name` is absent.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "match", default)]
    pub match_doc: MatchDoc,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub parse: Option<ParseDoc>,
    #[serde(default)]
    pub fields: Option<serde_yaml::Mapping>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub plugin: Option<String>,
}

// --- Fetch settings, passed through to the page fetcher untouched ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub engine: String,
    pub wait_until: String,
    pub timeout_ms: u64,
    pub user_agent: Option<String>,
    pub goto: Option<GotoConfig>,
    pub wait_for: Option<Vec<WaitForConfig>>,
    pub viewport: Option<ViewportConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            engine: "playwright".to_string(),
            wait_until: "load".to_string(),
            timeout_ms: 30_000,
            user_agent: None,
            goto: None,
            wait_for: None,
            viewport: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GotoConfig {
    pub wait_until: String,
    pub timeout_ms: u64,
}

impl Default for GotoConfig {
    fn default() -> Self {
        Self {
            wait_until: "load".to_string(),
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitForConfig {
    pub selector: String,
    #[serde(default = "default_wait_state")]
    pub state: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_wait_state() -> String {
    "attached".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

// --- Compiled profile ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseKind {
    #[default]
    Single,
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemPick {
    /// Containers of the first candidate that matches anything.
    #[default]
    FirstNonEmpty,
    /// Containers of every matching candidate, first-seen order, no repeats.
    All,
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub domains: Vec<String>,
    pub url_regex: Option<Regex>,
    pub priority: i32,
}

impl MatchConfig {
    /// Host (with `:port` when explicit) against `domains`, then `url_regex` anywhere in the URL.
    pub fn matches(&self, url: &str) -> bool {
        if !self.domains.is_empty() {
            if let Some(host) = host_of(url) {
                if self.domains.iter().any(|d| d.eq_ignore_ascii_case(&host)) {
                    return true;
                }
            }
        }
        self.url_regex.as_ref().is_some_and(|re| re.is_match(url))
    }
}

fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// `selector_candidates`, or the single `selector`.
    pub selectors: Vec<String>,
    pub attr: Option<String>,
    pub attr_candidates: Vec<String>,
    pub text: bool,
    pub transforms: Vec<Transform>,
}

#[derive(Debug, Clone)]
pub struct ParseConfig {
    pub kind: ParseKind,
    pub item_selector_candidates: Vec<String>,
    pub item_selector_pick: ItemPick,
    pub fields: Vec<(String, FieldConfig)>,
    pub pre_list_process: Vec<ProcessStep>,
    pub post_list_process: Vec<ProcessStep>,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub match_config: MatchConfig,
    pub fetch: FetchConfig,
    pub parse: Option<ParseConfig>,
    /// Legacy strategy chains, used only when `parse` is absent.
    pub fields: Option<Vec<(String, Vec<Strategy>)>>,
    pub site: Option<String>,
    pub category: Option<String>,
    /// Retained from the file, never executed.
    pub plugin: Option<String>,
}

impl Profile {
    pub fn from_doc(doc: ProfileDoc) -> Result<Self, ConfigError> {
        let name = [doc.name, doc.id]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .ok_or(ConfigError::MissingName)?;
        let invalid = |message: String| ConfigError::Invalid {
            profile: name.clone(),
            message,
        };

        let url_regex = doc
            .match_doc
            .url_regex
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::Regex {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        let match_config = MatchConfig {
            domains: doc.match_doc.domains.unwrap_or_default(),
            url_regex,
            priority: doc.match_doc.priority,
        };

        let parse = doc
            .parse
            .map(|parse| compile_parse(parse, &invalid))
            .transpose()?;

        let fields = match doc.fields {
            Some(mapping) => {
                let mut compiled = Vec::with_capacity(mapping.len());
                for (field, specs) in ordered::<Vec<StrategySpec>>(mapping)? {
                    let strategies = specs
                        .iter()
                        .map(Strategy::compile)
                        .collect::<Result<Vec<_>, _>>()?;
                    compiled.push((field, strategies));
                }
                Some(compiled)
            }
            None => None,
        };

        if parse.is_none() && fields.is_none() {
            tracing::warn!("Profile '{}' has neither 'parse' nor 'fields'", name);
        }

        Ok(Self {
            match_config,
            fetch: doc.fetch,
            parse,
            fields,
            site: doc.site,
            category: doc.category,
            plugin: doc.plugin,
            name,
        })
    }

    pub fn priority(&self) -> i32 {
        self.match_config.priority
    }

    pub fn matches(&self, url: &str) -> bool {
        self.match_config.matches(url)
    }
}

fn compile_parse(
    doc: ParseDoc,
    invalid: &dyn Fn(String) -> ConfigError,
) -> Result<ParseConfig, ConfigError> {
    let mut fields = Vec::with_capacity(doc.fields.len());
    for (field, field_doc) in ordered::<FieldDoc>(doc.fields)? {
        let selectors = match (field_doc.selector_candidates, field_doc.selector) {
            (Some(candidates), _) if !candidates.is_empty() => candidates,
            (_, Some(selector)) => vec![selector],
            _ => {
                return Err(invalid(format!(
                    "field '{}' has neither 'selector' nor 'selector_candidates'",
                    field
                )))
            }
        };
        let config = FieldConfig {
            selectors,
            attr: field_doc.attr,
            attr_candidates: field_doc.attr_candidates.unwrap_or_default(),
            text: field_doc.text,
            transforms: transforms::compile_all(&field_doc.transforms)?,
        };
        fields.push((field, config));
    }

    Ok(ParseConfig {
        kind: doc.kind,
        item_selector_candidates: doc.item_selector_candidates.unwrap_or_default(),
        item_selector_pick: doc.item_selector_pick,
        fields,
        pre_list_process: process::compile_all(&doc.pre_list_process.unwrap_or_default())?,
        post_list_process: process::compile_all(&doc.post_list_process.unwrap_or_default())?,
    })
}

// Mapping entries in file order, values deserialized as `T`.
fn ordered<T: DeserializeOwned>(
    mapping: serde_yaml::Mapping,
) -> Result<Vec<(String, T)>, ConfigError> {
    mapping
        .into_iter()
        .map(|(key, value)| -> Result<(String, T), ConfigError> {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                other => serde_yaml::to_string(&other)?.trim().to_string(),
            };
            Ok((key, serde_yaml::from_value(value)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(yaml: &str) -> Result<Profile, ConfigError> {
        Profile::from_doc(serde_yaml::from_str(yaml)?)
    }

    #[test]
    fn compiles_list_profile_in_declaration_order() {
        let p = profile(
            r#"
id: shop
category: watch
match: {domains: [shop.example], priority: 5}
parse:
  type: list
  item_selector_candidates: ["li.card"]
  fields:
    title: {selector: "h2", text: true, transforms: [{type: strip}]}
    product_url: {selector_candidates: ["a.main", "a"], attr: href}
    image: {selector: "img", attr_candidates: [data-src, src]}
  post_list_process: [{method: deduplicate_by_url}]
"#,
        )
        .unwrap();

        assert_eq!(p.name, "shop");
        assert_eq!(p.priority(), 5);
        let parse = p.parse.unwrap();
        assert_eq!(parse.kind, ParseKind::List);
        assert_eq!(parse.item_selector_pick, ItemPick::FirstNonEmpty);
        let names: Vec<_> = parse.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["title", "product_url", "image"]);
        assert_eq!(parse.fields[1].1.selectors, vec!["a.main", "a"]);
        assert_eq!(parse.fields[2].1.attr_candidates, vec!["data-src", "src"]);
        assert_eq!(parse.post_list_process.len(), 1);
        assert_eq!(p.fetch, FetchConfig::default());
    }

    #[test]
    fn fetch_config_defaults_fill_gaps() {
        let p = profile(
            r#"
name: slow
fetch:
  wait_until: networkidle
  goto: {timeout_ms: 60000}
  wait_for: [{selector: ".grid"}]
  viewport: {width: 1920}
fields: {}
"#,
        )
        .unwrap();
        assert_eq!(p.fetch.engine, "playwright");
        assert_eq!(p.fetch.wait_until, "networkidle");
        let goto = p.fetch.goto.unwrap();
        assert_eq!((goto.wait_until.as_str(), goto.timeout_ms), ("load", 60_000));
        assert_eq!(p.fetch.wait_for.unwrap()[0].state, "attached");
        assert_eq!(p.fetch.viewport.unwrap().height, 720);
    }

    #[test]
    fn name_takes_precedence_over_id() {
        assert_eq!(profile("name: shop\nid: shop-v2\n").unwrap().name, "shop");
        assert_eq!(profile("id: shop-v2\n").unwrap().name, "shop-v2");
        assert_eq!(profile("name: ''\nid: fallback\n").unwrap().name, "fallback");
    }

    #[test]
    fn rejects_broken_profiles() {
        assert!(matches!(profile("match: {priority: 1}"), Err(ConfigError::MissingName)));
        assert!(matches!(
            profile("name: x\nmatch: {url_regex: '('}"),
            Err(ConfigError::Regex { .. })
        ));
        assert!(matches!(
            profile("name: x\nparse: {fields: {title: {text: true}}}"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            profile("name: x\nparse: {fields: {t: {selector: h1, transforms: [{type: shout}]}}}"),
            Err(ConfigError::UnknownTransform(_))
        ));
        assert!(matches!(
            profile("name: x\nparse: {type: list, post_list_process: [{method: sort}]}"),
            Err(ConfigError::UnknownProcess(_))
        ));
        assert!(matches!(
            profile("name: x\nfields: {price: [{type: magic}]}"),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn match_rules() {
        let p = profile(
            r#"
name: m
match:
  domains: [shop.example, "local.test:8080"]
  url_regex: "/items/\\d+"
"#,
        )
        .unwrap();
        assert!(p.matches("https://shop.example/anything"));
        assert!(p.matches("http://local.test:8080/x"));
        assert!(!p.matches("http://local.test/x"));
        assert!(p.matches("https://mirror.example/items/42?ref=1"));
        assert!(!p.matches("https://mirror.example/items/new"));
        assert!(!p.matches("not a url"));
    }
}
