// src/transforms/mod.rs
pub mod title;

pub use title::{TitleParts, TitleSplitter};

use crate::dictionary::AliasDictionary;
use crate::utils::error::{ConfigError, TransformError};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

static SEPARATORS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]").expect("Failed to compile SEPARATORS_RE"));

/// A transform as written in a profile file: `{type, config}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// A compiled transform step.
#[derive(Debug, Clone)]
pub enum Transform {
    UrlJoin { base: Option<Url> },
    Strip,
    RegexCapture { regex: Regex, group: usize },
    Replace { from: Option<String>, to: String },
    ToInt,
    PickBestSrcset,
    SplitWatchTitle(TitleSplitter),
}

/// Result of running a value through one or more transforms.
///
/// `value == None` means the chain produced nothing. `extras` are additional top-level fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutcome {
    pub value: Option<Value>,
    pub extras: Vec<(String, Value)>,
}

impl TransformOutcome {
    fn value(value: Option<Value>) -> Self {
        Self {
            value,
            extras: Vec::new(),
        }
    }
}

impl Transform {
    pub fn compile(spec: &TransformSpec) -> Result<Self, ConfigError> {
        let config = &spec.config;
        let transform = match spec.kind.as_str() {
            "url_join" => {
                let base = match config_str(config, "base") {
                    Some(base) if !base.is_empty() => {
                        Some(Url::parse(base).map_err(|e| ConfigError::TransformConfig {
                            kind: "url_join",
                            message: format!("invalid base '{}': {}", base, e),
                        })?)
                    }
                    _ => None,
                };
                Transform::UrlJoin { base }
            }
            "strip" => Transform::Strip,
            "regex_capture" => {
                let pattern = config_str(config, "pattern").ok_or(ConfigError::TransformConfig {
                    kind: "regex_capture",
                    message: "missing 'pattern'".to_string(),
                })?;
                let regex = build_regex(pattern, config_str(config, "flags").unwrap_or(""))?;
                let group = config
                    .get("group")
                    .and_then(Value::as_u64)
                    .map(|g| g as usize)
                    .unwrap_or(1);
                Transform::RegexCapture { regex, group }
            }
            "replace" => Transform::Replace {
                from: config_str(config, "from").map(str::to_string),
                to: config_str(config, "to").unwrap_or("").to_string(),
            },
            "to_int" => Transform::ToInt,
            "pick_best_srcset" => Transform::PickBestSrcset,
            "split_watch_title" => Transform::SplitWatchTitle(TitleSplitter::new(
                config_str(config, "category").unwrap_or(title::DEFAULT_CATEGORY),
                config_str_list(config, "suffixes"),
                config_str_list(config, "markers"),
            )),
            other => return Err(ConfigError::UnknownTransform(other.to_string())),
        };
        Ok(transform)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::UrlJoin { .. } => "url_join",
            Transform::Strip => "strip",
            Transform::RegexCapture { .. } => "regex_capture",
            Transform::Replace { .. } => "replace",
            Transform::ToInt => "to_int",
            Transform::PickBestSrcset => "pick_best_srcset",
            Transform::SplitWatchTitle(_) => "split_watch_title",
        }
    }

    pub fn apply(
        &self,
        value: Value,
        dictionary: &dyn AliasDictionary,
    ) -> Result<TransformOutcome, TransformError> {
        match value.as_str() {
            Some(text) if !text.is_empty() => self.apply_text(text, dictionary),
            // Non-string and empty input passes through everything except to_int.
            _ => Ok(match self {
                Transform::ToInt => TransformOutcome::value(to_int(&value).map(Value::from)),
                _ => TransformOutcome::value(Some(value)),
            }),
        }
    }

    fn apply_text(
        &self,
        text: &str,
        dictionary: &dyn AliasDictionary,
    ) -> Result<TransformOutcome, TransformError> {
        let outcome = match self {
            Transform::UrlJoin { base } => {
                TransformOutcome::value(Some(Value::String(url_join(text, base.as_ref())?)))
            }
            Transform::Strip => TransformOutcome::value(Some(Value::String(text.trim().to_string()))),
            Transform::RegexCapture { regex, group } => {
                TransformOutcome::value(regex_capture(regex, *group, text).map(Value::String))
            }
            Transform::Replace { from, to } => {
                let replaced = match from {
                    Some(from) => text.replace(from.as_str(), to),
                    None => text.to_string(),
                };
                TransformOutcome::value(Some(Value::String(replaced)))
            }
            Transform::ToInt => {
                TransformOutcome::value(to_int(&Value::String(text.to_string())).map(Value::from))
            }
            Transform::PickBestSrcset => {
                TransformOutcome::value(Some(Value::String(pick_best_srcset(text))))
            }
            Transform::SplitWatchTitle(splitter) => {
                let parts = splitter.split(text, dictionary);
                let named = [
                    ("brand_name", parts.brand),
                    ("model_name", parts.model),
                    ("model_no", parts.model_no),
                ];
                let extras = named
                    .into_iter()
                    .filter_map(|(key, part)| {
                        part.filter(|p| !p.is_empty())
                            .map(|p| (key.to_string(), Value::String(p)))
                    })
                    .collect();
                TransformOutcome {
                    value: (!parts.title.is_empty()).then(|| Value::String(parts.title)),
                    extras,
                }
            }
        };
        Ok(outcome)
    }
}

/// Compiles every spec in order, failing on the first unknown or malformed one.
pub fn compile_all(specs: &[TransformSpec]) -> Result<Vec<Transform>, ConfigError> {
    specs.iter().map(Transform::compile).collect()
}

/// Runs `value` through `transforms` in order. A `None` result stops the chain.
pub fn apply_all(
    transforms: &[Transform],
    value: Value,
    dictionary: &dyn AliasDictionary,
) -> Result<TransformOutcome, TransformError> {
    let mut outcome = TransformOutcome::value(Some(value));
    for transform in transforms {
        let Some(current) = outcome.value.take() else {
            break;
        };
        let step = transform.apply(current, dictionary)?;
        tracing::trace!("Transform {} -> {:?}", transform.name(), step.value);
        outcome.value = step.value;
        outcome.extras.extend(step.extras);
    }
    Ok(outcome)
}

pub(crate) fn build_regex(pattern: &str, flags: &str) -> Result<Regex, ConfigError> {
    let flags = flags.to_lowercase();
    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| ConfigError::Regex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

pub(crate) fn config_str<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    config.get(key).and_then(Value::as_str)
}

fn config_str_list(config: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let list = config.get(key)?.as_array()?;
    Some(
        list.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

fn url_join(value: &str, base: Option<&Url>) -> Result<String, TransformError> {
    let Some(base) = base else {
        return Ok(value.to_string());
    };
    if Url::parse(value).is_ok() {
        return Ok(value.to_string());
    }
    base.join(value)
        .map(String::from)
        .map_err(|e| TransformError::UrlJoin {
            value: value.to_string(),
            base: base.to_string(),
            message: e.to_string(),
        })
}

// Group index past the last group falls back to the whole match.
fn regex_capture(regex: &Regex, group: usize, text: &str) -> Option<String> {
    let caps = regex.captures(text)?;
    let index = if group < caps.len() { group } else { 0 };
    caps.get(index).map(|m| m.as_str().to_string())
}

pub fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => SEPARATORS_RE.replace_all(s, "").parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Picks the widest candidate of a `srcset` list. Input without commas or spaces is returned as is.
pub fn pick_best_srcset(value: &str) -> String {
    if !value.contains(',') && !value.contains(' ') {
        return value.to_string();
    }

    let mut candidates: Vec<(i64, &str)> = value
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?;
            let width = parts
                .filter_map(|d| d.trim_end_matches(['x', 'w']).parse::<i64>().ok())
                .fold(0, i64::max);
            Some((width, url))
        })
        .collect();

    if candidates.is_empty() {
        return value.to_string();
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    candidates[0].1.to_string()
}
