// src/transforms/title.rs
use crate::dictionary::{normalize, AliasDictionary};
use once_cell::sync::Lazy;
use regex::Regex;

static BRACKETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"【[^】]*】").expect("Failed to compile BRACKETED_RE"));

static MODEL_NO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9./-]+$").expect("Failed to compile MODEL_NO_RE"));

pub const DEFAULT_CATEGORY: &str = "watch";

pub const DEFAULT_SUFFIXES: &[&str] = &[
    "メンズ",
    "レディース",
    "ユニセックス",
    "ボーイズ",
    "men's",
    "mens",
    "ladies",
    "women's",
    "unisex",
    "boys",
];

pub const DEFAULT_MARKERS: &[&str] = &["腕時計"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleParts {
    pub title: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub model_no: Option<String>,
}

/// Splits a product title into brand, model name and model number.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleSplitter {
    pub category: String,
    suffixes: Vec<String>,
    markers: Vec<String>,
}

impl Default for TitleSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY, None, None)
    }
}

impl TitleSplitter {
    pub fn new(
        category: impl Into<String>,
        suffixes: Option<Vec<String>>,
        markers: Option<Vec<String>>,
    ) -> Self {
        let suffixes = suffixes
            .unwrap_or_else(|| DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect())
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect();
        let markers = markers
            .unwrap_or_else(|| DEFAULT_MARKERS.iter().map(|s| s.to_string()).collect())
            .into_iter()
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            category: category.into(),
            suffixes,
            markers,
        }
    }

    pub fn split(&self, raw: &str, dictionary: &dyn AliasDictionary) -> TitleParts {
        let mut tokens = self.clean_tokens(raw);
        let title = tokens.join(" ");

        let brand_pairs = dictionary.brand_aliases(&self.category);
        let brand = match match_alias(&tokens, &brand_pairs) {
            Some((canonical, rest)) => {
                tokens = rest;
                Some(canonical)
            }
            None if !tokens.is_empty() => {
                tracing::trace!("No brand alias matched '{}', using leading token", title);
                Some(tokens.remove(0))
            }
            None => None,
        };

        let mut model = None;
        if let Some(brand) = &brand {
            let model_pairs = dictionary.model_aliases(brand, &self.category);
            if let Some((canonical, rest)) = match_alias(&tokens, &model_pairs) {
                tokens = rest;
                model = Some(canonical);
            }
        }

        let model_no = tokens
            .iter()
            .rposition(|t| looks_like_model_no(t))
            .map(|idx| tokens.remove(idx));

        if model.is_none() && !tokens.is_empty() {
            model = Some(tokens.join(" "));
        }

        TitleParts {
            title,
            brand,
            model,
            model_no,
        }
    }

    // Bracket removal, full-width spaces, marker truncation, then trailing audience suffixes.
    fn clean_tokens(&self, raw: &str) -> Vec<String> {
        let mut text = BRACKETED_RE.replace_all(raw, " ").replace('\u{3000}', " ");
        if let Some(cut) = self.markers.iter().filter_map(|m| text.find(m.as_str())).min() {
            text.truncate(cut);
        }

        let mut tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        while tokens
            .last()
            .is_some_and(|t| self.suffixes.contains(&t.to_lowercase()))
        {
            tokens.pop();
        }
        tokens
    }
}

fn looks_like_model_no(token: &str) -> bool {
    token.chars().count() >= 3
        && token.chars().any(|c| c.is_ascii_digit())
        && MODEL_NO_RE.is_match(token)
}

/// Longest alias first; exact token/string prefix, then a normalized prefix.
/// Returns the canonical name and the tokens left after the matched span.
fn match_alias(tokens: &[String], pairs: &[(String, String)]) -> Option<(String, Vec<String>)> {
    if tokens.is_empty() || pairs.is_empty() {
        return None;
    }

    let mut ordered: Vec<&(String, String)> = pairs.iter().filter(|(a, _)| !a.is_empty()).collect();
    ordered.sort_by_key(|(alias, _)| std::cmp::Reverse(alias.chars().count()));
    let text = tokens.join(" ");

    for (alias, canonical) in &ordered {
        let alias_tokens: Vec<&str> = alias.split_whitespace().collect();
        if !alias_tokens.is_empty()
            && tokens.len() >= alias_tokens.len()
            && tokens.iter().zip(&alias_tokens).all(|(t, a)| t == a)
        {
            return Some((canonical.clone(), tokens[alias_tokens.len()..].to_vec()));
        }
        if let Some(rest) = text.strip_prefix(alias.as_str()) {
            return Some((canonical.clone(), retokenize(rest)));
        }
    }

    for (alias, canonical) in &ordered {
        let target = normalize(alias);
        if target.is_empty() {
            continue;
        }
        if let Some(end) = normalized_prefix_end(&text, &target) {
            return Some((canonical.clone(), retokenize(&text[end..])));
        }
    }
    None
}

fn retokenize(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}

// Byte offset in `text` right after the shortest prefix whose normalized form equals `target`.
fn normalized_prefix_end(text: &str, target: &str) -> Option<usize> {
    let target: Vec<char> = target.chars().collect();
    let mut matched = 0;

    for (idx, ch) in text.char_indices() {
        if matched == target.len() {
            return Some(idx);
        }
        for lower in ch.to_lowercase().filter(|c| c.is_alphanumeric()) {
            if target.get(matched) != Some(&lower) {
                return None;
            }
            matched += 1;
        }
    }
    (matched == target.len()).then_some(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{AliasTable, DictionaryStore, EmptyDictionary};

    fn dictionary() -> DictionaryStore {
        let table = AliasTable::from_yaml_str(
            r#"
SEIKO:
  aliases: [セイコー, Seiko]
  model_name:
    Presage:
      aliases: [プレザージュ]
Grand Seiko:
  aliases: [グランドセイコー]
"#,
        )
        .unwrap();
        DictionaryStore::new().with_table("watch", table)
    }

    #[test]
    fn splits_title_with_dictionary_hits() {
        let parts = TitleSplitter::default().split(
            "【新品】SEIKO プレザージュ SARX035 メンズ 腕時計 自動巻き",
            &dictionary(),
        );
        assert_eq!(parts.title, "SEIKO プレザージュ SARX035");
        assert_eq!(parts.brand.as_deref(), Some("SEIKO"));
        assert_eq!(parts.model.as_deref(), Some("Presage"));
        assert_eq!(parts.model_no.as_deref(), Some("SARX035"));
    }

    #[test]
    fn longest_alias_wins_and_normalized_fallback_applies() {
        let parts = TitleSplitter::default().split("grand-seiko SBGA211 Heritage", &dictionary());
        assert_eq!(parts.brand.as_deref(), Some("Grand Seiko"));
        assert_eq!(parts.model_no.as_deref(), Some("SBGA211"));
        assert_eq!(parts.model.as_deref(), Some("Heritage"));
    }

    #[test]
    fn string_prefix_match_splits_glued_tokens() {
        let parts = TitleSplitter::default().split("セイコープレザージュ SRPD37J1", &dictionary());
        assert_eq!(parts.brand.as_deref(), Some("SEIKO"));
        assert_eq!(parts.model.as_deref(), Some("Presage"));
        assert_eq!(parts.model_no.as_deref(), Some("SRPD37J1"));
    }

    #[test]
    fn falls_back_to_leading_token_without_dictionary() {
        let parts = TitleSplitter::default().split(
            "ROLEX　Submariner 126610LN 40mm Ladies",
            &EmptyDictionary,
        );
        assert_eq!(parts.title, "ROLEX Submariner 126610LN 40mm");
        assert_eq!(parts.brand.as_deref(), Some("ROLEX"));
        // Scanned from the end: "40mm" qualifies before "126610LN".
        assert_eq!(parts.model_no.as_deref(), Some("40mm"));
        assert_eq!(parts.model.as_deref(), Some("Submariner 126610LN"));
    }

    #[test]
    fn model_number_rules() {
        assert!(looks_like_model_no("SBGA211"));
        assert!(looks_like_model_no("A-12.3/4"));
        assert!(!looks_like_model_no("12"));
        assert!(!looks_like_model_no("Heritage"));
        assert!(!looks_like_model_no("A1"));
        assert!(!looks_like_model_no("型番123"));
    }

    #[test]
    fn splitting_is_stable_on_cleaned_output() {
        let splitter = TitleSplitter::default();
        let dict = dictionary();
        for raw in [
            "SEIKO プレザージュ SARX035",
            "grand-seiko SBGA211 Heritage",
            "CITIZEN Attesa CC3085-51E",
        ] {
            let first = splitter.split(raw, &dict);
            let second = splitter.split(&first.title, &dict);
            assert_eq!(first.brand, second.brand);
            assert_eq!(first.model, second.model);
            assert_eq!(first.model_no, second.model_no);
        }
    }

    #[test]
    fn custom_suffixes_and_markers() {
        let splitter = TitleSplitter::new(
            "watch",
            Some(vec!["Unisex".into()]),
            Some(vec!["watch".into(), "時計".into()]),
        );
        let parts = splitter.split("Casio G-Shock GA2100 UNISEX wrist watch box", &EmptyDictionary);
        assert_eq!(parts.title, "Casio G-Shock GA2100 UNISEX wrist");

        let parts = splitter.split("Casio G-Shock GA2100 unisex", &EmptyDictionary);
        assert_eq!(parts.title, "Casio G-Shock GA2100");
        assert_eq!(parts.model_no.as_deref(), Some("GA2100"));
        assert_eq!(parts.model.as_deref(), Some("G-Shock"));
    }

    #[test]
    fn empty_title_yields_nothing() {
        let parts = TitleSplitter::default().split("【美品】 メンズ", &EmptyDictionary);
        assert_eq!(parts, TitleParts::default());
    }

    #[test]
    fn normalized_prefix_boundaries() {
        assert_eq!(normalized_prefix_end("Grand-Seiko X", "grandseiko"), Some(11));
        assert_eq!(normalized_prefix_end("Grand", "grandseiko"), None);
        assert_eq!(normalized_prefix_end("seiko", "seiko"), Some(5));
    }
}
