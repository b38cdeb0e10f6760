// src/extractors/selector.rs
use crate::extractors::path::PathQuery;
use crate::utils::error::SelectorError;
use scraper::{ElementRef, Selector};

/// The literal candidate meaning "the current node itself".
pub const ROOT_SELECTOR: &str = ":root";

/// A selection result: either an element or a raw string (text node or attribute value).
#[derive(Debug, Clone)]
pub enum Matched<'a> {
    Element(ElementRef<'a>),
    Value(String),
}

impl<'a> Matched<'a> {
    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        match self {
            Matched::Element(el) => Some(*el),
            Matched::Value(_) => None,
        }
    }
}

/// Tries each candidate in order and returns the matches of the first one that selects anything.
///
/// Zero matches across all candidates is `Ok(vec![])`. If nothing matched and at least one
/// candidate could not be interpreted, the last such error is returned instead.
pub fn resolve<'a, S: AsRef<str>>(
    root: ElementRef<'a>,
    candidates: &[S],
) -> Result<Vec<Matched<'a>>, SelectorError> {
    let mut last_error: Option<SelectorError> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate.trim() == ROOT_SELECTOR {
            tracing::trace!("Candidate ':root' selects the context node itself");
            return Ok(vec![Matched::Element(root)]);
        }

        match select_candidate(root, candidate) {
            Ok(found) if !found.is_empty() => {
                tracing::trace!("Selector '{}' matched {} node(s)", candidate, found.len());
                return Ok(found);
            }
            Ok(_) => {
                tracing::trace!("Selector '{}' matched nothing", candidate);
            }
            Err(e) => {
                tracing::debug!("Selector '{}' failed: {}", candidate, e);
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e),
        None => Ok(Vec::new()),
    }
}

/// CSS first; if the CSS engine rejects the text, a `:has(...)` rewrite, then a path query.
pub fn select_candidate<'a>(
    root: ElementRef<'a>,
    candidate: &str,
) -> Result<Vec<Matched<'a>>, SelectorError> {
    let css_error = match Selector::parse(candidate) {
        Ok(selector) => return Ok(root.select(&selector).map(Matched::Element).collect()),
        Err(e) => e.to_string(),
    };

    if candidate.contains(":has(") {
        match PathQuery::from_css(candidate) {
            Ok(query) => {
                tracing::trace!("Evaluating '{}' through the :has() rewrite", candidate);
                return Ok(query.evaluate(root));
            }
            Err(e) => tracing::trace!("':has()' rewrite of '{}' failed: {}", candidate, e),
        }
    }

    match PathQuery::parse(candidate) {
        Ok(query) => Ok(query.evaluate(root)),
        Err(path_error) => Err(SelectorError::Unsupported {
            selector: candidate.to_string(),
            css: css_error,
            path: path_error.to_string(),
        }),
    }
}
