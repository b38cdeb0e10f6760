// src/extractors/engine.rs
use crate::dictionary::{AliasDictionary, DictionaryStore};
use crate::extractors::process;
use crate::extractors::selector::{self, Matched};
use crate::fetch::{HttpImageFetcher, ImageFetcher, RetryPolicy};
use crate::models::{FieldError, ImageData, Item, Page, Record};
use crate::profile::{FieldConfig, ItemPick, ParseConfig, ParseKind, Profile};
use crate::transforms;
use crate::utils::config::Settings;
use crate::utils::error::AppError;
use scraper::{ElementRef, Html};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Outcome of one field against one root: value, error, or neither (absent).
#[derive(Debug, Default)]
struct FieldOutcome {
    value: Option<Value>,
    error: Option<FieldError>,
    extras: Vec<(String, Value)>,
}

impl FieldOutcome {
    fn failed(error: FieldError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }
}

/// Interprets profiles against pages.
pub struct ExtractEngine {
    dictionary: Arc<dyn AliasDictionary>,
    image_fetcher: Option<Arc<dyn ImageFetcher>>,
    retry: RetryPolicy,
}

impl ExtractEngine {
    pub fn new(dictionary: Arc<dyn AliasDictionary>) -> Self {
        Self {
            dictionary,
            image_fetcher: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_image_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>, retry: RetryPolicy) -> Self {
        self.image_fetcher = Some(fetcher);
        self.retry = retry;
        self
    }

    /// Loads the alias dictionary (if configured) and the HTTP image fetcher (if enabled).
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let mut store = DictionaryStore::new();
        if let Some(path) = &settings.dictionary_path {
            store.load_category(settings.dictionary_category.clone(), path)?;
        }

        let engine = Self::new(Arc::new(store));
        if !settings.image_fetch_enabled {
            tracing::info!("Image fetching disabled; only page resources will be used");
            return Ok(engine);
        }
        let fetcher = HttpImageFetcher::from_settings(settings)?;
        let retry = RetryPolicy::new(settings.image_fetch_attempts, settings.image_fetch_backoff);
        Ok(engine.with_image_fetcher(Arc::new(fetcher), retry))
    }

    /// Extracts a record, then resolves image bytes for list items.
    pub async fn extract(&self, page: &Page, profile: &Profile) -> Record {
        let mut record = self.extract_document(page, profile);
        if let Some(items) = record.items.as_mut() {
            self.attach_images(page, items).await;
        }
        record
    }

    /// Everything except image resolution. Pure given the page, profile and dictionary.
    pub fn extract_document(&self, page: &Page, profile: &Profile) -> Record {
        tracing::info!("Extracting {} with profile '{}'", page.url, profile.name);
        let mut record = Record::new(page.url.clone(), page.status_code);
        let document = Html::parse_document(&page.html);

        if let Some(parse) = &profile.parse {
            match parse.kind {
                ParseKind::List => {
                    let items = self.extract_list(&document, parse, profile);
                    tracing::info!("List extraction for {} produced {} item(s)", page.url, items.len());
                    if items.is_empty() {
                        record
                            .errors
                            .push(FieldError::new("items", "no list items could be extracted"));
                    }
                    record.items = Some(items);
                }
                ParseKind::Single => {
                    self.extract_single(&document, parse, &mut record);
                    if let Some(category) = &profile.category {
                        record
                            .data
                            .insert("category".to_string(), Value::String(category.clone()));
                    }
                }
            }
        } else if let Some(fields) = &profile.fields {
            for (name, strategies) in fields {
                let mut last_error = None;
                let mut value = None;
                for strategy in strategies {
                    match strategy.extract(&page.html, &document) {
                        Ok(Some(found)) if !found.is_null() => {
                            tracing::debug!("Field '{}' extracted by {}", name, strategy.name());
                            value = Some(found);
                            break;
                        }
                        Ok(_) => {}
                        Err(message) => {
                            tracing::debug!("Strategy {} failed for '{}': {}", strategy.name(), name, message);
                            last_error = Some(FieldError::new(name, message).with_strategy(strategy.name()));
                        }
                    }
                }
                match value {
                    Some(value) => {
                        record.data.insert(name.clone(), value);
                    }
                    None => record.errors.push(last_error.unwrap_or_else(|| {
                        FieldError::new(name, "all strategies failed to extract a value")
                    })),
                }
            }
        } else {
            tracing::warn!("Profile '{}' defines nothing to extract", profile.name);
        }

        if !record.errors.is_empty() {
            tracing::info!("{} field error(s) for {}", record.errors.len(), page.url);
        }
        record
    }

    fn extract_single(&self, document: &Html, parse: &ParseConfig, record: &mut Record) {
        let root = document.root_element();
        for (name, field) in &parse.fields {
            let outcome = self.extract_field(root, name, field);
            merge_extras(&mut record.data, outcome.extras);
            match (outcome.value, outcome.error) {
                (Some(value), _) => {
                    tracing::debug!("Field '{}' = {}", name, preview(&value));
                    record.data.insert(name.clone(), value);
                }
                (None, Some(error)) => {
                    tracing::debug!("Field '{}' failed: {}", name, error.error);
                    record.errors.push(error);
                }
                (None, None) => tracing::debug!("Field '{}' not found", name),
            }
        }
    }

    fn extract_list(&self, document: &Html, parse: &ParseConfig, profile: &Profile) -> Vec<Item> {
        let containers = item_containers(document.root_element(), parse);
        if containers.is_empty() {
            tracing::warn!("No item containers matched for profile '{}'", profile.name);
            return Vec::new();
        }
        tracing::debug!("Found {} item container(s)", containers.len());

        let mut items = Vec::with_capacity(containers.len());
        for (idx, container) in containers.into_iter().enumerate() {
            let mut item = Item::default();
            let mut found = 0usize;
            for (name, field) in &parse.fields {
                let outcome = self.extract_field(container, name, field);
                merge_extras(&mut item.fields, outcome.extras);
                if let Some(value) = outcome.value {
                    item.fields.insert(name.clone(), value);
                    found += 1;
                } else if let Some(error) = outcome.error {
                    tracing::debug!("Item {} field '{}' failed: {}", idx + 1, name, error.error);
                }
            }

            if found == 0 {
                tracing::debug!("Item {} produced no fields, dropping", idx + 1);
                continue;
            }
            tracing::trace!("Item {}: {}/{} fields", idx + 1, found, parse.fields.len());
            items.push(item);
        }

        let mut items = process::run_all(&parse.pre_list_process, items);
        if let Some(category) = &profile.category {
            for item in &mut items {
                item.fields
                    .insert("category".to_string(), Value::String(category.clone()));
            }
        }
        process::run_all(&parse.post_list_process, items)
    }

    /// Resolves the field's selectors under `root` and returns the first non-null transformed value.
    fn extract_field(&self, root: ElementRef<'_>, name: &str, field: &FieldConfig) -> FieldOutcome {
        let matched = match selector::resolve(root, &field.selectors) {
            Ok(matched) => matched,
            Err(e) => {
                return FieldOutcome::failed(FieldError::new(
                    name,
                    format!("all selectors failed, last error: {}", e),
                ))
            }
        };

        let mut extras: Option<Vec<(String, Value)>> = None;
        for node in &matched {
            let Some(raw) = raw_value(node, field).filter(|raw| !raw.is_empty()) else {
                continue;
            };

            let outcome =
                match transforms::apply_all(&field.transforms, Value::String(raw), self.dictionary.as_ref()) {
                    Ok(outcome) => outcome,
                    Err(e) => return FieldOutcome::failed(FieldError::new(name, e.to_string())),
                };
            if extras.is_none() && !outcome.extras.is_empty() {
                extras = Some(outcome.extras);
            }
            if let Some(value) = outcome.value.filter(|v| !v.is_null()) {
                return FieldOutcome {
                    value: Some(value),
                    error: None,
                    extras: extras.unwrap_or_default(),
                };
            }
        }

        // Extras without a primary value are dropped along with it.
        FieldOutcome::default()
    }

    async fn attach_images(&self, page: &Page, items: &mut [Item]) {
        let mut attached = 0usize;
        let mut wanted = 0usize;

        for (idx, item) in items.iter_mut().enumerate() {
            let Some(image_url) = item.get_str("image").filter(|u| !u.is_empty()).map(str::to_string) else {
                continue;
            };
            if !is_present(item.get("item_id")) {
                tracing::trace!("Item {} has an image but no item_id", idx + 1);
                continue;
            }

            wanted += 1;
            match self.resolve_image(page, &image_url).await {
                Some(bytes) => {
                    tracing::debug!("Item {}: {} image bytes", idx + 1, bytes.len());
                    item.image = Some(ImageData {
                        bytes,
                        url: image_url,
                    });
                    attached += 1;
                }
                None => tracing::warn!("Item {}: no image data for {}", idx + 1, image_url),
            }
        }

        if wanted > 0 {
            tracing::info!("Attached {}/{} image(s) for {}", attached, wanted, page.url);
        }
    }

    // Page resources by exact URL, then by scheme+host+path, then the network.
    async fn resolve_image(&self, page: &Page, image_url: &str) -> Option<Vec<u8>> {
        let absolute = absolutize(&page.url, image_url);

        if let Some(resources) = &page.resources {
            if let Some(bytes) = resources.get(image_url).or_else(|| resources.get(&absolute)) {
                tracing::trace!("Image {} served from page resources", image_url);
                return Some(bytes.clone());
            }
            if let Some(bytes) = find_by_path(resources, &absolute) {
                tracing::trace!("Image {} matched a page resource ignoring the query", image_url);
                return Some(bytes.clone());
            }
        }

        let fetcher = self.image_fetcher.as_ref()?;
        match self.retry.fetch(fetcher.as_ref(), &absolute).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Giving up on image {}: {}", absolute, e);
                None
            }
        }
    }
}

fn item_containers<'a>(root: ElementRef<'a>, parse: &ParseConfig) -> Vec<ElementRef<'a>> {
    if parse.item_selector_candidates.is_empty() {
        tracing::warn!("List profile has no item_selector_candidates");
        return Vec::new();
    }

    let resolved = match parse.item_selector_pick {
        ItemPick::FirstNonEmpty => match selector::resolve(root, &parse.item_selector_candidates) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Item selectors failed: {}", e);
                Vec::new()
            }
        },
        ItemPick::All => {
            let mut all = Vec::new();
            for candidate in &parse.item_selector_candidates {
                match selector::resolve(root, std::slice::from_ref(candidate)) {
                    Ok(found) => all.extend(found),
                    Err(e) => tracing::warn!("Item selector '{}' failed: {}", candidate, e),
                }
            }
            all
        }
    };

    let mut containers: Vec<ElementRef<'a>> = Vec::with_capacity(resolved.len());
    for element in resolved.iter().filter_map(Matched::as_element) {
        if !containers.iter().any(|c| c.id() == element.id()) {
            containers.push(element);
        }
    }
    containers
}

// `attr`, else the first non-empty of `attr_candidates`, else text when asked for.
fn raw_value(node: &Matched<'_>, field: &FieldConfig) -> Option<String> {
    let element = match node {
        Matched::Element(element) => element,
        Matched::Value(value) => return Some(value.clone()),
    };

    let attribute = match &field.attr {
        Some(attr) => element.value().attr(attr),
        None => field
            .attr_candidates
            .iter()
            .find_map(|attr| element.value().attr(attr).filter(|v| !v.is_empty())),
    };

    match attribute {
        Some(value) => Some(value.to_string()),
        None if field.text => Some(element.text().collect()),
        None => None,
    }
}

fn merge_extras(target: &mut Map<String, Value>, extras: Vec<(String, Value)>) {
    for (key, value) in extras {
        if !value.is_null() {
            target.insert(key, value);
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn absolutize(page_url: &str, image_url: &str) -> String {
    if Url::parse(image_url).is_ok() {
        return image_url.to_string();
    }
    Url::parse(page_url)
        .and_then(|base| base.join(image_url))
        .map(String::from)
        .unwrap_or_else(|_| image_url.to_string())
}

fn find_by_path<'r>(resources: &'r HashMap<String, Vec<u8>>, url: &str) -> Option<&'r Vec<u8>> {
    let wanted = Url::parse(url).ok()?;
    let same_resource = |candidate: &Url| {
        candidate.scheme() == wanted.scheme()
            && candidate.host_str() == wanted.host_str()
            && candidate.port_or_known_default() == wanted.port_or_known_default()
            && candidate.path() == wanted.path()
    };

    resources
        .iter()
        .filter(|(key, _)| Url::parse(key).is_ok_and(|candidate| same_resource(&candidate)))
        .min_by(|a, b| a.0.cmp(b.0))
        .map(|(_, bytes)| bytes)
}

fn preview(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    rendered.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{AliasTable, EmptyDictionary};
    use crate::fetch::tests::MockFetcher;
    use crate::profile::registry::parse_profiles;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn profile(yaml: &str) -> Profile {
        parse_profiles(yaml).unwrap().remove(0)
    }

    fn engine() -> ExtractEngine {
        let table = AliasTable::from_yaml_str(
            "SEIKO:\n  aliases: [セイコー]\n  model_name:\n    Presage:\n      aliases: [プレザージュ]\n",
        )
        .unwrap();
        ExtractEngine::new(Arc::new(DictionaryStore::new().with_table("watch", table)))
    }

    const LISTING: &str = r#"
        <html><body><main><ul>
          <li class="card">
            <a href="/products/1"><h2>【新品】SEIKO プレザージュ SARX035 メンズ 腕時計</h2></a>
            <span class="price">¥45,000</span>
          </li>
          <li class="card">
            <a href="/products/1"><h2>SEIKO Presage SARX035</h2></a>
            <span class="price">¥44,000</span>
          </li>
          <li class="card"><span class="sold">sold out</span></li>
        </ul></main></body></html>
    "#;

    const LIST_PROFILE: &str = r#"
name: shop
category: watch
match: {domains: [shop.example]}
parse:
  type: list
  item_selector_candidates: ["main li:has(a[href*='/products/'])"]
  fields:
    title:
      selector: h2
      text: true
      transforms: [{type: strip}, {type: split_watch_title}]
    product_url:
      selector: a
      attr: href
      transforms: [{type: url_join, config: {base: "https://shop.example/"}}]
    price:
      selector_candidates: [".price"]
      text: true
      transforms: [{type: replace, config: {from: "¥"}}, {type: to_int}]
  post_list_process: [{method: deduplicate_by_url}]
"#;

    #[test]
    fn list_mode_dedups_and_splits_titles() {
        let page = Page::new("https://shop.example/list", LISTING);
        let record = engine().extract_document(&page, &profile(LIST_PROFILE));

        assert!(record.errors.is_empty(), "{:?}", record.errors);
        let items = record.items();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.get_str("title"), Some("SEIKO プレザージュ SARX035"));
        assert_eq!(item.get_str("product_url"), Some("https://shop.example/products/1"));
        assert_eq!(item.get("price"), Some(&json!(45000)));
        assert_eq!(item.get_str("brand_name"), Some("SEIKO"));
        assert_eq!(item.get_str("model_name"), Some("Presage"));
        assert_eq!(item.get_str("model_no"), Some("SARX035"));
        assert_eq!(item.get_str("category"), Some("watch"));

        let rendered = record.to_json();
        assert_eq!(rendered["data"]["items"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn items_without_fields_are_dropped_and_empty_lists_reported() {
        let p = profile(
            r##"
name: cards
category: watch
parse:
  type: list
  item_selector_candidates: ["#nothing", "li.card"]
  fields:
    product_url: {selector: a, attr: href}
"##,
        );
        let record = engine().extract_document(&Page::new("https://shop.example/", LISTING), &p);
        assert_eq!(record.items().len(), 2);
        assert!(record.items().iter().all(|i| i.get_str("category") == Some("watch")));

        let record = engine().extract_document(&Page::new("https://shop.example/", "<p>empty</p>"), &p);
        assert!(record.items().is_empty());
        assert_eq!(record.errors.len(), 1);
        assert_eq!(record.errors[0].field, "items");
    }

    #[test]
    fn pick_all_concatenates_candidates_without_repeats() {
        let p = profile(
            r#"
name: all
parse:
  type: list
  item_selector_pick: all
  item_selector_candidates: ["li.card:first-child", "li.card", "h2"]
  fields:
    text: {selector: ":root", text: true, transforms: [{type: strip}]}
"#,
        );
        let record = engine().extract_document(&Page::new("https://shop.example/", LISTING), &p);
        let texts: Vec<_> = record
            .items()
            .iter()
            .map(|i| i.get_str("text").unwrap_or_default().to_string())
            .collect();
        assert_eq!(texts.len(), 5);
        assert!(texts[0].starts_with("【新品】SEIKO"));
        assert_eq!(texts[2], "sold out");
        assert_eq!(texts[4], "SEIKO Presage SARX035");
    }

    #[test]
    fn single_mode_absent_broken_and_extras() {
        let p = profile(
            r##"
name: detail
category: watch
parse:
  fields:
    title:
      selector_candidates: ["h1.missing", "h1"]
      text: true
      transforms: [{type: split_watch_title}]
    sku: {selector_candidates: ["#missing", "#also-missing"], text: true}
    broken: {selector_candidates: ["//div[", "a[[["], text: true}
    link:
      selector: a.bad
      attr: href
      transforms: [{type: url_join, config: {base: "https://shop.example/"}}]
"##,
        );
        let html = r#"<h1>SEIKO Presage SARX035</h1><a class="bad" href="http://[oops">x</a>"#;
        let record = engine().extract_document(&Page::new("https://shop.example/p/1", html), &p);

        assert_eq!(record.data["title"], json!("SEIKO Presage SARX035"));
        assert_eq!(record.data["brand_name"], json!("SEIKO"));
        assert_eq!(record.data["model_name"], json!("Presage"));
        assert_eq!(record.data["category"], json!("watch"));
        assert!(!record.data.contains_key("sku"));
        assert!(record.error_for("sku").is_none());

        let broken = record.error_for("broken").unwrap();
        assert!(broken.error.contains("a[[["), "{}", broken.error);
        assert_eq!(record.errors.iter().filter(|e| e.field == "broken").count(), 1);

        assert!(record.error_for("link").is_some());
        assert!(!record.data.contains_key("link"));
        assert!(record.items.is_none());
    }

    #[test]
    fn attribute_candidates_and_value_matches() {
        let p = profile(
            r#"
name: attrs
parse:
  fields:
    image: {selector: img, attr_candidates: [data-src, src]}
    href: {selector: "//a/@href"}
    missing_attr: {selector: img, attr: alt}
"#,
        );
        let html = r#"<img data-src="" src="/s.jpg"><a href="/next">n</a>"#;
        let record = engine().extract_document(&Page::new("https://x.example/", html), &p);
        assert_eq!(record.data["image"], json!("/s.jpg"));
        assert_eq!(record.data["href"], json!("/next"));
        assert!(!record.data.contains_key("missing_attr"));
        assert!(record.errors.is_empty());
    }

    #[test]
    fn legacy_strategies_report_absence() {
        let p = profile(
            r#"
name: legacy
fields:
  name:
    - {type: jsonld, config: {path: name}}
    - {type: xpath, config: {xpath: "//h1"}}
  price:
    - {type: regex, config: {pattern: "¥([\\d,]+)", group: 1}}
  sku:
    - {type: xpath, config: {xpath: "//span[@id='sku']"}}
"#,
        );
        let html = "<h1> Speedmaster </h1><p>¥ 900,000</p><p>¥1,200</p>";
        let record = engine().extract_document(&Page::new("https://x.example/", html), &p);
        assert_eq!(record.data["name"], json!("Speedmaster"));
        assert_eq!(record.data["price"], json!("1,200"));
        let sku = record.error_for("sku").unwrap();
        assert_eq!(sku.error, "all strategies failed to extract a value");
        assert_eq!(sku.strategy, None);
    }

    const IMAGE_PROFILE: &str = r#"
name: images
parse:
  type: list
  item_selector_candidates: ["li"]
  fields:
    item_id: {selector: "span", text: true}
    image: {selector: img, attr: src}
"#;

    const IMAGE_LISTING: &str = r#"<ul>
        <li><span>a</span><img src="https://cdn.example/a.jpg"></li>
        <li><span>b</span><img src="https://cdn.example/b.jpg?w=300"></li>
        <li><span>c</span><img src="/c.jpg"></li>
        <li><img src="https://cdn.example/no-id.jpg"></li>
    </ul>"#;

    #[tokio::test]
    async fn images_resolve_from_resources_then_network() {
        let mut resources = HashMap::new();
        resources.insert("https://cdn.example/a.jpg".to_string(), b"A".to_vec());
        resources.insert("https://cdn.example/b.jpg?w=1200".to_string(), b"B".to_vec());
        let page = Page::new("https://shop.example/list", IMAGE_LISTING).with_resources(resources);

        let fetcher = Arc::new(MockFetcher {
            failures_before_success: 1,
            ..MockFetcher::serving("https://shop.example/c.jpg", b"C")
        });
        let engine = ExtractEngine::new(Arc::new(EmptyDictionary))
            .with_image_fetcher(fetcher.clone(), RetryPolicy::new(3, Duration::from_millis(1)));

        let record = engine.extract(&page, &profile(IMAGE_PROFILE)).await;
        let images: Vec<_> = record
            .items()
            .iter()
            .map(|i| i.image.as_ref().map(|img| img.bytes.clone()))
            .collect();
        assert_eq!(
            images,
            vec![Some(b"A".to_vec()), Some(b"B".to_vec()), Some(b"C".to_vec()), None]
        );
        assert_eq!(record.items()[2].image.as_ref().unwrap().url, "/c.jpg");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec!["https://shop.example/c.jpg", "https://shop.example/c.jpg"]
        );

        let external = record.to_external_json();
        assert!(external["data"]["items"][0].get("_image_url").is_none());
        assert_eq!(record.to_json()["data"]["items"][0]["_image_url"], "https://cdn.example/a.jpg");
    }

    #[tokio::test]
    async fn image_failures_are_not_fatal() {
        let page = Page::new("https://shop.example/list", IMAGE_LISTING);
        let fetcher = Arc::new(MockFetcher::default());
        let engine = ExtractEngine::new(Arc::new(EmptyDictionary))
            .with_image_fetcher(fetcher.clone(), RetryPolicy::new(3, Duration::from_millis(1)));

        let record = engine.extract(&page, &profile(IMAGE_PROFILE)).await;
        assert_eq!(record.items().len(), 4);
        assert!(record.items().iter().all(|i| i.image.is_none()));
        assert!(record.errors.is_empty());
        // Three items carry an item_id, three attempts each.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn engine_from_default_settings() {
        let settings = Settings {
            image_fetch_enabled: false,
            ..Settings::default()
        };
        let engine = ExtractEngine::from_settings(&settings).unwrap();
        assert!(engine.image_fetcher.is_none());

        let record = tokio_test::block_on(engine.extract(
            &Page::new("https://x.example/", "<h1>t</h1>").with_status(404),
            &profile("name: t\nparse: {fields: {t: {selector: h1, text: true}}}"),
        ));
        assert_eq!(record.status_code, 404);
        assert_eq!(record.data["t"], json!("t"));
    }

    #[test]
    fn helpers() {
        assert_eq!(absolutize("https://a.example/x/y", "../img.png"), "https://a.example/img.png");
        assert_eq!(absolutize("not a url", "img.png"), "img.png");
        assert!(is_present(Some(&json!(0))));
        assert!(!is_present(Some(&json!(""))));
        assert_eq!(preview(&json!("x".repeat(300))).len(), 100);
    }
}
