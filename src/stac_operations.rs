use crate::error::LocatorError;
use crate::settings::LocatorSettings;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use stac::{Asset, Item};
use url::Url;

/// Parameters of a single STAC item search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub start: String,
    pub end: String,
    pub geometry: Value,
    pub collection: String,
    pub limit: usize,
}

impl SearchCriteria {
    /// Request body for `POST /search`.
    pub fn body(self: &Self) -> Value {
        serde_json::json!({
            "collections": vec![&self.collection],
            "intersects": self.geometry,
            "datetime": format!("{}/{}", self.start, self.end),
            "limit": self.limit,
        })
    }
}

/// Converts a `yyyy-mm-dd` date into the midnight UTC instant the catalog expects.
pub fn day_start_instant(date: &str) -> Result<String, LocatorError> {
    let re = Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Regex pattern should always compile");
    if !re.is_match(date) {
        return Err(LocatorError::Input(format!(
            "expected a date in yyyy-mm-dd format, got '{date}'"
        )));
    }
    Ok(format!("{date}T00:00:00Z"))
}

#[derive(Debug, Default)]
pub struct SearchResults {
    /// Total number of matches reported by the catalog, which may exceed `items.len()`.
    pub matched: u64,
    pub items: Vec<Item>,
}

pub trait Catalog {
    async fn search(self: &Self, criteria: &SearchCriteria) -> Result<SearchResults, LocatorError>;
}

#[derive(Deserialize)]
struct SearchPage {
    #[serde(default)]
    features: Vec<Item>,
    #[serde(default)]
    links: Vec<SearchLink>,
    #[serde(rename = "numberMatched")]
    number_matched: Option<u64>,
    context: Option<SearchContext>,
}

#[derive(Deserialize)]
struct SearchContext {
    matched: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
struct SearchLink {
    href: String,
    rel: String,
    method: Option<String>,
    body: Option<Map<String, Value>>,
    #[serde(default)]
    merge: bool,
}

impl SearchPage {
    fn matched(self: &Self) -> u64 {
        self.number_matched
            .or(self.context.as_ref().and_then(|c| c.matched))
            .unwrap_or(self.features.len() as u64)
    }

    fn next_link(self: &Self) -> Option<&SearchLink> {
        self.links.iter().find(|l| l.rel == "next")
    }
}

/// A page request: where to send it and, for POST, with which body.
enum PageRequest {
    Post(String, Value),
    Get(String),
}

fn next_page_request(link: &SearchLink, previous_body: &Value) -> PageRequest {
    let is_post = match &link.method {
        Some(method) => method.eq_ignore_ascii_case("POST"),
        None => link.body.is_some(),
    };
    if !is_post {
        return PageRequest::Get(link.href.clone());
    }

    let body = match (&link.body, link.merge) {
        (Some(extra), true) => {
            let mut merged = previous_body.as_object().cloned().unwrap_or_default();
            for (k, v) in extra {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (Some(extra), false) => Value::Object(extra.clone()),
        (None, _) => previous_body.clone(),
    };
    PageRequest::Post(link.href.clone(), body)
}

/// STAC API client issuing item searches over HTTP.
pub struct StacApi {
    client: reqwest::Client,
    search_url: Url,
    max_items: usize,
}

impl StacApi {
    pub fn new(search_url: Url, max_items: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_url,
            max_items,
        }
    }

    pub fn from_settings(settings: &LocatorSettings) -> Result<Self, LocatorError> {
        Ok(Self::new(settings.search_url()?, settings.max_items))
    }

    async fn fetch_page(self: &Self, request: &PageRequest) -> Result<SearchPage, LocatorError> {
        let builder = match request {
            PageRequest::Post(url, body) => {
                debug!("POST {url} {body}");
                self.client.post(url).json(body)
            }
            PageRequest::Get(url) => {
                debug!("GET {url}");
                self.client.get(url)
            }
        };
        let page = builder
            .send()
            .await?
            .error_for_status()?
            .json::<SearchPage>()
            .await?;
        Ok(page)
    }
}

impl Catalog for StacApi {
    /// Follows `next` links until `max_items` items are collected or the catalog runs out.
    async fn search(self: &Self, criteria: &SearchCriteria) -> Result<SearchResults, LocatorError> {
        let body = criteria.body();
        let mut request = PageRequest::Post(self.search_url.to_string(), body.clone());
        let mut last_body = body;
        let mut results = SearchResults::default();

        for page_number in 1.. {
            let page = self.fetch_page(&request).await?;
            if page_number == 1 {
                results.matched = page.matched();
            }
            let next = page.next_link().cloned();
            results.items.extend(page.features);

            if results.items.len() >= self.max_items {
                break;
            }
            let Some(link) = next else { break };
            request = next_page_request(&link, &last_body);
            if let PageRequest::Post(_, body) = &request {
                last_body = body.clone();
            }
        }

        results.items.truncate(self.max_items);
        Ok(results)
    }
}

/// Location of one named asset of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub item_id: String,
    pub key: String,
    pub title: Option<String>,
    pub href: String,
}

impl AssetInfo {
    pub fn from_item(item: &Item, key: &str) -> Result<Self, LocatorError> {
        let asset: &Asset = item.assets.get(key).ok_or(LocatorError::AssetNotFound {
            item_id: item.id.to_owned(),
            key: key.to_owned(),
        })?;
        Ok(Self {
            item_id: item.id.to_owned(),
            key: key.to_owned(),
            title: asset.title.to_owned(),
            href: asset.href.to_owned(),
        })
    }
}

/// Asset keys of an item with their titles, sorted by key.
pub fn asset_titles(item: &Item) -> Vec<(String, Option<String>)> {
    let mut titles: Vec<_> = item
        .assets
        .iter()
        .map(|(key, asset)| (key.to_owned(), asset.title.to_owned()))
        .collect();
    titles.sort();
    titles
}
