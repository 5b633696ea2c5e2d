use std::collections::BTreeMap;

use serde::Deserialize;

use crate::cache::MemoCache;
use crate::config::WikipediaConfig;
use crate::data_source::{ImageSource, SourceError, SourceFuture};
use crate::fetch::JsonFetcher;
use crate::http_client::HttpRequest;
use crate::{MediaImage, ProviderId};

pub const IMAGE_CACHE_CAPACITY: usize = 512;
const THUMBNAIL_SIZE: u32 = 640;

/// Article lead images through the MediaWiki `pageimages` API.
///
/// Both hits and misses are memoised by title.
#[derive(Debug, Clone)]
pub struct WikipediaAdapter {
    config: WikipediaConfig,
    fetcher: JsonFetcher,
    cache: MemoCache<Option<MediaImage>>,
}

impl WikipediaAdapter {
    pub fn new(config: WikipediaConfig, fetcher: JsonFetcher) -> Self {
        Self {
            config,
            fetcher,
            cache: MemoCache::with_capacity(IMAGE_CACHE_CAPACITY),
        }
    }

    async fn lookup(&self, title: &str) -> Result<Option<MediaImage>, SourceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SourceError::invalid_request("image title must not be empty"));
        }
        if let Some(image) = self.cache.get(title).await {
            return Ok(image);
        }

        let request = HttpRequest::get(self.config.base_url.as_str())
            .with_query("action", "query")
            .with_query("format", "json")
            .with_query("prop", "pageimages|description")
            .with_query("piprop", "original|thumbnail")
            .with_query("pithumbsize", THUMBNAIL_SIZE.to_string())
            .with_query("titles", title)
            .with_query("origin", "*");

        let payload: QueryResponse = self.fetcher.fetch_json(request).await?;
        let image = payload
            .query
            .and_then(|query| query.pages.into_values().next())
            .and_then(|page| page_image(title, page));

        self.cache.insert(title.to_string(), image.clone()).await;
        Ok(image)
    }
}

impl ImageSource for WikipediaAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Wikipedia
    }

    fn image<'a>(&'a self, title: &'a str) -> SourceFuture<'a, Option<MediaImage>> {
        Box::pin(self.lookup(title))
    }
}

/// Article title from a Wikipedia page URL.
///
/// Takes the last path segment, percent-decodes it and strips any namespace
/// prefix such as `File:`.
pub fn title_from_url(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme.split_once('/').map_or("", |(_, path)| path);
    let path = path
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let segment = path.rsplit('/').find(|segment| !segment.is_empty())?;
    let decoded = urlencoding::decode(segment).ok()?;
    let title = decoded.rsplit(':').next().unwrap_or_default().trim();
    (!title.is_empty()).then(|| title.to_string())
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBlock>,
}

#[derive(Debug, Deserialize)]
struct QueryBlock {
    #[serde(default)]
    pages: BTreeMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    original: Option<ImageRef>,
    #[serde(default)]
    thumbnail: Option<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    source: String,
}

fn page_image(title: &str, page: Page) -> Option<MediaImage> {
    let original = page.original.map(|image| image.source);
    let thumbnail = page.thumbnail.map(|image| image.source);
    let url = original.clone().or_else(|| thumbnail.clone())?;

    Some(MediaImage {
        title: title.to_string(),
        description: page.description.filter(|text| !text.is_empty()),
        url,
        thumbnail_url: thumbnail.or(original),
    })
}
