use serde::Deserialize;

use crate::config::KeyedProviderConfig;
use crate::data_source::{NewsSource, SearchQuery, SourceError, SourceFuture};
use crate::fetch::JsonFetcher;
use crate::http_client::{HttpAuth, HttpRequest};
use crate::{NewsArticle, ProviderId};

/// Latest articles from NewsAPI's `/everything` endpoint.
#[derive(Debug, Clone)]
pub struct NewsApiAdapter {
    config: KeyedProviderConfig,
    fetcher: JsonFetcher,
}

impl NewsApiAdapter {
    pub fn new(config: KeyedProviderConfig, fetcher: JsonFetcher) -> Self {
        Self { config, fetcher }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<NewsArticle>, SourceError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(SourceError::not_configured(
                ProviderId::NewsApi,
                "NEWS_API_KEY",
            ));
        };

        let request = HttpRequest::endpoint(&self.config.base_url, "/everything")
            .with_query("q", &query.text)
            .with_query("language", query.locale.as_str())
            .with_query("sortBy", "publishedAt")
            .with_query("pageSize", query.limit.to_string())
            .with_auth(&HttpAuth::Header {
                name: String::from("X-Api-Key"),
                value: api_key.to_string(),
            });

        let payload: NewsApiResponse = self.fetcher.fetch_json(request).await?;
        if payload.status != "ok" {
            return Err(SourceError::rejected(format!(
                "newsapi returned status '{}': {}",
                payload.status,
                payload.message.unwrap_or_default()
            )));
        }

        Ok(payload
            .articles
            .into_iter()
            .filter_map(normalize)
            .take(query.limit)
            .collect())
    }
}

impl NewsSource for NewsApiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::NewsApi
    }

    fn news<'a>(&'a self, query: &'a SearchQuery) -> SourceFuture<'a, Vec<NewsArticle>> {
        Box::pin(self.search(query))
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    url_to_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    name: Option<String>,
}

/// Articles without a title or link are useless to a reader; NewsAPI also
/// emits `[Removed]` placeholders for retracted items.
fn normalize(raw: RawArticle) -> Option<NewsArticle> {
    let title = raw.title.filter(|title| !title.is_empty() && title != "[Removed]")?;
    let url = raw.url.filter(|url| !url.is_empty())?;

    Some(NewsArticle {
        title,
        url,
        source: raw
            .source
            .and_then(|source| source.name)
            .unwrap_or_else(|| String::from("NewsAPI")),
        description: raw.description.filter(|text| !text.is_empty()),
        published_at: raw.published_at,
        image_url: raw.url_to_image.filter(|url| !url.is_empty()),
    })
}
