use serde::Deserialize;

use crate::config::KeyedProviderConfig;
use crate::data_source::{SearchQuery, SourceError, SourceFuture, VideoSource};
use crate::fetch::JsonFetcher;
use crate::http_client::{HttpAuth, HttpRequest};
use crate::{ProviderId, VideoItem};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Highlight videos from the YouTube Data API search endpoint.
#[derive(Debug, Clone)]
pub struct YouTubeAdapter {
    config: KeyedProviderConfig,
    fetcher: JsonFetcher,
}

impl YouTubeAdapter {
    pub fn new(config: KeyedProviderConfig, fetcher: JsonFetcher) -> Self {
        Self { config, fetcher }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VideoItem>, SourceError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(SourceError::not_configured(
                ProviderId::YouTube,
                "YOUTUBE_API_KEY",
            ));
        };

        let request = HttpRequest::endpoint(&self.config.base_url, "/search")
            .with_query("part", "snippet")
            .with_query("type", "video")
            .with_query("order", "date")
            .with_query("maxResults", query.limit.to_string())
            .with_query("relevanceLanguage", query.locale.as_str())
            .with_query("q", &query.text)
            .with_auth(&HttpAuth::Query {
                name: String::from("key"),
                value: api_key.to_string(),
            });

        let payload: SearchResponse = self.fetcher.fetch_json(request).await?;
        Ok(payload
            .items
            .into_iter()
            .filter_map(normalize)
            .take(query.limit)
            .collect())
    }
}

impl VideoSource for YouTubeAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::YouTube
    }

    fn videos<'a>(&'a self, query: &'a SearchQuery) -> SourceFuture<'a, Vec<VideoItem>> {
        Box::pin(self.search(query))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    high: Option<Thumbnail>,
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

fn normalize(item: SearchItem) -> Option<VideoItem> {
    // Channel and playlist hits carry no videoId.
    let id = item.id.video_id.filter(|id| !id.is_empty())?;
    let thumbnails = item.snippet.thumbnails;

    Some(VideoItem {
        url: format!("{WATCH_URL}{id}"),
        id,
        title: item.snippet.title,
        channel_title: item.snippet.channel_title,
        published_at: item.snippet.published_at,
        thumbnail_url: thumbnails.high.or(thumbnails.default).map(|thumb| thumb.url),
    })
}
