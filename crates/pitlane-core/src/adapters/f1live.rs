use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::F1LiveConfig;
use crate::data_source::{SourceError, SourceFuture, TrackStatusSource};
use crate::fetch::JsonFetcher;
use crate::http_client::HttpRequest;
use crate::{ProviderId, TrackStatus};

const MISSING_FLAG: &str = "--";

/// Race-control flag from the RapidAPI "API-Formula-1" live event feed.
#[derive(Debug, Clone)]
pub struct F1LiveAdapter {
    config: F1LiveConfig,
    fetcher: JsonFetcher,
}

impl F1LiveAdapter {
    pub fn new(config: F1LiveConfig, fetcher: JsonFetcher) -> Self {
        Self { config, fetcher }
    }

    async fn fetch_status(&self) -> Result<TrackStatus, SourceError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(SourceError::not_configured(
                ProviderId::F1Live,
                "RAPIDAPI_F1LIVE_KEY",
            ));
        };

        let mut request = HttpRequest::endpoint(&self.config.base_url, &self.config.endpoint)
            .with_header("X-RapidAPI-Key", api_key);
        if let Some(host) = self.config.rapidapi_host() {
            request = request.with_header("X-RapidAPI-Host", host);
        }

        let payload: LiveEventResponse = self.fetcher.fetch_json(request).await?;
        if payload.status.as_deref() != Some("success") {
            return Err(SourceError::rejected(format!(
                "f1live returned status '{}'",
                payload.status.unwrap_or_default()
            )));
        }
        let event = payload
            .data
            .ok_or_else(|| SourceError::rejected("f1live returned no event data"))?;

        Ok(normalize(event, Utc::now()))
    }
}

impl TrackStatusSource for F1LiveAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::F1Live
    }

    fn track_status<'a>(&'a self) -> SourceFuture<'a, TrackStatus> {
        Box::pin(self.fetch_status())
    }
}

#[derive(Debug, Deserialize)]
struct LiveEventResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<LiveEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveEvent {
    #[serde(default)]
    flag: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// An unparseable timestamp is stamped with `now`.
fn normalize(event: LiveEvent, now: DateTime<Utc>) -> TrackStatus {
    TrackStatus {
        flag: event
            .flag
            .filter(|flag| !flag.trim().is_empty())
            .unwrap_or_else(|| MISSING_FLAG.to_string()),
        message: event.description.unwrap_or_default(),
        updated_at: event
            .updated_at
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map_or(now, |stamp| stamp.with_timezone(&Utc)),
    }
}
