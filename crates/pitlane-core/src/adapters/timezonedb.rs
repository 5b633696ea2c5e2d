use serde::Deserialize;

use crate::cache::MemoCache;
use crate::config::KeyedProviderConfig;
use crate::data_source::{SourceError, SourceFuture, TimezoneSource};
use crate::domain::time;
use crate::fetch::JsonFetcher;
use crate::http_client::{HttpAuth, HttpRequest};
use crate::{Circuit, GeoPoint, ProviderId, TimezoneInfo};

/// Distinct circuits per season stay well below this.
pub const TIMEZONE_CACHE_CAPACITY: usize = 256;

/// Resolves IANA zone ids from coordinates through TimeZoneDB.
///
/// Answers are memoised by `"lat,lng"` for the life of the cache; circuit
/// coordinates never move.
#[derive(Debug, Clone)]
pub struct TimeZoneDbAdapter {
    config: KeyedProviderConfig,
    fetcher: JsonFetcher,
    cache: MemoCache<TimezoneInfo>,
}

impl TimeZoneDbAdapter {
    pub fn new(config: KeyedProviderConfig, fetcher: JsonFetcher) -> Self {
        Self::with_cache(
            config,
            fetcher,
            MemoCache::with_capacity(TIMEZONE_CACHE_CAPACITY),
        )
    }

    /// Pre-resolves `circuits` so their lookups never reach the network.
    ///
    /// Circuits whose zone is `"UTC"` are treated as unresolved and skipped.
    pub fn with_known_circuits(
        config: KeyedProviderConfig,
        fetcher: JsonFetcher,
        circuits: &[Circuit],
    ) -> Self {
        let known = circuits
            .iter()
            .filter(|circuit| circuit.timezone != "UTC")
            .map(|circuit| {
                (
                    circuit.geo.cache_key(),
                    TimezoneInfo {
                        zone_name: circuit.timezone.clone(),
                        abbreviation: None,
                        gmt_offset: None,
                    },
                )
            });
        Self::with_cache(
            config,
            fetcher,
            MemoCache::seeded(TIMEZONE_CACHE_CAPACITY, known),
        )
    }

    pub fn with_cache(
        config: KeyedProviderConfig,
        fetcher: JsonFetcher,
        cache: MemoCache<TimezoneInfo>,
    ) -> Self {
        Self {
            config,
            fetcher,
            cache,
        }
    }

    async fn lookup(&self, geo: GeoPoint) -> Result<TimezoneInfo, SourceError> {
        let key = geo.cache_key();
        if let Some(info) = self.cache.get(&key).await {
            return Ok(info);
        }

        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(SourceError::not_configured(
                ProviderId::TimeZoneDb,
                "TIMEZONEDB_API_KEY",
            ));
        };

        let request = HttpRequest::endpoint(&self.config.base_url, "/v2.1/get-time-zone")
            .with_query("format", "json")
            .with_query("by", "position")
            .with_query("lat", geo.lat.to_string())
            .with_query("lng", geo.lng.to_string())
            .with_auth(&HttpAuth::Query {
                name: String::from("key"),
                value: api_key.to_string(),
            });

        let payload: TimeZoneDbResponse = self.fetcher.fetch_json(request).await?;
        let info = normalize(payload)?;
        self.cache.insert(key, info.clone()).await;
        Ok(info)
    }
}

impl TimezoneSource for TimeZoneDbAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::TimeZoneDb
    }

    fn timezone<'a>(&'a self, geo: GeoPoint) -> SourceFuture<'a, TimezoneInfo> {
        Box::pin(self.lookup(geo))
    }
}

/// Zone id for `geo`, or `"UTC"` when the lookup is unconfigured or fails.
pub async fn zone_name_or_utc(source: &dyn TimezoneSource, geo: GeoPoint) -> String {
    match source.timezone(geo).await {
        Ok(info) => info.zone_name,
        Err(error) if error.is_not_configured() => String::from("UTC"),
        Err(error) => {
            tracing::warn!(
                provider = %source.id(),
                lat = geo.lat,
                lng = geo.lng,
                %error,
                "timezone lookup failed; using UTC"
            );
            String::from("UTC")
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeZoneDbResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    zone_name: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
    #[serde(default)]
    gmt_offset: Option<i64>,
}

fn normalize(payload: TimeZoneDbResponse) -> Result<TimezoneInfo, SourceError> {
    if payload.status != "OK" {
        return Err(SourceError::rejected(format!(
            "timezonedb returned status '{}': {}",
            payload.status,
            payload.message.unwrap_or_default()
        )));
    }
    let zone_name = payload
        .zone_name
        .filter(|zone| !zone.is_empty())
        .ok_or_else(|| SourceError::rejected("timezonedb response has no zoneName"))?;
    time::parse_timezone(&zone_name)?;

    Ok(TimezoneInfo {
        zone_name,
        abbreviation: payload.abbreviation.filter(|value| !value.is_empty()),
        gmt_offset: payload.gmt_offset,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::http_client::StubHttpClient;
    use crate::provider_policy::ProviderPolicy;
    use crate::retry::RetryConfig;

    const BAHRAIN: &str = r#"{"status":"OK","message":"","zoneName":"Asia/Bahrain","abbreviation":"+03","gmtOffset":10800}"#;

    fn adapter(stub: &StubHttpClient, api_key: Option<&str>) -> TimeZoneDbAdapter {
        let mut config = KeyedProviderConfig::unconfigured("https://tz.test");
        config.api_key = api_key.map(str::to_string);
        let policy = ProviderPolicy {
            quota_limit: 100,
            ..ProviderPolicy::timezonedb_default()
        };
        let fetcher = JsonFetcher::new(Arc::new(stub.clone()), policy)
            .with_retry(RetryConfig::linear(2, Duration::ZERO));
        TimeZoneDbAdapter::new(config, fetcher)
    }

    fn sakhir() -> GeoPoint {
        GeoPoint::new(26.0325, 50.5106).expect("valid")
    }

    #[tokio::test]
    async fn resolves_zone_and_redacts_key() {
        let stub = StubHttpClient::new().respond_json("/v2.1/get-time-zone", BAHRAIN);
        let adapter = adapter(&stub, Some("tz-secret"));

        let info = adapter.timezone(sakhir()).await.expect("resolves");

        assert_eq!(info.zone_name, "Asia/Bahrain");
        assert_eq!(info.gmt_offset, Some(10_800));
        let request = &stub.requests()[0];
        assert!(request.url.contains("by=position"));
        assert!(request.url.contains("lat=26.0325"));
        assert!(!request.log_url.contains("tz-secret"));
    }

    #[tokio::test]
    async fn memoises_by_coordinates() {
        let stub = StubHttpClient::new().respond_json("/v2.1/get-time-zone", BAHRAIN);
        let base = adapter(&stub, Some("k"));
        let adapter = TimeZoneDbAdapter::with_cache(
            base.config.clone(),
            base
                .fetcher
                .clone()
                .with_cache(crate::cache::ResponseCache::disabled()),
            MemoCache::with_capacity(4),
        );

        for _ in 0..3 {
            adapter.timezone(sakhir()).await.expect("resolves");
        }

        assert_eq!(stub.request_count("/v2.1/get-time-zone"), 1);
    }

    #[tokio::test]
    async fn unconfigured_and_failed_lookups_fall_back_to_utc() {
        let stub = StubHttpClient::new().respond_json(
            "/v2.1/get-time-zone",
            r#"{"status":"FAILED","message":"Invalid API key."}"#,
        );

        let unconfigured = adapter(&stub, None);
        assert!(unconfigured
            .timezone(sakhir())
            .await
            .expect_err("no key")
            .is_not_configured());
        assert_eq!(zone_name_or_utc(&unconfigured, sakhir()).await, "UTC");
        assert_eq!(stub.request_count("/v2.1/get-time-zone"), 0);

        let rejected = adapter(&stub, Some("bad"));
        assert_eq!(zone_name_or_utc(&rejected, sakhir()).await, "UTC");
    }

    #[tokio::test]
    async fn unknown_zone_names_are_rejected() {
        let stub = StubHttpClient::new().respond_json(
            "/v2.1/get-time-zone",
            r#"{"status":"OK","zoneName":"Mars/Olympus"}"#,
        );

        let error = adapter(&stub, Some("k"))
            .timezone(sakhir())
            .await
            .expect_err("not an IANA zone");
        assert_eq!(error.code(), "source.rejected");
    }
}
