use std::sync::Arc;
use std::time::Duration;

use pitlane_core::{
    FallbackStore, GeoPoint, GrandPrix, HttpResponse, ImageSource, JolpicaAdapter, JolpicaConfig,
    JsonFetcher, KeyedProviderConfig, LiveTimingSource, Locale, NewsApiAdapter, NewsSource,
    OpenF1Adapter, OpenF1Config, OpenWeatherAdapter, ProviderId, ProviderPolicy, ResponseCache,
    RetryConfig, SearchQuery, SeasonSource, SourceError, SourceErrorKind, StubHttpClient,
    TimeZoneDbAdapter, TimezoneSource, VideoSource, WeatherSource, WikipediaAdapter,
    WikipediaConfig, YouTubeAdapter,
};

/// One keyed provider behind its concept trait.
#[derive(Clone)]
enum KeyedSource {
    Weather(Arc<dyn WeatherSource>),
    News(Arc<dyn NewsSource>),
    Videos(Arc<dyn VideoSource>),
    Timezone(Arc<dyn TimezoneSource>),
}

impl KeyedSource {
    fn id(&self) -> ProviderId {
        match self {
            Self::Weather(source) => source.id(),
            Self::News(source) => source.id(),
            Self::Videos(source) => source.id(),
            Self::Timezone(source) => source.id(),
        }
    }

    /// Issues one representative call and discards the payload.
    async fn probe(&self) -> Result<(), SourceError> {
        let query = SearchQuery::new("Formula 1", 3, Locale::Es).expect("valid query");
        match self {
            Self::Weather(source) => source.weather(&grand_prix(), Locale::Es).await.map(drop),
            Self::News(source) => source.news(&query).await.map(drop),
            Self::Videos(source) => source.videos(&query).await.map(drop),
            Self::Timezone(source) => source
                .timezone(GeoPoint::new(26.0325, 50.5106).expect("valid"))
                .await
                .map(drop),
        }
    }
}

struct ProviderCase {
    id: ProviderId,
    source: KeyedSource,
}

fn fetcher(stub: &StubHttpClient, provider: ProviderId) -> JsonFetcher {
    let policy = ProviderPolicy {
        quota_limit: 1_000,
        ..ProviderPolicy::default_for(provider)
    };
    JsonFetcher::new(Arc::new(stub.clone()), policy)
        .with_retry(RetryConfig::linear(2, Duration::ZERO))
        .with_cache(ResponseCache::disabled())
}

fn grand_prix() -> GrandPrix {
    FallbackStore::bundled().expect("bundled").schedule()[0].clone()
}

fn keyed_cases(stub: &StubHttpClient, api_key: Option<&str>) -> Vec<ProviderCase> {
    let config = |base: &str| {
        let mut config = KeyedProviderConfig::unconfigured(base);
        config.api_key = api_key.map(str::to_string);
        config
    };

    vec![
        ProviderCase {
            id: ProviderId::OpenWeather,
            source: KeyedSource::Weather(Arc::new(OpenWeatherAdapter::new(
                config("https://owm.test"),
                fetcher(stub, ProviderId::OpenWeather),
            ))),
        },
        ProviderCase {
            id: ProviderId::NewsApi,
            source: KeyedSource::News(Arc::new(NewsApiAdapter::new(
                config("https://news.test/v2"),
                fetcher(stub, ProviderId::NewsApi),
            ))),
        },
        ProviderCase {
            id: ProviderId::YouTube,
            source: KeyedSource::Videos(Arc::new(YouTubeAdapter::new(
                config("https://yt.test/v3"),
                fetcher(stub, ProviderId::YouTube),
            ))),
        },
        ProviderCase {
            id: ProviderId::TimeZoneDb,
            source: KeyedSource::Timezone(Arc::new(TimeZoneDbAdapter::new(
                config("https://tz.test"),
                fetcher(stub, ProviderId::TimeZoneDb),
            ))),
        },
    ]
}

fn jolpica(stub: &StubHttpClient) -> JolpicaAdapter {
    let timezones = Arc::new(TimeZoneDbAdapter::new(
        KeyedProviderConfig::unconfigured("https://tz.test"),
        fetcher(stub, ProviderId::TimeZoneDb),
    ));
    JolpicaAdapter::new(
        JolpicaConfig {
            base_url: String::from("https://jolpica.test"),
        },
        fetcher(stub, ProviderId::Jolpica),
        timezones,
    )
}

#[tokio::test]
async fn every_adapter_reports_its_provider_id() {
    let stub = StubHttpClient::new();

    for case in keyed_cases(&stub, Some("key")) {
        assert_eq!(case.source.id(), case.id);
    }
    assert_eq!(jolpica(&stub).id(), ProviderId::Jolpica);
    assert_eq!(
        OpenF1Adapter::new(OpenF1Config::default(), fetcher(&stub, ProviderId::OpenF1)).id(),
        ProviderId::OpenF1
    );
    assert_eq!(
        WikipediaAdapter::new(WikipediaConfig::default(), fetcher(&stub, ProviderId::Wikipedia))
            .id(),
        ProviderId::Wikipedia
    );
}

#[tokio::test]
async fn unconfigured_keyed_providers_fail_fast_without_requests() {
    let stub = StubHttpClient::new();

    for case in keyed_cases(&stub, None) {
        let error = case
            .source
            .probe()
            .await
            .expect_err("missing key must not succeed");
        assert_eq!(
            error.kind(),
            SourceErrorKind::NotConfigured,
            "provider '{}': error kind",
            case.id
        );
        assert!(!error.retryable(), "provider '{}': retryable", case.id);
        assert_eq!(error.code(), "source.not_configured");
    }

    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn outages_are_unavailable_and_retryable() {
    let stub = StubHttpClient::new().respond("https://", HttpResponse::new(503, "maintenance"));

    for case in keyed_cases(&stub, Some("key")) {
        let error = case.source.probe().await.expect_err("upstream is down");
        assert_eq!(
            error.kind(),
            SourceErrorKind::Unavailable,
            "provider '{}': error kind",
            case.id
        );
        assert!(error.retryable(), "provider '{}': retryable", case.id);
    }
}

#[tokio::test]
async fn unexpected_payloads_are_rejected_without_retry() {
    let stub = StubHttpClient::new().respond_json("https://", "[1, 2, 3]");

    for case in keyed_cases(&stub, Some("key")) {
        let error = case.source.probe().await.expect_err("wrong shape");
        assert_eq!(
            error.kind(),
            SourceErrorKind::Rejected,
            "provider '{}': error kind",
            case.id
        );
        assert!(!error.retryable(), "provider '{}': retryable", case.id);
    }

    // OpenWeather issues two requests; every other provider one
    assert_eq!(stub.requests().len(), 5);
}

#[tokio::test]
async fn search_providers_never_exceed_the_requested_limit() {
    let stub = StubHttpClient::new()
        .respond_json(
            "/everything",
            r#"{"status":"ok","articles":[
                {"title":"One","url":"https://a.test/1"},
                {"title":"Two","url":"https://a.test/2"},
                {"title":"Three","url":"https://a.test/3"}
            ]}"#,
        )
        .respond_json(
            "/search",
            r#"{"items":[
                {"id":{"videoId":"a"},"snippet":{"title":"A"}},
                {"id":{"videoId":"b"},"snippet":{"title":"B"}},
                {"id":{"videoId":"c"},"snippet":{"title":"C"}}
            ]}"#,
        );
    let query = SearchQuery::new("F1", 2, Locale::En).expect("valid query");
    let key = |base: &str| KeyedProviderConfig::unconfigured(base).with_api_key("key");

    let news = NewsApiAdapter::new(key("https://news.test/v2"), fetcher(&stub, ProviderId::NewsApi))
        .news(&query)
        .await
        .expect("articles");
    let videos = YouTubeAdapter::new(key("https://yt.test/v3"), fetcher(&stub, ProviderId::YouTube))
        .videos(&query)
        .await
        .expect("videos");

    assert_eq!(news.len(), 2);
    assert_eq!(videos.len(), 2);
    for request in stub.requests() {
        assert!(
            request.url.contains("pageSize=2") || request.url.contains("maxResults=2"),
            "limit missing from {}",
            request.url
        );
    }
}

#[tokio::test]
async fn season_source_tolerates_empty_tables() {
    let stub = StubHttpClient::new().respond_json("https://jolpica.test", r#"{"MRData":{}}"#);
    let season = jolpica(&stub);

    assert!(season.schedule(2025).await.expect("schedule").is_empty());
    assert!(season
        .driver_standings(2025)
        .await
        .expect("driver standings")
        .is_empty());
    assert!(season
        .constructor_standings(2025)
        .await
        .expect("constructor standings")
        .is_empty());
    assert!(season
        .last_race_result(2025)
        .await
        .expect("last race")
        .is_none());
}

#[tokio::test]
async fn live_timing_without_a_session_is_a_hint_not_an_error() {
    let stub = StubHttpClient::new();
    let live = OpenF1Adapter::new(
        OpenF1Config {
            session_key: None,
            base_url: String::from("https://openf1.test/v1"),
        },
        fetcher(&stub, ProviderId::OpenF1),
    );

    let timing = live.live_timing(None, Locale::Es).await.expect("snapshot");
    let telemetry = live.telemetry(None, Some(1), Locale::Es).await.expect("snapshot");

    assert!(!timing.available);
    assert!(timing.message.is_some());
    assert!(!telemetry.available);
    assert!(telemetry.message.is_some());
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn image_lookup_rejects_blank_titles_and_tolerates_missing_pages() {
    let stub = StubHttpClient::new().respond_json("titles=Nobody", r#"{"query":{"pages":{"-1":{}}}}"#);
    let images = WikipediaAdapter::new(
        WikipediaConfig {
            base_url: String::from("https://wiki.test/w/api.php"),
        },
        fetcher(&stub, ProviderId::Wikipedia),
    );

    let blank = images.image("  ").await.expect_err("blank title");
    let missing = images.image("Nobody").await.expect("lookup succeeds");

    assert_eq!(blank.kind(), SourceErrorKind::InvalidRequest);
    assert!(missing.is_none());
    assert_eq!(stub.requests().len(), 1);
}
