//! Failure handling: broken providers, broken fixtures and invalid input.
//!
//! A provider outage must never surface as an error to the caller; invalid
//! caller input must never be papered over with sample data.

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use pitlane_core::domain::time::{localize, parse_local, parse_timezone, to_user_zone, to_zone_local};
use pitlane_core::{
    Aggregator, CoreError, Envelope, F1LiveAdapter, F1LiveConfig, FallbackStore, HttpResponse,
    JolpicaAdapter, JolpicaConfig, JsonFetcher, KeyedProviderConfig, Locale, NewsApiAdapter, Notice,
    OpenF1Adapter, OpenF1Config, OpenWeatherAdapter, Origin, PitlaneConfig, ProviderId,
    ProviderPolicy, Resolved, ResponseCache, RetryConfig, SearchQuery, StubHttpClient,
    TimeZoneDbAdapter, ValidationError, WikipediaAdapter, WikipediaConfig, YouTubeAdapter,
};

// =============================================================================
// Fixtures
// =============================================================================

fn fetcher(stub: &StubHttpClient, provider: ProviderId) -> JsonFetcher {
    let policy = ProviderPolicy {
        quota_limit: 1_000,
        ..ProviderPolicy::default_for(provider)
    };
    JsonFetcher::new(Arc::new(stub.clone()), policy)
        .with_retry(RetryConfig::linear(2, Duration::ZERO))
        .with_cache(ResponseCache::disabled())
}

/// Every provider configured, every provider answering 500.
fn broken_aggregator(stub: &StubHttpClient) -> Aggregator {
    let keyed = |base: &str| KeyedProviderConfig::unconfigured(base).with_api_key("key");
    let timezones = Arc::new(TimeZoneDbAdapter::new(
        keyed("https://tz.test"),
        fetcher(stub, ProviderId::TimeZoneDb),
    ));
    Aggregator::builder(FallbackStore::bundled().expect("bundled"))
        .season_source(Arc::new(JolpicaAdapter::new(
            JolpicaConfig {
                base_url: String::from("https://jolpica.test"),
            },
            fetcher(stub, ProviderId::Jolpica),
            timezones.clone(),
        )))
        .weather_source(Arc::new(OpenWeatherAdapter::new(
            keyed("https://owm.test"),
            fetcher(stub, ProviderId::OpenWeather),
        )))
        .news_source(Arc::new(NewsApiAdapter::new(
            keyed("https://news.test/v2"),
            fetcher(stub, ProviderId::NewsApi),
        )))
        .video_source(Arc::new(YouTubeAdapter::new(
            keyed("https://yt.test/v3"),
            fetcher(stub, ProviderId::YouTube),
        )))
        .live_timing_source(Arc::new(OpenF1Adapter::new(
            OpenF1Config {
                session_key: Some(String::from("9693")),
                base_url: String::from("https://openf1.test/v1"),
            },
            fetcher(stub, ProviderId::OpenF1),
        )))
        .timezone_source(timezones)
        .track_status_source(Arc::new(F1LiveAdapter::new(
            F1LiveConfig::unconfigured("https://f1live.test").with_api_key("key"),
            fetcher(stub, ProviderId::F1Live),
        )))
        .image_source(Arc::new(WikipediaAdapter::new(
            WikipediaConfig {
                base_url: String::from("https://wiki.test/w/api.php"),
            },
            fetcher(stub, ProviderId::Wikipedia),
        )))
        .build()
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

// =============================================================================
// Provider outages
// =============================================================================

#[tokio::test]
async fn when_every_provider_fails_every_view_still_resolves() {
    // Given: Every upstream answers 500
    let stub = StubHttpClient::new().respond("https://", HttpResponse::new(500, "down"));
    let aggregator = broken_aggregator(&stub);
    let store = aggregator.fallback().clone();
    let grand_prix = store.schedule()[0].clone();
    let query = SearchQuery::new("Formula 1", 6, Locale::Es).expect("valid query");

    // When: Each view is requested
    let schedule = aggregator.schedule(2025).await;
    let drivers = aggregator.drivers(2025).await;
    let teams = aggregator.teams_with_drivers(2025).await;
    let weather = aggregator.weather_for_grand_prix(&grand_prix, Locale::Es).await;
    let news = aggregator.news(&query).await;
    let videos = aggregator.highlights(&query).await;
    let live = aggregator.live_timing(None, Locale::Es).await;
    let result = aggregator.last_race_result(2025).await;
    let zone = aggregator
        .timezone(26.0325, 50.5106)
        .await
        .expect("valid coordinates");
    let track = aggregator.track_status(Locale::Es).await;

    // Then: Samples are served and each view explains why
    assert_eq!(schedule.data, store.schedule());
    assert_eq!(drivers.data.len(), store.drivers().len());
    assert_eq!(teams.data.len(), store.teams().len());
    assert!(!weather.data.live);
    assert!(news.data.is_empty());
    assert!(videos.data.is_empty());
    assert!(!live.data.available);
    assert_eq!(
        live.data.message.as_deref(),
        Some(Locale::Es.notice(Notice::LiveTimingFailed))
    );
    assert_eq!(&result.data, store.last_race());
    assert_eq!(zone.data.zone_name, "UTC");
    assert_eq!(track.data.flag, "N/A");
    assert_eq!(track.data.message, "Estado de pista no disponible");

    for (origin, warnings) in [
        (schedule.origin, &schedule.warnings),
        (drivers.origin, &drivers.warnings),
        (weather.origin, &weather.warnings),
        (news.origin, &news.warnings),
        (videos.origin, &videos.warnings),
        (live.origin, &live.warnings),
        (result.origin, &result.warnings),
        (zone.origin, &zone.warnings),
        (track.origin, &track.warnings),
    ] {
        assert_eq!(origin, Origin::Fallback);
        assert_eq!(warnings.len(), 1);
    }
    // Teams and drivers each contribute a warning
    assert_eq!(teams.warnings.len(), 2);
}

#[tokio::test]
async fn unconfigured_providers_are_never_called() {
    let stub = StubHttpClient::new();
    let unconfigured = |base: &str| KeyedProviderConfig::unconfigured(base);
    let aggregator = Aggregator::builder(FallbackStore::bundled().expect("bundled"))
        .weather_source(Arc::new(OpenWeatherAdapter::new(
            unconfigured("https://owm.test"),
            fetcher(&stub, ProviderId::OpenWeather),
        )))
        .news_source(Arc::new(NewsApiAdapter::new(
            unconfigured("https://news.test/v2"),
            fetcher(&stub, ProviderId::NewsApi),
        )))
        .video_source(Arc::new(YouTubeAdapter::new(
            unconfigured("https://yt.test/v3"),
            fetcher(&stub, ProviderId::YouTube),
        )))
        .timezone_source(Arc::new(TimeZoneDbAdapter::new(
            unconfigured("https://tz.test"),
            fetcher(&stub, ProviderId::TimeZoneDb),
        )))
        .build();
    let grand_prix = aggregator.fallback().schedule()[0].clone();
    let query = SearchQuery::new("F1", 3, Locale::En).expect("valid query");

    let weather = aggregator.weather_for_grand_prix(&grand_prix, Locale::En).await;
    let news = aggregator.news(&query).await;
    let videos = aggregator.highlights(&query).await;
    let zone = aggregator.timezone(0.0, 0.0).await.expect("valid coordinates");

    assert!(stub.requests().is_empty());
    assert!(weather.warnings[0].contains("OPENWEATHER_API_KEY"));
    assert!(news.warnings[0].contains("NEWS_API_KEY"));
    assert!(videos.warnings[0].contains("YOUTUBE_API_KEY"));
    assert_eq!(zone.data.zone_name, "UTC");
}

#[tokio::test]
async fn configured_retry_attempts_flow_into_every_fetcher() {
    // Given: Configuration from the environment with a single attempt
    let config = PitlaneConfig::from_lookup(lookup(&[
        ("JOLPICA_BASE_URL", "https://jolpica.test"),
        ("PITLANE_RETRY_ATTEMPTS", "1"),
        ("PITLANE_RETRY_BASE_MS", "0"),
    ]))
    .expect("valid configuration");
    let stub = StubHttpClient::new().respond("/2025.json", HttpResponse::new(503, "down"));
    let aggregator = Aggregator::from_config(&config, Arc::new(stub.clone())).expect("wired");

    // When: The schedule is requested
    let schedule = aggregator.schedule(2025).await;

    // Then: One attempt only, then the sample
    assert_eq!(schedule.origin, Origin::Fallback);
    assert_eq!(stub.request_count("/2025.json"), 1);
}

// =============================================================================
// Fixture overrides
// =============================================================================

#[test]
fn fixture_directory_overrides_only_the_files_it_contains() {
    // Given: A directory with a custom weather sample only
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join("weather-sample.json"),
        r#"{"now":{"temperatureC":31,"description":"hot","windKmh":4,"humidityPct":20},"forecast":[]}"#,
    )
    .expect("write override");

    // When: The store is loaded from it
    let store = FallbackStore::from_dir(dir.path()).expect("valid fixtures");
    let bundled = FallbackStore::bundled().expect("bundled");

    // Then: The override wins and everything else is bundled
    assert_eq!(store.weather_sample().now.temperature_c, 31);
    assert!(store.weather_sample().forecast.is_empty());
    assert_eq!(store.schedule(), bundled.schedule());
    assert_eq!(store.drivers(), bundled.drivers());
}

#[test]
fn malformed_fixture_is_reported_by_name() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("drivers.json"), "[{\"id\": ").expect("write override");

    let error = FallbackStore::from_dir(dir.path()).expect_err("malformed drivers");

    match error {
        CoreError::Fixture { name, .. } => assert_eq!(name, "drivers.json"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fixture_schedule_out_of_round_order_is_rejected() {
    let bundled = FallbackStore::bundled().expect("bundled");
    let mut schedule = bundled.schedule().to_vec();
    schedule.swap(0, 1);
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(
        dir.path().join("schedule.json"),
        serde_json::to_string(&schedule).expect("serialize"),
    )
    .expect("write override");

    let error = FallbackStore::from_dir(dir.path()).expect_err("unordered rounds");

    assert!(matches!(
        error,
        CoreError::Validation(ValidationError::UnorderedRound { round: 1 })
    ));
}

#[test]
fn broken_fixture_directory_fails_aggregator_construction() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("teams.json"), "not json").expect("write override");
    let dir_path = dir.path().display().to_string();
    let config = PitlaneConfig::from_lookup(lookup(&[("PITLANE_FIXTURES_DIR", dir_path.as_str())]))
        .expect("valid configuration");

    let result = Aggregator::from_config(&config, Arc::new(StubHttpClient::new()));

    assert!(matches!(result, Err(CoreError::Fixture { name: "teams.json", .. })));
}

// =============================================================================
// Invalid caller input
// =============================================================================

#[tokio::test]
async fn invalid_coordinates_are_rejected_before_any_request() {
    let stub = StubHttpClient::new();
    let aggregator = broken_aggregator(&stub);

    let out_of_range = aggregator.timezone(95.0, 10.0).await;
    let not_finite = aggregator.timezone(f64::NAN, 10.0).await;

    assert!(matches!(
        out_of_range,
        Err(ValidationError::CoordinateOutOfRange { field: "lat", .. })
    ));
    assert!(matches!(
        not_finite,
        Err(ValidationError::NonFiniteValue { field: "lat" })
    ));
    assert!(stub.requests().is_empty());
}

#[test]
fn search_queries_are_validated() {
    assert!(SearchQuery::new("   ", 6, Locale::Es).is_err());
    assert!(SearchQuery::new("F1", 0, Locale::Es).is_err());
    assert!(SearchQuery::new("F1", 6, Locale::Es).is_ok());
}

#[test]
fn invalid_configuration_values_are_rejected() {
    let bad_number = PitlaneConfig::from_lookup(lookup(&[("PITLANE_TIMEOUT_MS", "soon")]));
    assert!(matches!(
        bad_number,
        Err(ValidationError::InvalidSetting {
            name: "PITLANE_TIMEOUT_MS",
            ..
        })
    ));

    let zero_attempts = PitlaneConfig::from_lookup(lookup(&[("PITLANE_RETRY_ATTEMPTS", "0")]));
    assert!(zero_attempts.is_err());
}

#[test]
fn blank_credentials_count_as_unconfigured() {
    let config = PitlaneConfig::from_lookup(lookup(&[
        ("NEWS_API_KEY", "   "),
        ("YOUTUBE_API_KEY", "yt-key"),
        ("OPENF1_SESSION_KEY", ""),
    ]))
    .expect("valid configuration");

    let missing = config.unconfigured_features();

    assert!(missing.contains(&"news"));
    assert!(missing.contains(&"live_timing"));
    assert!(!missing.contains(&"videos"));
}

// =============================================================================
// Envelopes
// =============================================================================

#[test]
fn fallback_envelopes_carry_warnings_and_no_source() {
    let envelope = Envelope::from_resolved(
        "request-0001",
        Resolved::fallback(vec![1, 2, 3], "schedule: jolpica returned no races for 2025"),
        12,
    )
    .expect("valid envelope");

    assert_eq!(envelope.meta.origin, Origin::Fallback);
    assert!(envelope.meta.source_chain.is_empty());
    assert_eq!(envelope.meta.warnings.len(), 1);
    assert!(envelope.errors.is_empty());
}

#[test]
fn live_envelopes_name_their_provider() {
    let envelope = Envelope::from_resolved("request-0002", Resolved::live(ProviderId::Jolpica, ()), 3)
        .expect("valid envelope");

    assert_eq!(envelope.meta.source_chain, vec![ProviderId::Jolpica]);
    assert!(envelope.meta.warnings.is_empty());
}

#[test]
fn short_request_ids_are_rejected() {
    let result = Envelope::from_resolved("abc", Resolved::local(()), 0);

    assert!(matches!(result, Err(ValidationError::InvalidRequestId)));
}

// =============================================================================
// Time zone conversion
// =============================================================================

#[test]
fn converting_to_another_zone_and_back_restores_the_wall_clock() {
    let cases = [
        ("2025-03-16T15:00", "Australia/Melbourne", "America/Argentina/Cordoba"),
        ("2025-04-13T18:00", "Asia/Bahrain", "Europe/Madrid"),
        ("2025-10-19T14:00", "America/Chicago", "Asia/Tokyo"),
        ("2025-12-07T17:00", "Asia/Dubai", "UTC"),
    ];

    for (local, circuit, user) in cases {
        let local = parse_local(local).expect("valid local time");
        let converted = to_user_zone(local, circuit, user).expect("valid zones");
        let back = to_zone_local(&converted, circuit).expect("valid zone");
        assert_eq!(back, local, "{circuit} -> {user}");
    }
}

#[test]
fn daylight_saving_edges_resolve_deterministically() {
    let madrid = parse_timezone("Europe/Madrid").expect("known zone");

    // Clocks go forward at 02:00; 02:30 does not exist and moves to 03:30 CEST
    let gap = localize(parse_local("2025-03-30T02:30").expect("valid"), madrid).expect("shifted");
    assert_eq!(gap.to_rfc3339(), "2025-03-30T03:30:00+02:00");

    // Clocks go back at 03:00; 02:30 happens twice and the first one wins
    let overlap = localize(parse_local("2025-10-26T02:30").expect("valid"), madrid).expect("earliest");
    assert_eq!(overlap.to_rfc3339(), "2025-10-26T02:30:00+02:00");
}

#[test]
fn unknown_zones_are_rejected() {
    let local = parse_local("2025-03-16T15:00").expect("valid");

    assert!(matches!(
        to_user_zone(local, "Mars/Olympus", "UTC"),
        Err(ValidationError::InvalidTimezone { .. })
    ));
}
