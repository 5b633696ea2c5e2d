//! # Pitlane Core
//!
//! Formula 1 season data aggregated from public providers, with bundled
//! sample data whenever a provider is down or not configured.
//!
//! ## Overview
//!
//! - **Canonical domain models** for races, sessions, drivers, teams and standings
//! - **Provider adapters** for Jolpica, OpenWeather, NewsAPI, YouTube, OpenF1,
//!   TimeZoneDB, Wikipedia and the API-Formula-1 track-status feed
//! - **Bounded-retry JSON fetching** with per-provider pacing and caching
//! - **Fallback store** of validated fixtures
//! - **Aggregation** that never fails: every view is tagged live or fallback
//! - **Response envelope** with metadata and structured errors
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Live provider adapters |
//! | [`aggregate`] | Season views with provider fallback |
//! | [`cache`] | Response and memo caches |
//! | [`config`] | Environment-driven configuration |
//! | [`data_source`] | Source traits and transfer types |
//! | [`domain`] | Domain models and zone-aware time helpers |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Core error types |
//! | [`fallback`] | Bundled sample datasets |
//! | [`fetch`] | JSON fetching with retry |
//! | [`http_client`] | HTTP client abstraction |
//! | [`locale`] | Localized notices |
//! | [`provider_policy`] | Per-provider pacing and freshness |
//! | [`retry`] | Retry configuration |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Rate limiting |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use pitlane_core::{Aggregator, PitlaneConfig, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PitlaneConfig::from_env()?;
//!     let http = Arc::new(ReqwestHttpClient::new(&config.http.user_agent));
//!     let aggregator = Aggregator::from_config(&config, http)?;
//!
//!     let next = aggregator.next_grand_prix(None, 2025).await;
//!     if let Some(grand_prix) = next.data {
//!         println!("next: round {} {}", grand_prix.round, grand_prix.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Aggregator     │────▶│ Fallback Store   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Source Traits   │────▶│ JSON Fetcher     │
//! │ (Adapters)      │     │ (retry, cache)   │
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ HTTP Client      │
//!                         │ (reqwest/stub)   │
//!                         └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapters return [`SourceError`]; the aggregator turns every failure into
//! fallback data plus a warning:
//!
//! ```rust
//! use pitlane_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::NotConfigured => "feature disabled",
//!         SourceErrorKind::Unavailable => "try again later",
//!         _ => "provider rejected the request",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from environment variables only and never logged
//! - Logged URLs have credentials stripped

pub mod adapters;
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod http_client;
pub mod locale;
pub mod provider_policy;
pub mod retry;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{
    F1LiveAdapter, JolpicaAdapter, NewsApiAdapter, OpenF1Adapter, OpenWeatherAdapter,
    TimeZoneDbAdapter, WikipediaAdapter, YouTubeAdapter,
};

// Aggregation
pub use aggregate::{
    Aggregator, AggregatorBuilder, Dashboard, DashboardOrigins, Origin, Resolved, WeatherReport,
};

// Caching
pub use cache::{MemoCache, ResponseCache};

// Configuration
pub use config::{
    F1LiveConfig, HttpSettings, JolpicaConfig, KeyedProviderConfig, OpenF1Config, PitlaneConfig,
    WikipediaConfig,
};

// Source traits and types
pub use data_source::{
    ConstructorStanding, DriverStanding, ImageSource, LiveTimingSource, NewsSource, SearchQuery,
    SeasonSource, SourceError, SourceErrorKind, SourceFuture, TimezoneSource, TrackStatusSource,
    VideoSource, WeatherSource,
};

// Domain models
pub use domain::{
    normalize_driver_code, validate_driver_code, Circuit, Driver, ForecastItem, GeoPoint,
    GrandPrix, LiveTimingEntry, LiveTimingSnapshot, MediaImage, NewsArticle, PodiumEntry,
    RaceResult, Session, SessionType, StandingEntry, StandingKind, Team, TelemetryEntry,
    TelemetrySnapshot, TimezoneInfo, TrackStatus, VideoItem, WeatherNow, WeatherSnapshot,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta, SCHEMA_VERSION};

// Error types
pub use error::{CoreError, ValidationError};

// Fallback data
pub use fallback::FallbackStore;

// Fetching
pub use fetch::{FetchError, FetchErrorKind, JsonFetcher, DEFAULT_USER_AGENT};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, StubHttpClient,
};

// Locale
pub use locale::{Locale, Notice};

// Provider policies
pub use provider_policy::ProviderPolicy;

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Source identifiers
pub use source::ProviderId;

// Throttling
pub use throttling::Throttle;
