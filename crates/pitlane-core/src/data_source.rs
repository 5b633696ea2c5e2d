//! Provider contracts and the transfer types they exchange.
//!
//! Each upstream concept gets its own trait so an aggregation can be wired
//! with any mix of live adapters and test doubles.
//!
//! | Trait | Concept | Live adapter |
//! |-------|---------|--------------|
//! | [`SeasonSource`] | schedule, standings, last result | Jolpica |
//! | [`WeatherSource`] | conditions and forecast | OpenWeather |
//! | [`NewsSource`] | articles | NewsAPI |
//! | [`VideoSource`] | highlights | YouTube |
//! | [`LiveTimingSource`] | positions and car data | OpenF1 |
//! | [`TimezoneSource`] | coordinates to IANA zone | TimeZoneDB |
//! | [`ImageSource`] | article images | Wikipedia |
//! | [`TrackStatusSource`] | race-control flag | API-Formula-1 |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::fetch::{FetchError, FetchErrorKind};
use crate::{
    GeoPoint, GrandPrix, LiveTimingSnapshot, Locale, MediaImage, NewsArticle, ProviderId,
    RaceResult, TelemetrySnapshot, TimezoneInfo, TrackStatus, ValidationError, VideoItem,
    WeatherSnapshot,
};

/// Boxed future returned by every source method.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Network failure or 5xx after retries.
    Unavailable,
    /// 4xx or a payload that could not be normalized.
    Rejected,
    /// No credential or session configured; a feature switch, not a failure.
    NotConfigured,
    InvalidRequest,
    Internal,
}

/// Structured source error consumed by the aggregation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Rejected,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_configured(provider: ProviderId, setting: &str) -> Self {
        Self {
            kind: SourceErrorKind::NotConfigured,
            message: format!("{provider} is disabled: {setting} is not set"),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn is_not_configured(&self) -> bool {
        matches!(self.kind, SourceErrorKind::NotConfigured)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Rejected => "source.rejected",
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<FetchError> for SourceError {
    fn from(error: FetchError) -> Self {
        match error.kind {
            FetchErrorKind::Transient => Self::unavailable(error.to_string()),
            FetchErrorKind::Permanent | FetchErrorKind::Malformed => {
                Self::rejected(error.to_string())
            }
        }
    }
}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::rejected(error.to_string())
    }
}

/// Driver row of a provider's standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStanding {
    pub position: u32,
    pub points: f64,
    pub wins: u32,
    pub driver_id: String,
    pub name: String,
    pub code: Option<String>,
    pub number: Option<u32>,
    pub nationality: Option<String>,
    pub team_id: Option<String>,
    pub team_name: Option<String>,
    /// Biography page, used for photo lookup.
    pub info_url: Option<String>,
}

/// Constructor row of a provider's standings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorStanding {
    pub position: u32,
    pub points: f64,
    pub wins: u32,
    pub team_id: String,
    pub name: String,
    pub nationality: Option<String>,
    pub info_url: Option<String>,
}

/// Search parameters shared by news and video sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub limit: usize,
    pub locale: Locale,
}

impl SearchQuery {
    pub const MAX_LIMIT: usize = 50;

    pub fn new(text: impl Into<String>, limit: usize, locale: Locale) -> Result<Self, SourceError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SourceError::invalid_request("search query must not be empty"));
        }
        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(SourceError::invalid_request(format!(
                "search limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }
        Ok(Self {
            text: text.trim().to_string(),
            limit,
            locale,
        })
    }
}

/// Season schedule, standings and results.
pub trait SeasonSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Races of `season` ordered by round; malformed races are dropped.
    fn schedule<'a>(&'a self, season: u32) -> SourceFuture<'a, Vec<GrandPrix>>;

    fn driver_standings<'a>(&'a self, season: u32) -> SourceFuture<'a, Vec<DriverStanding>>;

    fn constructor_standings<'a>(
        &'a self,
        season: u32,
    ) -> SourceFuture<'a, Vec<ConstructorStanding>>;

    /// `None` when the season has no completed race yet.
    fn last_race_result<'a>(&'a self, season: u32) -> SourceFuture<'a, Option<RaceResult>>;
}

pub trait WeatherSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Current conditions at the circuit plus one forecast item per session.
    fn weather<'a>(
        &'a self,
        grand_prix: &'a GrandPrix,
        locale: Locale,
    ) -> SourceFuture<'a, WeatherSnapshot>;
}

pub trait NewsSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn news<'a>(&'a self, query: &'a SearchQuery) -> SourceFuture<'a, Vec<NewsArticle>>;
}

pub trait VideoSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn videos<'a>(&'a self, query: &'a SearchQuery) -> SourceFuture<'a, Vec<VideoItem>>;
}

/// Live classification and car data.
///
/// A missing session or an empty classification is reported as an
/// unavailable snapshot, not an error.
pub trait LiveTimingSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn live_timing<'a>(
        &'a self,
        session_key: Option<&'a str>,
        locale: Locale,
    ) -> SourceFuture<'a, LiveTimingSnapshot>;

    fn telemetry<'a>(
        &'a self,
        session_key: Option<&'a str>,
        driver_number: Option<u32>,
        locale: Locale,
    ) -> SourceFuture<'a, TelemetrySnapshot>;
}

pub trait TimezoneSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn timezone<'a>(&'a self, geo: GeoPoint) -> SourceFuture<'a, TimezoneInfo>;
}

pub trait ImageSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Lead image of the article titled `title`, if it has one.
    fn image<'a>(&'a self, title: &'a str) -> SourceFuture<'a, Option<MediaImage>>;
}

pub trait TrackStatusSource: Send + Sync {
    fn id(&self) -> ProviderId;

    fn track_status<'a>(&'a self) -> SourceFuture<'a, TrackStatus>;
}
