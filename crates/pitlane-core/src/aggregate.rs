//! Season-level views over the provider adapters.
//!
//! Every operation tries the live provider once and, on any failure, answers
//! from the [`FallbackStore`]. Provider errors never escape this module: they
//! become a `tracing` event plus a warning on the returned [`Resolved`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapters::{
    session_label, title_from_url, F1LiveAdapter, JolpicaAdapter, NewsApiAdapter, OpenF1Adapter,
    OpenWeatherAdapter, TimeZoneDbAdapter, WikipediaAdapter, YouTubeAdapter,
};
use crate::config::PitlaneConfig;
use crate::data_source::{
    ConstructorStanding, DriverStanding, ImageSource, LiveTimingSource, NewsSource, SearchQuery,
    SeasonSource, SourceError, SourceFuture, TimezoneSource, TrackStatusSource, VideoSource,
    WeatherSource,
};
use crate::fallback::FallbackStore;
use crate::http_client::HttpClient;
use crate::locale::Notice;
use crate::{
    normalize_driver_code, CoreError, Driver, GeoPoint, GrandPrix, LiveTimingSnapshot, Locale,
    MediaImage, NewsArticle, ProviderId, RaceResult, StandingEntry, Team, TelemetrySnapshot,
    TimezoneInfo, TrackStatus, ValidationError, VideoItem, WeatherSnapshot,
};

pub const DEFAULT_NEWS_QUERY: &str = "Formula 1";
pub const DEFAULT_HIGHLIGHTS_QUERY: &str = "F1 highlights";
pub const DEFAULT_SEARCH_LIMIT: usize = 6;

const PLACEHOLDER_LIVERY: &str = "/liveries/placeholder-team.svg";
const UNKNOWN_TEAM: &str = "unknown";

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "provider", rename_all = "snake_case")]
pub enum Origin {
    Live(ProviderId),
    Fallback,
    /// Computed without consulting any provider.
    Local,
}

impl Origin {
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live(_))
    }

    pub fn sources(self) -> Vec<ProviderId> {
        match self {
            Self::Live(provider) => vec![provider],
            Self::Fallback | Self::Local => Vec::new(),
        }
    }
}

/// A value tagged with its origin and any degradation warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolved<T> {
    pub data: T,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> Resolved<T> {
    pub fn live(provider: ProviderId, data: T) -> Self {
        Self {
            data,
            origin: Origin::Live(provider),
            warnings: Vec::new(),
        }
    }

    pub fn local(data: T) -> Self {
        Self {
            data,
            origin: Origin::Local,
            warnings: Vec::new(),
        }
    }

    pub fn fallback(data: T, warning: impl Into<String>) -> Self {
        Self {
            data,
            origin: Origin::Fallback,
            warnings: vec![warning.into()],
        }
    }

    pub const fn is_live(&self) -> bool {
        self.origin.is_live()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            data: f(self.data),
            origin: self.origin,
            warnings: self.warnings,
        }
    }
}

/// Weather for one Grand Prix; `notice` is set whenever `live` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub live: bool,
    pub weather: WeatherSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub drivers: Vec<Driver>,
    pub teams: Vec<Team>,
    pub schedule: Vec<GrandPrix>,
    pub next_grand_prix: Option<GrandPrix>,
    pub origins: DashboardOrigins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOrigins {
    pub drivers: Origin,
    pub teams: Origin,
    pub schedule: Origin,
}

/// Entry point for every season-level view.
#[derive(Clone)]
pub struct Aggregator {
    season: Arc<dyn SeasonSource>,
    weather: Arc<dyn WeatherSource>,
    news: Arc<dyn NewsSource>,
    videos: Arc<dyn VideoSource>,
    live: Arc<dyn LiveTimingSource>,
    timezones: Arc<dyn TimezoneSource>,
    track: Arc<dyn TrackStatusSource>,
    images: Option<Arc<dyn ImageSource>>,
    fallback: Arc<FallbackStore>,
}

impl Aggregator {
    pub fn builder(fallback: FallbackStore) -> AggregatorBuilder {
        AggregatorBuilder::new(fallback)
    }

    /// Wires every live adapter from `config` over `http`.
    pub fn from_config(config: &PitlaneConfig, http: Arc<dyn HttpClient>) -> Result<Self, CoreError> {
        let fallback = match &config.fixtures_dir {
            Some(dir) => FallbackStore::from_dir(dir)?,
            None => FallbackStore::bundled()?,
        };
        let fetcher = |provider| config.http.fetcher_for(Arc::clone(&http), provider);

        // Bundled circuits are answered from memory; TimeZoneDB allows one request a second.
        let circuits: Vec<_> = fallback
            .schedule()
            .iter()
            .map(|grand_prix| grand_prix.circuit.clone())
            .collect();
        let timezones: Arc<dyn TimezoneSource> = Arc::new(TimeZoneDbAdapter::with_known_circuits(
            config.timezonedb.clone(),
            fetcher(ProviderId::TimeZoneDb),
            &circuits,
        ));
        let season = JolpicaAdapter::new(
            config.jolpica.clone(),
            fetcher(ProviderId::Jolpica),
            Arc::clone(&timezones),
        );

        for feature in config.unconfigured_features() {
            tracing::debug!(feature, "provider not configured; sample data will be used");
        }

        Ok(AggregatorBuilder::new(fallback)
            .season_source(Arc::new(season))
            .weather_source(Arc::new(OpenWeatherAdapter::new(
                config.openweather.clone(),
                fetcher(ProviderId::OpenWeather),
            )))
            .news_source(Arc::new(NewsApiAdapter::new(
                config.newsapi.clone(),
                fetcher(ProviderId::NewsApi),
            )))
            .video_source(Arc::new(YouTubeAdapter::new(
                config.youtube.clone(),
                fetcher(ProviderId::YouTube),
            )))
            .live_timing_source(Arc::new(OpenF1Adapter::new(
                config.openf1.clone(),
                fetcher(ProviderId::OpenF1),
            )))
            .timezone_source(timezones)
            .track_status_source(Arc::new(F1LiveAdapter::new(
                config.f1live.clone(),
                fetcher(ProviderId::F1Live),
            )))
            .image_source(Arc::new(WikipediaAdapter::new(
                config.wikipedia.clone(),
                fetcher(ProviderId::Wikipedia),
            )))
            .build())
    }

    pub fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }

    /// Season schedule ordered by round; an empty provider answer counts as a failure.
    pub async fn schedule(&self, season: u32) -> Resolved<Vec<GrandPrix>> {
        let provider = self.season.id();
        match self.season.schedule(season).await {
            Ok(races) if !races.is_empty() => Resolved::live(provider, races),
            Ok(_) => {
                tracing::warn!(%provider, season, "provider returned no races; using sample schedule");
                Resolved::fallback(
                    self.fallback.schedule().to_vec(),
                    format!("schedule: {provider} returned no races for {season}"),
                )
            }
            Err(error) => Resolved::fallback(
                self.fallback.schedule().to_vec(),
                degraded("schedule", provider, &error),
            ),
        }
    }

    /// First Grand Prix whose reference session starts strictly after
    /// `reference` (default: now). `None` once the season is over.
    pub async fn next_grand_prix(
        &self,
        reference: Option<DateTime<Utc>>,
        season: u32,
    ) -> Resolved<Option<GrandPrix>> {
        let reference = reference.unwrap_or_else(Utc::now);
        self.schedule(season)
            .await
            .map(|schedule| next_after(&schedule, reference))
    }

    pub async fn grand_prix_by_round(&self, round: u32, season: u32) -> Resolved<Option<GrandPrix>> {
        self.schedule(season).await.map(|schedule| {
            schedule
                .into_iter()
                .find(|grand_prix| grand_prix.round == round)
        })
    }

    /// Drivers merged with bundled metadata, ordered by points.
    pub async fn drivers(&self, season: u32) -> Resolved<Vec<Driver>> {
        let provider = self.season.id();
        let rows = match self.season.driver_standings(season).await {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                tracing::warn!(%provider, season, "provider returned no driver standings");
                return Resolved::fallback(
                    self.fallback_drivers(),
                    format!("drivers: {provider} returned no standings for {season}"),
                );
            }
            Err(error) => {
                return Resolved::fallback(
                    self.fallback_drivers(),
                    degraded("drivers", provider, &error),
                );
            }
        };

        let mut drivers: Vec<Driver> = rows.iter().map(|row| self.merge_driver(row)).collect();
        self.attach_driver_photos(&mut drivers, &rows).await;
        append_missing(&mut drivers, self.fallback.drivers(), |driver| {
            let mut driver = driver.clone();
            driver.points = self.fallback.driver_points(&driver.id);
            driver
        });
        sort_by_points(&mut drivers, |driver| driver.points);
        Resolved::live(provider, drivers)
    }

    pub async fn driver_standings(&self, season: u32) -> Resolved<Vec<StandingEntry>> {
        self.drivers(season).await.map(|drivers| {
            rank(
                drivers
                    .into_iter()
                    .map(|driver| (driver.id, driver.name, driver.points)),
            )
        })
    }

    pub async fn team_standings(&self, season: u32) -> Resolved<Vec<StandingEntry>> {
        self.team_records(season).await.map(|teams| {
            rank(teams.into_iter().map(|team| (team.id, team.name, team.points)))
        })
    }

    /// Teams ordered by points, each carrying the ids of its drivers.
    pub async fn teams_with_drivers(&self, season: u32) -> Resolved<Vec<Team>> {
        let (teams, drivers) = tokio::join!(self.team_records(season), self.drivers(season));
        let mut resolved = teams.map(|teams| attach_drivers(teams, &drivers.data));
        resolved.warnings.extend(drivers.warnings);
        resolved
    }

    pub async fn weather_for_grand_prix(
        &self,
        grand_prix: &GrandPrix,
        locale: Locale,
    ) -> Resolved<WeatherReport> {
        let provider = self.weather.id();
        match self.weather.weather(grand_prix, locale).await {
            Ok(weather) => Resolved::live(
                provider,
                WeatherReport {
                    live: true,
                    weather,
                    notice: None,
                },
            ),
            Err(error) => Resolved::fallback(
                WeatherReport {
                    live: false,
                    weather: self.fallback.weather_sample().clone(),
                    notice: Some(locale.notice(Notice::WeatherSample).to_string()),
                },
                degraded("weather", provider, &error),
            ),
        }
    }

    /// Latest articles; empty when the provider is unavailable.
    pub async fn news(&self, query: &SearchQuery) -> Resolved<Vec<NewsArticle>> {
        let provider = self.news.id();
        match self.news.news(query).await {
            Ok(articles) => Resolved::live(provider, articles),
            Err(error) => Resolved::fallback(Vec::new(), degraded("news", provider, &error)),
        }
    }

    pub async fn highlights(&self, query: &SearchQuery) -> Resolved<Vec<VideoItem>> {
        let provider = self.videos.id();
        match self.videos.videos(query).await {
            Ok(videos) => Resolved::live(provider, videos),
            Err(error) => Resolved::fallback(Vec::new(), degraded("highlights", provider, &error)),
        }
    }

    /// Never fails; every unavailable snapshot carries a localized message.
    pub async fn live_timing(
        &self,
        session_key: Option<&str>,
        locale: Locale,
    ) -> Resolved<LiveTimingSnapshot> {
        let provider = self.live.id();
        match self.live.live_timing(session_key, locale).await {
            Ok(snapshot) => Resolved::live(provider, snapshot),
            Err(error) => {
                let notice = if error.is_not_configured() {
                    Notice::LiveTimingUnconfigured
                } else {
                    Notice::LiveTimingFailed
                };
                Resolved::fallback(
                    LiveTimingSnapshot::unavailable(locale.notice(notice), Utc::now()),
                    degraded("live timing", provider, &error),
                )
            }
        }
    }

    /// The bundled classification, for demos and offline rendering.
    pub fn live_timing_sample(&self, locale: Locale) -> Resolved<LiveTimingSnapshot> {
        Resolved::fallback(
            self.fallback.live_snapshot(Utc::now()),
            locale.notice(Notice::SampleData),
        )
    }

    pub async fn telemetry(
        &self,
        session_key: Option<&str>,
        driver_number: Option<u32>,
        locale: Locale,
    ) -> Resolved<TelemetrySnapshot> {
        let provider = self.live.id();
        match self.live.telemetry(session_key, driver_number, locale).await {
            Ok(snapshot) => Resolved::live(provider, snapshot),
            Err(error) => {
                let notice = if error.is_not_configured() {
                    Notice::TelemetryUnconfigured
                } else {
                    Notice::TelemetryFailed
                };
                let session = session_key.map(session_label).unwrap_or_default();
                Resolved::fallback(
                    TelemetrySnapshot::unavailable(session, locale.notice(notice), Utc::now()),
                    degraded("telemetry", provider, &error),
                )
            }
        }
    }

    pub async fn last_race_result(&self, season: u32) -> Resolved<RaceResult> {
        let provider = self.season.id();
        match self.season.last_race_result(season).await {
            Ok(Some(result)) => Resolved::live(provider, result),
            Ok(None) => Resolved::fallback(
                self.fallback.last_race().clone(),
                format!("results: {provider} has no completed race for {season}"),
            ),
            Err(error) => Resolved::fallback(
                self.fallback.last_race().clone(),
                degraded("results", provider, &error),
            ),
        }
    }

    /// Zone for coordinates; UTC when the lookup is unavailable.
    pub async fn timezone(&self, lat: f64, lng: f64) -> Result<Resolved<TimezoneInfo>, ValidationError> {
        let geo = GeoPoint::new(lat, lng)?;
        let provider = self.timezones.id();
        Ok(match self.timezones.timezone(geo).await {
            Ok(info) => Resolved::live(provider, info),
            Err(error) => Resolved::fallback(TimezoneInfo::utc(), degraded("timezone", provider, &error)),
        })
    }

    /// Current race-control flag; `"N/A"` with a localized message when the
    /// feed is unavailable.
    pub async fn track_status(&self, locale: Locale) -> Resolved<TrackStatus> {
        let provider = self.track.id();
        match self.track.track_status().await {
            Ok(status) => Resolved::live(provider, status),
            Err(error) => Resolved::fallback(
                TrackStatus::unknown(locale.notice(Notice::TrackStatusUnavailable)),
                degraded("track status", provider, &error),
            ),
        }
    }

    /// Lead images for article titles, looked up concurrently.
    ///
    /// Blank titles, missing articles and failed lookups are left out; each
    /// failure adds a warning. The result is a fallback only when no source is
    /// wired or every lookup failed.
    pub async fn images(&self, titles: &[String]) -> Resolved<Vec<MediaImage>> {
        let Some(source) = self.images.as_deref() else {
            return Resolved::fallback(Vec::new(), "images: no image source configured");
        };
        let provider = source.id();
        let titles: Vec<&str> = titles
            .iter()
            .map(|title| title.trim())
            .filter(|title| !title.is_empty())
            .collect();

        let lookups =
            futures::future::join_all(titles.iter().map(|title| source.image(title))).await;

        let mut found = Vec::new();
        let mut warnings = Vec::new();
        for (title, lookup) in titles.iter().zip(lookups) {
            match lookup {
                Ok(Some(image)) if !image.url.is_empty() => found.push(image),
                Ok(_) => {}
                Err(error) => {
                    let warning = degraded("images", provider, &error);
                    warnings.push(format!("{warning} ({title})"));
                }
            }
        }

        let all_failed = !titles.is_empty() && warnings.len() == titles.len();
        Resolved {
            data: found,
            origin: if all_failed {
                Origin::Fallback
            } else {
                Origin::Live(provider)
            },
            warnings,
        }
    }

    /// Drivers, teams, schedule and the next Grand Prix, fetched concurrently.
    ///
    /// Each branch degrades on its own; the result is live only when every
    /// branch is.
    pub async fn dashboard(&self, season: u32, reference: Option<DateTime<Utc>>) -> Resolved<Dashboard> {
        let reference = reference.unwrap_or_else(Utc::now);
        let (drivers, teams, schedule) = tokio::join!(
            self.drivers(season),
            self.team_records(season),
            self.schedule(season),
        );

        let origins = DashboardOrigins {
            drivers: drivers.origin,
            teams: teams.origin,
            schedule: schedule.origin,
        };
        let origin = if drivers.is_live() && teams.is_live() && schedule.is_live() {
            schedule.origin
        } else {
            Origin::Fallback
        };
        let mut warnings = Vec::new();
        warnings.extend(drivers.warnings);
        warnings.extend(teams.warnings);
        warnings.extend(schedule.warnings);

        let next_grand_prix = next_after(&schedule.data, reference);
        Resolved {
            data: Dashboard {
                teams: attach_drivers(teams.data, &drivers.data),
                drivers: drivers.data,
                schedule: schedule.data,
                next_grand_prix,
                origins,
            },
            origin,
            warnings,
        }
    }

    async fn team_records(&self, season: u32) -> Resolved<Vec<Team>> {
        let provider = self.season.id();
        let rows = match self.season.constructor_standings(season).await {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                tracing::warn!(%provider, season, "provider returned no constructor standings");
                return Resolved::fallback(
                    self.fallback_teams(),
                    format!("teams: {provider} returned no standings for {season}"),
                );
            }
            Err(error) => {
                return Resolved::fallback(self.fallback_teams(), degraded("teams", provider, &error));
            }
        };

        let mut teams: Vec<Team> = rows.iter().map(|row| self.merge_team(row)).collect();
        self.attach_liveries(&mut teams, &rows).await;
        append_missing(&mut teams, self.fallback.teams(), |team| {
            let mut team = team.clone();
            team.points = self.fallback.team_points(&team.id);
            team
        });
        sort_by_points(&mut teams, |team| team.points);
        Resolved::live(provider, teams)
    }

    fn fallback_drivers(&self) -> Vec<Driver> {
        let mut drivers: Vec<Driver> = self
            .fallback
            .drivers()
            .iter()
            .map(|driver| Driver {
                points: self.fallback.driver_points(&driver.id),
                ..driver.clone()
            })
            .collect();
        sort_by_points(&mut drivers, |driver| driver.points);
        drivers
    }

    fn fallback_teams(&self) -> Vec<Team> {
        let mut teams: Vec<Team> = self
            .fallback
            .teams()
            .iter()
            .map(|team| Team {
                points: self.fallback.team_points(&team.id),
                ..team.clone()
            })
            .collect();
        sort_by_points(&mut teams, |team| team.points);
        teams
    }

    fn merge_driver(&self, row: &DriverStanding) -> Driver {
        let known = self.fallback.driver(&row.driver_id);
        let code = known
            .map(|driver| driver.code.clone())
            .or_else(|| row.code.as_deref().and_then(|code| normalize_driver_code(code).ok()))
            .or_else(|| {
                row.name
                    .split_whitespace()
                    .last()
                    .and_then(|family| normalize_driver_code(family).ok())
            })
            .unwrap_or_else(|| String::from("UNK"));

        Driver {
            id: row.driver_id.clone(),
            code,
            name: row.name.clone(),
            number: row
                .number
                .or_else(|| known.map(|driver| driver.number))
                .unwrap_or(row.position),
            country: row
                .nationality
                .clone()
                .or_else(|| known.map(|driver| driver.country.clone()))
                .unwrap_or_default(),
            team_id: row
                .team_id
                .clone()
                .or_else(|| known.map(|driver| driver.team_id.clone()))
                .unwrap_or_else(|| UNKNOWN_TEAM.to_string()),
            points: row.points,
            photo_url: known.and_then(|driver| driver.photo_url.clone()),
        }
    }

    fn merge_team(&self, row: &ConstructorStanding) -> Team {
        let known = self.fallback.team(&row.team_id);
        Team {
            id: row.team_id.clone(),
            name: row.name.clone(),
            power_unit: known.and_then(|team| team.power_unit.clone()),
            livery_url: known
                .map(|team| team.livery_url.clone())
                .unwrap_or_else(|| PLACEHOLDER_LIVERY.to_string()),
            driver_ids: known.map(|team| team.driver_ids.clone()).unwrap_or_default(),
            points: row.points,
        }
    }

    /// Photos for drivers the bundled metadata does not know.
    async fn attach_driver_photos(&self, drivers: &mut [Driver], rows: &[DriverStanding]) {
        let titles: Vec<Option<String>> = drivers
            .iter()
            .zip(rows)
            .map(|(driver, row)| match driver.photo_url {
                Some(_) => None,
                None => row.info_url.as_deref().and_then(title_from_url),
            })
            .collect();
        let images = self.lookup_images(&titles).await;
        for (driver, image) in drivers.iter_mut().zip(images) {
            if let Some(image) = image {
                driver.photo_url = Some(image.url);
            }
        }
    }

    async fn attach_liveries(&self, teams: &mut [Team], rows: &[ConstructorStanding]) {
        let titles: Vec<Option<String>> = teams
            .iter()
            .zip(rows)
            .map(|(team, row)| {
                if self.fallback.team(&team.id).is_some() {
                    None
                } else {
                    row.info_url.as_deref().and_then(title_from_url)
                }
            })
            .collect();
        let images = self.lookup_images(&titles).await;
        for (team, image) in teams.iter_mut().zip(images) {
            if let Some(image) = image {
                team.livery_url = image.url;
            }
        }
    }

    async fn lookup_images(&self, titles: &[Option<String>]) -> Vec<Option<MediaImage>> {
        let Some(images) = self.images.as_deref() else {
            return vec![None; titles.len()];
        };
        futures::future::join_all(titles.iter().map(|title| async move {
            let title = title.as_deref()?;
            match images.image(title).await {
                Ok(image) => image,
                Err(error) => {
                    tracing::debug!(provider = %images.id(), title, %error, "image lookup failed");
                    None
                }
            }
        }))
        .await
    }
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("season", &self.season.id())
            .field("weather", &self.weather.id())
            .field("news", &self.news.id())
            .field("videos", &self.videos.id())
            .field("live", &self.live.id())
            .field("timezones", &self.timezones.id())
            .field("track", &self.track.id())
            .field("images", &self.images.as_ref().map(|images| images.id()))
            .finish_non_exhaustive()
    }
}

/// Assembles an [`Aggregator`]; any source left unset reports itself as not
/// configured.
pub struct AggregatorBuilder {
    fallback: FallbackStore,
    season: Option<Arc<dyn SeasonSource>>,
    weather: Option<Arc<dyn WeatherSource>>,
    news: Option<Arc<dyn NewsSource>>,
    videos: Option<Arc<dyn VideoSource>>,
    live: Option<Arc<dyn LiveTimingSource>>,
    timezones: Option<Arc<dyn TimezoneSource>>,
    track: Option<Arc<dyn TrackStatusSource>>,
    images: Option<Arc<dyn ImageSource>>,
}

impl AggregatorBuilder {
    pub fn new(fallback: FallbackStore) -> Self {
        Self {
            fallback,
            season: None,
            weather: None,
            news: None,
            videos: None,
            live: None,
            timezones: None,
            track: None,
            images: None,
        }
    }

    pub fn season_source(mut self, source: Arc<dyn SeasonSource>) -> Self {
        self.season = Some(source);
        self
    }

    pub fn weather_source(mut self, source: Arc<dyn WeatherSource>) -> Self {
        self.weather = Some(source);
        self
    }

    pub fn news_source(mut self, source: Arc<dyn NewsSource>) -> Self {
        self.news = Some(source);
        self
    }

    pub fn video_source(mut self, source: Arc<dyn VideoSource>) -> Self {
        self.videos = Some(source);
        self
    }

    pub fn live_timing_source(mut self, source: Arc<dyn LiveTimingSource>) -> Self {
        self.live = Some(source);
        self
    }

    pub fn timezone_source(mut self, source: Arc<dyn TimezoneSource>) -> Self {
        self.timezones = Some(source);
        self
    }

    pub fn track_status_source(mut self, source: Arc<dyn TrackStatusSource>) -> Self {
        self.track = Some(source);
        self
    }

    pub fn image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.images = Some(source);
        self
    }

    pub fn build(self) -> Aggregator {
        Aggregator {
            season: self
                .season
                .unwrap_or_else(|| Arc::new(Disabled::new(ProviderId::Jolpica, "JOLPICA_BASE_URL"))),
            weather: self.weather.unwrap_or_else(|| {
                Arc::new(Disabled::new(ProviderId::OpenWeather, "OPENWEATHER_API_KEY"))
            }),
            news: self
                .news
                .unwrap_or_else(|| Arc::new(Disabled::new(ProviderId::NewsApi, "NEWS_API_KEY"))),
            videos: self
                .videos
                .unwrap_or_else(|| Arc::new(Disabled::new(ProviderId::YouTube, "YOUTUBE_API_KEY"))),
            live: self
                .live
                .unwrap_or_else(|| Arc::new(Disabled::new(ProviderId::OpenF1, "OPENF1_SESSION_KEY"))),
            timezones: self.timezones.unwrap_or_else(|| {
                Arc::new(Disabled::new(ProviderId::TimeZoneDb, "TIMEZONEDB_API_KEY"))
            }),
            track: self
                .track
                .unwrap_or_else(|| Arc::new(Disabled::new(ProviderId::F1Live, "RAPIDAPI_F1LIVE_KEY"))),
            images: self.images,
            fallback: Arc::new(self.fallback),
        }
    }
}

/// Stand-in for a source that was never wired.
#[derive(Debug, Clone, Copy)]
struct Disabled {
    provider: ProviderId,
    setting: &'static str,
}

impl Disabled {
    const fn new(provider: ProviderId, setting: &'static str) -> Self {
        Self { provider, setting }
    }

    fn fail<'a, T: Send + 'a>(&self) -> SourceFuture<'a, T> {
        let error = SourceError::not_configured(self.provider, self.setting);
        Box::pin(async move { Err(error) })
    }
}

impl SeasonSource for Disabled {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn schedule<'a>(&'a self, _season: u32) -> SourceFuture<'a, Vec<GrandPrix>> {
        self.fail()
    }

    fn driver_standings<'a>(&'a self, _season: u32) -> SourceFuture<'a, Vec<DriverStanding>> {
        self.fail()
    }

    fn constructor_standings<'a>(
        &'a self,
        _season: u32,
    ) -> SourceFuture<'a, Vec<ConstructorStanding>> {
        self.fail()
    }

    fn last_race_result<'a>(&'a self, _season: u32) -> SourceFuture<'a, Option<RaceResult>> {
        self.fail()
    }
}

impl WeatherSource for Disabled {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn weather<'a>(
        &'a self,
        _grand_prix: &'a GrandPrix,
        _locale: Locale,
    ) -> SourceFuture<'a, WeatherSnapshot> {
        self.fail()
    }
}

impl NewsSource for Disabled {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn news<'a>(&'a self, _query: &'a SearchQuery) -> SourceFuture<'a, Vec<NewsArticle>> {
        self.fail()
    }
}

impl VideoSource for Disabled {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn videos<'a>(&'a self, _query: &'a SearchQuery) -> SourceFuture<'a, Vec<VideoItem>> {
        self.fail()
    }
}

impl LiveTimingSource for Disabled {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn live_timing<'a>(
        &'a self,
        _session_key: Option<&'a str>,
        _locale: Locale,
    ) -> SourceFuture<'a, LiveTimingSnapshot> {
        self.fail()
    }

    fn telemetry<'a>(
        &'a self,
        _session_key: Option<&'a str>,
        _driver_number: Option<u32>,
        _locale: Locale,
    ) -> SourceFuture<'a, TelemetrySnapshot> {
        self.fail()
    }
}

impl TimezoneSource for Disabled {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn timezone<'a>(&'a self, _geo: GeoPoint) -> SourceFuture<'a, TimezoneInfo> {
        self.fail()
    }
}

impl TrackStatusSource for Disabled {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn track_status<'a>(&'a self) -> SourceFuture<'a, TrackStatus> {
        self.fail()
    }
}

/// Logs a provider failure and returns the warning attached to the result.
fn degraded(concept: &'static str, provider: ProviderId, error: &SourceError) -> String {
    if error.is_not_configured() {
        tracing::debug!(concept, %provider, %error, "provider not configured; using sample data");
    } else {
        tracing::warn!(
            concept,
            %provider,
            code = error.code(),
            %error,
            "provider failed; using sample data"
        );
    }
    format!("{concept}: {error}")
}

/// First race whose reference session is strictly after `reference`.
pub fn next_after(schedule: &[GrandPrix], reference: DateTime<Utc>) -> Option<GrandPrix> {
    let mut ordered: Vec<&GrandPrix> = schedule.iter().collect();
    ordered.sort_by_key(|grand_prix| grand_prix.round);

    ordered
        .into_iter()
        .find(|grand_prix| match grand_prix.reference_instant() {
            Ok(Some(instant)) => instant > reference,
            Ok(None) => false,
            Err(error) => {
                tracing::warn!(round = grand_prix.round, %error, "skipping race with unusable timezone");
                false
            }
        })
        .cloned()
}

/// Stable sort, highest points first; ties keep their current order.
fn sort_by_points<T>(items: &mut [T], points: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| points(b).total_cmp(&points(a)));
}

/// Appends `known` records whose id is not yet in `items`.
fn append_missing<T: HasId>(items: &mut Vec<T>, known: &[T], patch: impl Fn(&T) -> T) {
    let present: HashSet<String> = items.iter().map(|item| item.id().to_string()).collect();
    for record in known {
        if !present.contains(record.id()) {
            items.push(patch(record));
        }
    }
}

/// Positions 1..n in the given order.
fn rank(rows: impl Iterator<Item = (String, String, f64)>) -> Vec<StandingEntry> {
    rows.enumerate()
        .filter_map(|(index, (id, name, points))| {
            let position = u32::try_from(index + 1).ok()?;
            match StandingEntry::new(position, id, name, points) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    tracing::warn!(position, %error, "dropping invalid standing");
                    None
                }
            }
        })
        .collect()
}

/// Rebuilds each team's driver list from `drivers`.
fn attach_drivers(mut teams: Vec<Team>, drivers: &[Driver]) -> Vec<Team> {
    for team in &mut teams {
        team.driver_ids.clear();
    }
    for driver in drivers {
        if let Some(team) = teams.iter_mut().find(|team| team.id == driver.team_id) {
            team.add_driver(&driver.id);
        }
    }
    teams
}

trait HasId {
    fn id(&self) -> &str;
}

impl HasId for Driver {
    fn id(&self) -> &str {
        &self.id
    }
}

impl HasId for Team {
    fn id(&self) -> &str {
        &self.id
    }
}
