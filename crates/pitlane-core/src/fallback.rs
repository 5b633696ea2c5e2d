//! Bundled sample data served when a provider is down or unconfigured.
//!
//! Fixtures are compiled into the binary and validated when the store is
//! loaded. A directory with files of the same names can override any of them.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{
    CoreError, Driver, GrandPrix, LiveTimingEntry, LiveTimingSnapshot, RaceResult, Team,
    ValidationError, WeatherSnapshot,
};

pub const DRIVERS_FILE: &str = "drivers.json";
pub const TEAMS_FILE: &str = "teams.json";
pub const SCHEDULE_FILE: &str = "schedule.json";
pub const RESULTS_FILE: &str = "results.json";
pub const WEATHER_SAMPLE_FILE: &str = "weather-sample.json";
pub const LIVE_SAMPLE_FILE: &str = "live-sample.json";

const BUNDLED_DRIVERS: &str = include_str!("../fixtures/drivers.json");
const BUNDLED_TEAMS: &str = include_str!("../fixtures/teams.json");
const BUNDLED_SCHEDULE: &str = include_str!("../fixtures/schedule.json");
const BUNDLED_RESULTS: &str = include_str!("../fixtures/results.json");
const BUNDLED_WEATHER_SAMPLE: &str = include_str!("../fixtures/weather-sample.json");
const BUNDLED_LIVE_SAMPLE: &str = include_str!("../fixtures/live-sample.json");

/// Last race plus the season standings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackResults {
    pub last_race: RaceResult,
    pub season: SeasonSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonSnapshot {
    pub year: u32,
    pub driver_standings: Vec<DriverPoints>,
    pub constructor_standings: Vec<TeamPoints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPoints {
    pub position: u32,
    pub driver_id: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPoints {
    pub position: u32,
    pub team_id: String,
    pub points: f64,
}

/// Immutable sample datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackStore {
    drivers: Vec<Driver>,
    teams: Vec<Team>,
    schedule: Vec<GrandPrix>,
    results: FallbackResults,
    weather_sample: WeatherSnapshot,
    live_sample: Vec<LiveTimingEntry>,
}

impl FallbackStore {
    /// Fixtures compiled into the crate.
    pub fn bundled() -> Result<Self, CoreError> {
        Self::from_sources(
            BUNDLED_DRIVERS,
            BUNDLED_TEAMS,
            BUNDLED_SCHEDULE,
            BUNDLED_RESULTS,
            BUNDLED_WEATHER_SAMPLE,
            BUNDLED_LIVE_SAMPLE,
        )
    }

    /// Fixtures read from `dir`; a file that is absent falls back to the
    /// bundled copy.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        let dir = dir.as_ref();
        let drivers = read_or_bundled(dir, DRIVERS_FILE, BUNDLED_DRIVERS)?;
        let teams = read_or_bundled(dir, TEAMS_FILE, BUNDLED_TEAMS)?;
        let schedule = read_or_bundled(dir, SCHEDULE_FILE, BUNDLED_SCHEDULE)?;
        let results = read_or_bundled(dir, RESULTS_FILE, BUNDLED_RESULTS)?;
        let weather = read_or_bundled(dir, WEATHER_SAMPLE_FILE, BUNDLED_WEATHER_SAMPLE)?;
        let live = read_or_bundled(dir, LIVE_SAMPLE_FILE, BUNDLED_LIVE_SAMPLE)?;

        tracing::debug!(dir = %dir.display(), "loading fixtures");
        Self::from_sources(&drivers, &teams, &schedule, &results, &weather, &live)
    }

    fn from_sources(
        drivers: &str,
        teams: &str,
        schedule: &str,
        results: &str,
        weather_sample: &str,
        live_sample: &str,
    ) -> Result<Self, CoreError> {
        let store = Self {
            drivers: parse(DRIVERS_FILE, drivers)?,
            teams: parse(TEAMS_FILE, teams)?,
            schedule: parse(SCHEDULE_FILE, schedule)?,
            results: parse(RESULTS_FILE, results)?,
            weather_sample: parse(WEATHER_SAMPLE_FILE, weather_sample)?,
            live_sample: parse(LIVE_SAMPLE_FILE, live_sample)?,
        };
        store.validate()?;
        Ok(store)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for driver in &self.drivers {
            driver.validate()?;
        }
        for team in &self.teams {
            team.validate()?;
        }

        let mut previous = 0;
        for grand_prix in &self.schedule {
            grand_prix.validate()?;
            if grand_prix.round <= previous {
                return Err(ValidationError::UnorderedRound {
                    round: grand_prix.round,
                });
            }
            previous = grand_prix.round;
            if grand_prix
                .sessions
                .windows(2)
                .any(|pair| pair[1].start < pair[0].start)
            {
                return Err(ValidationError::UnorderedSessions {
                    round: grand_prix.round,
                });
            }
        }

        for row in &self.results.season.driver_standings {
            validate_row(row.position, row.points)?;
        }
        for row in &self.results.season.constructor_standings {
            validate_row(row.position, row.points)?;
        }
        Ok(())
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Races ordered by round.
    pub fn schedule(&self) -> &[GrandPrix] {
        &self.schedule
    }

    pub fn results(&self) -> &FallbackResults {
        &self.results
    }

    pub fn last_race(&self) -> &RaceResult {
        &self.results.last_race
    }

    pub fn season_snapshot(&self) -> &SeasonSnapshot {
        &self.results.season
    }

    pub fn weather_sample(&self) -> &WeatherSnapshot {
        &self.weather_sample
    }

    pub fn live_sample(&self) -> &[LiveTimingEntry] {
        &self.live_sample
    }

    /// The live sample as a snapshot stamped `at`.
    pub fn live_snapshot(&self, at: DateTime<Utc>) -> LiveTimingSnapshot {
        LiveTimingSnapshot {
            available: !self.live_sample.is_empty(),
            updated_at: at,
            message: None,
            entries: self.live_sample.clone(),
        }
    }

    pub fn driver(&self, id: &str) -> Option<&Driver> {
        self.drivers.iter().find(|driver| driver.id == id)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.id == id)
    }

    /// Last known points for a driver: the season snapshot first, then the
    /// driver record.
    pub fn driver_points(&self, id: &str) -> f64 {
        self.results
            .season
            .driver_standings
            .iter()
            .find(|row| row.driver_id == id)
            .map(|row| row.points)
            .or_else(|| self.driver(id).map(|driver| driver.points))
            .unwrap_or(0.0)
    }

    pub fn team_points(&self, id: &str) -> f64 {
        self.results
            .season
            .constructor_standings
            .iter()
            .find(|row| row.team_id == id)
            .map(|row| row.points)
            .or_else(|| self.team(id).map(|team| team.points))
            .unwrap_or(0.0)
    }
}

fn parse<T: DeserializeOwned>(name: &'static str, raw: &str) -> Result<T, CoreError> {
    serde_json::from_str(raw).map_err(|source| CoreError::Fixture { name, source })
}

fn read_or_bundled(dir: &Path, name: &str, bundled: &str) -> Result<String, CoreError> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(raw) => Ok(raw),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "fixture override absent; using bundled copy");
            Ok(bundled.to_string())
        }
        Err(source) => Err(CoreError::FixtureIo {
            path: path.display().to_string(),
            source,
        }),
    }
}

fn validate_row(position: u32, points: f64) -> Result<(), ValidationError> {
    if position == 0 {
        return Err(ValidationError::InvalidPosition);
    }
    if !points.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "points" });
    }
    if points < 0.0 {
        return Err(ValidationError::NegativeValue { field: "points" });
    }
    Ok(())
}
