use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::time;
use crate::ValidationError;

/// On-track activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "FP1")]
    Fp1,
    #[serde(rename = "FP2")]
    Fp2,
    #[serde(rename = "FP3")]
    Fp3,
    #[serde(rename = "SPRINT")]
    Sprint,
    #[serde(rename = "QUALY")]
    Qualy,
    #[serde(rename = "RACE")]
    Race,
}

impl SessionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fp1 => "FP1",
            Self::Fp2 => "FP2",
            Self::Fp3 => "FP3",
            Self::Sprint => "SPRINT",
            Self::Qualy => "QUALY",
            Self::Race => "RACE",
        }
    }

    /// Scheduled length used when the provider only publishes a start time.
    pub const fn default_duration_minutes(self) -> i64 {
        match self {
            Self::Fp1 | Self::Fp2 | Self::Fp3 | Self::Qualy => 60,
            Self::Sprint => 30,
            Self::Race => 120,
        }
    }
}

impl Display for SessionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "FP1" => Ok(Self::Fp1),
            "FP2" => Ok(Self::Fp2),
            "FP3" => Ok(Self::Fp3),
            "SPRINT" => Ok(Self::Sprint),
            "QUALY" | "QUALIFYING" => Ok(Self::Qualy),
            "RACE" => Ok(Self::Race),
            _ => Err(ValidationError::InvalidSessionType {
                value: value.to_string(),
            }),
        }
    }
}

/// A timed session; `start`/`end` are wall-clock times in the circuit's zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "type")]
    pub kind: SessionType,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Session {
    pub fn new(
        kind: SessionType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::SessionEndsBeforeStart {
                session: kind.as_str(),
            });
        }
        Ok(Self { kind, start, end })
    }

    pub fn with_default_duration(kind: SessionType, start: NaiveDateTime) -> Self {
        Self {
            kind,
            start,
            end: start + TimeDelta::minutes(kind.default_duration_minutes()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_finite("lat", self.lat)?;
        validate_finite("lng", self.lng)?;
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "lat",
                value: self.lat.to_string(),
            });
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "lng",
                value: self.lng.to_string(),
            });
        }
        Ok(())
    }

    /// `"lat,lng"` key used by the timezone cache.
    pub fn cache_key(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: String,
    pub name: String,
    pub location: String,
    /// IANA zone id; `"UTC"` when it could not be resolved.
    pub timezone: String,
    pub geo: GeoPoint,
}

/// One race weekend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrandPrix {
    pub round: u32,
    pub name: String,
    pub circuit: Circuit,
    pub sessions: Vec<Session>,
}

impl GrandPrix {
    /// Builds a Grand Prix with sessions ordered by start time.
    pub fn new(
        round: u32,
        name: impl Into<String>,
        circuit: Circuit,
        mut sessions: Vec<Session>,
    ) -> Result<Self, ValidationError> {
        if round == 0 {
            return Err(ValidationError::InvalidRound);
        }
        sessions.sort_by_key(|session| session.start);
        Ok(Self {
            round,
            name: name.into(),
            circuit,
            sessions,
        })
    }

    /// The race if scheduled, otherwise the first session.
    pub fn reference_session(&self) -> Option<&Session> {
        self.sessions
            .iter()
            .find(|session| session.kind == SessionType::Race)
            .or_else(|| self.sessions.first())
    }

    pub fn reference_instant(&self) -> Result<Option<DateTime<Utc>>, ValidationError> {
        let Some(session) = self.reference_session() else {
            return Ok(None);
        };
        time::to_instant(session.start, &self.circuit.timezone).map(Some)
    }

    pub fn session(&self, kind: SessionType) -> Option<&Session> {
        self.sessions.iter().find(|session| session.kind == kind)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.round == 0 {
            return Err(ValidationError::InvalidRound);
        }
        time::parse_timezone(&self.circuit.timezone)?;
        self.circuit.geo.validate()?;
        for session in &self.sessions {
            if session.end < session.start {
                return Err(ValidationError::SessionEndsBeforeStart {
                    session: session.kind.as_str(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub code: String,
    pub name: String,
    pub number: u32,
    pub country: String,
    pub team_id: String,
    pub points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl Driver {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_driver_code(&self.code)?;
        validate_points(self.points)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_unit: Option<String>,
    pub livery_url: String,
    #[serde(default)]
    pub driver_ids: Vec<String>,
    pub points: f64,
}

impl Team {
    /// Adds `driver_id` unless already present; insertion order is kept.
    pub fn add_driver(&mut self, driver_id: &str) {
        if !self.driver_ids.iter().any(|id| id == driver_id) {
            self.driver_ids.push(driver_id.to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_points(self.points)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingKind {
    Driver,
    Constructor,
}

/// Ranked points total for a driver or a constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    pub position: u32,
    pub id: String,
    pub display_name: String,
    pub points: f64,
}

impl StandingEntry {
    pub fn new(
        position: u32,
        id: impl Into<String>,
        display_name: impl Into<String>,
        points: f64,
    ) -> Result<Self, ValidationError> {
        if position == 0 {
            return Err(ValidationError::InvalidPosition);
        }
        validate_points(points)?;
        Ok(Self {
            position,
            id: id.into(),
            display_name: display_name.into(),
            points,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherNow {
    pub temperature_c: i32,
    pub description: String,
    pub wind_kmh: i32,
    pub humidity_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastItem {
    pub session: SessionType,
    pub temperature_c: i32,
    pub rain_chance_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub now: WeatherNow,
    #[serde(default)]
    pub forecast: Vec<ForecastItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTimingEntry {
    pub position: u32,
    pub driver_label: String,
    pub gap_text: String,
    pub tyre_label: String,
    pub last_lap_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveTimingSnapshot {
    pub available: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub entries: Vec<LiveTimingEntry>,
}

impl LiveTimingSnapshot {
    /// Unavailable snapshot; never carries entries.
    pub fn unavailable(message: impl Into<String>, updated_at: DateTime<Utc>) -> Self {
        Self {
            available: false,
            updated_at,
            message: Some(message.into()),
            entries: Vec::new(),
        }
    }

    /// Available when `entries` is non-empty, otherwise unavailable with `empty_message`.
    pub fn from_entries(
        entries: Vec<LiveTimingEntry>,
        updated_at: DateTime<Utc>,
        empty_message: impl Into<String>,
    ) -> Self {
        if entries.is_empty() {
            return Self::unavailable(empty_message, updated_at);
        }
        Self {
            available: true,
            updated_at,
            message: None,
            entries,
        }
    }
}

/// Race-control flag for the session in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStatus {
    pub flag: String,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl TrackStatus {
    pub const UNKNOWN_FLAG: &'static str = "N/A";

    /// Placeholder shown when no feed is reachable; stamped at the Unix epoch.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            flag: Self::UNKNOWN_FLAG.to_string(),
            message: message.into(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn is_known(&self) -> bool {
        self.flag != Self::UNKNOWN_FLAG
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodiumEntry {
    pub position: u32,
    pub driver: String,
    pub driver_id: String,
    pub team: String,
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
    pub circuit_name: String,
    pub date: String,
    pub podium: Vec<PodiumEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEntry {
    pub driver: String,
    pub samples: u32,
    pub top_speed_kmh: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub available: bool,
    pub session: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub entries: Vec<TelemetryEntry>,
}

impl TelemetrySnapshot {
    pub fn unavailable(
        session: impl Into<String>,
        message: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            available: false,
            session: session.into(),
            updated_at,
            message: Some(message.into()),
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneInfo {
    pub zone_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gmt_offset: Option<i64>,
}

impl TimezoneInfo {
    pub fn utc() -> Self {
        Self {
            zone_name: String::from("UTC"),
            abbreviation: Some(String::from("UTC")),
            gmt_offset: Some(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaImage {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Upper-cases `raw` and keeps at most three characters.
pub fn normalize_driver_code(raw: &str) -> Result<String, ValidationError> {
    let code: String = raw
        .trim()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    validate_driver_code(&code)?;
    Ok(code)
}

pub fn validate_driver_code(code: &str) -> Result<(), ValidationError> {
    let valid = (1..=3).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidDriverCode {
            value: code.to_string(),
        })
    }
}

fn validate_points(points: f64) -> Result<(), ValidationError> {
    validate_finite("points", points)?;
    if points < 0.0 {
        return Err(ValidationError::NegativeValue { field: "points" });
    }
    Ok(())
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFiniteValue { field })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .expect("valid date")
    }

    fn circuit() -> Circuit {
        Circuit {
            id: String::from("albert_park"),
            name: String::from("Albert Park Grand Prix Circuit"),
            location: String::from("Melbourne, Australia"),
            timezone: String::from("Australia/Melbourne"),
            geo: GeoPoint::new(-37.8497, 144.968).expect("valid"),
        }
    }

    #[test]
    fn grand_prix_orders_sessions_by_start() {
        let gp = GrandPrix::new(
            1,
            "Australian Grand Prix",
            circuit(),
            vec![
                Session::with_default_duration(SessionType::Race, at(16, 15)),
                Session::with_default_duration(SessionType::Fp1, at(14, 12)),
                Session::with_default_duration(SessionType::Qualy, at(15, 16)),
            ],
        )
        .expect("valid grand prix");

        let kinds: Vec<_> = gp.sessions.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SessionType::Fp1, SessionType::Qualy, SessionType::Race]);
        assert_eq!(gp.reference_session().map(|s| s.kind), Some(SessionType::Race));
    }

    #[test]
    fn reference_session_falls_back_to_first() {
        let gp = GrandPrix::new(
            1,
            "Testing",
            circuit(),
            vec![Session::with_default_duration(SessionType::Fp2, at(2, 10))],
        )
        .expect("valid");

        assert_eq!(gp.reference_session().map(|s| s.kind), Some(SessionType::Fp2));
    }

    #[test]
    fn session_rejects_end_before_start() {
        let error = Session::new(SessionType::Fp1, at(14, 12), at(14, 11)).expect_err("invalid");
        assert_eq!(error, ValidationError::SessionEndsBeforeStart { session: "FP1" });
    }

    #[test]
    fn default_durations_match_weekend_format() {
        let race = Session::with_default_duration(SessionType::Race, at(16, 15));
        let sprint = Session::with_default_duration(SessionType::Sprint, at(15, 11));

        assert_eq!(race.end - race.start, TimeDelta::minutes(120));
        assert_eq!(sprint.end - sprint.start, TimeDelta::minutes(30));
    }

    #[test]
    fn session_serializes_with_type_tag_and_local_times() {
        let session = Session::with_default_duration(SessionType::Qualy, at(15, 16));
        let json = serde_json::to_value(&session).expect("serializes");

        assert_eq!(json["type"], "QUALY");
        assert_eq!(json["start"], "2025-03-15T16:00:00");
        assert_eq!(json["end"], "2025-03-15T17:00:00");
    }

    #[test]
    fn driver_codes_are_normalized() {
        assert_eq!(normalize_driver_code("ver").expect("valid"), "VER");
        assert_eq!(normalize_driver_code("hamilton").expect("valid"), "HAM");
        assert!(normalize_driver_code("").is_err());
        assert!(validate_driver_code("ver").is_err());
    }

    #[test]
    fn coordinates_are_range_checked() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
        assert_eq!(
            GeoPoint::new(26.0325, 50.5106).expect("valid").cache_key(),
            "26.0325,50.5106"
        );
    }

    #[test]
    fn live_snapshot_without_entries_is_unavailable() {
        let snapshot = LiveTimingSnapshot::from_entries(Vec::new(), Utc::now(), "no data");

        assert!(!snapshot.available);
        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.message.as_deref(), Some("no data"));
    }

    #[test]
    fn team_driver_ids_stay_unique() {
        let mut team = Team {
            id: String::from("mclaren"),
            name: String::from("McLaren"),
            power_unit: Some(String::from("Mercedes")),
            livery_url: String::from("/liveries/mclaren.svg"),
            driver_ids: Vec::new(),
            points: 0.0,
        };
        team.add_driver("norris");
        team.add_driver("piastri");
        team.add_driver("norris");

        assert_eq!(team.driver_ids, vec!["norris", "piastri"]);
    }
}
