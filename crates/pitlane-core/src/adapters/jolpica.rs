//! Jolpica (Ergast-compatible) schedule, standings and results adapter.
//!
//! Ergast serializes every numeric as a string; each one is parsed
//! explicitly here. A race record that fails to parse is dropped and logged,
//! the rest of the season is still returned.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::timezonedb::zone_name_or_utc;
use crate::config::JolpicaConfig;
use crate::data_source::{
    ConstructorStanding, DriverStanding, SeasonSource, SourceError, SourceFuture, TimezoneSource,
};
use crate::domain::time;
use crate::fetch::JsonFetcher;
use crate::http_client::HttpRequest;
use crate::{
    Circuit, GeoPoint, GrandPrix, PodiumEntry, ProviderId, RaceResult, Session, SessionType,
    ValidationError,
};

#[derive(Clone)]
pub struct JolpicaAdapter {
    config: JolpicaConfig,
    fetcher: JsonFetcher,
    timezones: Arc<dyn TimezoneSource>,
}

impl JolpicaAdapter {
    pub fn new(
        config: JolpicaConfig,
        fetcher: JsonFetcher,
        timezones: Arc<dyn TimezoneSource>,
    ) -> Self {
        Self {
            config,
            fetcher,
            timezones,
        }
    }

    fn request(&self, path: &str, limit: u32) -> HttpRequest {
        HttpRequest::endpoint(&self.config.base_url, path).with_query("limit", limit.to_string())
    }

    async fn fetch_schedule(&self, season: u32) -> Result<Vec<GrandPrix>, SourceError> {
        let payload: ErgastEnvelope = self
            .fetcher
            .fetch_json(self.request(&format!("/{season}.json"), 200))
            .await?;
        let races = payload.mr_data.race_table.unwrap_or_default().races;

        let drafts: Vec<RaceDraft> = races
            .into_iter()
            .filter_map(|value| match parse_race(value) {
                Ok(draft) => Some(draft),
                Err(reason) => {
                    tracing::warn!(provider = %ProviderId::Jolpica, season, %reason, "dropping malformed race");
                    None
                }
            })
            .collect();

        let zones = futures::future::join_all(
            drafts
                .iter()
                .map(|draft| zone_name_or_utc(self.timezones.as_ref(), draft.geo)),
        )
        .await;

        let mut seen = BTreeSet::new();
        let mut schedule = Vec::with_capacity(drafts.len());
        for (draft, zone) in drafts.into_iter().zip(zones) {
            let round = draft.round;
            if seen.contains(&round) {
                tracing::warn!(provider = %ProviderId::Jolpica, season, round, "dropping duplicate round");
                continue;
            }
            // A record that fails here does not claim its round.
            match draft.into_grand_prix(zone) {
                Ok(grand_prix) => {
                    seen.insert(round);
                    schedule.push(grand_prix);
                }
                Err(error) => {
                    tracing::warn!(provider = %ProviderId::Jolpica, season, %error, "dropping race");
                }
            }
        }

        schedule.sort_by_key(|grand_prix| grand_prix.round);
        Ok(schedule)
    }

    async fn fetch_driver_standings(&self, season: u32) -> Result<Vec<DriverStanding>, SourceError> {
        let payload: ErgastEnvelope = self
            .fetcher
            .fetch_json(self.request(&format!("/{season}/driverStandings.json"), 100))
            .await?;
        let rows = first_standings_list(payload, "DriverStandings");

        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                parse_driver_standing(value, index)
                    .map_err(|reason| {
                        tracing::warn!(provider = %ProviderId::Jolpica, season, %reason, "dropping driver standing");
                    })
                    .ok()
            })
            .collect())
    }

    async fn fetch_constructor_standings(
        &self,
        season: u32,
    ) -> Result<Vec<ConstructorStanding>, SourceError> {
        let payload: ErgastEnvelope = self
            .fetcher
            .fetch_json(self.request(&format!("/{season}/constructorStandings.json"), 100))
            .await?;
        let rows = first_standings_list(payload, "ConstructorStandings");

        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                parse_constructor_standing(value, index)
                    .map_err(|reason| {
                        tracing::warn!(provider = %ProviderId::Jolpica, season, %reason, "dropping constructor standing");
                    })
                    .ok()
            })
            .collect())
    }

    async fn fetch_last_result(&self, season: u32) -> Result<Option<RaceResult>, SourceError> {
        let payload: ErgastEnvelope = self
            .fetcher
            .fetch_json(self.request(&format!("/{season}/last/results.json"), 60))
            .await?;
        let Some(race) = payload
            .mr_data
            .race_table
            .unwrap_or_default()
            .races
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let race: ErgastResultRace = serde_json::from_value(race)
            .map_err(|error| SourceError::rejected(format!("malformed results payload: {error}")))?;
        normalize_result(race).map(Some)
    }
}

impl std::fmt::Debug for JolpicaAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JolpicaAdapter")
            .field("config", &self.config)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl SeasonSource for JolpicaAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Jolpica
    }

    fn schedule<'a>(&'a self, season: u32) -> SourceFuture<'a, Vec<GrandPrix>> {
        Box::pin(self.fetch_schedule(season))
    }

    fn driver_standings<'a>(&'a self, season: u32) -> SourceFuture<'a, Vec<DriverStanding>> {
        Box::pin(self.fetch_driver_standings(season))
    }

    fn constructor_standings<'a>(
        &'a self,
        season: u32,
    ) -> SourceFuture<'a, Vec<ConstructorStanding>> {
        Box::pin(self.fetch_constructor_standings(season))
    }

    fn last_race_result<'a>(&'a self, season: u32) -> SourceFuture<'a, Option<RaceResult>> {
        Box::pin(self.fetch_last_result(season))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErgastEnvelope {
    #[serde(rename = "MRData")]
    mr_data: MrData,
}

#[derive(Debug, Deserialize)]
struct MrData {
    #[serde(rename = "RaceTable", default)]
    race_table: Option<RaceTable>,
    #[serde(rename = "StandingsTable", default)]
    standings_table: Option<StandingsTable>,
}

/// Races stay untyped so one bad record cannot fail the whole table.
#[derive(Debug, Default, Deserialize)]
struct RaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct StandingsTable {
    #[serde(rename = "StandingsLists", default)]
    standings_lists: Vec<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ErgastRace {
    round: String,
    #[serde(rename = "raceName")]
    race_name: String,
    date: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(rename = "Circuit")]
    circuit: ErgastCircuit,
    #[serde(rename = "FirstPractice", default)]
    first_practice: Option<ErgastSlot>,
    #[serde(rename = "SecondPractice", default)]
    second_practice: Option<ErgastSlot>,
    #[serde(rename = "ThirdPractice", default)]
    third_practice: Option<ErgastSlot>,
    #[serde(rename = "Qualifying", default)]
    qualifying: Option<ErgastSlot>,
    #[serde(rename = "SprintQualifying", default)]
    sprint_qualifying: Option<ErgastSlot>,
    #[serde(rename = "SprintShootout", default)]
    sprint_shootout: Option<ErgastSlot>,
    #[serde(rename = "Sprint", default)]
    sprint: Option<ErgastSlot>,
}

#[derive(Debug, Deserialize)]
struct ErgastCircuit {
    #[serde(rename = "circuitId")]
    circuit_id: String,
    #[serde(rename = "circuitName")]
    circuit_name: String,
    #[serde(rename = "Location")]
    location: ErgastLocation,
}

#[derive(Debug, Deserialize)]
struct ErgastLocation {
    lat: String,
    long: String,
    #[serde(default)]
    locality: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct ErgastSlot {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErgastDriverStanding {
    #[serde(default)]
    position: Option<String>,
    points: String,
    #[serde(default)]
    wins: Option<String>,
    #[serde(rename = "Driver")]
    driver: ErgastDriver,
    #[serde(rename = "Constructors", default)]
    constructors: Vec<ErgastConstructor>,
}

#[derive(Debug, Deserialize)]
struct ErgastDriver {
    #[serde(rename = "driverId")]
    driver_id: String,
    #[serde(rename = "permanentNumber", default)]
    permanent_number: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(rename = "givenName", default)]
    given_name: String,
    #[serde(rename = "familyName", default)]
    family_name: String,
    #[serde(default)]
    nationality: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErgastConstructorStanding {
    #[serde(default)]
    position: Option<String>,
    points: String,
    #[serde(default)]
    wins: Option<String>,
    #[serde(rename = "Constructor")]
    constructor: ErgastConstructor,
}

#[derive(Debug, Deserialize)]
struct ErgastConstructor {
    #[serde(rename = "constructorId")]
    constructor_id: String,
    name: String,
    #[serde(default)]
    nationality: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErgastResultRace {
    season: String,
    round: String,
    #[serde(rename = "raceName")]
    race_name: String,
    date: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(rename = "Circuit")]
    circuit: ErgastResultCircuit,
    #[serde(rename = "Results", default)]
    results: Vec<ErgastResult>,
}

#[derive(Debug, Deserialize)]
struct ErgastResultCircuit {
    #[serde(rename = "circuitName")]
    circuit_name: String,
}

#[derive(Debug, Deserialize)]
struct ErgastResult {
    position: String,
    #[serde(rename = "Driver")]
    driver: ErgastDriver,
    #[serde(rename = "Constructor")]
    constructor: ErgastConstructor,
    #[serde(rename = "Time", default)]
    time: Option<ErgastTime>,
}

#[derive(Debug, Deserialize)]
struct ErgastTime {
    time: String,
}

// ============================================================================
// Normalization
// ============================================================================

/// A race whose numerics parsed; session times are still UTC.
#[derive(Debug)]
struct RaceDraft {
    round: u32,
    name: String,
    circuit_id: String,
    circuit_name: String,
    location: String,
    geo: GeoPoint,
    sessions_utc: Vec<(SessionType, NaiveDateTime)>,
}

impl RaceDraft {
    fn into_grand_prix(self, zone: String) -> Result<GrandPrix, ValidationError> {
        let tz = time::parse_timezone(&zone)?;
        let sessions = self
            .sessions_utc
            .into_iter()
            .map(|(kind, utc)| {
                let local = Utc.from_utc_datetime(&utc).with_timezone(&tz).naive_local();
                Session::with_default_duration(kind, local)
            })
            .collect();

        GrandPrix::new(
            self.round,
            self.name,
            Circuit {
                id: self.circuit_id,
                name: self.circuit_name,
                location: self.location,
                timezone: zone,
                geo: self.geo,
            },
            sessions,
        )
    }
}

fn parse_race(value: Value) -> Result<RaceDraft, String> {
    let race: ErgastRace =
        serde_json::from_value(value).map_err(|error| format!("unexpected race shape: {error}"))?;

    let round = parse_round(&race.round)?;
    let lat = parse_f64("lat", &race.circuit.location.lat)?;
    let lng = parse_f64("long", &race.circuit.location.long)?;
    let geo = GeoPoint::new(lat, lng).map_err(|error| format!("round {round}: {error}"))?;
    let race_start = parse_slot(&race.date, race.time.as_deref())
        .ok_or_else(|| format!("round {round}: invalid race date '{}'", race.date))?;

    let optional = [
        (SessionType::Fp1, &race.first_practice),
        (SessionType::Fp2, &race.second_practice),
        (SessionType::Fp3, &race.third_practice),
        (SessionType::Qualy, &race.sprint_qualifying),
        (SessionType::Qualy, &race.sprint_shootout),
        (SessionType::Qualy, &race.qualifying),
        (SessionType::Sprint, &race.sprint),
    ];
    let mut sessions_utc = Vec::with_capacity(optional.len() + 1);
    for (kind, slot) in optional {
        let Some(slot) = slot else { continue };
        let Some(date) = slot.date.as_deref() else { continue };
        match parse_slot(date, slot.time.as_deref()) {
            Some(start) => sessions_utc.push((kind, start)),
            None => tracing::debug!(round, session = %kind, date, "skipping session with invalid date"),
        }
    }
    sessions_utc.push((SessionType::Race, race_start));

    let location = [race.circuit.location.locality, race.circuit.location.country]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(RaceDraft {
        round,
        name: race.race_name,
        circuit_id: race.circuit.circuit_id,
        circuit_name: race.circuit.circuit_name,
        location,
        geo,
        sessions_utc,
    })
}

/// `date` plus an optional `HH:MM:SSZ` time; midnight when the time is unknown.
fn parse_slot(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = match time {
        Some(raw) => {
            let raw = raw.trim().trim_end_matches('Z');
            NaiveTime::parse_from_str(raw, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
                .ok()?
        }
        None => NaiveTime::MIN,
    };
    Some(date.and_time(time))
}

fn parse_round(raw: &str) -> Result<u32, String> {
    match raw.trim().parse::<u32>() {
        Ok(round) if round > 0 => Ok(round),
        _ => Err(format!("invalid round '{raw}'")),
    }
}

fn parse_f64(field: &str, raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("invalid {field} '{raw}'"))
}

fn parse_points(raw: &str) -> Result<f64, String> {
    let points = parse_f64("points", raw)?;
    if points < 0.0 {
        return Err(format!("negative points '{raw}'"));
    }
    Ok(points)
}

/// Position as published, or the row order when the provider omits it.
fn parse_position(raw: Option<&str>, index: usize) -> Result<u32, String> {
    let fallback = u32::try_from(index + 1).map_err(|_| String::from("too many rows"))?;
    match raw {
        None => Ok(fallback),
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(position) if position > 0 => Ok(position),
            _ => Err(format!("invalid position '{raw}'")),
        },
    }
}

fn parse_count(raw: Option<&str>) -> u32 {
    raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or(0)
}

fn first_standings_list(payload: ErgastEnvelope, key: &str) -> Vec<Value> {
    payload
        .mr_data
        .standings_table
        .unwrap_or_default()
        .standings_lists
        .into_iter()
        .next()
        .and_then(|mut list| list.remove(key))
        .and_then(|rows| match rows {
            Value::Array(rows) => Some(rows),
            _ => None,
        })
        .unwrap_or_default()
}

fn full_name(driver: &ErgastDriver) -> String {
    format!("{} {}", driver.given_name, driver.family_name)
        .trim()
        .to_string()
}

fn parse_driver_standing(value: Value, index: usize) -> Result<DriverStanding, String> {
    let row: ErgastDriverStanding =
        serde_json::from_value(value).map_err(|error| format!("unexpected shape: {error}"))?;
    let constructor = row.constructors.into_iter().next();

    Ok(DriverStanding {
        position: parse_position(row.position.as_deref(), index)?,
        points: parse_points(&row.points)?,
        wins: parse_count(row.wins.as_deref()),
        name: full_name(&row.driver),
        driver_id: row.driver.driver_id,
        code: row.driver.code.filter(|code| !code.is_empty()),
        number: row
            .driver
            .permanent_number
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok()),
        nationality: row.driver.nationality,
        team_id: constructor.as_ref().map(|c| c.constructor_id.clone()),
        team_name: constructor.map(|c| c.name),
        info_url: row.driver.url,
    })
}

fn parse_constructor_standing(value: Value, index: usize) -> Result<ConstructorStanding, String> {
    let row: ErgastConstructorStanding =
        serde_json::from_value(value).map_err(|error| format!("unexpected shape: {error}"))?;

    Ok(ConstructorStanding {
        position: parse_position(row.position.as_deref(), index)?,
        points: parse_points(&row.points)?,
        wins: parse_count(row.wins.as_deref()),
        team_id: row.constructor.constructor_id,
        name: row.constructor.name,
        nationality: row.constructor.nationality,
        info_url: row.constructor.url,
    })
}

fn normalize_result(race: ErgastResultRace) -> Result<RaceResult, SourceError> {
    let season = race
        .season
        .trim()
        .parse::<u32>()
        .map_err(|_| SourceError::rejected(format!("invalid season '{}'", race.season)))?;
    let round = parse_round(&race.round).map_err(SourceError::rejected)?;

    let mut podium: Vec<PodiumEntry> = race
        .results
        .into_iter()
        .filter_map(|result| {
            let position = result.position.trim().parse::<u32>().ok()?;
            (1..=3).contains(&position).then(|| PodiumEntry {
                position,
                driver: full_name(&result.driver),
                driver_id: result.driver.driver_id,
                team: result.constructor.name,
                team_id: result.constructor.constructor_id,
                time: result.time.map(|time| time.time),
            })
        })
        .collect();
    podium.sort_by_key(|entry| entry.position);

    let date = match race.time {
        Some(time) => format!("{}T{}", race.date, time),
        None => race.date,
    };

    Ok(RaceResult {
        season,
        round,
        race_name: race.race_name,
        circuit_name: race.circuit.circuit_name,
        date,
        podium,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slot_with_and_without_time() {
        let with_time = parse_slot("2025-03-16", Some("04:00:00Z")).expect("valid");
        assert_eq!(with_time.to_string(), "2025-03-16 04:00:00");

        let date_only = parse_slot("2025-03-16", None).expect("valid");
        assert_eq!(date_only.to_string(), "2025-03-16 00:00:00");

        assert!(parse_slot("16/03/2025", None).is_none());
        assert!(parse_slot("2025-03-16", Some("late")).is_none());
    }

    #[test]
    fn round_must_be_positive_integer() {
        assert_eq!(parse_round("7"), Ok(7));
        assert!(parse_round("0").is_err());
        assert!(parse_round("seven").is_err());
    }

    #[test]
    fn malformed_race_reports_reason() {
        let value = serde_json::json!({
            "round": "x",
            "raceName": "Broken Grand Prix",
            "date": "2025-05-04",
            "Circuit": {
                "circuitId": "miami",
                "circuitName": "Miami International Autodrome",
                "Location": {"lat": "25.9581", "long": "-80.2389", "locality": "Miami", "country": "USA"}
            }
        });

        let reason = parse_race(value).expect_err("non-numeric round");
        assert!(reason.contains("invalid round"));
    }

    #[test]
    fn draft_converts_utc_sessions_to_circuit_time() {
        let value = serde_json::json!({
            "round": "1",
            "raceName": "Australian Grand Prix",
            "date": "2025-03-16",
            "time": "04:00:00Z",
            "Circuit": {
                "circuitId": "albert_park",
                "circuitName": "Albert Park Grand Prix Circuit",
                "Location": {"lat": "-37.8497", "long": "144.968", "locality": "Melbourne", "country": "Australia"}
            },
            "FirstPractice": {"date": "2025-03-14", "time": "01:30:00Z"},
            "Qualifying": {"date": "2025-03-15", "time": "05:00:00Z"}
        });

        let grand_prix = parse_race(value)
            .expect("valid race")
            .into_grand_prix(String::from("Australia/Melbourne"))
            .expect("valid zone");

        assert_eq!(grand_prix.circuit.location, "Melbourne, Australia");
        let starts: Vec<String> = grand_prix
            .sessions
            .iter()
            .map(|s| format!("{} {}", s.kind, s.start))
            .collect();
        assert_eq!(
            starts,
            vec![
                "FP1 2025-03-14 12:30:00",
                "QUALY 2025-03-15 16:00:00",
                "RACE 2025-03-16 15:00:00",
            ]
        );
    }

    /// Answers a zone per latitude sign.
    struct SplitZones;

    impl TimezoneSource for SplitZones {
        fn id(&self) -> ProviderId {
            ProviderId::TimeZoneDb
        }

        fn timezone<'a>(&'a self, geo: GeoPoint) -> SourceFuture<'a, crate::TimezoneInfo> {
            let zone_name = if geo.lat >= 0.0 {
                "Mars/Olympus"
            } else {
                "Australia/Melbourne"
            };
            Box::pin(async move {
                Ok(crate::TimezoneInfo {
                    zone_name: zone_name.to_string(),
                    abbreviation: None,
                    gmt_offset: None,
                })
            })
        }
    }

    #[tokio::test]
    async fn failed_race_does_not_claim_its_round() {
        let stub = crate::http_client::StubHttpClient::new().respond_json(
            "/2025.json",
            r#"{"MRData":{"RaceTable":{"Races":[
                {"round":"1","raceName":"Broken Grand Prix","date":"2025-03-16","time":"04:00:00Z",
                 "Circuit":{"circuitId":"nowhere","circuitName":"Nowhere","Location":{"lat":"10.0","long":"10.0","locality":"Nowhere","country":"None"}}},
                {"round":"1","raceName":"Australian Grand Prix","date":"2025-03-16","time":"04:00:00Z",
                 "Circuit":{"circuitId":"albert_park","circuitName":"Albert Park Grand Prix Circuit","Location":{"lat":"-37.8497","long":"144.968","locality":"Melbourne","country":"Australia"}}}
            ]}}}"#,
        );
        let fetcher = JsonFetcher::new(
            Arc::new(stub),
            crate::provider_policy::ProviderPolicy::jolpica_default(),
        )
        .with_retry(crate::retry::RetryConfig::no_retry());
        let adapter = JolpicaAdapter::new(
            JolpicaConfig {
                base_url: String::from("https://jolpica.test"),
            },
            fetcher,
            Arc::new(SplitZones),
        );

        let schedule = adapter.schedule(2025).await.expect("schedule");

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].name, "Australian Grand Prix");
        assert_eq!(schedule[0].circuit.timezone, "Australia/Melbourne");
    }

    #[test]
    fn standings_position_falls_back_to_row_order() {
        assert_eq!(parse_position(None, 4), Ok(5));
        assert_eq!(parse_position(Some("2"), 0), Ok(2));
        assert!(parse_position(Some("-"), 0).is_err());
    }
}
