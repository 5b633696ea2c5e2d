//! OpenF1 live classification and car telemetry.
//!
//! Both endpoints need a session key. Without one the adapter answers with an
//! unavailable snapshot instead of an error, so callers render a hint rather
//! than a failure.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::config::OpenF1Config;
use crate::data_source::{LiveTimingSource, SourceError, SourceFuture};
use crate::fetch::JsonFetcher;
use crate::http_client::HttpRequest;
use crate::locale::Notice;
use crate::{
    LiveTimingEntry, LiveTimingSnapshot, Locale, ProviderId, TelemetryEntry, TelemetrySnapshot,
};

const CAR_DATA_LIMIT: u32 = 200;
const PLACEHOLDER: &str = "--";

#[derive(Debug, Clone)]
pub struct OpenF1Adapter {
    config: OpenF1Config,
    fetcher: JsonFetcher,
}

impl OpenF1Adapter {
    pub fn new(config: OpenF1Config, fetcher: JsonFetcher) -> Self {
        Self { config, fetcher }
    }

    /// Explicit key first, then the configured one.
    fn session<'a>(&'a self, session_key: Option<&'a str>) -> Option<&'a str> {
        session_key
            .or(self.config.session_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    async fn fetch_live_timing(
        &self,
        session_key: Option<&str>,
        locale: Locale,
    ) -> Result<LiveTimingSnapshot, SourceError> {
        let Some(session) = self.session(session_key) else {
            return Ok(LiveTimingSnapshot::unavailable(
                locale.notice(Notice::LiveTimingUnconfigured),
                Utc::now(),
            ));
        };

        let request = HttpRequest::endpoint(&self.config.base_url, "/position")
            .with_query("session_key", session);
        let rows: Vec<PositionRow> = self.fetcher.fetch_json(request).await?;

        Ok(LiveTimingSnapshot::from_entries(
            classification(rows),
            Utc::now(),
            locale.notice(Notice::LiveTimingNoData),
        ))
    }

    async fn fetch_telemetry(
        &self,
        session_key: Option<&str>,
        driver_number: Option<u32>,
        locale: Locale,
    ) -> Result<TelemetrySnapshot, SourceError> {
        let Some(session) = self.session(session_key) else {
            return Ok(TelemetrySnapshot::unavailable(
                "",
                locale.notice(Notice::TelemetryUnconfigured),
                Utc::now(),
            ));
        };

        let mut request = HttpRequest::endpoint(&self.config.base_url, "/car_data")
            .with_query("session_key", session)
            .with_query("limit", CAR_DATA_LIMIT.to_string());
        if let Some(number) = driver_number {
            request = request.with_query("driver_number", number.to_string());
        }
        let rows: Vec<CarDataRow> = self.fetcher.fetch_json(request).await?;

        let label = session_label(session);
        let entries = summarize_car_data(rows);
        if entries.is_empty() {
            return Ok(TelemetrySnapshot::unavailable(
                label,
                locale.notice(Notice::TelemetryNoSamples),
                Utc::now(),
            ));
        }
        Ok(TelemetrySnapshot {
            available: true,
            session: label,
            updated_at: Utc::now(),
            message: None,
            entries,
        })
    }
}

impl LiveTimingSource for OpenF1Adapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenF1
    }

    fn live_timing<'a>(
        &'a self,
        session_key: Option<&'a str>,
        locale: Locale,
    ) -> SourceFuture<'a, LiveTimingSnapshot> {
        Box::pin(self.fetch_live_timing(session_key, locale))
    }

    fn telemetry<'a>(
        &'a self,
        session_key: Option<&'a str>,
        driver_number: Option<u32>,
        locale: Locale,
    ) -> SourceFuture<'a, TelemetrySnapshot> {
        Box::pin(self.fetch_telemetry(session_key, driver_number, locale))
    }
}

pub fn session_label(session_key: &str) -> String {
    format!("Session {session_key}")
}

#[derive(Debug, Deserialize)]
struct PositionRow {
    driver_number: u32,
    #[serde(default)]
    position: Option<u32>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    gap_to_leader: Option<Value>,
    #[serde(default)]
    last_lap_time: Option<Value>,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    driver_short_name: Option<String>,
    #[serde(default)]
    tyre_compound: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CarDataRow {
    driver_number: u32,
    #[serde(default)]
    speed: Option<f64>,
}

/// Latest row per driver, ordered by position.
fn classification(rows: Vec<PositionRow>) -> Vec<LiveTimingEntry> {
    let mut latest: HashMap<u32, PositionRow> = HashMap::new();
    for row in rows.into_iter().filter(|row| row.position.is_some_and(|p| p > 0)) {
        match latest.get(&row.driver_number) {
            Some(current) if current.date >= row.date => {}
            _ => {
                latest.insert(row.driver_number, row);
            }
        }
    }

    let mut rows: Vec<PositionRow> = latest.into_values().collect();
    rows.sort_by_key(|row| (row.position, row.driver_number));
    rows.into_iter().map(entry_from_row).collect()
}

fn entry_from_row(row: PositionRow) -> LiveTimingEntry {
    let driver = row
        .driver_short_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("#{}", row.driver_number));
    let driver_label = match row.team_name.filter(|team| !team.is_empty()) {
        Some(team) => format!("{driver} · {team}"),
        None => driver,
    };

    LiveTimingEntry {
        position: row.position.unwrap_or_default(),
        driver_label,
        gap_text: gap_text(row.gap_to_leader.as_ref()),
        tyre_label: row
            .tyre_compound
            .filter(|tyre| !tyre.is_empty())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        last_lap_text: lap_text(row.last_lap_time.as_ref()),
    }
}

fn gap_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(gap) if gap > 0.0 => format!("+{gap:.3}"),
            Some(_) => String::from("0.000"),
            None => PLACEHOLDER.to_string(),
        },
        _ => PLACEHOLDER.to_string(),
    }
}

/// Lap seconds as `m:ss.mmm`; strings pass through unchanged.
fn lap_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => {
                let millis = (seconds * 1000.0).round() as u64;
                format!(
                    "{}:{:02}.{:03}",
                    millis / 60_000,
                    (millis / 1000) % 60,
                    millis % 1000
                )
            }
            _ => PLACEHOLDER.to_string(),
        },
        _ => PLACEHOLDER.to_string(),
    }
}

fn summarize_car_data(rows: Vec<CarDataRow>) -> Vec<TelemetryEntry> {
    let mut grouped: BTreeMap<u32, (u32, f64)> = BTreeMap::new();
    for row in rows {
        let slot = grouped.entry(row.driver_number).or_insert((0, 0.0));
        slot.0 += 1;
        if let Some(speed) = row.speed.filter(|speed| speed.is_finite()) {
            slot.1 = slot.1.max(speed);
        }
    }

    grouped
        .into_iter()
        .map(|(number, (samples, top_speed))| TelemetryEntry {
            driver: format!("#{number}"),
            samples,
            top_speed_kmh: top_speed.round().max(0.0) as u32,
        })
        .collect()
}
