//! # Domain Models
//!
//! Canonical, provider-agnostic Formula 1 records.
//!
//! Every aggregation call builds these fresh; nothing is patched after
//! construction. Session times are wall-clock times in the circuit's own
//! zone, see [`time`] for conversions.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`GrandPrix`] | One race weekend with its circuit and ordered sessions |
//! | [`Session`] | FP1..RACE with local start/end |
//! | [`Driver`] / [`Team`] | Season entrants with points |
//! | [`StandingEntry`] | Ranked points total |
//! | [`WeatherSnapshot`] | Current conditions plus per-session forecast |
//! | [`LiveTimingSnapshot`] | Classification during a session |
//! | [`RaceResult`] | Podium of the last race |
//! | [`TrackStatus`] | Race-control flag of the running session |

mod models;
pub mod time;

pub use models::{
    normalize_driver_code, validate_driver_code, Circuit, Driver, ForecastItem, GeoPoint,
    GrandPrix, LiveTimingEntry, LiveTimingSnapshot, MediaImage, NewsArticle, PodiumEntry,
    RaceResult, Session, SessionType, StandingEntry, StandingKind, Team, TelemetryEntry,
    TelemetrySnapshot, TimezoneInfo, TrackStatus, VideoItem, WeatherNow, WeatherSnapshot,
};
