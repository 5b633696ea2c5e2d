//! CLI argument definitions for pitlane.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `schedule` | Season calendar |
//! | `next` | Next Grand Prix with countdown |
//! | `round` | One Grand Prix by round |
//! | `standings` | Driver or constructor standings |
//! | `drivers` / `teams` | Entrants with points |
//! | `weather` | Circuit weather for a round |
//! | `news` / `videos` | Articles and highlights |
//! | `live` / `telemetry` | OpenF1 session data |
//! | `status` | Race-control flag of the running session |
//! | `images` | Lead images of Wikipedia articles |
//! | `results` | Podium of the last race |
//! | `timezone` | IANA zone for coordinates |
//! | `dashboard` | Drivers, teams and schedule in one call |
//! | `convert` | Circuit wall-clock time to another zone |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Fail when sample data was served |
//! | `--lang` | `es` | Notice language |
//! | `--season` | current year | Championship year |
//! | `--tz` | `America/Argentina/Cordoba` | Zone for user-facing times |
//!
//! # Examples
//!
//! ```bash
//! pitlane next --lang en --pretty
//! pitlane standings --kind constructors --season 2025
//! pitlane convert 2025-03-16T15:00 --from Australia/Melbourne --to Europe/Madrid
//! pitlane live --sample --format table
//! pitlane images --title "Lando Norris" --title "McLaren"
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use pitlane_core::aggregate::{DEFAULT_HIGHLIGHTS_QUERY, DEFAULT_NEWS_QUERY, DEFAULT_SEARCH_LIMIT};
use pitlane_core::domain::time::DEFAULT_USER_TIMEZONE;

/// Formula 1 season data from public providers, with offline sample data.
#[derive(Debug, Parser)]
#[command(
    name = "pitlane",
    author,
    version,
    about = "Formula 1 season data CLI",
    long_about = "pitlane aggregates Formula 1 schedules, standings, weather, news, \
videos and live timing from public providers. Every provider is optional: when one \
is down or not configured the answer comes from bundled sample data and the \
envelope says so.\n\
\n\
Provider keys are read from the environment (OPENWEATHER_API_KEY, NEWS_API_KEY, \
YOUTUBE_API_KEY, OPENF1_SESSION_KEY, TIMEZONEDB_API_KEY, RAPIDAPI_F1LIVE_KEY). Logs go to stderr and \
are controlled by RUST_LOG."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Exit with code 5 when any part of the answer is sample data.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Language for notices (es, en).
    #[arg(long, global = true, env = "PITLANE_LANG")]
    pub lang: Option<String>,

    /// Championship year; defaults to the current year.
    #[arg(long, global = true)]
    pub season: Option<u32>,

    /// IANA zone used for user-facing times.
    #[arg(long, global = true, env = "PITLANE_TZ", default_value = DEFAULT_USER_TIMEZONE)]
    pub tz: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Key/value summary for terminals.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Season calendar ordered by round.
    Schedule,

    /// Next Grand Prix after now, with countdown and sessions in `--tz`.
    Next(NextArgs),

    /// One Grand Prix by round number.
    Round(RoundArgs),

    /// Driver or constructor standings.
    ///
    /// # Examples
    ///
    ///   pitlane standings
    ///   pitlane standings --kind constructors
    Standings(StandingsArgs),

    /// Drivers ordered by points.
    Drivers,

    /// Teams ordered by points, with their drivers.
    Teams,

    /// Weather at the circuit; defaults to the next Grand Prix.
    Weather(WeatherArgs),

    /// Latest Formula 1 articles.
    News(SearchArgs),

    /// Highlight videos.
    Videos(SearchArgs),

    /// Live classification of an OpenF1 session.
    Live(LiveArgs),

    /// Per-driver car data of an OpenF1 session.
    Telemetry(TelemetryArgs),

    /// Race-control flag; `N/A` when the feed is unavailable.
    Status,

    /// Lead images for Wikipedia article titles; misses are left out.
    ///
    /// # Examples
    ///
    ///   pitlane images --title "Lando Norris" --title "Oscar Piastri"
    Images(ImagesArgs),

    /// Podium of the last completed race.
    Results,

    /// IANA zone for a pair of coordinates.
    Timezone(TimezoneArgs),

    /// Drivers, teams, schedule and the next Grand Prix in one call.
    Dashboard,

    /// Converts a circuit wall-clock time into another zone.
    ///
    /// # Examples
    ///
    ///   pitlane convert 2025-04-13T18:00 --from Asia/Bahrain
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct NextArgs {
    /// Reference instant (RFC 3339) instead of now.
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Args)]
pub struct RoundArgs {
    pub round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StandingsKind {
    Drivers,
    Constructors,
}

#[derive(Debug, Args)]
pub struct StandingsArgs {
    #[arg(long, value_enum, default_value_t = StandingsKind::Drivers)]
    pub kind: StandingsKind,
}

#[derive(Debug, Args)]
pub struct WeatherArgs {
    /// Round to report; defaults to the next Grand Prix.
    #[arg(long)]
    pub round: Option<u32>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-form search text; each command has its own default.
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: usize,
}

impl SearchArgs {
    pub fn news_text(&self) -> &str {
        self.query.as_deref().unwrap_or(DEFAULT_NEWS_QUERY)
    }

    pub fn videos_text(&self) -> &str {
        self.query.as_deref().unwrap_or(DEFAULT_HIGHLIGHTS_QUERY)
    }
}

#[derive(Debug, Args)]
pub struct LiveArgs {
    /// OpenF1 session key; defaults to OPENF1_SESSION_KEY.
    #[arg(long)]
    pub session: Option<String>,

    /// Print the bundled sample classification without calling OpenF1.
    #[arg(long, default_value_t = false)]
    pub sample: bool,
}

#[derive(Debug, Args)]
pub struct TelemetryArgs {
    /// OpenF1 session key; defaults to OPENF1_SESSION_KEY.
    #[arg(long)]
    pub session: Option<String>,

    /// Restrict samples to one car number.
    #[arg(long)]
    pub driver: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ImagesArgs {
    /// Article title; repeat for several.
    #[arg(long = "title", required = true)]
    pub titles: Vec<String>,
}

#[derive(Debug, Args)]
pub struct TimezoneArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Wall-clock time, `YYYY-MM-DDTHH:MM[:SS]`.
    pub local: String,

    /// Zone the time is expressed in.
    #[arg(long)]
    pub from: String,

    /// Target zone; defaults to `--tz`.
    #[arg(long)]
    pub to: Option<String>,
}
