use chrono::{DateTime, Utc};
use serde::Serialize;

use pitlane_core::aggregate::next_after;
use pitlane_core::domain::time::{countdown, parse_timezone, to_user_zone};
use pitlane_core::{EnvelopeError, GrandPrix, Notice, Resolved, Session, SessionType};

use crate::cli::{NextArgs, RoundArgs, WeatherArgs};
use crate::error::CliError;
use crate::metadata::CommandOutput;

use super::CommandContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleData {
    season: u32,
    races: Vec<GrandPrix>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextData {
    grand_prix: Option<GrandPrix>,
    starts_at: Option<DateTime<Utc>>,
    countdown: Option<String>,
    user_timezone: String,
    user_sessions: Vec<UserSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<String>,
}

#[derive(Debug, Serialize)]
struct UserSession {
    #[serde(rename = "type")]
    kind: SessionType,
    start: String,
    end: String,
}

pub async fn schedule(context: &CommandContext) -> Result<CommandOutput, CliError> {
    let season = context.season;
    let resolved = context
        .aggregator
        .schedule(season)
        .await
        .map(|races| ScheduleData { season, races });
    CommandOutput::from_resolved(resolved)
}

pub async fn next(args: &NextArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    parse_timezone(&context.user_zone)?;
    let now = match args.at.as_deref() {
        Some(raw) => parse_instant(raw)?,
        None => Utc::now(),
    };

    let Resolved {
        data,
        origin,
        warnings,
    } = context
        .aggregator
        .next_grand_prix(Some(now), context.season)
        .await;

    let view = match data {
        Some(grand_prix) => {
            let starts_at = grand_prix.reference_instant()?;
            let user_sessions = grand_prix
                .sessions
                .iter()
                .map(|session| {
                    user_session(session, &grand_prix.circuit.timezone, &context.user_zone)
                })
                .collect::<Result<Vec<_>, _>>()?;
            NextData {
                countdown: starts_at.map(|target| {
                    countdown(target, now, context.locale.notice(Notice::LiveLabel))
                }),
                grand_prix: Some(grand_prix),
                starts_at,
                user_timezone: context.user_zone.clone(),
                user_sessions,
                notice: None,
            }
        }
        None => NextData {
            grand_prix: None,
            starts_at: None,
            countdown: None,
            user_timezone: context.user_zone.clone(),
            user_sessions: Vec::new(),
            notice: Some(context.locale.notice(Notice::SeasonOver).to_string()),
        },
    };

    CommandOutput::from_resolved(Resolved {
        data: view,
        origin,
        warnings,
    })
}

pub async fn round(args: &RoundArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    let resolved = context
        .aggregator
        .grand_prix_by_round(args.round, context.season)
        .await;
    let missing = resolved.data.is_none();

    let mut output = CommandOutput::from_resolved(resolved)?;
    if missing {
        output = output.with_error(EnvelopeError::new(
            "round.not_found",
            format!(
                "round {} is not in the {} schedule",
                args.round, context.season
            ),
        )?);
    }
    Ok(output)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WeatherData {
    round: u32,
    grand_prix: String,
    circuit: String,
    #[serde(flatten)]
    report: pitlane_core::WeatherReport,
}

pub async fn weather(args: &WeatherArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    let schedule = context.aggregator.schedule(context.season).await;
    let grand_prix = match args.round {
        Some(round) => schedule.data.iter().find(|gp| gp.round == round).cloned(),
        None => next_after(&schedule.data, Utc::now()),
    };
    let Some(grand_prix) = grand_prix else {
        return Err(CliError::Command(match args.round {
            Some(round) => format!("round {round} is not in the {} schedule", context.season),
            None => format!(
                "no upcoming Grand Prix in {}; pass --round",
                context.season
            ),
        }));
    };

    let report = context
        .aggregator
        .weather_for_grand_prix(&grand_prix, context.locale)
        .await;
    let mut resolved = report.map(|report| WeatherData {
        round: grand_prix.round,
        grand_prix: grand_prix.name.clone(),
        circuit: grand_prix.circuit.name.clone(),
        report,
    });
    resolved.warnings.extend(schedule.warnings);
    CommandOutput::from_resolved(resolved)
}

pub async fn results(context: &CommandContext) -> Result<CommandOutput, CliError> {
    CommandOutput::from_resolved(context.aggregator.last_race_result(context.season).await)
}

pub async fn dashboard(context: &CommandContext) -> Result<CommandOutput, CliError> {
    CommandOutput::from_resolved(context.aggregator.dashboard(context.season, None).await)
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|error| CliError::Command(format!("invalid --at '{raw}': {error}")))
}

fn user_session(
    session: &Session,
    circuit_zone: &str,
    user_zone: &str,
) -> Result<UserSession, CliError> {
    Ok(UserSession {
        kind: session.kind,
        start: to_user_zone(session.start, circuit_zone, user_zone)?.to_rfc3339(),
        end: to_user_zone(session.end, circuit_zone, user_zone)?.to_rfc3339(),
    })
}
