use serde::Serialize;

use pitlane_core::{StandingEntry, StandingKind};

use crate::cli::{StandingsArgs, StandingsKind};
use crate::error::CliError;
use crate::metadata::CommandOutput;

use super::CommandContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StandingsData {
    kind: StandingKind,
    season: u32,
    entries: Vec<StandingEntry>,
}

pub async fn standings(
    args: &StandingsArgs,
    context: &CommandContext,
) -> Result<CommandOutput, CliError> {
    let season = context.season;
    let (kind, resolved) = match args.kind {
        StandingsKind::Drivers => (
            StandingKind::Driver,
            context.aggregator.driver_standings(season).await,
        ),
        StandingsKind::Constructors => (
            StandingKind::Constructor,
            context.aggregator.team_standings(season).await,
        ),
    };
    CommandOutput::from_resolved(resolved.map(|entries| StandingsData {
        kind,
        season,
        entries,
    }))
}

pub async fn drivers(context: &CommandContext) -> Result<CommandOutput, CliError> {
    CommandOutput::from_resolved(context.aggregator.drivers(context.season).await)
}

pub async fn teams(context: &CommandContext) -> Result<CommandOutput, CliError> {
    CommandOutput::from_resolved(context.aggregator.teams_with_drivers(context.season).await)
}
