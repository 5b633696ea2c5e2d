mod live;
mod media;
mod season;
mod standings;
mod time;

use std::sync::Arc;

use chrono::{Datelike, Utc};
use pitlane_core::{Aggregator, Envelope, Locale, PitlaneConfig, ReqwestHttpClient};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::{CommandOutput, RequestContext};

/// What every command needs besides its own arguments.
pub struct CommandContext {
    pub aggregator: Aggregator,
    pub season: u32,
    pub locale: Locale,
    pub user_zone: String,
}

pub async fn run(cli: &Cli, request: &RequestContext) -> Result<Envelope<Value>, CliError> {
    let config = PitlaneConfig::from_env()?;
    let http = Arc::new(ReqwestHttpClient::new(&config.http.user_agent));
    let context = CommandContext {
        aggregator: Aggregator::from_config(&config, http)?,
        season: cli.season.unwrap_or_else(current_season),
        locale: Locale::resolve(cli.lang.as_deref()),
        user_zone: cli.tz.clone(),
    };
    tracing::debug!(
        season = context.season,
        locale = %context.locale,
        aggregator = ?context.aggregator,
        "running command"
    );

    let output = dispatch(&cli.command, &context).await?;
    request.finish(output)
}

async fn dispatch(command: &Command, context: &CommandContext) -> Result<CommandOutput, CliError> {
    match command {
        Command::Schedule => season::schedule(context).await,
        Command::Next(args) => season::next(args, context).await,
        Command::Round(args) => season::round(args, context).await,
        Command::Weather(args) => season::weather(args, context).await,
        Command::Results => season::results(context).await,
        Command::Dashboard => season::dashboard(context).await,
        Command::Standings(args) => standings::standings(args, context).await,
        Command::Drivers => standings::drivers(context).await,
        Command::Teams => standings::teams(context).await,
        Command::News(args) => media::news(args, context).await,
        Command::Videos(args) => media::videos(args, context).await,
        Command::Live(args) => live::live(args, context).await,
        Command::Telemetry(args) => live::telemetry(args, context).await,
        Command::Status => live::status(context).await,
        Command::Images(args) => media::images(args, context).await,
        Command::Timezone(args) => time::timezone(args, context).await,
        Command::Convert(args) => time::convert(args, &context.user_zone),
    }
}

fn current_season() -> u32 {
    u32::try_from(Utc::now().year()).unwrap_or(2025)
}
