use crate::cli::{LiveArgs, TelemetryArgs};
use crate::error::CliError;
use crate::metadata::CommandOutput;

use super::CommandContext;

pub async fn live(args: &LiveArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    let resolved = if args.sample {
        context.aggregator.live_timing_sample(context.locale)
    } else {
        context
            .aggregator
            .live_timing(args.session.as_deref(), context.locale)
            .await
    };
    CommandOutput::from_resolved(resolved)
}

pub async fn telemetry(
    args: &TelemetryArgs,
    context: &CommandContext,
) -> Result<CommandOutput, CliError> {
    let resolved = context
        .aggregator
        .telemetry(args.session.as_deref(), args.driver, context.locale)
        .await;
    CommandOutput::from_resolved(resolved)
}

pub async fn status(context: &CommandContext) -> Result<CommandOutput, CliError> {
    CommandOutput::from_resolved(context.aggregator.track_status(context.locale).await)
}
