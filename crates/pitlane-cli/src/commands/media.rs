use pitlane_core::SearchQuery;

use crate::cli::{ImagesArgs, SearchArgs};
use crate::error::CliError;
use crate::metadata::CommandOutput;

use super::CommandContext;

pub async fn news(args: &SearchArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    let query = SearchQuery::new(args.news_text(), args.limit, context.locale)?;
    CommandOutput::from_resolved(context.aggregator.news(&query).await)
}

pub async fn videos(args: &SearchArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    let query = SearchQuery::new(args.videos_text(), args.limit, context.locale)?;
    CommandOutput::from_resolved(context.aggregator.highlights(&query).await)
}

pub async fn images(args: &ImagesArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    CommandOutput::from_resolved(context.aggregator.images(&args.titles).await)
}
