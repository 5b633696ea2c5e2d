use chrono::NaiveDateTime;
use serde::Serialize;

use pitlane_core::domain::time::{parse_local, to_user_zone};
use pitlane_core::Resolved;

use crate::cli::{ConvertArgs, TimezoneArgs};
use crate::error::CliError;
use crate::metadata::CommandOutput;

use super::CommandContext;

pub async fn timezone(args: &TimezoneArgs, context: &CommandContext) -> Result<CommandOutput, CliError> {
    let resolved = context.aggregator.timezone(args.lat, args.lng).await?;
    CommandOutput::from_resolved(resolved)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConversionData {
    local: NaiveDateTime,
    from: String,
    to: String,
    converted: String,
}

/// Pure conversion; no provider is consulted.
pub fn convert(args: &ConvertArgs, default_zone: &str) -> Result<CommandOutput, CliError> {
    let local = parse_local(&args.local)?;
    let target = args.to.as_deref().unwrap_or(default_zone);
    let converted = to_user_zone(local, &args.from, target)?;

    CommandOutput::from_resolved(Resolved::local(ConversionData {
        local,
        from: args.from.clone(),
        to: target.to_string(),
        converted: converted.to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use pitlane_core::Origin;

    use super::*;

    fn args(local: &str, from: &str, to: Option<&str>) -> ConvertArgs {
        ConvertArgs {
            local: local.to_string(),
            from: from.to_string(),
            to: to.map(str::to_string),
        }
    }

    #[test]
    fn converts_into_default_zone() {
        let output = convert(
            &args("2025-03-16T15:00", "Australia/Melbourne", None),
            "America/Argentina/Cordoba",
        )
        .expect("valid conversion");

        assert_eq!(output.resolved.origin, Origin::Local);
        assert_eq!(output.resolved.data["converted"], "2025-03-16T01:00:00-03:00");
        assert_eq!(output.resolved.data["to"], "America/Argentina/Cordoba");
    }

    #[test]
    fn rejects_unknown_zone_and_bad_time() {
        let error = convert(&args("2025-03-16T15:00", "Mars/Olympus", None), "UTC")
            .expect_err("unknown zone");
        assert_eq!(error.exit_code(), 2);

        assert!(convert(&args("16/03/2025", "UTC", None), "UTC").is_err());
    }
}
