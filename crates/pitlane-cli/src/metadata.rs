use std::fmt::{Display, Formatter};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use pitlane_core::{Envelope, EnvelopeError, Resolved};

use crate::error::CliError;

/// Request identifier (UUID v4) for end-to-end request tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Per-invocation identity and clock.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    started: Instant,
}

impl RequestContext {
    pub fn start() -> Self {
        Self {
            request_id: RequestId::new_v4(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Wraps a command's output; `latency_ms` is measured at this call.
    pub fn finish(&self, output: CommandOutput) -> Result<Envelope<Value>, CliError> {
        let request_id = self.request_id.to_string();
        tracing::debug!(
            %request_id,
            origin = ?output.resolved.origin,
            warnings = output.resolved.warnings.len(),
            "command finished"
        );

        let mut envelope = Envelope::from_resolved(request_id, output.resolved, self.elapsed_ms())?;
        for error in output.errors {
            envelope.push_error(error)?;
        }
        Ok(envelope)
    }
}

/// Serialized result of one command, before it is wrapped in an envelope.
#[derive(Debug)]
pub struct CommandOutput {
    pub resolved: Resolved<Value>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandOutput {
    pub fn from_resolved<T: Serialize>(resolved: Resolved<T>) -> Result<Self, CliError> {
        let data = serde_json::to_value(&resolved.data)?;
        Ok(Self {
            resolved: Resolved {
                data,
                origin: resolved.origin,
                warnings: resolved.warnings,
            },
            errors: Vec::new(),
        })
    }

    pub fn with_error(mut self, error: EnvelopeError) -> Self {
        self.errors.push(error);
        self
    }
}

#[cfg(test)]
mod tests {
    use pitlane_core::{Origin, ProviderId};

    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
        assert_eq!(request_id.to_string().len(), 36);
    }

    #[test]
    fn finish_keeps_origin_warnings_and_errors() {
        let context = RequestContext::start();
        let output = CommandOutput::from_resolved(Resolved::fallback(
            vec!["a", "b"],
            "drivers: jolpica unavailable",
        ))
        .expect("serializes")
        .with_error(EnvelopeError::new("not_found", "round 30 is not scheduled").expect("valid"));

        let envelope = context.finish(output).expect("valid envelope");

        assert_eq!(envelope.meta.origin, Origin::Fallback);
        assert_eq!(envelope.meta.warnings, vec!["drivers: jolpica unavailable"]);
        assert_eq!(envelope.errors.len(), 1);
        assert_eq!(envelope.data, serde_json::json!(["a", "b"]));
        assert_eq!(envelope.meta.request_id, context.request_id.to_string());
    }

    #[test]
    fn live_output_lists_its_provider() {
        let output =
            CommandOutput::from_resolved(Resolved::live(ProviderId::OpenF1, 3)).expect("serializes");
        let envelope = RequestContext::start().finish(output).expect("valid envelope");

        assert_eq!(envelope.meta.source_chain, vec![ProviderId::OpenF1]);
        assert!(envelope.meta.warnings.is_empty());
    }
}
