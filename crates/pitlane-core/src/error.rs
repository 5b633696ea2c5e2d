use thiserror::Error;

/// Validation and contract errors exposed by `pitlane-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown IANA timezone '{value}'")]
    InvalidTimezone { value: String },
    #[error("invalid local date-time '{value}', expected YYYY-MM-DDTHH:MM[:SS]")]
    InvalidLocalDateTime { value: String },
    #[error("local time '{value}' does not exist in timezone '{timezone}'")]
    NonexistentLocalTime { value: String, timezone: String },
    #[error("invalid session type '{value}', expected one of FP1, FP2, FP3, SPRINT, QUALY, RACE")]
    InvalidSessionType { value: String },
    #[error("session {session} ends before it starts")]
    SessionEndsBeforeStart { session: &'static str },

    #[error("driver code must be 1-3 upper-case ASCII characters: '{value}'")]
    InvalidDriverCode { value: String },
    #[error("round must be greater than zero")]
    InvalidRound,
    #[error("round {round} is duplicated or out of order")]
    UnorderedRound { round: u32 },
    #[error("sessions of round {round} are not ordered by start time")]
    UnorderedSessions { round: u32 },
    #[error("standing position must be greater than zero")]
    InvalidPosition,
    #[error("coordinate '{field}' is out of range: {value}")]
    CoordinateOutOfRange { field: &'static str, value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("invalid value '{value}' for {name}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("fixture '{name}' is malformed: {source}")]
    Fixture {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read fixture '{path}': {source}")]
    FixtureIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
