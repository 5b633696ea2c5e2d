use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Canonical upstream provider identifiers used in logs, errors and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Jolpica,
    OpenWeather,
    NewsApi,
    YouTube,
    OpenF1,
    TimeZoneDb,
    Wikipedia,
    /// RapidAPI "API-Formula-1" live event feed (track status).
    F1Live,
}

impl ProviderId {
    pub const ALL: [Self; 8] = [
        Self::Jolpica,
        Self::OpenWeather,
        Self::NewsApi,
        Self::YouTube,
        Self::OpenF1,
        Self::TimeZoneDb,
        Self::Wikipedia,
        Self::F1Live,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Jolpica => "jolpica",
            Self::OpenWeather => "openweather",
            Self::NewsApi => "newsapi",
            Self::YouTube => "youtube",
            Self::OpenF1 => "openf1",
            Self::TimeZoneDb => "timezonedb",
            Self::Wikipedia => "wikipedia",
            Self::F1Live => "f1live",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_names_match_as_str() {
        for provider in ProviderId::ALL {
            let json = serde_json::to_string(&provider).expect("provider serializes");
            assert_eq!(json, format!("\"{}\"", provider.as_str()));
        }
    }
}
