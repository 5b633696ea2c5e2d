use std::time::Duration;

use crate::ProviderId;

/// Request pacing and response freshness for one upstream provider.
///
/// `quota_limit` requests are allowed per `quota_window`; `revalidate` is how
/// long a successful response may be served from the response cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub revalidate: Duration,
}

impl ProviderPolicy {
    pub fn jolpica_default() -> Self {
        Self {
            provider_id: ProviderId::Jolpica,
            quota_window: Duration::from_secs(1),
            quota_limit: 4,
            revalidate: Duration::from_secs(15 * 60),
        }
    }

    pub fn openweather_default() -> Self {
        Self {
            provider_id: ProviderId::OpenWeather,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            revalidate: Duration::from_secs(5 * 60),
        }
    }

    pub fn newsapi_default() -> Self {
        Self {
            provider_id: ProviderId::NewsApi,
            quota_window: Duration::from_secs(60),
            quota_limit: 30,
            revalidate: Duration::from_secs(15 * 60),
        }
    }

    pub fn youtube_default() -> Self {
        Self {
            provider_id: ProviderId::YouTube,
            quota_window: Duration::from_secs(60),
            quota_limit: 30,
            revalidate: Duration::from_secs(15 * 60),
        }
    }

    pub fn openf1_default() -> Self {
        Self {
            provider_id: ProviderId::OpenF1,
            quota_window: Duration::from_secs(1),
            quota_limit: 3,
            revalidate: Duration::from_secs(15),
        }
    }

    pub fn timezonedb_default() -> Self {
        Self {
            provider_id: ProviderId::TimeZoneDb,
            quota_window: Duration::from_secs(1),
            quota_limit: 1,
            revalidate: Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn wikipedia_default() -> Self {
        Self {
            provider_id: ProviderId::Wikipedia,
            quota_window: Duration::from_secs(1),
            quota_limit: 10,
            revalidate: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Polled while a session runs.
    pub fn f1live_default() -> Self {
        Self {
            provider_id: ProviderId::F1Live,
            quota_window: Duration::from_secs(60),
            quota_limit: 10,
            revalidate: Duration::from_secs(15),
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Jolpica => Self::jolpica_default(),
            ProviderId::OpenWeather => Self::openweather_default(),
            ProviderId::NewsApi => Self::newsapi_default(),
            ProviderId::YouTube => Self::youtube_default(),
            ProviderId::OpenF1 => Self::openf1_default(),
            ProviderId::TimeZoneDb => Self::timezonedb_default(),
            ProviderId::Wikipedia => Self::wikipedia_default(),
            ProviderId::F1Live => Self::f1live_default(),
        }
    }
}
