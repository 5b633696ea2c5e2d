use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Output language for user-facing notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

/// User-facing notices that depend on the locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    WeatherSample,
    LiveTimingUnconfigured,
    LiveTimingNoData,
    LiveTimingFailed,
    TelemetryUnconfigured,
    TelemetryNoSamples,
    TelemetryFailed,
    LiveLabel,
    SeasonOver,
    SampleData,
    TrackStatusUnavailable,
}

impl Locale {
    /// Resolves an optional `lang` value such as `en`, `en-GB` or `ES`; anything
    /// unrecognised falls back to Spanish.
    pub fn resolve(lang: Option<&str>) -> Self {
        let Some(lang) = lang else {
            return Self::default();
        };
        let primary = lang
            .trim()
            .split(|c: char| c == '-' || c == '_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Self::En,
            _ => Self::Es,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    pub const fn notice(self, notice: Notice) -> &'static str {
        match (self, notice) {
            (Self::Es, Notice::WeatherSample) => {
                "Datos de muestra: configura OPENWEATHER_API_KEY para el clima en vivo"
            }
            (Self::En, Notice::WeatherSample) => {
                "Sample data: configure OPENWEATHER_API_KEY for live weather"
            }
            (Self::Es, Notice::LiveTimingUnconfigured) => {
                "Configura OPENF1_SESSION_KEY para habilitar live timing"
            }
            (Self::En, Notice::LiveTimingUnconfigured) => {
                "Set OPENF1_SESSION_KEY to enable live timing"
            }
            (Self::Es, Notice::LiveTimingNoData) => "Sin datos en vivo disponibles",
            (Self::En, Notice::LiveTimingNoData) => "No live data available",
            (Self::Es, Notice::LiveTimingFailed) => "No se pudo obtener live timing desde OpenF1",
            (Self::En, Notice::LiveTimingFailed) => "Could not fetch live timing from OpenF1",
            (Self::Es, Notice::TelemetryUnconfigured) => {
                "Configura OPENF1_SESSION_KEY para habilitar telemetría"
            }
            (Self::En, Notice::TelemetryUnconfigured) => {
                "Set OPENF1_SESSION_KEY to enable telemetry"
            }
            (Self::Es, Notice::TelemetryNoSamples) => "Sin muestras de telemetría",
            (Self::En, Notice::TelemetryNoSamples) => "No telemetry samples",
            (Self::Es, Notice::TelemetryFailed) => "No fue posible recuperar telemetría",
            (Self::En, Notice::TelemetryFailed) => "Could not fetch telemetry",
            (Self::Es, Notice::LiveLabel) => "En vivo",
            (Self::En, Notice::LiveLabel) => "Live",
            (Self::Es, Notice::SeasonOver) => "La temporada terminó",
            (Self::En, Notice::SeasonOver) => "The season is over",
            (Self::Es, Notice::SampleData) => "Datos sin conexión / de muestra",
            (Self::En, Notice::SampleData) => "Offline / sample data",
            (Self::Es, Notice::TrackStatusUnavailable) => "Estado de pista no disponible",
            (Self::En, Notice::TrackStatusUnavailable) => "Track status unavailable",
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
