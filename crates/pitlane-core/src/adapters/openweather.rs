//! OpenWeather current conditions and 3-hourly forecast.

use serde::Deserialize;

use crate::config::KeyedProviderConfig;
use crate::data_source::{SourceError, SourceFuture, WeatherSource};
use crate::domain::time;
use crate::fetch::JsonFetcher;
use crate::http_client::{HttpAuth, HttpRequest};
use crate::{ForecastItem, GeoPoint, GrandPrix, Locale, ProviderId, WeatherNow, WeatherSnapshot};

#[derive(Debug, Clone)]
pub struct OpenWeatherAdapter {
    config: KeyedProviderConfig,
    fetcher: JsonFetcher,
}

impl OpenWeatherAdapter {
    pub fn new(config: KeyedProviderConfig, fetcher: JsonFetcher) -> Self {
        Self { config, fetcher }
    }

    fn request(&self, path: &str, geo: GeoPoint, locale: Locale, api_key: &str) -> HttpRequest {
        HttpRequest::endpoint(&self.config.base_url, path)
            .with_query("lat", geo.lat.to_string())
            .with_query("lon", geo.lng.to_string())
            .with_query("units", "metric")
            .with_query("lang", locale.as_str())
            .with_auth(&HttpAuth::Query {
                name: String::from("appid"),
                value: api_key.to_string(),
            })
    }

    async fn fetch_weather(
        &self,
        grand_prix: &GrandPrix,
        locale: Locale,
    ) -> Result<WeatherSnapshot, SourceError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(SourceError::not_configured(
                ProviderId::OpenWeather,
                "OPENWEATHER_API_KEY",
            ));
        };
        let geo = grand_prix.circuit.geo;

        let (current, forecast) = tokio::join!(
            self.fetcher
                .fetch_json::<CurrentResponse>(self.request("/weather", geo, locale, api_key)),
            self.fetcher
                .fetch_json::<ForecastResponse>(self.request("/forecast", geo, locale, api_key)),
        );
        let current = current?;
        let forecast = forecast?;

        let now = WeatherNow {
            temperature_c: round_i32(current.main.temp),
            description: current
                .weather
                .into_iter()
                .next()
                .map(|condition| condition.description)
                .unwrap_or_default(),
            wind_kmh: round_i32(current.wind.map_or(0.0, |wind| wind.speed) * 3.6),
            humidity_pct: percent(current.main.humidity.unwrap_or(0.0)),
        };

        let timestamps: Vec<i64> = forecast.list.iter().map(|bucket| bucket.dt).collect();
        let mut items = Vec::with_capacity(grand_prix.sessions.len());
        for session in &grand_prix.sessions {
            let target = time::to_instant(session.start, &grand_prix.circuit.timezone)?;
            let item = match nearest_forecast_index(&timestamps, target.timestamp()) {
                Some(index) => {
                    let bucket = &forecast.list[index];
                    ForecastItem {
                        session: session.kind,
                        temperature_c: round_i32(bucket.main.temp),
                        rain_chance_pct: percent(bucket.pop.unwrap_or(0.0) * 100.0),
                    }
                }
                None => ForecastItem {
                    session: session.kind,
                    temperature_c: now.temperature_c,
                    rain_chance_pct: 0,
                },
            };
            items.push(item);
        }

        Ok(WeatherSnapshot {
            now,
            forecast: items,
        })
    }
}

impl WeatherSource for OpenWeatherAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    fn weather<'a>(
        &'a self,
        grand_prix: &'a GrandPrix,
        locale: Locale,
    ) -> SourceFuture<'a, WeatherSnapshot> {
        Box::pin(self.fetch_weather(grand_prix, locale))
    }
}

/// Index of the bucket closest to `target` (unix seconds).
///
/// Ties keep the earlier bucket.
pub fn nearest_forecast_index(timestamps: &[i64], target: i64) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (index, timestamp) in timestamps.iter().enumerate() {
        let delta = timestamp.abs_diff(target);
        if best.map_or(true, |(_, best_delta)| delta < best_delta) {
            best = Some((index, delta));
        }
    }
    best.map(|(index, _)| index)
}

fn round_i32(value: f64) -> i32 {
    if value.is_finite() {
        value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    } else {
        0
    }
}

fn percent(value: f64) -> u8 {
    if value.is_finite() {
        value.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: MainBlock,
    #[serde(default)]
    wind: Option<Wind>,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    #[serde(default)]
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastBucket>,
}

#[derive(Debug, Deserialize)]
struct ForecastBucket {
    dt: i64,
    main: MainBlock,
    #[serde(default)]
    pop: Option<f64>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::http_client::StubHttpClient;
    use crate::provider_policy::ProviderPolicy;
    use crate::retry::RetryConfig;
    use crate::{Circuit, Session, SessionType};

    fn bahrain() -> GrandPrix {
        let start = NaiveDate::from_ymd_opt(2025, 4, 13)
            .and_then(|date| date.and_hms_opt(18, 0, 0))
            .expect("valid");
        GrandPrix::new(
            4,
            "Bahrain Grand Prix",
            Circuit {
                id: String::from("bahrain"),
                name: String::from("Bahrain International Circuit"),
                location: String::from("Sakhir, Bahrain"),
                timezone: String::from("Asia/Bahrain"),
                geo: GeoPoint::new(26.0325, 50.5106).expect("valid"),
            },
            vec![Session::with_default_duration(SessionType::Race, start)],
        )
        .expect("valid")
    }

    fn adapter(stub: &StubHttpClient, api_key: Option<&str>) -> OpenWeatherAdapter {
        let mut config = KeyedProviderConfig::unconfigured("https://owm.test");
        config.api_key = api_key.map(str::to_string);
        let fetcher = JsonFetcher::new(Arc::new(stub.clone()), ProviderPolicy::openweather_default())
            .with_retry(RetryConfig::linear(2, Duration::ZERO));
        OpenWeatherAdapter::new(config, fetcher)
    }

    #[test]
    fn nearest_index_prefers_earlier_bucket_on_tie() {
        assert_eq!(nearest_forecast_index(&[], 100), None);
        assert_eq!(nearest_forecast_index(&[0, 200], 100), Some(0));
        assert_eq!(nearest_forecast_index(&[0, 150, 300], 160), Some(1));
        assert_eq!(nearest_forecast_index(&[500], -10), Some(0));
    }

    #[tokio::test]
    async fn converts_wind_and_matches_race_to_forecast() {
        // 2025-04-13 18:00 in Bahrain (+03) is 15:00 UTC = 1744556400.
        let stub = StubHttpClient::new()
            .respond_json(
                "/weather",
                r#"{"weather":[{"description":"cielo claro"}],"main":{"temp":27.6,"humidity":48},"wind":{"speed":5.0}}"#,
            )
            .respond_json(
                "/forecast",
                r#"{"list":[
                    {"dt":1744545600,"main":{"temp":30.2},"pop":0.0},
                    {"dt":1744556400,"main":{"temp":26.4},"pop":0.35},
                    {"dt":1744567200,"main":{"temp":24.0},"pop":0.1}
                ]}"#,
            );

        let snapshot = adapter(&stub, Some("owm-key"))
            .weather(&bahrain(), Locale::Es)
            .await
            .expect("weather");

        assert_eq!(snapshot.now.temperature_c, 28);
        assert_eq!(snapshot.now.wind_kmh, 18);
        assert_eq!(snapshot.now.humidity_pct, 48);
        assert_eq!(snapshot.forecast.len(), 1);
        assert_eq!(snapshot.forecast[0].temperature_c, 26);
        assert_eq!(snapshot.forecast[0].rain_chance_pct, 35);

        let requests = stub.requests();
        assert!(requests.iter().all(|r| r.url.contains("units=metric")));
        assert!(requests.iter().all(|r| r.url.contains("lang=es")));
        assert!(requests.iter().all(|r| !r.log_url.contains("owm-key")));
    }

    #[tokio::test]
    async fn empty_forecast_uses_current_temperature() {
        let stub = StubHttpClient::new()
            .respond_json("/weather", r#"{"weather":[],"main":{"temp":21.2}}"#)
            .respond_json("/forecast", r#"{"list":[]}"#);

        let snapshot = adapter(&stub, Some("k"))
            .weather(&bahrain(), Locale::En)
            .await
            .expect("weather");

        assert_eq!(snapshot.forecast[0].temperature_c, 21);
        assert_eq!(snapshot.forecast[0].rain_chance_pct, 0);
        assert_eq!(snapshot.now.wind_kmh, 0);
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let stub = StubHttpClient::new();
        let error = adapter(&stub, None)
            .weather(&bahrain(), Locale::Es)
            .await
            .expect_err("no key");

        assert!(error.is_not_configured());
        assert!(stub.requests().is_empty());
    }
}
