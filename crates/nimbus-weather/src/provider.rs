//! Open-Meteo weather provider.

use crate::types::{City, TemperatureUnit, WeatherCondition, WeatherError, WeatherSnapshot};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.open-meteo.com";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,relative_humidity_2m,wind_speed_10m,weather_code";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min";
const OPEN_METEO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Per-city weather lookup.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(&self, city: &City) -> Result<WeatherSnapshot, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: String,
    temperature_2m: f64,
    apparent_temperature: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
    weather_code: i32,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    unit: TemperatureUnit,
}

impl WeatherProvider {
    pub fn new(unit: TemperatureUnit) -> Result<Self, WeatherError> {
        Self::with_base_url(DEFAULT_API_URL, unit, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        unit: TemperatureUnit,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            unit,
        })
    }

    /// Fetch current conditions and today's range for a coordinate pair
    pub async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        tracing::debug!("Fetching weather for {}, {}", latitude, longitude);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("forecast_days", "1".to_string()),
                ("timezone", "auto".to_string()),
                ("temperature_unit", self.unit.as_query().to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        self.to_snapshot(body)
    }

    fn to_snapshot(&self, body: ForecastResponse) -> Result<WeatherSnapshot, WeatherError> {
        let current = body.current;
        let observed_at = NaiveDateTime::parse_from_str(&current.time, OPEN_METEO_TIME_FORMAT)
            .map_err(|e| WeatherError::Parse(format!("bad time {:?}: {}", current.time, e)))?;

        let (temp_min, temp_max) = body
            .daily
            .map(|d| {
                (
                    d.temperature_2m_min.first().copied().flatten(),
                    d.temperature_2m_max.first().copied().flatten(),
                )
            })
            .unwrap_or((None, None));

        Ok(WeatherSnapshot {
            temperature: current.temperature_2m,
            feels_like: current.apparent_temperature,
            humidity: current.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
            wind_speed: current.wind_speed_10m,
            condition: WeatherCondition::from_wmo_code(current.weather_code),
            temp_min,
            temp_max,
            unit: self.unit,
            observed_at,
        })
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn fetch_weather(&self, city: &City) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch(city.latitude, city.longitude).await
    }
}
