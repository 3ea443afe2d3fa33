//! Forward geocoding: turn a typed city name into candidate cities.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use crate::types::{City, WeatherError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com";
pub const DEFAULT_GEOCODING_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("Nimbus/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<CitySuggestion>,
}

/// A geocoder match the user can pick when adding a city
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CitySuggestion {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "admin1")]
    pub region: Option<String>,
    pub country: Option<String>,
}

impl CitySuggestion {
    pub fn into_city(self) -> City {
        let mut city = City::new(self.id.to_string(), self.name, self.latitude, self.longitude);
        city.region = self.region;
        city.country = self.country;
        city
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Search cities by name. A blank query returns no matches without a request.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<CitySuggestion>, WeatherError> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", query.to_string()),
                ("count", limit.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("City search returned status {}", status);
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        tracing::info!("City search for {:?} found {} matches", query, body.results.len());
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_suggestion_into_city() {
        let suggestion: CitySuggestion = serde_json::from_value(serde_json::json!({
            "id": 3448439,
            "name": "São Paulo",
            "latitude": -23.5475,
            "longitude": -46.63611,
            "admin1": "São Paulo",
            "country": "Brazil",
            "population": 10021295
        }))
        .unwrap();

        let city = suggestion.into_city();
        assert_eq!(city.id, "3448439");
        assert_eq!(city.country.as_deref(), Some("Brazil"));
        assert!(city.weather.is_none());
        assert_eq!(city.display_name(), "São Paulo, Brazil");
    }

    #[test]
    fn test_missing_results_is_empty() {
        let body: SearchResponse =
            serde_json::from_value(serde_json::json!({"generationtime_ms": 0.5})).unwrap();
        assert!(body.results.is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        // Unroutable base URL: any request would fail
        let geocoder = Geocoder::new("http://127.0.0.1:9", DEFAULT_GEOCODING_TIMEOUT).unwrap();
        let results = geocoder.search("   ", 5).await.unwrap();
        assert!(results.is_empty());
    }
}
