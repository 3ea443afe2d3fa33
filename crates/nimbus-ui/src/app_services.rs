//! Application services shared by the screen models.
//!
//! `AppServices` owns the tokio runtime that runs all network work, the
//! shutdown token, the weather source and the shared `AppState`. It is built
//! once at startup and handed to models as `Arc<AppServices>`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use nimbus_core::{AppError, Config};
use nimbus_services::CityStore;
use nimbus_weather::{CitySuggestion, Geocoder, RefreshOptions, WeatherProvider, WeatherSource};

use crate::app_state::AppState;
use crate::error_mapping::map_weather_error;

pub const DEFAULT_LAST_UPDATE_FORMAT: &str = "%d/%m/%Y %I:%M";

pub struct AppServices {
    /// Tokio runtime for async operations
    runtime: tokio::runtime::Runtime,

    /// Cancelled on shutdown; in-flight refreshes observe it
    shutdown: CancellationToken,

    state: Arc<AppState>,
    weather_source: Arc<dyn WeatherSource>,
    geocoder: Option<Geocoder>,
    refresh_options: RefreshOptions,
    last_update_format: String,
}

impl AppServices {
    /// Build services around an existing state and weather source
    pub fn new(
        state: Arc<AppState>,
        weather_source: Arc<dyn WeatherSource>,
        refresh_options: RefreshOptions,
    ) -> Result<Self, AppError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("nimbus-tokio")
            .build()?;

        Ok(Self {
            runtime,
            shutdown: CancellationToken::new(),
            state,
            weather_source,
            geocoder: None,
            refresh_options,
            last_update_format: DEFAULT_LAST_UPDATE_FORMAT.to_string(),
        })
    }

    /// Wire everything from configuration: provider, geocoder and the
    /// persistent city store.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let unit = match config.weather.temperature_unit {
            nimbus_core::TemperatureUnit::Celsius => nimbus_weather::TemperatureUnit::Celsius,
            nimbus_core::TemperatureUnit::Fahrenheit => nimbus_weather::TemperatureUnit::Fahrenheit,
        };
        let policy = match config.weather.refresh_policy {
            nimbus_core::RefreshPolicy::AllOrNothing => nimbus_weather::RefreshPolicy::AllOrNothing,
            nimbus_core::RefreshPolicy::BestEffort => nimbus_weather::RefreshPolicy::BestEffort,
        };

        let request_timeout = Duration::from_secs(config.weather.request_timeout_secs);
        let provider = WeatherProvider::with_base_url(
            config.weather.api_url.clone(),
            unit,
            request_timeout,
        )
        .map_err(map_weather_error)?;
        let geocoder = Geocoder::new(config.weather.geocoding_url.clone(), request_timeout)
            .map_err(map_weather_error)?;

        let db_path = config.database_path();
        let store = CityStore::open(&db_path)?;
        let state = AppState::load(store)?;

        let options = RefreshOptions {
            timeout: Duration::from_secs(config.weather.refresh_timeout_secs),
            policy,
        };

        tracing::info!("Services initialized (db: {:?})", db_path);

        Ok(Self::new(Arc::new(state), Arc::new(provider), options)?
            .with_geocoder(geocoder)
            .with_last_update_format(config.ui.last_update_format.clone()))
    }

    pub fn with_geocoder(mut self, geocoder: Geocoder) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_last_update_format(mut self, format: impl Into<String>) -> Self {
        self.last_update_format = format.into();
        self
    }

    /// Get the tokio runtime handle.
    pub fn runtime(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub fn weather_source(&self) -> Arc<dyn WeatherSource> {
        self.weather_source.clone()
    }

    pub fn refresh_options(&self) -> RefreshOptions {
        self.refresh_options
    }

    pub fn last_update_format(&self) -> &str {
        &self.last_update_format
    }

    /// Child token for one refresh; cancelled on shutdown
    pub fn cancel_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Search cities by name for the add-city flow. Blocks on the runtime.
    pub fn search_cities(&self, query: &str, limit: usize) -> Result<Vec<CitySuggestion>, AppError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or(AppError::Weather(nimbus_core::WeatherError::ServiceUnavailable))?;

        let results = self
            .runtime
            .block_on(geocoder.search(query, limit))
            .map_err(map_weather_error)?;

        tracing::debug!("Search {:?} returned {} matches", query, results.len());
        Ok(results)
    }

    /// Signal application shutdown, cancelling in-flight refreshes.
    pub fn shutdown(&self) {
        tracing::info!("AppServices shutdown initiated");
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use async_trait::async_trait;
    use nimbus_weather::{City, WeatherError, WeatherSnapshot};

    struct NoSource;

    #[async_trait]
    impl WeatherSource for NoSource {
        async fn fetch_weather(&self, _city: &City) -> Result<WeatherSnapshot, WeatherError> {
            Err(WeatherError::Parse("unused".to_string()))
        }
    }

    fn services() -> AppServices {
        AppServices::new(
            Arc::new(AppState::new()),
            Arc::new(NoSource),
            RefreshOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_shutdown_cancels_child_tokens() {
        let services = services();
        let token = services.cancel_token();
        assert!(!token.is_cancelled());

        services.shutdown();
        assert!(token.is_cancelled());
        assert!(services.is_shutting_down());
    }

    #[test]
    fn test_search_without_geocoder_is_unavailable() {
        let err = services().search_cities("Paris", 5).unwrap_err();
        assert!(matches!(
            err,
            AppError::Weather(nimbus_core::WeatherError::ServiceUnavailable)
        ));
    }

    #[test]
    fn test_from_config_uses_database_in_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            config_dir: dir.path().to_path_buf(),
            ..Config::default()
        };

        let services = AppServices::from_config(&config).unwrap();
        assert!(services.state().is_persistent());
        assert_eq!(services.last_update_format(), DEFAULT_LAST_UPDATE_FORMAT);
        assert!(dir.path().join("cities.db").exists());
    }
}
