use crate::services::weather_service::ServiceError;
use nimbus_core::error::ReqwestErrorExt;
use nimbus_core::{AppError, NetworkError, WeatherError};
use nimbus_weather::RefreshError;

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Refresh(RefreshError::TimedOut(_)) => {
                AppError::Weather(WeatherError::RefreshTimedOut)
            }
            ServiceError::Refresh(other) => {
                AppError::Weather(WeatherError::RefreshFailed(other.to_string()))
            }
            ServiceError::Cancelled => {
                AppError::Weather(WeatherError::RefreshFailed("cancelled".to_string()))
            }
        }
    }
}

/// Map a data-source error into the app hierarchy.
pub fn map_weather_error(e: nimbus_weather::WeatherError) -> AppError {
    match e {
        nimbus_weather::WeatherError::Network(e) => AppError::Network(e.into_network_error()),
        nimbus_weather::WeatherError::Api { status, message } => {
            AppError::Network(NetworkError::ServerError { status, message })
        }
        nimbus_weather::WeatherError::Parse(s) => {
            AppError::Network(NetworkError::InvalidResponse(s))
        }
    }
}
