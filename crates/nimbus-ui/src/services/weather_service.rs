//! Weather backend: async refresh of every saved city.
//! All network work runs off the UI thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use nimbus_weather::{update_all_cities, CityList, RefreshError, RefreshOptions, RefreshOutcome, WeatherSource};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Error type for refresh operations
#[derive(Debug)]
pub enum ServiceError {
    Refresh(RefreshError),
    Cancelled,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Refresh(e) => write!(f, "Refresh error: {}", e),
            ServiceError::Cancelled => write!(f, "Refresh cancelled by shutdown"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Refresh(e) => Some(e),
            ServiceError::Cancelled => None,
        }
    }
}

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of refreshing the whole city list
    RefreshDone(Result<RefreshOutcome, ServiceError>),
}

/// Request a refresh of `cities` on the runtime.
/// Sends `RefreshDone` on the channel when complete or cancelled.
pub fn request_refresh(
    tx: &Sender<WeatherServiceMessage>,
    runtime: &Handle,
    source: Arc<dyn WeatherSource>,
    cities: CityList,
    options: RefreshOptions,
    cancel: CancellationToken,
) {
    let tx = tx.clone();

    runtime.spawn(async move {
        // Cancellation wins when both arms are ready
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ServiceError::Cancelled),
            outcome = update_all_cities(source.as_ref(), &cities, &options) => {
                outcome.map_err(ServiceError::Refresh)
            }
        };

        if let Err(e) = &result {
            tracing::error!("City refresh failed: {}", e);
        }

        // Receiver is gone when the screen was dropped mid-refresh
        let _ = tx.send(WeatherServiceMessage::RefreshDone(result));
    });
}
