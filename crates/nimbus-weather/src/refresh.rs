//! Refresh every saved city's weather in one batch.

use std::time::Duration;

use chrono::Utc;
use futures::future::{join_all, try_join_all};

use crate::provider::WeatherSource;
use crate::types::{City, CityList, WeatherError};

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(20);

/// What to do when some cities fail to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// One failure fails the batch and nothing is updated
    #[default]
    AllOrNothing,
    /// Failed cities keep their previous weather; fails only if every city failed
    BestEffort,
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    pub timeout: Duration,
    pub policy: RefreshPolicy,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REFRESH_TIMEOUT,
            policy: RefreshPolicy::default(),
        }
    }
}

/// Updated list, plus the ids that kept stale weather under `BestEffort`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshOutcome {
    pub cities: CityList,
    pub failed: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("Failed to refresh {city_id}: {source}")]
    Fetch {
        city_id: String,
        #[source]
        source: WeatherError,
    },
    #[error("All {count} cities failed to refresh")]
    AllFailed { count: usize },
    #[error("Refresh timed out after {0:?}")]
    TimedOut(Duration),
}

/// Fetch fresh weather for every city in `cities`.
///
/// Fetches run concurrently and the result keeps the input order and ids.
/// An empty list is a no-op that never touches `source`. The whole batch is
/// bounded by `options.timeout`.
pub async fn update_all_cities(
    source: &dyn WeatherSource,
    cities: &CityList,
    options: &RefreshOptions,
) -> Result<RefreshOutcome, RefreshError> {
    if cities.is_empty() {
        tracing::debug!("No saved cities, nothing to refresh");
        return Ok(RefreshOutcome::default());
    }

    tracing::info!(
        "Refreshing {} cities ({:?})",
        cities.len(),
        options.policy
    );

    let batch = async {
        match options.policy {
            RefreshPolicy::AllOrNothing => refresh_all_or_nothing(source, cities).await,
            RefreshPolicy::BestEffort => refresh_best_effort(source, cities).await,
        }
    };

    match tokio::time::timeout(options.timeout, batch).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("City refresh exceeded {:?}", options.timeout);
            Err(RefreshError::TimedOut(options.timeout))
        }
    }
}

async fn refresh_all_or_nothing(
    source: &dyn WeatherSource,
    cities: &CityList,
) -> Result<RefreshOutcome, RefreshError> {
    let refreshed_at = Utc::now();

    let updated = try_join_all(cities.iter().map(|city| async move {
        source
            .fetch_weather(city)
            .await
            .map(|snapshot| city.clone().with_weather(snapshot, refreshed_at))
            .map_err(|source| RefreshError::Fetch {
                city_id: city.id.clone(),
                source,
            })
    }))
    .await?;

    Ok(RefreshOutcome {
        cities: CityList::from_unique(updated),
        failed: Vec::new(),
    })
}

async fn refresh_best_effort(
    source: &dyn WeatherSource,
    cities: &CityList,
) -> Result<RefreshOutcome, RefreshError> {
    let refreshed_at = Utc::now();

    let results = join_all(
        cities
            .iter()
            .map(|city| async move { (city, source.fetch_weather(city).await) }),
    )
    .await;

    let mut updated: Vec<City> = Vec::with_capacity(results.len());
    let mut failed = Vec::new();
    for (city, result) in results {
        match result {
            Ok(snapshot) => updated.push(city.clone().with_weather(snapshot, refreshed_at)),
            Err(e) => {
                tracing::warn!("Keeping stale weather for {}: {}", city.id, e);
                failed.push(city.id.clone());
                updated.push(city.clone());
            }
        }
    }

    if failed.len() == cities.len() {
        return Err(RefreshError::AllFailed { count: failed.len() });
    }

    Ok(RefreshOutcome {
        cities: CityList::from_unique(updated),
        failed,
    })
}
