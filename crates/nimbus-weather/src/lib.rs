//! Weather data for Nimbus
//!
//! Provides per-city weather via the Open-Meteo API, city search for the
//! add-city flow, and the batch refresh of every saved city.

pub mod geocode;
pub mod provider;
pub mod refresh;
pub mod types;

pub use geocode::{CitySuggestion, Geocoder};
pub use provider::{WeatherProvider, WeatherSource};
pub use refresh::{update_all_cities, RefreshError, RefreshOptions, RefreshOutcome, RefreshPolicy};
pub use types::*;
