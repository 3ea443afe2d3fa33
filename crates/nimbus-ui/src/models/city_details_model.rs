//! Details screen for the selected city.

use std::sync::Arc;

use chrono::Local;

use crate::app_state::AppState;
use crate::view::{CityCard, CityDetailsView};

pub struct CityDetailsModel {
    state: Arc<AppState>,
}

impl CityDetailsModel {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// View of the selected city, `None` when nothing is selected
    pub fn view(&self) -> Option<CityDetailsView> {
        let city = self.state.selected_city()?;
        let card = CityCard::from(&city);
        let weather = city.weather.as_ref();

        Some(CityDetailsView {
            id: city.id.clone(),
            name: city.name.clone(),
            country: city.country.clone(),
            coordinates: format!("{:.4}, {:.4}", city.latitude, city.longitude),
            temperature: card.temperature,
            feels_like: weather.map(|w| w.unit.format_degrees(w.feels_like)),
            condition: card.condition,
            icon: card.icon,
            humidity: weather.map(|w| format!("{}%", w.humidity)),
            wind: weather.map(|w| format!("{:.1} km/h", w.wind_speed)),
            range: card.range,
            updated_at: city
                .updated_at
                .map(|t| t.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Utc;
    use nimbus_weather::{City, CityList, TemperatureUnit, WeatherCondition, WeatherSnapshot};

    #[test]
    fn test_no_selection_has_no_view() {
        let model = CityDetailsModel::new(Arc::new(AppState::new()));
        assert!(model.view().is_none());
    }

    #[test]
    fn test_selected_city_view() {
        let snapshot = WeatherSnapshot {
            temperature: 12.6,
            feels_like: 10.2,
            humidity: 88,
            wind_speed: 14.25,
            condition: WeatherCondition::Rain,
            temp_min: Some(9.0),
            temp_max: Some(14.0),
            unit: TemperatureUnit::Celsius,
            observed_at: chrono::NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        };
        let mut city = City::new("2643743", "London", 51.50853, -0.12574).with_weather(snapshot, Utc::now());
        city.country = Some("United Kingdom".to_string());

        let state = Arc::new(AppState::with_cities(CityList::try_from(vec![city]).unwrap()));
        assert!(state.select_city_by_id("2643743"));

        let view = CityDetailsModel::new(state).view().unwrap();
        assert_eq!(view.name, "London");
        assert_eq!(view.temperature, "13°C");
        assert_eq!(view.feels_like.as_deref(), Some("10°C"));
        assert_eq!(view.humidity.as_deref(), Some("88%"));
        assert_eq!(view.coordinates, "51.5085, -0.1257");
        assert_eq!(view.range.as_deref(), Some("9°C / 14°C"));
        assert!(view.updated_at.is_some());
    }
}
