//! Render trees produced by the screen models.
//!
//! These are plain data: a front end (the CLI renderer, or a GUI binding)
//! draws them without reaching back into the models.

use nimbus_weather::City;

#[derive(Debug, Clone, PartialEq)]
pub struct HomeView {
    pub content: HomeContent,
    pub modal: ErrorModal,
    pub add_city_label: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HomeContent {
    Empty(EmptyState),
    Cities(CityListView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    /// Asset id of the illustration
    pub illustration: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityListView {
    pub header: String,
    pub refreshing: bool,
    pub cards: Vec<CityCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityCard {
    pub id: String,
    pub name: String,
    /// "--" until the first successful refresh
    pub temperature: String,
    pub condition: String,
    pub icon: String,
    pub range: Option<String>,
}

impl From<&City> for CityCard {
    fn from(city: &City) -> Self {
        match &city.weather {
            Some(weather) => Self {
                id: city.id.clone(),
                name: city.display_name(),
                temperature: weather.format_temperature(),
                condition: weather.condition.description().to_string(),
                icon: weather.condition.icon_name().to_string(),
                range: weather.format_range(),
            },
            None => Self {
                id: city.id.clone(),
                name: city.display_name(),
                temperature: "--".to_string(),
                condition: "No data yet".to_string(),
                icon: "weather-unknown".to_string(),
                range: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorModal {
    pub visible: bool,
    pub title: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityDetailsView {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub coordinates: String,
    pub temperature: String,
    pub feels_like: Option<String>,
    pub condition: String,
    pub icon: String,
    pub humidity: Option<String>,
    pub wind: Option<String>,
    pub range: Option<String>,
    pub updated_at: Option<String>,
}
