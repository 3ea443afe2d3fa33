use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature unit requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Query parameter value understood by Open-Meteo
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// Whole degrees with the unit symbol. Values that round to zero print
    /// as "0", never "-0".
    pub fn format_degrees(&self, value: f64) -> String {
        let rounded = value.round();
        let rounded = if rounded == 0.0 { 0.0 } else { rounded };
        format!("{:.0}{}", rounded, self.symbol())
    }
}

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 | 66 | 67 => Self::Sleet,
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Icon name for city cards
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::PartlyCloudy => "cloud_sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::Drizzle | Self::Rain | Self::HeavyRain => "cloud_rain",
            Self::Snow | Self::Sleet => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
        }
    }
}

/// Point-in-time weather reading for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub condition: WeatherCondition,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub unit: TemperatureUnit,
    /// Observation time in the city's local time
    pub observed_at: NaiveDateTime,
}

impl WeatherSnapshot {
    pub fn format_temperature(&self) -> String {
        self.unit.format_degrees(self.temperature)
    }

    /// "min / max" for today, when the provider sent both
    pub fn format_range(&self) -> Option<String> {
        match (self.temp_min, self.temp_max) {
            (Some(min), Some(max)) => Some(format!(
                "{} / {}",
                self.unit.format_degrees(min),
                self.unit.format_degrees(max)
            )),
            _ => None,
        }
    }
}

/// A tracked city with its cached weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub weather: Option<WeatherSnapshot>,
    /// Last successful refresh
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl City {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            region: None,
            country: None,
            weather: None,
            updated_at: None,
        }
    }

    /// Name with region or country for disambiguation, e.g. "Springfield, Illinois"
    pub fn display_name(&self) -> String {
        let suffix = self
            .region
            .as_deref()
            .filter(|r| !r.is_empty() && *r != self.name)
            .or_else(|| {
                self.country
                    .as_deref()
                    .filter(|c| !c.is_empty() && *c != self.name)
            });

        match suffix {
            Some(s) => format!("{}, {}", self.name, s),
            None => self.name.clone(),
        }
    }

    /// Same city with a fresh snapshot
    pub fn with_weather(mut self, snapshot: WeatherSnapshot, refreshed_at: DateTime<Utc>) -> Self {
        self.weather = Some(snapshot);
        self.updated_at = Some(refreshed_at);
        self
    }
}

/// Adding a city whose id is already in the list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("City {0} is already in the list")]
pub struct DuplicateCityError(pub String);

/// Ordered list of cities with unique ids. Order is display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<City>", into = "Vec<City>")]
pub struct CityList(Vec<City>);

impl CityList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap cities whose ids are already known to be unique.
    pub(crate) fn from_unique(cities: Vec<City>) -> Self {
        Self(cities)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, City> {
        self.0.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&City> {
        self.0.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.id.as_str()).collect()
    }

    /// Append a city at the end of the list
    pub fn push(&mut self, city: City) -> Result<(), DuplicateCityError> {
        if self.contains(&city.id) {
            return Err(DuplicateCityError(city.id));
        }
        self.0.push(city);
        Ok(())
    }

    /// Remove a city by id, returning it if it was present
    pub fn remove(&mut self, id: &str) -> Option<City> {
        let index = self.0.iter().position(|c| c.id == id)?;
        Some(self.0.remove(index))
    }
}

impl TryFrom<Vec<City>> for CityList {
    type Error = DuplicateCityError;

    fn try_from(cities: Vec<City>) -> Result<Self, Self::Error> {
        let mut list = CityList::new();
        for city in cities {
            list.push(city)?;
        }
        Ok(list)
    }
}

impl From<CityList> for Vec<City> {
    fn from(list: CityList) -> Self {
        list.0
    }
}

impl<'a> IntoIterator for &'a CityList {
    type Item = &'a City;
    type IntoIter = std::slice::Iter<'a, City>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn city(id: &str, name: &str) -> City {
        City::new(id, name, 0.0, 0.0)
    }

    #[test]
    fn test_wmo_code_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
    }

    #[test]
    fn test_wmo_code_partly_cloudy() {
        assert_eq!(WeatherCondition::from_wmo_code(1), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn test_wmo_code_precipitation() {
        assert_eq!(WeatherCondition::from_wmo_code(53), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_wmo_code(63), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(75), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(95), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_condition_icon_name() {
        assert_eq!(WeatherCondition::Clear.icon_name(), "sun");
        assert_eq!(WeatherCondition::HeavyRain.icon_name(), "cloud_rain");
    }

    #[test]
    fn test_city_list_rejects_duplicate_ids() {
        let mut list = CityList::new();
        list.push(city("sp", "São Paulo")).unwrap();
        let err = list.push(city("sp", "Sao Paulo")).unwrap_err();
        assert_eq!(err, DuplicateCityError("sp".to_string()));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_city_list_keeps_insertion_order() {
        let list =
            CityList::try_from(vec![city("b", "B"), city("a", "A"), city("c", "C")]).unwrap();
        assert_eq!(list.ids(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_city_list_remove() {
        let mut list = CityList::try_from(vec![city("a", "A"), city("b", "B")]).unwrap();
        assert_eq!(list.remove("a").map(|c| c.name), Some("A".to_string()));
        assert!(list.remove("a").is_none());
        assert_eq!(list.ids(), vec!["b"]);
    }

    #[test]
    fn test_city_list_deserialize_rejects_duplicates() {
        let json = serde_json::json!([
            {"id": "sp", "name": "São Paulo", "latitude": -23.5, "longitude": -46.6},
            {"id": "sp", "name": "São Paulo", "latitude": -23.5, "longitude": -46.6}
        ]);
        assert!(serde_json::from_value::<CityList>(json).is_err());
    }

    #[test]
    fn test_display_name_skips_redundant_region() {
        let mut c = city("sp", "São Paulo");
        c.region = Some("São Paulo".to_string());
        c.country = Some("Brazil".to_string());
        assert_eq!(c.display_name(), "São Paulo, Brazil");

        c.region = Some("Sao Paulo State".to_string());
        assert_eq!(c.display_name(), "São Paulo, Sao Paulo State");
    }

    #[test]
    fn test_snapshot_formatting() {
        let snapshot = WeatherSnapshot {
            temperature: 21.6,
            feels_like: 20.0,
            humidity: 70,
            wind_speed: 3.2,
            condition: WeatherCondition::Cloudy,
            temp_min: Some(15.2),
            temp_max: Some(24.8),
            unit: TemperatureUnit::Celsius,
            observed_at: chrono::NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
        };
        assert_eq!(snapshot.format_temperature(), "22°C");
        assert_eq!(snapshot.format_range().as_deref(), Some("15°C / 25°C"));
    }

    #[test]
    fn test_small_negative_temperatures_print_as_zero() {
        let snapshot = WeatherSnapshot {
            temperature: -0.4,
            feels_like: -3.0,
            humidity: 90,
            wind_speed: 5.0,
            condition: WeatherCondition::Snow,
            temp_min: Some(-0.2),
            temp_max: Some(3.0),
            unit: TemperatureUnit::Celsius,
            observed_at: chrono::NaiveDate::from_ymd_opt(2026, 1, 12)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap(),
        };
        assert_eq!(snapshot.format_temperature(), "0°C");
        assert_eq!(snapshot.format_range().as_deref(), Some("0°C / 3°C"));
        assert_eq!(TemperatureUnit::Fahrenheit.format_degrees(-0.6), "-1°F");
    }
}
