// crates/nimbus-services/src/city_store.rs

use chrono::{DateTime, Utc};
use nimbus_core::error::RusqliteErrorExt;
use nimbus_core::DatabaseError;
use nimbus_weather::{City, CityList, WeatherSnapshot};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA_VERSION: i32 = 1;
const LAST_UPDATE_KEY: &str = "last_update";

/// Local SQLite storage for saved cities and the last-update stamp
pub struct CityStore {
    conn: Connection,
}

impl CityStore {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| e.into_database_error())?;
        let store = Self { conn };
        store.init_schema()?;

        tracing::debug!("City store opened at {:?}", path);
        Ok(store)
    }

    /// In-memory store, nothing is written to disk
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|e| e.into_database_error())?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

                CREATE TABLE IF NOT EXISTS cities (
                    id TEXT PRIMARY KEY,
                    position INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    latitude REAL NOT NULL,
                    longitude REAL NOT NULL,
                    region TEXT,
                    country TEXT,
                    weather_json TEXT,
                    updated_at TEXT
                );

                CREATE TABLE IF NOT EXISTS meta (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_cities_position ON cities(position);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()
            .map_err(|e| e.into_database_error())?;

        match version {
            None => {
                self.conn
                    .execute(
                        "INSERT INTO schema_version (version) VALUES (?1)",
                        params![SCHEMA_VERSION],
                    )
                    .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
            }
            Some(v) if v > SCHEMA_VERSION => {
                return Err(DatabaseError::MigrationFailed(format!(
                    "database schema v{} is newer than supported v{}",
                    v, SCHEMA_VERSION
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }

    /// Get all saved cities in display order
    pub fn load_cities(&self) -> Result<CityList, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, latitude, longitude, region, country, weather_json, updated_at
                 FROM cities ORDER BY position ASC",
            )
            .map_err(|e| e.into_database_error())?;

        let rows = stmt
            .query_map([], |row| {
                Ok(StoredCity {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                    region: row.get(4)?,
                    country: row.get(5)?,
                    weather_json: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })
            .map_err(|e| e.into_database_error())?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.into_database_error())?;

        let cities = rows
            .into_iter()
            .map(StoredCity::into_city)
            .collect::<Result<Vec<_>, _>>()?;

        CityList::try_from(cities).map_err(|e| DatabaseError::Corruption(e.to_string()))
    }

    /// Replace the saved list with `cities`, keeping their order
    pub fn save_cities(&mut self, cities: &CityList) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction().map_err(|e| e.into_database_error())?;
        write_cities(&tx, cities)?;
        tx.commit().map_err(|e| e.into_database_error())?;

        tracing::debug!("Saved {} cities", cities.len());
        Ok(())
    }

    /// Save a refreshed list together with its last-update stamp.
    /// Either both are written or neither is.
    pub fn save_refresh(&mut self, cities: &CityList, last_update: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction().map_err(|e| e.into_database_error())?;
        write_cities(&tx, cities)?;
        write_last_update(&tx, last_update)?;
        tx.commit().map_err(|e| e.into_database_error())?;

        tracing::debug!("Saved refresh of {} cities at {}", cities.len(), last_update);
        Ok(())
    }

    /// Last-update stamp shown on the home screen
    pub fn last_update(&self) -> Result<Option<String>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                [LAST_UPDATE_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| e.into_database_error())
    }

    pub fn set_last_update(&self, value: &str) -> Result<(), DatabaseError> {
        write_last_update(&self.conn, value)
    }
}

fn write_cities(conn: &Connection, cities: &CityList) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM cities", [])
        .map_err(|e| e.into_database_error())?;

    for (position, city) in cities.iter().enumerate() {
        let weather_json = city
            .weather
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        let updated_at = city.updated_at.map(|t| t.to_rfc3339());

        conn.execute(
            "INSERT INTO cities
             (id, position, name, latitude, longitude, region, country, weather_json, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                city.id,
                position as i64,
                city.name,
                city.latitude,
                city.longitude,
                city.region,
                city.country,
                weather_json,
                updated_at,
            ],
        )
        .map_err(|e| e.into_database_error())?;
    }
    Ok(())
}

fn write_last_update(conn: &Connection, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![LAST_UPDATE_KEY, value],
    )
    .map_err(|e| e.into_database_error())?;
    Ok(())
}

struct StoredCity {
    id: String,
    name: String,
    latitude: f64,
    longitude: f64,
    region: Option<String>,
    country: Option<String>,
    weather_json: Option<String>,
    updated_at: Option<String>,
}

impl StoredCity {
    fn into_city(self) -> Result<City, DatabaseError> {
        let weather = self
            .weather_json
            .as_deref()
            .map(serde_json::from_str::<WeatherSnapshot>)
            .transpose()
            .map_err(|e| DatabaseError::Corruption(format!("weather for {}: {}", self.id, e)))?;

        let updated_at = self
            .updated_at
            .as_deref()
            .map(DateTime::parse_from_rfc3339)
            .transpose()
            .map_err(|e| DatabaseError::Corruption(format!("timestamp for {}: {}", self.id, e)))?
            .map(|t| t.with_timezone(&Utc));

        let mut city = City::new(self.id, self.name, self.latitude, self.longitude);
        city.region = self.region;
        city.country = self.country;
        city.weather = weather;
        city.updated_at = updated_at;
        Ok(city)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use nimbus_weather::{TemperatureUnit, WeatherCondition};
    use tempfile::tempdir;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: 19.5,
            feels_like: 18.0,
            humidity: 80,
            wind_speed: 4.0,
            condition: WeatherCondition::Drizzle,
            temp_min: Some(15.0),
            temp_max: Some(22.0),
            unit: TemperatureUnit::Celsius,
            observed_at: chrono::NaiveDate::from_ymd_opt(2026, 10, 18)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_save_and_load_keeps_order() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let mut store = CityStore::open(&db_path).unwrap();

        let mut sp = City::new("sp", "São Paulo", -23.5475, -46.63611);
        sp.country = Some("Brazil".to_string());
        let sp = sp.with_weather(snapshot(), Utc::now());
        let cities = CityList::try_from(vec![
            City::new("rj", "Rio de Janeiro", -22.90278, -43.2075),
            sp.clone(),
        ])
        .unwrap();

        store.save_cities(&cities).unwrap();

        let loaded = store.load_cities().unwrap();
        assert_eq!(loaded.ids(), vec!["rj", "sp"]);
        let loaded_sp = loaded.get("sp").unwrap();
        assert_eq!(loaded_sp.weather, sp.weather);
        assert_eq!(loaded_sp.country.as_deref(), Some("Brazil"));
        assert_eq!(
            loaded_sp.updated_at.map(|t| t.timestamp()),
            sp.updated_at.map(|t| t.timestamp())
        );
        assert!(loaded.get("rj").unwrap().weather.is_none());
    }

    #[test]
    fn test_save_replaces_previous_list() {
        let mut store = CityStore::open_in_memory().unwrap();

        let first = CityList::try_from(vec![
            City::new("a", "A", 0.0, 0.0),
            City::new("b", "B", 0.0, 0.0),
        ])
        .unwrap();
        store.save_cities(&first).unwrap();

        let second = CityList::try_from(vec![City::new("b", "B", 0.0, 0.0)]).unwrap();
        store.save_cities(&second).unwrap();

        assert_eq!(store.load_cities().unwrap().ids(), vec!["b"]);
    }

    #[test]
    fn test_empty_store() {
        let store = CityStore::open_in_memory().unwrap();
        assert!(store.load_cities().unwrap().is_empty());
        assert!(store.last_update().unwrap().is_none());
    }

    #[test]
    fn test_last_update_round_trip() {
        let store = CityStore::open_in_memory().unwrap();
        store.set_last_update("18/10/2026 02:15").unwrap();
        store.set_last_update("18/10/2026 02:45").unwrap();
        assert_eq!(store.last_update().unwrap().as_deref(), Some("18/10/2026 02:45"));
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("cities.db");
        {
            let mut store = CityStore::open(&db_path).unwrap();
            let cities = CityList::try_from(vec![City::new("sp", "São Paulo", 0.0, 0.0)]).unwrap();
            store.save_cities(&cities).unwrap();
            store.set_last_update("01/01/2026 12:00").unwrap();
        }

        let store = CityStore::open(&db_path).unwrap();
        assert_eq!(store.load_cities().unwrap().ids(), vec!["sp"]);
        assert_eq!(store.last_update().unwrap().as_deref(), Some("01/01/2026 12:00"));
    }

    #[test]
    fn test_corrupt_weather_json_is_reported() {
        let store = CityStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO cities (id, position, name, latitude, longitude, weather_json)
                 VALUES ('x', 0, 'X', 0, 0, 'not json')",
                [],
            )
            .unwrap();

        assert!(matches!(
            store.load_cities(),
            Err(DatabaseError::Corruption(_))
        ));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("cities.db");
        {
            let store = CityStore::open(&db_path).unwrap();
            store
                .conn
                .execute("UPDATE schema_version SET version = 99", [])
                .unwrap();
        }

        assert!(matches!(
            CityStore::open(&db_path),
            Err(DatabaseError::MigrationFailed(_))
        ));
    }

    #[test]
    fn test_save_refresh_writes_list_and_stamp() {
        let mut store = CityStore::open_in_memory().unwrap();
        let cities = CityList::try_from(vec![
            City::new("sp", "São Paulo", 0.0, 0.0).with_weather(snapshot(), Utc::now()),
        ])
        .unwrap();

        store.save_refresh(&cities, "18/10/2026 09:30").unwrap();

        assert_eq!(store.load_cities().unwrap(), cities);
        assert_eq!(store.last_update().unwrap().as_deref(), Some("18/10/2026 09:30"));
    }

    #[test]
    fn test_failed_stamp_rolls_back_list() {
        let mut store = CityStore::open_in_memory().unwrap();
        let before = CityList::try_from(vec![City::new("sp", "São Paulo", 0.0, 0.0)]).unwrap();
        store.save_cities(&before).unwrap();
        store.conn.execute("DROP TABLE meta", []).unwrap();

        let refreshed = CityList::try_from(vec![
            City::new("sp", "São Paulo", 0.0, 0.0).with_weather(snapshot(), Utc::now()),
        ])
        .unwrap();
        assert!(store.save_refresh(&refreshed, "18/10/2026 09:30").is_err());

        let loaded = store.load_cities().unwrap();
        assert!(loaded.get("sp").unwrap().weather.is_none());
    }
}
