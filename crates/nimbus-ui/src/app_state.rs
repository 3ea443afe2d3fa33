//! Shared application state: saved cities, selection and the last-update stamp.
//!
//! `AppState` is passed around explicitly as `Arc<AppState>`. When backed by a
//! `CityStore`, every mutator writes through before returning.

use parking_lot::{Mutex, RwLock};

use nimbus_core::{AppError, DatabaseError, WeatherError};
use nimbus_services::CityStore;
use nimbus_weather::{City, CityList};

pub struct AppState {
    cities: RwLock<CityList>,
    selected_city: RwLock<Option<City>>,
    last_update: RwLock<Option<String>>,
    store: Option<Mutex<CityStore>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Empty state with no persistence
    pub fn new() -> Self {
        Self::with_cities(CityList::new())
    }

    pub fn with_cities(cities: CityList) -> Self {
        Self {
            cities: RwLock::new(cities),
            selected_city: RwLock::new(None),
            last_update: RwLock::new(None),
            store: None,
        }
    }

    /// Hydrate from `store` and keep it for write-through
    pub fn load(store: CityStore) -> Result<Self, AppError> {
        let cities = store.load_cities()?;
        let last_update = store.last_update()?;

        tracing::info!("Loaded {} saved cities", cities.len());

        Ok(Self {
            cities: RwLock::new(cities),
            selected_city: RwLock::new(None),
            last_update: RwLock::new(last_update),
            store: Some(Mutex::new(store)),
        })
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Snapshot of the saved cities
    pub fn cities(&self) -> CityList {
        self.cities.read().clone()
    }

    pub fn set_cities(&self, cities: CityList) -> Result<(), AppError> {
        self.persist_cities(&cities)?;
        *self.cities.write() = cities;
        Ok(())
    }

    /// Merge refreshed cities into the current list by id and stamp the
    /// last update.
    ///
    /// Cities added while the refresh was in flight are kept as they are, and
    /// cities removed meanwhile are not brought back. The list and the stamp
    /// are stored in one transaction; on error neither changes.
    pub fn apply_refresh(&self, refreshed: &CityList, stamp: impl Into<String>) -> Result<(), AppError> {
        let stamp = stamp.into();
        let merged: Vec<City> = self
            .cities
            .read()
            .iter()
            .map(|current| {
                refreshed
                    .get(&current.id)
                    .cloned()
                    .unwrap_or_else(|| current.clone())
            })
            .collect();

        let merged = CityList::try_from(merged)
            .map_err(|e| DatabaseError::Corruption(e.to_string()))?;
        if let Some(store) = &self.store {
            store.lock().save_refresh(&merged, &stamp)?;
        }

        *self.cities.write() = merged;
        *self.last_update.write() = Some(stamp);
        Ok(())
    }

    pub fn last_update(&self) -> Option<String> {
        self.last_update.read().clone()
    }

    pub fn set_last_update(&self, stamp: impl Into<String>) -> Result<(), AppError> {
        let stamp = stamp.into();
        if let Some(store) = &self.store {
            store.lock().set_last_update(&stamp)?;
        }
        *self.last_update.write() = Some(stamp);
        Ok(())
    }

    pub fn selected_city(&self) -> Option<City> {
        self.selected_city.read().clone()
    }

    pub fn set_selected_city(&self, city: Option<City>) {
        *self.selected_city.write() = city;
    }

    /// Select a saved city by id. Returns false for unknown ids.
    pub fn select_city_by_id(&self, id: &str) -> bool {
        let city = self.cities.read().get(id).cloned();
        match city {
            Some(city) => {
                self.set_selected_city(Some(city));
                true
            }
            None => false,
        }
    }

    pub fn add_city(&self, city: City) -> Result<(), AppError> {
        let mut cities = self.cities.read().clone();
        cities
            .push(city)
            .map_err(|e| AppError::Weather(WeatherError::DuplicateCity(e.0)))?;
        self.set_cities(cities)
    }

    /// Remove a city, clearing the selection if it pointed at it.
    /// Returns the removed city, or `None` for unknown ids.
    pub fn remove_city(&self, id: &str) -> Result<Option<City>, AppError> {
        let mut cities = self.cities.read().clone();
        let removed = cities.remove(id);
        if removed.is_none() {
            return Ok(None);
        }

        self.set_cities(cities)?;

        let mut selected = self.selected_city.write();
        if selected.as_ref().is_some_and(|c| c.id == id) {
            *selected = None;
        }
        Ok(removed)
    }

    fn persist_cities(&self, cities: &CityList) -> Result<(), AppError> {
        if let Some(store) = &self.store {
            store.lock().save_cities(cities)?;
        }
        Ok(())
    }
}
