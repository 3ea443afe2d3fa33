//! Typed screen routes.

use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    AddCity,
    CityDetails { city_id: String },
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::AddCity => "add-city",
            Route::CityDetails { .. } => "city-details",
        }
    }
}

/// Fire-and-forget navigation
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only records where it was sent
#[derive(Debug, Default)]
pub struct NavigationHistory {
    routes: Mutex<Vec<Route>>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent route, `Home` before any navigation
    pub fn current(&self) -> Route {
        self.routes.lock().last().cloned().unwrap_or(Route::Home)
    }
}

impl Navigator for NavigationHistory {
    fn navigate(&self, route: Route) {
        tracing::debug!("Navigate to {}", route.name());
        self.routes.lock().push(route);
    }
}
