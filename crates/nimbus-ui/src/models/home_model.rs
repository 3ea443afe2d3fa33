//! Home screen: saved cities, refresh on mount and pull-to-refresh, error modal.
//!
//! The model lives on the UI thread. Refreshes run on the services runtime and
//! report back through an mpsc channel drained by `poll_channel`.

use std::fmt::Write as _;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use nimbus_core::{AppError, RefreshState};
use nimbus_weather::RefreshOutcome;

use crate::app_services::{AppServices, DEFAULT_LAST_UPDATE_FORMAT};
use crate::navigation::{Navigator, Route};
use crate::services::weather_service::{request_refresh, ServiceError, WeatherServiceMessage};
use crate::view::{CityCard, CityListView, EmptyState, ErrorModal, HomeContent, HomeView};

pub const MODAL_TITLE: &str = "Oops!";
pub const REFRESH_FAILED_MESSAGE: &str =
    "We're having trouble updating your saved cities. Please try again later.";
pub const EMPTY_ILLUSTRATION: &str = "no_cities";
pub const EMPTY_MESSAGE: &str = "You haven't added any cities yet. Add one to see its weather here.";
pub const UPDATING_TEXT: &str = "Updating…";
pub const ADD_CITY_LABEL: &str = "Add city";

pub struct HomeModel {
    services: Arc<AppServices>,
    navigator: Arc<dyn Navigator>,
    tx: Sender<WeatherServiceMessage>,
    rx: Receiver<WeatherServiceMessage>,
    refresh_state: RefreshState,
    error_visible: bool,
    mounted: bool,
}

impl HomeModel {
    pub fn new(services: Arc<AppServices>, navigator: Arc<dyn Navigator>) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            services,
            navigator,
            tx,
            rx,
            refresh_state: RefreshState::default(),
            error_visible: false,
            mounted: false,
        }
    }

    /// First display of the screen: starts the automatic refresh once.
    pub fn on_mount(&mut self) -> bool {
        if self.mounted {
            tracing::debug!("HomeModel already mounted");
            return false;
        }
        self.mounted = true;
        self.refresh()
    }

    /// Start refreshing every saved city.
    /// Returns false if a refresh is already running or services are
    /// shutting down; the latter shows the error modal.
    pub fn refresh(&mut self) -> bool {
        if !self.refresh_state.can_start_refresh() {
            tracing::info!("Refresh already in progress, ignoring request");
            return false;
        }
        if self.services.is_shutting_down() {
            self.show_error(AppError::from(ServiceError::Cancelled));
            return false;
        }
        self.refresh_state = self.refresh_state.on_refresh_started();

        let cities = self.services.state().cities();
        tracing::debug!("Requesting refresh of {} cities", cities.len());

        request_refresh(
            &self.tx,
            &self.services.runtime(),
            self.services.weather_source(),
            cities,
            self.services.refresh_options(),
            self.services.cancel_token(),
        );
        true
    }

    /// Apply any finished refresh without blocking.
    pub fn poll_channel(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }
    }

    /// Block until the running refresh finishes or `timeout` passes.
    /// Returns true if a result was applied.
    pub fn wait_for_refresh(&mut self, timeout: Duration) -> bool {
        if !self.refresh_state.is_loading() {
            self.poll_channel();
            return false;
        }

        match self.rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.handle_message(msg);
                true
            }
            Err(_) => {
                tracing::warn!("No refresh result after {:?}", timeout);
                false
            }
        }
    }

    fn handle_message(&mut self, msg: WeatherServiceMessage) {
        match msg {
            WeatherServiceMessage::RefreshDone(result) => {
                self.refresh_state = self.refresh_state.on_refresh_done();
                match result {
                    Ok(outcome) => self.apply_outcome(outcome),
                    Err(e) => self.show_error(AppError::from(e)),
                }
            }
        }
    }

    fn apply_outcome(&mut self, outcome: RefreshOutcome) {
        if !outcome.failed.is_empty() {
            tracing::warn!("Kept stale weather for: {}", outcome.failed.join(", "));
        }

        let state = self.services.state();
        let stamp = format_last_update(Local::now(), self.services.last_update_format());
        match state.apply_refresh(&outcome.cities, stamp) {
            Ok(()) => tracing::info!("Refreshed {} cities", outcome.cities.len()),
            Err(e) => self.show_error(e),
        }
    }

    fn show_error(&mut self, e: AppError) {
        tracing::error!("Home refresh failed: {} ({})", e, e.user_message());
        self.error_visible = true;
    }

    /// Close the error modal. The list is left as it is.
    pub fn dismiss_error(&mut self) {
        self.error_visible = false;
    }

    pub fn is_loading(&self) -> bool {
        self.refresh_state.is_loading()
    }

    pub fn is_error_visible(&self) -> bool {
        self.error_visible
    }

    pub fn add_city_pressed(&self) {
        self.navigator.navigate(Route::AddCity);
    }

    /// Open the details screen for `city_id`. Unknown ids are ignored.
    pub fn select_city(&self, city_id: &str) -> bool {
        if !self.services.state().select_city_by_id(city_id) {
            tracing::warn!("Selected unknown city {}", city_id);
            return false;
        }
        self.navigator.navigate(Route::CityDetails {
            city_id: city_id.to_string(),
        });
        true
    }

    pub fn view(&self) -> HomeView {
        let state = self.services.state();
        let cities = state.cities();

        let content = if cities.is_empty() {
            HomeContent::Empty(EmptyState {
                illustration: EMPTY_ILLUSTRATION,
                message: EMPTY_MESSAGE,
            })
        } else {
            let loading = self.is_loading();
            let header = if loading {
                UPDATING_TEXT.to_string()
            } else {
                format!(
                    "Last updated: {}",
                    state.last_update().as_deref().unwrap_or("never")
                )
            };
            HomeContent::Cities(CityListView {
                header,
                refreshing: loading,
                cards: cities.iter().map(CityCard::from).collect(),
            })
        };

        HomeView {
            content,
            modal: ErrorModal {
                visible: self.error_visible,
                title: MODAL_TITLE,
                message: REFRESH_FAILED_MESSAGE,
            },
            add_city_label: ADD_CITY_LABEL,
        }
    }
}

/// Last-update stamp for `now`, falling back to the default format when
/// `format` cannot be rendered.
pub fn format_last_update(now: DateTime<Local>, format: &str) -> String {
    let mut stamp = String::new();
    if write!(stamp, "{}", now.format(format)).is_err() {
        tracing::warn!("Invalid last-update format {:?}, using default", format);
        stamp = now.format(DEFAULT_LAST_UPDATE_FORMAT).to_string();
    }
    stamp
}
