//! Screen models and application services for Nimbus.
//!
//! Models are plain Rust objects owned by the UI thread. They produce render
//! trees (`view`) and receive async results over mpsc channels.

pub mod app_services;
pub mod app_state;
pub mod error_mapping;
pub mod models;
pub mod navigation;
pub mod render;
pub mod services;
pub mod view;

pub use app_services::AppServices;
pub use app_state::AppState;
pub use models::{CityDetailsModel, HomeModel};
pub use navigation::{NavigationHistory, Navigator, Route};
