pub mod city_details_model;
pub mod home_model;

pub use city_details_model::CityDetailsModel;
pub use home_model::HomeModel;
