pub mod city_store;

pub use city_store::CityStore;
