pub mod base_pool;
pub mod daily_volume;
pub mod load_checker;
pub mod location_provider;
pub mod nearest_location_provider;
pub mod service_time_provider;
