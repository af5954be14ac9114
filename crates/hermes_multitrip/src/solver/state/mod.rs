pub mod run_state;
pub mod trip_tracker;
