pub mod base;
pub mod capacity;
pub mod destination;
pub mod job;
pub mod location;
pub mod time_window;
pub mod travel_cost_matrix;
pub mod unload_site;
pub mod vehicle;
pub mod vehicle_profile;
pub mod vehicle_routing_problem;
