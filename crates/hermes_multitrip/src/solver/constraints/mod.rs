pub mod access_egress_constraint;
pub mod activity_constraint;
pub mod base_sequence_constraint;
pub mod capacity_constraint;
pub mod compute_insertion_cost;
pub mod constraint;
pub mod daily_volume_constraint;
pub mod maximum_destinations_constraint;
pub mod route_constraint;
pub mod time_window_constraint;
pub mod transport_cost;
