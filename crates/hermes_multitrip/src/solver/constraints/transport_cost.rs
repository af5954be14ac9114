use crate::problem::{
    location::LocationIdx, vehicle::Vehicle, vehicle_routing_problem::VehicleRoutingProblem,
};

pub const TRANSPORT_COST_WEIGHT: f64 = 1.0;

/// Cost of the detour through `location_id` between two stops.
pub fn marginal_transport_cost(
    problem: &VehicleRoutingProblem,
    vehicle: &Vehicle,
    previous_location_id: Option<LocationIdx>,
    location_id: LocationIdx,
    next_location_id: Option<LocationIdx>,
) -> f64 {
    let old_cost = problem.travel_cost_or_zero(vehicle, previous_location_id, next_location_id);
    let new_cost = problem.travel_cost_or_zero(vehicle, previous_location_id, Some(location_id))
        + problem.travel_cost_or_zero(vehicle, Some(location_id), next_location_id);

    (new_cost - old_cost) * TRANSPORT_COST_WEIGHT
}
