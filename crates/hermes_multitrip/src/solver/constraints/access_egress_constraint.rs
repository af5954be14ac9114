use crate::{
    problem::{location::LocationIdx, vehicle::Vehicle},
    solver::insertion_context::RouteInsertionContext,
};

use super::{constraint::ScoreLevel, route_constraint::RouteConstraint};

/// Charges a vehicle switch on a non-empty route with the change in the legs
/// from the depot to the first stop and from the last stop to the end.
#[derive(Clone)]
pub struct AccessEgressConstraint;

impl AccessEgressConstraint {
    fn access_egress_cost(
        context: &RouteInsertionContext,
        vehicle: &Vehicle,
        first: Option<LocationIdx>,
        last: Option<LocationIdx>,
    ) -> f64 {
        let problem = context.problem;
        problem.travel_cost_or_zero(vehicle, vehicle.depot_location_id(), first)
            + problem.travel_cost_or_zero(vehicle, last, vehicle.end_location_id())
    }
}

impl RouteConstraint for AccessEgressConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Soft
    }

    fn insertion_cost(&self, context: &RouteInsertionContext) -> f64 {
        let route = context.route();
        if route.is_empty() || !context.switches_vehicle() {
            return 0.0;
        }

        let problem = context.problem;
        let bases = context.solution.bases();
        let first = route.location_id(problem, bases, 0);
        let last = route.location_id(problem, bases, route.len() - 1);

        Self::access_egress_cost(context, context.vehicle(), first, last)
            - Self::access_egress_cost(context, route.vehicle(problem), first, last)
    }
}
