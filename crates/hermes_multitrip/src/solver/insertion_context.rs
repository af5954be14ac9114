use jiff::Timestamp;

use crate::{
    problem::{
        capacity::Capacity,
        job::ActivityId,
        location::LocationIdx,
        vehicle::{Vehicle, VehicleIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        bases::{
            daily_volume::DailyUnloadVolumeTracker, location_provider::BaseLocationProvider,
            service_time_provider::BaseServiceTimeProvider,
        },
        constraints::constraint::Constraint,
        insertion::{ActivityGap, NewActivity},
        solution::{
            route::WorkingSolutionRoute, route_id::RouteIdx, working_solution::WorkingSolution,
        },
        state::run_state::RunStateStore,
    },
};

/// Read-only view shared by every calculator call of a pass.
pub struct InsertionContext<'a> {
    pub solution: &'a WorkingSolution,
    pub daily_volume: &'a DailyUnloadVolumeTracker,
    pub constraints: &'a [Constraint],
    pub location_provider: &'a dyn BaseLocationProvider,
    pub service_time_provider: &'a dyn BaseServiceTimeProvider,

    /// Cleared once the base pool runs dry
    pub allow_new_trips: bool,
}

impl<'a> InsertionContext<'a> {
    pub fn problem(&self) -> &'a VehicleRoutingProblem {
        self.solution.problem()
    }

    pub fn run_states(&self) -> &'a RunStateStore {
        self.solution.run_states()
    }
}

/// A proposed insertion into one route, evaluated by route constraints.
pub struct RouteInsertionContext<'a> {
    pub problem: &'a VehicleRoutingProblem,
    pub solution: &'a WorkingSolution,
    pub route_id: RouteIdx,

    /// Vehicle that would serve the route after the insertion
    pub vehicle_id: VehicleIdx,
    pub departure_time: Timestamp,

    pub activity_id: ActivityId,
}

impl<'a> RouteInsertionContext<'a> {
    pub fn route(&self) -> &'a WorkingSolutionRoute {
        self.solution.route(self.route_id)
    }

    pub fn vehicle(&self) -> &'a Vehicle {
        self.problem.vehicle(self.vehicle_id)
    }

    pub fn switches_vehicle(&self) -> bool {
        self.route().vehicle_id() != self.vehicle_id
    }
}

/// A proposed insertion at one gap, evaluated by activity constraints.
pub struct ActivityInsertionContext<'a> {
    pub route: &'a RouteInsertionContext<'a>,
    pub daily_volume: &'a DailyUnloadVolumeTracker,
    pub new_activity: NewActivity,
    pub gap: ActivityGap,
    pub run_index: usize,

    /// Load of the trip at `run_index` before the insertion
    pub run_load: &'a Capacity,
    pub unload_location_id: Option<LocationIdx>,
}

impl<'a> ActivityInsertionContext<'a> {
    pub fn problem(&self) -> &'a VehicleRoutingProblem {
        self.route.problem
    }

    pub fn vehicle(&self) -> &'a Vehicle {
        self.route.vehicle()
    }

    pub fn run_states(&self) -> &'a RunStateStore {
        self.route.solution.run_states()
    }

    pub fn new_location_id(&self) -> LocationIdx {
        self.new_activity.location_id(self.route.problem)
    }

    /// Arrival at the new activity.
    pub fn new_arrival(&self) -> Timestamp {
        self.gap.previous_departure
            + self.route.problem.travel_time_or_zero(
                self.vehicle(),
                self.gap.previous_location_id,
                Some(self.new_location_id()),
            )
    }

    /// How much later the next stop is reached once the new activity sits in the gap.
    pub fn next_arrival_delay(&self) -> f64 {
        let problem = self.route.problem;
        let vehicle = self.vehicle();

        let current_arrival = self.gap.previous_departure
            + problem.travel_time_or_zero(
                vehicle,
                self.gap.previous_location_id,
                self.gap.next_location_id,
            );
        let new_arrival = self.new_activity.end_time(problem, self.new_arrival())
            + problem.travel_time_or_zero(
                vehicle,
                Some(self.new_location_id()),
                self.gap.next_location_id,
            );

        new_arrival.duration_since(current_arrival).as_secs_f64()
    }
}
