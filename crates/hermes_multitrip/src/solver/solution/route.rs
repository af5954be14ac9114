use jiff::{SignedDuration, Timestamp};

use crate::{
    problem::{
        job::ActivityId,
        location::LocationIdx,
        vehicle::{Vehicle, VehicleIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::bases::base_pool::BasePool,
};

/// Endpoint of an insertion gap. `Start` and `End` are the virtual depot stops.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RouteStop {
    Start,
    Activity(ActivityId),
    End,
}

impl RouteStop {
    pub fn is_base(&self) -> bool {
        matches!(self, RouteStop::Activity(ActivityId::Base(_)))
    }

    pub fn is_destination(&self) -> bool {
        matches!(self, RouteStop::Activity(ActivityId::Destination(_)))
    }
}

/// Time at which service at `activity` ends, given its arrival time.
pub fn activity_end_time(
    problem: &VehicleRoutingProblem,
    bases: &BasePool,
    activity: ActivityId,
    arrival: Timestamp,
) -> Timestamp {
    match activity {
        ActivityId::Destination(job_id) => {
            let destination = problem.destination(job_id);
            destination.time_window().service_start(arrival) + destination.duration()
        }
        ActivityId::Base(base_id) => arrival + bases.base(base_id).service_duration(),
    }
}

pub fn activity_location_id(
    problem: &VehicleRoutingProblem,
    bases: &BasePool,
    activity: ActivityId,
) -> Option<LocationIdx> {
    match activity {
        ActivityId::Destination(job_id) => Some(problem.destination(job_id).location_id()),
        ActivityId::Base(base_id) => bases.base(base_id).location_id(),
    }
}

#[derive(Clone, Debug)]
pub struct WorkingSolutionRoute {
    pub(super) vehicle_id: VehicleIdx,

    /// Fixed departure set by a vehicle switch. Falls back to the shift start.
    pub(super) departure: Option<Timestamp>,

    /// List of activity ids in the route order
    pub(super) activity_ids: Vec<ActivityId>,

    pub(super) arrival_times: Vec<Timestamp>,
    pub(super) departure_times: Vec<Timestamp>,
    pub(super) waiting_durations: Vec<SignedDuration>,

    pub(super) end_arrival: Timestamp,
}

impl WorkingSolutionRoute {
    pub fn empty(problem: &VehicleRoutingProblem, vehicle_id: VehicleIdx) -> Self {
        let departure = problem.vehicle(vehicle_id).departure_time();
        WorkingSolutionRoute {
            vehicle_id,
            departure: None,
            activity_ids: Vec::new(),
            arrival_times: Vec::new(),
            departure_times: Vec::new(),
            waiting_durations: Vec::new(),
            end_arrival: departure,
        }
    }

    pub fn len(&self) -> usize {
        self.activity_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activity_ids.is_empty()
    }

    pub fn vehicle_id(&self) -> VehicleIdx {
        self.vehicle_id
    }

    pub fn vehicle<'a>(&self, problem: &'a VehicleRoutingProblem) -> &'a Vehicle {
        problem.vehicle(self.vehicle_id)
    }

    pub fn activity_ids(&self) -> &[ActivityId] {
        &self.activity_ids
    }

    pub fn activity(&self, position: usize) -> ActivityId {
        self.activity_ids[position]
    }

    pub fn position_of(&self, activity_id: ActivityId) -> Option<usize> {
        self.activity_ids.iter().position(|&id| id == activity_id)
    }

    pub fn contains_activity(&self, activity_id: ActivityId) -> bool {
        self.activity_ids.contains(&activity_id)
    }

    pub fn destination_count(&self) -> usize {
        self.activity_ids
            .iter()
            .filter(|activity| activity.is_destination())
            .count()
    }

    pub fn base_count(&self) -> usize {
        self.activity_ids
            .iter()
            .filter(|activity| activity.is_base())
            .count()
    }

    /// Stop right before the gap at `position`.
    pub fn previous_stop(&self, position: usize) -> RouteStop {
        if position == 0 {
            RouteStop::Start
        } else {
            RouteStop::Activity(self.activity_ids[position - 1])
        }
    }

    /// Stop right after the gap at `position`.
    pub fn next_stop(&self, position: usize) -> RouteStop {
        if position >= self.len() {
            RouteStop::End
        } else {
            RouteStop::Activity(self.activity_ids[position])
        }
    }

    pub fn departure_time(&self, problem: &VehicleRoutingProblem) -> Timestamp {
        self.departure
            .unwrap_or_else(|| self.vehicle(problem).departure_time())
    }

    pub fn arrival_time(&self, position: usize) -> Timestamp {
        self.arrival_times[position]
    }

    pub fn activity_departure_time(&self, position: usize) -> Timestamp {
        self.departure_times[position]
    }

    pub fn waiting_duration(&self, position: usize) -> SignedDuration {
        self.waiting_durations[position]
    }

    pub fn end_arrival_time(&self) -> Timestamp {
        self.end_arrival
    }

    pub fn start_location_id(&self, problem: &VehicleRoutingProblem) -> Option<LocationIdx> {
        self.vehicle(problem).depot_location_id()
    }

    pub fn end_location_id(&self, problem: &VehicleRoutingProblem) -> Option<LocationIdx> {
        self.vehicle(problem).end_location_id()
    }

    pub fn location_id(
        &self,
        problem: &VehicleRoutingProblem,
        bases: &BasePool,
        position: usize,
    ) -> Option<LocationIdx> {
        activity_location_id(problem, bases, self.activity_ids[position])
    }

    pub fn stop_location_id(
        &self,
        problem: &VehicleRoutingProblem,
        bases: &BasePool,
        stop: RouteStop,
    ) -> Option<LocationIdx> {
        match stop {
            RouteStop::Start => self.start_location_id(problem),
            RouteStop::End => self.end_location_id(problem),
            RouteStop::Activity(activity) => activity_location_id(problem, bases, activity),
        }
    }

    pub(crate) fn insert(&mut self, position: usize, activity_id: ActivityId) {
        self.activity_ids.insert(position, activity_id);
    }

    pub(crate) fn remove(&mut self, position: usize) -> ActivityId {
        self.activity_ids.remove(position)
    }

    pub(crate) fn set_vehicle(&mut self, vehicle_id: VehicleIdx, departure: Timestamp) {
        self.vehicle_id = vehicle_id;
        self.departure = Some(departure);
    }

    pub(crate) fn reset(&mut self, problem: &VehicleRoutingProblem, bases: &BasePool) {
        self.activity_ids.clear();
        self.departure = None;
        self.update_activity_data(problem, bases);
    }

    /// Recomputes arrival, waiting and departure for every stop.
    /// A base without a location yet is treated as sitting at the previous stop.
    pub fn update_activity_data(&mut self, problem: &VehicleRoutingProblem, bases: &BasePool) {
        let vehicle = problem.vehicle(self.vehicle_id);
        let len = self.activity_ids.len();

        self.arrival_times.resize(len, Timestamp::UNIX_EPOCH);
        self.departure_times.resize(len, Timestamp::UNIX_EPOCH);
        self.waiting_durations.resize(len, SignedDuration::ZERO);

        let mut previous_location_id = vehicle.depot_location_id();
        let mut previous_departure = self.departure_time(problem);

        for (position, &activity_id) in self.activity_ids.iter().enumerate() {
            let location_id =
                activity_location_id(problem, bases, activity_id).or(previous_location_id);
            let arrival = previous_departure
                + problem.travel_time_or_zero(vehicle, previous_location_id, location_id);
            let departure = activity_end_time(problem, bases, activity_id, arrival);

            let waiting = match activity_id {
                ActivityId::Destination(job_id) => problem
                    .destination(job_id)
                    .time_window()
                    .service_start(arrival)
                    .duration_since(arrival),
                ActivityId::Base(_) => SignedDuration::ZERO,
            };

            self.arrival_times[position] = arrival;
            self.departure_times[position] = departure;
            self.waiting_durations[position] = waiting;

            previous_location_id = location_id;
            previous_departure = departure;
        }

        self.end_arrival = previous_departure
            + problem.travel_time_or_zero(
                vehicle,
                previous_location_id,
                vehicle.end_location_id(),
            );
    }

    pub fn transport_costs(&self, problem: &VehicleRoutingProblem, bases: &BasePool) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let vehicle = self.vehicle(problem);
        let mut previous_location_id = vehicle.depot_location_id();
        let mut cost = 0.0;

        for &activity_id in &self.activity_ids {
            let location_id =
                activity_location_id(problem, bases, activity_id).or(previous_location_id);
            cost += problem.travel_cost_or_zero(vehicle, previous_location_id, location_id);
            previous_location_id = location_id;
        }

        cost + problem.travel_cost_or_zero(
            vehicle,
            previous_location_id,
            vehicle.end_location_id(),
        )
    }

    /// Weighted earliness plus lateness over all destinations, in seconds.
    /// Lateness is ignored when the vehicle cannot reach the window at all.
    pub fn time_window_costs(&self, problem: &VehicleRoutingProblem, weight: f64) -> f64 {
        let vehicle = self.vehicle(problem);
        let earliest_departure = vehicle.departure_time();

        let mut cost = 0.0;
        for (position, &activity_id) in self.activity_ids.iter().enumerate() {
            let ActivityId::Destination(job_id) = activity_id else {
                continue;
            };

            let time_window = problem.destination(job_id).time_window();
            let arrival = self.arrival_times[position];

            cost += time_window.earliness(arrival);
            if time_window.is_reachable_from(earliest_departure) {
                cost += time_window.lateness(arrival);
            }
        }

        cost * weight
    }
}
