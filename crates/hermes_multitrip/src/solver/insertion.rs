use jiff::{SignedDuration, Timestamp};
use smallvec::SmallVec;

use crate::{
    problem::{
        base::BaseIdx,
        capacity::{Capacity, EMPTY_CAPACITY},
        job::{ActivityId, JobIdx},
        location::LocationIdx,
        vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::{route::RouteStop, route_id::RouteIdx},
};

/// Deferred mutation produced by a calculator. Nothing is applied until the
/// insertion is committed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InsertionEvent {
    InsertActivity {
        route_id: RouteIdx,
        position: usize,
        activity_id: ActivityId,
    },
    AssignBase {
        base_id: BaseIdx,
        location_id: LocationIdx,
        service_duration: SignedDuration,
    },
    SwitchVehicle {
        route_id: RouteIdx,
        vehicle_id: VehicleIdx,
        departure_time: Timestamp,
    },
}

pub type InsertionEvents = SmallVec<[InsertionEvent; 4]>;

#[derive(Clone, Debug)]
pub struct InsertionResult {
    pub route_id: RouteIdx,
    pub cost: f64,

    /// Position of the inserted activity before any event is applied
    pub position: usize,

    /// Trip receiving the activity
    pub run_index: usize,

    pub vehicle_id: VehicleIdx,
    pub departure_time: Timestamp,
    pub events: InsertionEvents,
}

impl InsertionResult {
    pub fn opens_trip(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, InsertionEvent::AssignBase { .. }))
    }

    pub fn inserted_job(&self) -> Option<JobIdx> {
        self.events.iter().find_map(|event| match event {
            InsertionEvent::InsertActivity { activity_id, .. } => activity_id.job_id(),
            _ => None,
        })
    }
}

/// Gap between two consecutive stops where an activity could go.
#[derive(Clone, Copy, Debug)]
pub struct ActivityGap {
    pub position: usize,
    pub previous: RouteStop,
    pub next: RouteStop,
    pub previous_location_id: Option<LocationIdx>,
    pub next_location_id: Option<LocationIdx>,
    pub previous_departure: Timestamp,
}

/// Activity being evaluated. A base always comes with the location it would
/// unload at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NewActivity {
    Destination(JobIdx),
    Base {
        base_id: BaseIdx,
        location_id: LocationIdx,
        service_duration: SignedDuration,
    },
}

impl NewActivity {
    pub fn activity_id(&self) -> ActivityId {
        match self {
            NewActivity::Destination(job_id) => ActivityId::Destination(*job_id),
            NewActivity::Base { base_id, .. } => ActivityId::Base(*base_id),
        }
    }

    pub fn location_id(&self, problem: &VehicleRoutingProblem) -> LocationIdx {
        match self {
            NewActivity::Destination(job_id) => problem.destination(*job_id).location_id(),
            NewActivity::Base { location_id, .. } => *location_id,
        }
    }

    pub fn demand<'a>(&self, problem: &'a VehicleRoutingProblem) -> &'a Capacity {
        match self {
            NewActivity::Destination(job_id) => problem.destination(*job_id).demand(),
            NewActivity::Base { .. } => &EMPTY_CAPACITY,
        }
    }

    /// Departure from the activity when arriving at `arrival`.
    pub fn end_time(&self, problem: &VehicleRoutingProblem, arrival: Timestamp) -> Timestamp {
        match self {
            NewActivity::Destination(job_id) => {
                let destination = problem.destination(*job_id);
                destination.time_window().service_start(arrival) + destination.duration()
            }
            NewActivity::Base {
                service_duration, ..
            } => arrival + *service_duration,
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, NewActivity::Base { .. })
    }
}
