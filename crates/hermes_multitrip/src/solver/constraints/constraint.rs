use crate::problem::vehicle_routing_problem::VehicleRoutingProblem;

use super::{
    access_egress_constraint::AccessEgressConstraint,
    activity_constraint::{ActivityConstraint, ActivityConstraintType},
    base_sequence_constraint::BaseSequenceConstraint,
    capacity_constraint::CapacityConstraint,
    daily_volume_constraint::DailyVolumeConstraint,
    maximum_destinations_constraint::MaximumDestinationsConstraint,
    route_constraint::{RouteConstraint, RouteConstraintType},
    time_window_constraint::TimeWindowConstraint,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreLevel {
    Hard,
    Soft,
}

/// Outcome of a hard check at one gap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintStatus {
    Fulfilled,
    /// Not here, try the next gap.
    ContinueScan,
    /// Not anywhere else in this trip either.
    BreakTrip,
}

impl ConstraintStatus {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, ConstraintStatus::Fulfilled)
    }
}

#[derive(Clone)]
pub enum Constraint {
    Route(RouteConstraintType),
    Activity(ActivityConstraintType),
}

impl Constraint {
    pub fn score_level(&self) -> ScoreLevel {
        match self {
            Constraint::Route(constraint) => constraint.score_level(),
            Constraint::Activity(constraint) => constraint.score_level(),
        }
    }

    pub fn constraint_name(&self) -> &'static str {
        match self {
            Constraint::Route(c) => c.constraint_name(),
            Constraint::Activity(c) => c.constraint_name(),
        }
    }
}

/// Hard checks first, soft costs after, as evaluated by the calculators.
pub fn default_constraints(
    problem: &VehicleRoutingProblem,
    time_window_weight: f64,
) -> Vec<Constraint> {
    vec![
        Constraint::Route(RouteConstraintType::MaximumDestinations(
            MaximumDestinationsConstraint,
        )),
        Constraint::Activity(ActivityConstraintType::Capacity(CapacityConstraint)),
        Constraint::Activity(ActivityConstraintType::DailyVolume(DailyVolumeConstraint)),
        Constraint::Activity(ActivityConstraintType::BaseSequence(BaseSequenceConstraint)),
        Constraint::Activity(ActivityConstraintType::TimeWindow(
            TimeWindowConstraint::new(problem, time_window_weight),
        )),
        Constraint::Route(RouteConstraintType::AccessEgress(AccessEgressConstraint)),
    ]
}
