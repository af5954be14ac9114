use crate::{
    error::Result,
    solver::{
        insertion::NewActivity, insertion_context::ActivityInsertionContext,
        solution::route::RouteStop,
    },
};

use super::{
    activity_constraint::ActivityConstraint,
    constraint::{ConstraintStatus, ScoreLevel},
};

/// The trip receiving a destination must stay within the vehicle capacity for
/// that trip. A destination is never appended after the last base, and never
/// fills a trip that a base already closes empty.
#[derive(Clone)]
pub struct CapacityConstraint;

impl ActivityConstraint for CapacityConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn fulfilled(&self, context: &ActivityInsertionContext) -> Result<ConstraintStatus> {
        let NewActivity::Destination(job_id) = context.new_activity else {
            return Ok(ConstraintStatus::Fulfilled);
        };

        if context.gap.next == RouteStop::End {
            return Ok(ConstraintStatus::BreakTrip);
        }

        let closes_existing_trip = context.gap.position < context.route.route().len();
        if context.gap.next.is_base() && closes_existing_trip && context.run_load.is_empty() {
            return Ok(ConstraintStatus::BreakTrip);
        }

        let demand = context.problem().destination(job_id).demand();
        let capacity = context.vehicle().trip_capacity(context.run_index);

        if (context.run_load + demand).is_less_or_equal(capacity) {
            Ok(ConstraintStatus::Fulfilled)
        } else {
            Ok(ConstraintStatus::BreakTrip)
        }
    }
}
