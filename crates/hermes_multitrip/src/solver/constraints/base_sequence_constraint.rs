use crate::{
    error::Result,
    solver::{insertion_context::ActivityInsertionContext, solution::route::RouteStop},
};

use super::{
    activity_constraint::ActivityConstraint,
    constraint::{ConstraintStatus, ScoreLevel},
};

/// A base never opens a route and never sits next to another base.
#[derive(Clone)]
pub struct BaseSequenceConstraint;

impl ActivityConstraint for BaseSequenceConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn fulfilled(&self, context: &ActivityInsertionContext) -> Result<ConstraintStatus> {
        if !context.new_activity.is_base() {
            return Ok(ConstraintStatus::Fulfilled);
        }

        let gap = &context.gap;
        if gap.previous == RouteStop::Start || gap.previous.is_base() || gap.next.is_base() {
            Ok(ConstraintStatus::ContinueScan)
        } else {
            Ok(ConstraintStatus::Fulfilled)
        }
    }
}
