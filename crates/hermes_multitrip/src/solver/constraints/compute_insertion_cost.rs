use crate::{
    error::Result,
    solver::insertion_context::{ActivityInsertionContext, RouteInsertionContext},
};

use super::{
    activity_constraint::ActivityConstraint,
    constraint::{Constraint, ConstraintStatus, ScoreLevel},
    route_constraint::RouteConstraint,
};

pub fn route_constraints_fulfilled(
    constraints: &[Constraint],
    context: &RouteInsertionContext,
) -> bool {
    constraints
        .iter()
        .filter(|c| c.score_level() == ScoreLevel::Hard)
        .all(|constraint| match constraint {
            Constraint::Route(constraint) => constraint.fulfilled(context),
            Constraint::Activity(_) => true,
        })
}

pub fn route_insertion_cost(constraints: &[Constraint], context: &RouteInsertionContext) -> f64 {
    constraints
        .iter()
        .filter(|c| c.score_level() == ScoreLevel::Soft)
        .map(|constraint| match constraint {
            Constraint::Route(constraint) => constraint.insertion_cost(context),
            Constraint::Activity(_) => 0.0,
        })
        .sum()
}

/// Combined status of the hard activity constraints. A break wins over
/// everything else, a continue over a fulfilled check.
pub fn activity_status(
    constraints: &[Constraint],
    context: &ActivityInsertionContext,
) -> Result<ConstraintStatus> {
    let mut status = ConstraintStatus::Fulfilled;

    for constraint in constraints
        .iter()
        .filter(|c| c.score_level() == ScoreLevel::Hard)
    {
        let Constraint::Activity(constraint) = constraint else {
            continue;
        };

        match constraint.fulfilled(context)? {
            ConstraintStatus::BreakTrip => return Ok(ConstraintStatus::BreakTrip),
            ConstraintStatus::ContinueScan => status = ConstraintStatus::ContinueScan,
            ConstraintStatus::Fulfilled => {}
        }
    }

    Ok(status)
}

pub fn activity_insertion_cost(
    constraints: &[Constraint],
    context: &ActivityInsertionContext,
) -> f64 {
    constraints
        .iter()
        .filter(|c| c.score_level() == ScoreLevel::Soft)
        .map(|constraint| match constraint {
            Constraint::Activity(constraint) => constraint.insertion_cost(context),
            Constraint::Route(_) => 0.0,
        })
        .sum()
}
