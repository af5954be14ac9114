use crate::solver::insertion_context::RouteInsertionContext;

use super::{
    access_egress_constraint::AccessEgressConstraint, constraint::ScoreLevel,
    maximum_destinations_constraint::MaximumDestinationsConstraint,
};

pub trait RouteConstraint {
    fn score_level(&self) -> ScoreLevel;

    fn fulfilled(&self, _context: &RouteInsertionContext) -> bool {
        true
    }

    fn insertion_cost(&self, _context: &RouteInsertionContext) -> f64 {
        0.0
    }
}

#[derive(Clone)]
pub enum RouteConstraintType {
    MaximumDestinations(MaximumDestinationsConstraint),
    AccessEgress(AccessEgressConstraint),
}

impl RouteConstraintType {
    pub fn constraint_name(&self) -> &'static str {
        match self {
            RouteConstraintType::MaximumDestinations(_) => "maximum_destinations",
            RouteConstraintType::AccessEgress(_) => "access_egress",
        }
    }
}

impl RouteConstraint for RouteConstraintType {
    fn score_level(&self) -> ScoreLevel {
        match self {
            RouteConstraintType::MaximumDestinations(c) => c.score_level(),
            RouteConstraintType::AccessEgress(c) => c.score_level(),
        }
    }

    fn fulfilled(&self, context: &RouteInsertionContext) -> bool {
        match self {
            RouteConstraintType::MaximumDestinations(c) => c.fulfilled(context),
            RouteConstraintType::AccessEgress(c) => c.fulfilled(context),
        }
    }

    fn insertion_cost(&self, context: &RouteInsertionContext) -> f64 {
        match self {
            RouteConstraintType::MaximumDestinations(c) => c.insertion_cost(context),
            RouteConstraintType::AccessEgress(c) => c.insertion_cost(context),
        }
    }
}
