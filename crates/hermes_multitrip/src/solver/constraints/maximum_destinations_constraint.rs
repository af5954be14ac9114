use crate::solver::insertion_context::RouteInsertionContext;

use super::{constraint::ScoreLevel, route_constraint::RouteConstraint};

#[derive(Clone)]
pub struct MaximumDestinationsConstraint;

impl RouteConstraint for MaximumDestinationsConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn fulfilled(&self, context: &RouteInsertionContext) -> bool {
        if !context.activity_id.is_destination() {
            return true;
        }

        context
            .vehicle()
            .maximum_destinations()
            .is_none_or(|maximum| context.route().destination_count() < maximum)
    }
}
