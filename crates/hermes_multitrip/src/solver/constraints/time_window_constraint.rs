use crate::{
    problem::vehicle_routing_problem::VehicleRoutingProblem,
    solver::{
        insertion::NewActivity, insertion_context::ActivityInsertionContext,
        solution::route::RouteStop, state::run_state::TimeSlack,
    },
};

use super::{activity_constraint::ActivityConstraint, constraint::ScoreLevel};

/// Seconds of miss per time window that count as a fully bad window.
const TOLERATED_MISS_PER_WINDOW: f64 = 120.0;

/// Soft time-window cost estimated from the route slack instead of replaying
/// the route. Misses are scaled so that a fully missed set of windows weighs
/// as much as the longest trip between two destinations.
#[derive(Clone)]
pub struct TimeWindowConstraint {
    weight: f64,
    normalization: f64,
}

impl TimeWindowConstraint {
    pub fn new(problem: &VehicleRoutingProblem, weight: f64) -> Self {
        let bad = problem.time_window_count() as f64 * TOLERATED_MISS_PER_WINDOW;
        let normalization = if bad > 0.0 {
            problem.max_destination_cost() / bad
        } else {
            0.0
        };

        TimeWindowConstraint {
            weight,
            normalization,
        }
    }

    /// Slack accumulated before the gap, read at the stop after it.
    fn past_slack(context: &ActivityInsertionContext) -> Option<TimeSlack> {
        let route_id = context.route.route_id;
        let run_states = context.run_states();

        if context.gap.position >= context.route.route().len() {
            run_states.end_slack(route_id)
        } else {
            run_states
                .activity_state(route_id, context.gap.position)
                .map(|state| state.time_slack)
        }
    }

    /// Slack of the stops after the gap, read at the stop before it.
    fn future_slack(context: &ActivityInsertionContext) -> Option<TimeSlack> {
        let route_id = context.route.route_id;
        let run_states = context.run_states();

        match context.gap.previous {
            RouteStop::Start => run_states.start_slack(route_id),
            _ => run_states
                .activity_state(route_id, context.gap.position - 1)
                .map(|state| state.time_slack),
        }
    }
}

impl ActivityConstraint for TimeWindowConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Soft
    }

    fn insertion_cost(&self, context: &ActivityInsertionContext) -> f64 {
        let NewActivity::Destination(job_id) = context.new_activity else {
            return 0.0;
        };

        let problem = context.problem();
        if !problem.has_time_windows() || self.normalization == 0.0 {
            return 0.0;
        }

        let time_window = problem.destination(job_id).time_window();
        let arrival = context.new_arrival();
        let mut miss = time_window.earliness(arrival);
        if time_window.is_reachable_from(context.vehicle().departure_time()) {
            miss += time_window.lateness(arrival);
        }

        if let Some(past) = Self::past_slack(context) {
            miss += past.past_waiting.max(0.0) + past.past_lateness.max(0.0);
        }

        if let Some(future) = Self::future_slack(context) {
            let delay = context.next_arrival_delay();
            miss += (future.future_waiting - delay).max(0.0)
                + (future.future_lateness + delay).max(0.0);
        }

        miss * self.normalization * self.weight
    }
}
