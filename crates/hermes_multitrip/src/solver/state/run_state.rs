use crate::{
    problem::{capacity::Capacity, location::LocationIdx},
    solver::solution::route_id::RouteIdx,
};

/// State of one trip (run) of a route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunState {
    pub load: Option<Capacity>,
    pub unload_location: Option<LocationIdx>,
}

/// Time-window miss accumulators, in seconds.
///
/// `past_*` cover the destinations before a stop, `future_*` the ones after it.
/// Past values are sums of positive misses, future values are the signed
/// maximum miss so an added delay can be applied to them directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSlack {
    pub past_waiting: f64,
    pub past_lateness: f64,
    pub future_waiting: f64,
    pub future_lateness: f64,
}

impl Default for TimeSlack {
    fn default() -> Self {
        TimeSlack {
            past_waiting: 0.0,
            past_lateness: 0.0,
            future_waiting: f64::NEG_INFINITY,
            future_lateness: f64::NEG_INFINITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityState {
    /// Load accumulated in the trip up to and including this stop.
    pub load: Capacity,
    /// Highest load the trip reaches from this stop on.
    pub future_max_load: Capacity,
    pub time_slack: TimeSlack,
}

#[derive(Debug, Clone, Default)]
struct RouteState {
    runs: Vec<RunState>,
    run_count: Option<usize>,
    base_required: Option<bool>,
    activities: Vec<ActivityState>,
    start_slack: Option<TimeSlack>,
    end_slack: Option<TimeSlack>,
}

/// Per-route and per-trip derived state. Absent entries are `None`, never zero.
#[derive(Debug, Clone, Default)]
pub struct RunStateStore {
    routes: Vec<RouteState>,
}

impl RunStateStore {
    pub fn new(num_routes: usize) -> Self {
        RunStateStore {
            routes: vec![RouteState::default(); num_routes],
        }
    }

    fn route_state(&self, route_id: RouteIdx) -> Option<&RouteState> {
        self.routes.get(route_id.get())
    }

    fn route_state_mut(&mut self, route_id: RouteIdx) -> &mut RouteState {
        let index = route_id.get();
        if index >= self.routes.len() {
            self.routes.resize_with(index + 1, RouteState::default);
        }

        &mut self.routes[index]
    }

    fn run_mut(&mut self, route_id: RouteIdx, run_index: usize) -> &mut RunState {
        let runs = &mut self.route_state_mut(route_id).runs;
        if run_index >= runs.len() {
            runs.resize_with(run_index + 1, RunState::default);
        }

        &mut runs[run_index]
    }

    fn run(&self, route_id: RouteIdx, run_index: usize) -> Option<&RunState> {
        self.route_state(route_id)
            .and_then(|state| state.runs.get(run_index))
    }

    /// Stores the load of a trip and returns the previous one.
    pub fn put_run_load(
        &mut self,
        route_id: RouteIdx,
        run_index: usize,
        load: Capacity,
    ) -> Option<Capacity> {
        self.run_mut(route_id, run_index).load.replace(load)
    }

    pub fn run_load(&self, route_id: RouteIdx, run_index: usize) -> Option<&Capacity> {
        self.run(route_id, run_index)
            .and_then(|run| run.load.as_ref())
    }

    pub fn run_load_or<'a>(
        &'a self,
        route_id: RouteIdx,
        run_index: usize,
        default: &'a Capacity,
    ) -> &'a Capacity {
        self.run_load(route_id, run_index).unwrap_or(default)
    }

    pub fn put_unload_location(
        &mut self,
        route_id: RouteIdx,
        run_index: usize,
        location_id: LocationIdx,
    ) -> Option<LocationIdx> {
        self.run_mut(route_id, run_index)
            .unload_location
            .replace(location_id)
    }

    pub fn unload_location(&self, route_id: RouteIdx, run_index: usize) -> Option<LocationIdx> {
        self.run(route_id, run_index)
            .and_then(|run| run.unload_location)
    }

    /// Number of trips closed by a base.
    pub fn put_run_count(&mut self, route_id: RouteIdx, run_count: usize) -> Option<usize> {
        self.route_state_mut(route_id).run_count.replace(run_count)
    }

    pub fn run_count(&self, route_id: RouteIdx) -> Option<usize> {
        self.route_state(route_id).and_then(|state| state.run_count)
    }

    pub fn run_count_or(&self, route_id: RouteIdx, default: usize) -> usize {
        self.run_count(route_id).unwrap_or(default)
    }

    pub fn put_base_required(&mut self, route_id: RouteIdx, required: bool) -> Option<bool> {
        self.route_state_mut(route_id)
            .base_required
            .replace(required)
    }

    pub fn base_required(&self, route_id: RouteIdx) -> Option<bool> {
        self.route_state(route_id)
            .and_then(|state| state.base_required)
    }

    /// A route that was never checked is assumed to need a new trip.
    pub fn is_base_required(&self, route_id: RouteIdx) -> bool {
        self.base_required(route_id).unwrap_or(true)
    }

    pub fn put_activity_states(
        &mut self,
        route_id: RouteIdx,
        activities: Vec<ActivityState>,
    ) -> Vec<ActivityState> {
        std::mem::replace(&mut self.route_state_mut(route_id).activities, activities)
    }

    pub fn activity_state(&self, route_id: RouteIdx, position: usize) -> Option<&ActivityState> {
        self.route_state(route_id)
            .and_then(|state| state.activities.get(position))
    }

    pub fn activity_states_mut(&mut self, route_id: RouteIdx) -> &mut [ActivityState] {
        &mut self.route_state_mut(route_id).activities
    }

    pub fn put_start_slack(&mut self, route_id: RouteIdx, slack: TimeSlack) -> Option<TimeSlack> {
        self.route_state_mut(route_id).start_slack.replace(slack)
    }

    pub fn start_slack(&self, route_id: RouteIdx) -> Option<TimeSlack> {
        self.route_state(route_id)
            .and_then(|state| state.start_slack)
    }

    pub fn put_end_slack(&mut self, route_id: RouteIdx, slack: TimeSlack) -> Option<TimeSlack> {
        self.route_state_mut(route_id).end_slack.replace(slack)
    }

    pub fn end_slack(&self, route_id: RouteIdx) -> Option<TimeSlack> {
        self.route_state(route_id).and_then(|state| state.end_slack)
    }

    /// Drops everything derived from the shape of the route. The base-required
    /// flag is kept since it depends on the job being inserted.
    pub fn clear_trips(&mut self, route_id: RouteIdx) {
        let state = self.route_state_mut(route_id);
        state.runs.clear();
        state.run_count = None;
        state.activities.clear();
        state.start_slack = None;
        state.end_slack = None;
    }

    pub fn clear_route(&mut self, route_id: RouteIdx) {
        *self.route_state_mut(route_id) = RouteState::default();
    }

    pub fn clear(&mut self) {
        self.routes.iter_mut().for_each(|state| *state = RouteState::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_returns_previous_value() {
        let mut store = RunStateStore::new(1);
        let route_id = RouteIdx::new(0);

        let first = Capacity::from_vec(vec![15.0]);
        assert_eq!(store.put_run_load(route_id, 0, first.clone()), None);
        assert_eq!(store.run_load(route_id, 0), Some(&first));

        let second = Capacity::from_vec(vec![90.0]);
        assert_eq!(store.put_run_load(route_id, 0, second.clone()), Some(first));
        assert_eq!(store.run_load(route_id, 0), Some(&second));
    }

    #[test]
    fn test_absent_is_distinct_from_zero() {
        let mut store = RunStateStore::new(1);
        let route_id = RouteIdx::new(0);

        assert_eq!(store.run_load(route_id, 3), None);
        assert_eq!(store.unload_location(route_id, 0), None);
        assert_eq!(store.run_count(route_id), None);

        store.put_run_load(route_id, 0, Capacity::EMPTY);
        store.put_run_count(route_id, 0);
        assert_eq!(store.run_load(route_id, 0), Some(&Capacity::EMPTY));
        assert_eq!(store.run_count(route_id), Some(0));

        let fallback = Capacity::from_vec(vec![1.0]);
        assert_eq!(store.run_load_or(route_id, 5, &fallback), &fallback);
    }

    #[test]
    fn test_clear_trips_keeps_base_required() {
        let mut store = RunStateStore::new(1);
        let route_id = RouteIdx::new(0);

        store.put_base_required(route_id, false);
        store.put_unload_location(route_id, 0, LocationIdx::new(4));
        store.put_run_count(route_id, 1);
        store.clear_trips(route_id);

        assert_eq!(store.unload_location(route_id, 0), None);
        assert_eq!(store.run_count(route_id), None);
        assert_eq!(store.base_required(route_id), Some(false));

        store.clear_route(route_id);
        assert_eq!(store.base_required(route_id), None);
        assert!(store.is_base_required(route_id));
    }

    #[test]
    fn test_lookup_on_unknown_route_is_none() {
        let store = RunStateStore::new(1);
        assert_eq!(store.run_count(RouteIdx::new(7)), None);
        assert!(store.activity_state(RouteIdx::new(7), 0).is_none());
    }
}
