use crate::{
    problem::{capacity::Capacity, job::ActivityId, vehicle_routing_problem::VehicleRoutingProblem},
    solver::{
        bases::base_pool::BasePool,
        solution::{route::WorkingSolutionRoute, route_id::RouteIdx},
    },
};

use super::run_state::{ActivityState, RunStateStore, TimeSlack};

/// Recomputes the run state of a route from its activity sequence.
///
/// Trips are numbered from zero in route order. Every base closes the current
/// trip: its accumulated load and the base location are stored under the trip
/// index. The trailing trip, if any, is stored without an unload location and is
/// not counted in the run count.
pub fn refresh_route(
    problem: &VehicleRoutingProblem,
    route_id: RouteIdx,
    route: &WorkingSolutionRoute,
    bases: &BasePool,
    store: &mut RunStateStore,
) {
    store.clear_trips(route_id);

    let mut activity_states = Vec::with_capacity(route.len());
    let mut load = Capacity::EMPTY;
    let mut run_index = 0;
    let mut open_trip_has_destinations = false;

    for &activity_id in route.activity_ids() {
        match activity_id {
            ActivityId::Destination(job_id) => {
                load += problem.destination(job_id).demand();
                open_trip_has_destinations = true;
                activity_states.push(ActivityState {
                    load: load.clone(),
                    ..ActivityState::default()
                });
            }
            ActivityId::Base(base_id) => {
                store.put_run_load(route_id, run_index, load.clone());
                if let Some(location_id) = bases.base(base_id).location_id() {
                    store.put_unload_location(route_id, run_index, location_id);
                }

                activity_states.push(ActivityState {
                    load: std::mem::take(&mut load),
                    ..ActivityState::default()
                });

                run_index += 1;
                open_trip_has_destinations = false;
            }
        }
    }

    if open_trip_has_destinations {
        store.put_run_load(route_id, run_index, load);
    }
    store.put_run_count(route_id, run_index);

    compute_future_max_loads(route, &mut activity_states);
    store.put_activity_states(route_id, activity_states);

    refresh_time_slack(problem, route_id, route, store);
}

/// Highest load reached from each stop until the end of its trip.
fn compute_future_max_loads(route: &WorkingSolutionRoute, states: &mut [ActivityState]) {
    let mut running_max = Capacity::EMPTY;

    for position in (0..states.len()).rev() {
        if route.activity(position).is_base() {
            running_max = Capacity::EMPTY;
            states[position].future_max_load = states[position].load.clone();
            continue;
        }

        running_max.update_max(&states[position].load);
        states[position].future_max_load = running_max.clone();
    }
}

/// Misses of one stop, in seconds. Positive start miss means waiting, positive end
/// miss means lateness.
fn activity_misses(
    problem: &VehicleRoutingProblem,
    route: &WorkingSolutionRoute,
    position: usize,
) -> Option<(f64, f64)> {
    let ActivityId::Destination(job_id) = route.activity(position) else {
        return None;
    };

    let time_window = problem.destination(job_id).time_window();
    let arrival = route.arrival_time(position);
    let start_miss = time_window.start_miss(arrival).unwrap_or(f64::NEG_INFINITY);

    let end_miss = if time_window.is_reachable_from(route.vehicle(problem).departure_time()) {
        time_window.end_miss(arrival).unwrap_or(f64::NEG_INFINITY)
    } else {
        f64::NEG_INFINITY
    };

    Some((start_miss, end_miss))
}

/// Forward and backward pass over the route computing time-window slack.
fn refresh_time_slack(
    problem: &VehicleRoutingProblem,
    route_id: RouteIdx,
    route: &WorkingSolutionRoute,
    store: &mut RunStateStore,
) {
    let misses = (0..route.len())
        .map(|position| activity_misses(problem, route, position))
        .collect::<Vec<_>>();

    let states = store.activity_states_mut(route_id);

    let mut past_waiting = 0.0;
    let mut past_lateness = 0.0;
    for (position, miss) in misses.iter().enumerate() {
        states[position].time_slack.past_waiting = past_waiting;
        states[position].time_slack.past_lateness = past_lateness;

        if let Some((start_miss, end_miss)) = miss {
            past_waiting += start_miss.max(0.0);
            past_lateness += end_miss.max(0.0);
        }
    }

    let end_lateness = route
        .vehicle(problem)
        .latest_end_time()
        .map(|latest_end| {
            route
                .end_arrival_time()
                .duration_since(latest_end)
                .as_secs_f64()
        })
        .unwrap_or(f64::NEG_INFINITY);

    let mut future_waiting = f64::NEG_INFINITY;
    let mut future_lateness = end_lateness;
    for (position, miss) in misses.iter().enumerate().rev() {
        states[position].time_slack.future_waiting = future_waiting;
        states[position].time_slack.future_lateness = future_lateness;

        if let Some((start_miss, end_miss)) = miss {
            future_waiting = future_waiting.max(*start_miss);
            future_lateness = future_lateness.max(*end_miss);
        }
    }

    store.put_start_slack(
        route_id,
        TimeSlack {
            past_waiting: 0.0,
            past_lateness: 0.0,
            future_waiting,
            future_lateness,
        },
    );
    store.put_end_slack(
        route_id,
        TimeSlack {
            past_waiting,
            past_lateness,
            future_waiting: f64::NEG_INFINITY,
            future_lateness: end_lateness,
        },
    );
}

/// Removes bases that open the route or directly follow another base and hands
/// them back to the pool. Returns how many were removed.
pub fn clear_double_bases(route: &mut WorkingSolutionRoute, bases: &mut BasePool) -> usize {
    let mut removed = 0;
    let mut position = 0;

    while position < route.len() {
        let is_degenerate = route.activity(position).is_base()
            && (position == 0 || route.activity(position - 1).is_base());

        if is_degenerate {
            if let ActivityId::Base(base_id) = route.remove(position) {
                bases.release(base_id);
            }
            removed += 1;
        } else {
            position += 1;
        }
    }

    removed
}
