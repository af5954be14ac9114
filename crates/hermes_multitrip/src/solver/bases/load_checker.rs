use tracing::debug;

use crate::{
    error::Result,
    problem::job::JobIdx,
    solver::solution::{route_id::RouteIdx, working_solution::WorkingSolution},
};

use super::{daily_volume::DailyUnloadVolumeTracker, location_provider::LocationAssignment};

/// Answers whether a route still has room for a job in one of its closed trips.
pub struct TripLoadChecker<'a> {
    solution: &'a WorkingSolution,
    daily_volume: &'a DailyUnloadVolumeTracker,
}

impl<'a> TripLoadChecker<'a> {
    pub fn new(solution: &'a WorkingSolution, daily_volume: &'a DailyUnloadVolumeTracker) -> Self {
        TripLoadChecker {
            solution,
            daily_volume,
        }
    }

    /// True when no closed trip of the route can take the job, either because
    /// the vehicle is full or because the trip's unload location is.
    pub fn is_loaded(&self, job_id: JobIdx, route_id: RouteIdx) -> Result<bool> {
        let problem = self.solution.problem();
        let demand = problem.destination(job_id).demand();
        let vehicle = self.solution.route(route_id).vehicle(problem);
        let run_states = self.solution.run_states();

        for run_index in 0..run_states.run_count_or(route_id, 0) {
            let Some(load) = run_states.run_load(route_id, run_index) else {
                continue;
            };

            if !(load + demand).is_less_or_equal(vehicle.trip_capacity(run_index)) {
                continue;
            }

            let loadable = match run_states.unload_location(route_id, run_index) {
                Some(location_id) => self.daily_volume.is_loadable(location_id, demand)?,
                None => true,
            };

            if loadable {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Fill level of a trip, in percent of its first capacity dimension.
    pub fn load_percent(&self, route_id: RouteIdx, run_index: usize) -> f64 {
        let problem = self.solution.problem();
        let vehicle = self.solution.route(route_id).vehicle(problem);

        self.solution
            .run_states()
            .run_load(route_id, run_index)
            .map_or(0.0, |load| load.fill_percent(vehicle.trip_capacity(run_index)))
    }

    pub fn location_assignments(&self, route_id: RouteIdx) -> Vec<LocationAssignment> {
        location_assignments(self.solution, route_id)
    }
}

/// Unload locations used by the closed trips of a route, in order of first use.
pub fn location_assignments(solution: &WorkingSolution, route_id: RouteIdx) -> Vec<LocationAssignment> {
    let run_states = solution.run_states();
    let mut assignments: Vec<LocationAssignment> = Vec::new();

    for run_index in 0..run_states.run_count_or(route_id, 0) {
        let Some(location_id) = run_states.unload_location(route_id, run_index) else {
            continue;
        };

        match assignments
            .iter_mut()
            .find(|assignment| assignment.location_id == location_id)
        {
            Some(assignment) => assignment.count += 1,
            None => assignments.push(LocationAssignment {
                location_id,
                count: 1,
            }),
        }
    }

    assignments
}

/// Writes the base-required flag of every route for `job_id`.
pub fn mark_required_routes(
    solution: &mut WorkingSolution,
    daily_volume: &DailyUnloadVolumeTracker,
    job_id: JobIdx,
) -> Result<()> {
    let required = {
        let checker = TripLoadChecker::new(solution, daily_volume);
        solution
            .route_ids()
            .map(|route_id| checker.is_loaded(job_id, route_id))
            .collect::<Result<Vec<_>>>()?
    };

    for (route_id, is_required) in solution.route_ids().zip(required) {
        if is_required {
            debug!(%route_id, %job_id, "base required");
        }
        solution
            .run_states_mut()
            .put_base_required(route_id, is_required);
    }

    Ok(())
}
