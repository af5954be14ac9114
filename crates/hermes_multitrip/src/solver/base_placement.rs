use tracing::{debug, instrument, warn};

use crate::{
    error::Result,
    problem::{capacity::Capacity, job::{ActivityId, JobIdx}},
    solver::{
        bases::{
            daily_volume::DailyUnloadVolumeTracker,
            location_provider::{BaseLocationProvider, LocationAssignment, LocationQuery},
            service_time_provider::BaseServiceTimeProvider,
        },
        calculator::best_loadable_location,
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// Re-chooses the unload location of every base once a pass is done.
///
/// Trips are walked in route order and the daily volume is rebuilt along the
/// way, so a location saturated by an earlier trip is no longer offered to a
/// later one. A trip that no location can absorb is removed from the route and
/// its destinations are handed back as unassigned.
pub struct BasePlacementOptimizer<'a> {
    location_provider: &'a dyn BaseLocationProvider,
    service_time_provider: &'a dyn BaseServiceTimeProvider,
}

impl<'a> BasePlacementOptimizer<'a> {
    pub fn new(
        location_provider: &'a dyn BaseLocationProvider,
        service_time_provider: &'a dyn BaseServiceTimeProvider,
    ) -> Self {
        BasePlacementOptimizer {
            location_provider,
            service_time_provider,
        }
    }

    /// Returns the destinations unassigned by trip deletions, in route order.
    #[instrument(skip_all, level = "debug")]
    pub fn optimize(
        &self,
        solution: &mut WorkingSolution,
        daily_volume: &mut DailyUnloadVolumeTracker,
    ) -> Result<Vec<JobIdx>> {
        daily_volume.clear();

        let mut unassigned = Vec::new();
        for route_id in solution.route_ids() {
            unassigned.extend(self.optimize_route(solution, daily_volume, route_id)?);
        }

        Ok(unassigned)
    }

    fn optimize_route(
        &self,
        solution: &mut WorkingSolution,
        daily_volume: &mut DailyUnloadVolumeTracker,
        route_id: RouteIdx,
    ) -> Result<Vec<JobIdx>> {
        let removed_bases = solution.clear_double_bases(route_id);
        if removed_bases > 0 {
            debug!(%route_id, removed_bases, "removed empty trips");
        }
        solution.refresh_route(route_id);

        let problem = solution.problem_arc();
        let mut unassigned = Vec::new();
        let mut assigned_locations: Vec<LocationAssignment> = Vec::new();
        let mut trip_load = Capacity::EMPTY;
        let mut trip_start = 0;
        let mut run_index = 0;
        let mut position = 0;

        while position < solution.route(route_id).len() {
            let route = solution.route(route_id);
            let base_id = match route.activity(position) {
                ActivityId::Destination(job_id) => {
                    trip_load += problem.destination(job_id).demand();
                    position += 1;
                    continue;
                }
                ActivityId::Base(base_id) => base_id,
            };

            let vehicle = problem.vehicle(route.vehicle_id());
            let bases = solution.bases();
            // A base never opens a route once double bases are gone.
            let previous_location_id = route.location_id(&problem, bases, position - 1);
            let next_location_id = if position + 1 < route.len() {
                route.location_id(&problem, bases, position + 1)
            } else {
                vehicle.end_location_id()
            };
            let is_last_trip = !route.activity_ids()[position + 1..]
                .iter()
                .any(ActivityId::is_base);

            let query = LocationQuery {
                vehicle,
                is_last_trip,
                trip_index: run_index,
                fill_percent: trip_load.fill_percent(vehicle.trip_capacity(run_index)),
                assigned_locations: &assigned_locations,
                previous_location_id,
                next_location_id,
            };

            let best_location_id = best_loadable_location(
                &problem,
                self.location_provider,
                daily_volume,
                &query,
                &trip_load,
            )?;

            match best_location_id {
                Some(location_id) => {
                    let arrival = route.activity_departure_time(position - 1)
                        + problem.travel_time_or_zero(
                            vehicle,
                            previous_location_id,
                            Some(location_id),
                        );
                    let service_duration =
                        self.service_time_provider
                            .base_service_time(vehicle, location_id, arrival);

                    solution.assign_base(base_id, location_id, service_duration);
                    daily_volume.add_volume(location_id, &trip_load)?;

                    match assigned_locations
                        .iter_mut()
                        .find(|assignment| assignment.location_id == location_id)
                    {
                        Some(assignment) => assignment.count += 1,
                        None => assigned_locations.push(LocationAssignment {
                            location_id,
                            count: 1,
                        }),
                    }

                    run_index += 1;
                    position += 1;
                    trip_start = position;
                }
                None => {
                    warn!(%route_id, run_index, "no loadable location, trip removed");

                    let removed = (trip_start..=position)
                        .rev()
                        .filter_map(|position| {
                            solution.remove_activity(route_id, position).job_id()
                        })
                        .collect::<Vec<_>>();
                    unassigned.extend(removed.into_iter().rev());

                    position = trip_start;
                }
            }

            trip_load.reset();
            solution.refresh_route(route_id);
        }

        Ok(unassigned)
    }
}
