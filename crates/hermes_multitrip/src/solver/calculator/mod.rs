pub mod base_insertion;
pub mod destination_insertion;

use jiff::Timestamp;

use crate::{
    error::Result,
    problem::{
        capacity::Capacity, location::LocationIdx, vehicle::Vehicle,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        bases::{
            base_pool::BasePool,
            daily_volume::DailyUnloadVolumeTracker,
            location_provider::{BaseLocationProvider, LocationQuery},
        },
        insertion::{ActivityGap, InsertionEvent, InsertionEvents, InsertionResult},
        insertion_context::RouteInsertionContext,
        solution::route::{RouteStop, WorkingSolutionRoute, activity_end_time, activity_location_id},
    },
};

/// Cheapest candidate of the provider, by the detour between the two stops of
/// the query, that can still absorb `trip_load` today. Ties keep the first
/// candidate.
pub(crate) fn best_loadable_location(
    problem: &VehicleRoutingProblem,
    location_provider: &dyn BaseLocationProvider,
    daily_volume: &DailyUnloadVolumeTracker,
    query: &LocationQuery,
    trip_load: &Capacity,
) -> Result<Option<LocationIdx>> {
    let mut best_location_id = None;
    let mut best_cost = f64::INFINITY;

    for location_id in location_provider.available_locations(query) {
        if !daily_volume.is_loadable(location_id, trip_load)? {
            continue;
        }

        let cost = problem.travel_cost_or_zero(
            query.vehicle,
            query.previous_location_id,
            Some(location_id),
        ) + problem.travel_cost_or_zero(query.vehicle, Some(location_id), query.next_location_id);

        if cost < best_cost {
            best_cost = cost;
            best_location_id = Some(location_id);
        }
    }

    Ok(best_location_id)
}

/// Wraps calculator events into a result, switching the vehicle first when needed.
pub(crate) fn insertion_result(
    context: &RouteInsertionContext,
    cost: f64,
    position: usize,
    run_index: usize,
    events: impl IntoIterator<Item = InsertionEvent>,
) -> InsertionResult {
    let mut all_events = InsertionEvents::new();
    if context.switches_vehicle() {
        all_events.push(InsertionEvent::SwitchVehicle {
            route_id: context.route_id,
            vehicle_id: context.vehicle_id,
            departure_time: context.departure_time,
        });
    }
    all_events.extend(events);

    InsertionResult {
        route_id: context.route_id,
        cost,
        position,
        run_index,
        vehicle_id: context.vehicle_id,
        departure_time: context.departure_time,
        events: all_events,
    }
}

/// Walks the gaps of a route from Start to End, replaying travel and service
/// times for the given vehicle and departure. Yields each gap with the index of
/// the trip it belongs to.
pub(crate) struct RouteGaps<'a> {
    problem: &'a VehicleRoutingProblem,
    bases: &'a BasePool,
    route: &'a WorkingSolutionRoute,
    vehicle: &'a Vehicle,
    position: usize,
    previous: RouteStop,
    previous_location_id: Option<LocationIdx>,
    previous_departure: Timestamp,
    run_index: usize,
}

impl<'a> RouteGaps<'a> {
    pub(crate) fn new(
        problem: &'a VehicleRoutingProblem,
        bases: &'a BasePool,
        route: &'a WorkingSolutionRoute,
        vehicle: &'a Vehicle,
        departure_time: Timestamp,
    ) -> Self {
        RouteGaps {
            problem,
            bases,
            route,
            vehicle,
            position: 0,
            previous: RouteStop::Start,
            previous_location_id: vehicle.depot_location_id(),
            previous_departure: departure_time,
            run_index: 0,
        }
    }

    /// An unplaced base sits where the vehicle already is.
    fn stop_location_id(&self, stop: RouteStop) -> Option<LocationIdx> {
        match stop {
            RouteStop::Start => self.vehicle.depot_location_id(),
            RouteStop::End => self.vehicle.end_location_id(),
            RouteStop::Activity(activity_id) => {
                activity_location_id(self.problem, self.bases, activity_id)
                    .or(self.previous_location_id)
            }
        }
    }
}

impl Iterator for RouteGaps<'_> {
    type Item = (ActivityGap, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.position > self.route.len() {
            return None;
        }

        let next = self.route.next_stop(self.position);
        let next_location_id = self.stop_location_id(next);
        let gap = ActivityGap {
            position: self.position,
            previous: self.previous,
            next,
            previous_location_id: self.previous_location_id,
            next_location_id,
            previous_departure: self.previous_departure,
        };
        let run_index = self.run_index;

        if let RouteStop::Activity(activity_id) = next {
            let arrival = self.previous_departure
                + self.problem.travel_time_or_zero(
                    self.vehicle,
                    self.previous_location_id,
                    next_location_id,
                );

            self.previous_departure =
                activity_end_time(self.problem, self.bases, activity_id, arrival);
            self.previous_location_id = next_location_id;
            self.previous = next;

            if activity_id.is_base() {
                self.run_index += 1;
            }
        }

        self.position += 1;
        Some((gap, run_index))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::SignedDuration;

    use crate::{
        problem::{base::BaseIdx, job::ActivityId},
        test_utils::{TestProblemBuilder, TestStop, create_location_grid, create_test_working_solution},
    };

    use super::*;

    #[test]
    fn test_route_gaps_follow_trips() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(1, 1.0), (3, 1.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();
        let solution = create_test_working_solution(
            Arc::new(problem),
            vec![vec![TestStop::D(0), TestStop::B(0, 9), TestStop::D(1)]],
        );
        let route = &solution.routes()[0];
        let problem = solution.problem();

        let gaps = RouteGaps::new(
            problem,
            solution.bases(),
            route,
            route.vehicle(problem),
            Timestamp::UNIX_EPOCH,
        )
        .collect::<Vec<_>>();

        assert_eq!(gaps.len(), 4);
        assert_eq!(
            gaps.iter().map(|(_, run)| *run).collect::<Vec<_>>(),
            vec![0, 0, 1, 1]
        );

        let (gap, _) = gaps[2];
        assert_eq!(gap.previous, RouteStop::Activity(ActivityId::Base(BaseIdx::new(0))));
        assert_eq!(gap.previous_location_id, Some(LocationIdx::new(9)));
        assert_eq!(
            gap.previous_departure,
            Timestamp::UNIX_EPOCH + SignedDuration::from_secs(9)
        );
        assert_eq!(gaps[3].0.next, RouteStop::End);
        assert_eq!(gaps[3].0.next_location_id, None);
    }
}
