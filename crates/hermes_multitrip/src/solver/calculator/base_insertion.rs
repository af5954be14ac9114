use jiff::Timestamp;
use tracing::debug;

use crate::{
    error::{MultiTripError, Result},
    problem::{
        base::BaseIdx,
        capacity::EMPTY_CAPACITY,
        job::ActivityId,
        vehicle::VehicleIdx,
    },
    solver::{
        bases::{load_checker::location_assignments, location_provider::LocationQuery},
        constraints::{
            compute_insertion_cost::{activity_status, route_constraints_fulfilled},
            constraint::ConstraintStatus,
        },
        insertion::{InsertionEvent, InsertionResult, NewActivity},
        insertion_context::{ActivityInsertionContext, InsertionContext, RouteInsertionContext},
        solution::{route::RouteStop, route_id::RouteIdx},
    },
};

use super::{RouteGaps, best_loadable_location, insertion_result};

/// Cost reported for a forced base. A base is placed where it is needed, it
/// never competes with other positions on cost.
pub const ALWAYS_BEST_COST: f64 = f64::MIN;

pub struct BaseInsertionCalculator<'a> {
    context: &'a InsertionContext<'a>,
}

impl<'a> BaseInsertionCalculator<'a> {
    pub fn new(context: &'a InsertionContext<'a>) -> Self {
        BaseInsertionCalculator { context }
    }

    /// First gap of the route where `base_id` passes the hard checks, with the
    /// best loadable location for the trip it closes.
    pub fn evaluate(
        &self,
        route_id: RouteIdx,
        base_id: BaseIdx,
        vehicle_id: VehicleIdx,
        departure_time: Timestamp,
    ) -> Result<Option<InsertionResult>> {
        let context = self.context;
        let problem = context.problem();
        let run_states = context.run_states();

        if !context.solution.bases().is_free(base_id) {
            return Err(MultiTripError::InconsistentState(format!(
                "base {base_id} is already part of a route"
            )));
        }

        let route_context = RouteInsertionContext {
            problem,
            solution: context.solution,
            route_id,
            vehicle_id,
            departure_time,
            activity_id: ActivityId::Base(base_id),
        };

        if !route_constraints_fulfilled(context.constraints, &route_context) {
            return Ok(None);
        }

        let vehicle = route_context.vehicle();
        let assigned_locations = location_assignments(context.solution, route_id);
        let gaps = RouteGaps::new(
            problem,
            context.solution.bases(),
            route_context.route(),
            vehicle,
            departure_time,
        );

        for (gap, run_index) in gaps {
            let trip_load = if gap.previous.is_destination() {
                run_states
                    .activity_state(route_id, gap.position - 1)
                    .map_or(&EMPTY_CAPACITY, |state| &state.load)
            } else {
                &EMPTY_CAPACITY
            };

            let query = LocationQuery {
                vehicle,
                is_last_trip: gap.next == RouteStop::End,
                trip_index: run_index,
                fill_percent: trip_load.fill_percent(vehicle.trip_capacity(run_index)),
                assigned_locations: &assigned_locations,
                previous_location_id: gap.previous_location_id,
                next_location_id: gap.next_location_id,
            };

            let Some(location_id) = best_loadable_location(
                problem,
                context.location_provider,
                context.daily_volume,
                &query,
                trip_load,
            )?
            else {
                continue;
            };

            let arrival = gap.previous_departure
                + problem.travel_time_or_zero(vehicle, gap.previous_location_id, Some(location_id));
            let service_duration =
                context
                    .service_time_provider
                    .base_service_time(vehicle, location_id, arrival);

            let activity_context = ActivityInsertionContext {
                route: &route_context,
                daily_volume: context.daily_volume,
                new_activity: NewActivity::Base {
                    base_id,
                    location_id,
                    service_duration,
                },
                gap,
                run_index,
                run_load: trip_load,
                unload_location_id: Some(location_id),
            };

            match activity_status(context.constraints, &activity_context)? {
                ConstraintStatus::Fulfilled => {
                    return Ok(Some(insertion_result(
                        &route_context,
                        ALWAYS_BEST_COST,
                        gap.position,
                        run_index,
                        [
                            InsertionEvent::InsertActivity {
                                route_id,
                                position: gap.position,
                                activity_id: ActivityId::Base(base_id),
                            },
                            InsertionEvent::AssignBase {
                                base_id,
                                location_id,
                                service_duration,
                            },
                        ],
                    )));
                }
                ConstraintStatus::BreakTrip => break,
                ConstraintStatus::ContinueScan => {}
            }
        }

        debug!(%route_id, %base_id, "no position for base");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::SignedDuration;

    use crate::{
        problem::location::LocationIdx,
        solver::{
            bases::{
                daily_volume::DailyUnloadVolumeTracker,
                location_provider::DefaultBaseLocationProvider,
                service_time_provider::VehicleUnloadServiceTime,
            },
            constraints::constraint::default_constraints,
            solution::working_solution::WorkingSolution,
        },
        test_utils::{TestProblemBuilder, TestStop, create_location_grid, create_test_working_solution},
    };

    use super::*;

    fn evaluate(solution: &WorkingSolution, base_id: usize) -> Result<Option<InsertionResult>> {
        let problem = solution.problem();
        let daily_volume = DailyUnloadVolumeTracker::from_problem(problem);
        let constraints = default_constraints(problem, 1.0);
        let location_provider = DefaultBaseLocationProvider::from_problem(problem);

        let context = InsertionContext {
            solution,
            daily_volume: &daily_volume,
            constraints: &constraints,
            location_provider: &location_provider,
            service_time_provider: &VehicleUnloadServiceTime,
            allow_new_trips: true,
        };

        let route = solution.route(RouteIdx::new(0));
        BaseInsertionCalculator::new(&context).evaluate(
            RouteIdx::new(0),
            BaseIdx::new(base_id),
            route.vehicle_id(),
            route.departure_time(problem),
        )
    }

    #[test]
    fn test_first_feasible_gap() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(1, 3.0), (2, 3.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();
        let solution = create_test_working_solution(
            Arc::new(problem),
            vec![vec![TestStop::D(0), TestStop::D(1)]],
        );

        let result = evaluate(&solution, 0).unwrap().unwrap();

        assert_eq!(result.cost, ALWAYS_BEST_COST);
        assert_eq!(result.position, 1);
        assert_eq!(
            result.events.as_slice(),
            &[
                InsertionEvent::InsertActivity {
                    route_id: RouteIdx::new(0),
                    position: 1,
                    activity_id: ActivityId::Base(BaseIdx::new(0)),
                },
                InsertionEvent::AssignBase {
                    base_id: BaseIdx::new(0),
                    location_id: LocationIdx::new(9),
                    service_duration: SignedDuration::ZERO,
                },
            ]
        );
    }

    #[test]
    fn test_empty_route_has_no_position() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(1, 3.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();
        let solution = create_test_working_solution(Arc::new(problem), vec![vec![]]);

        assert!(evaluate(&solution, 0).unwrap().is_none());
    }

    #[test]
    fn test_taken_base_is_inconsistent() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(1, 3.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();
        let solution = create_test_working_solution(
            Arc::new(problem),
            vec![vec![TestStop::D(0), TestStop::B(0, 9)]],
        );

        assert!(matches!(
            evaluate(&solution, 0),
            Err(MultiTripError::InconsistentState(_))
        ));
    }
}
