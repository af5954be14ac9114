use jiff::Timestamp;
use tracing::debug;

use crate::{
    error::{MultiTripError, Result},
    problem::{
        base::BaseIdx,
        capacity::EMPTY_CAPACITY,
        job::{ActivityId, JobIdx},
        vehicle::VehicleIdx,
    },
    solver::{
        bases::{load_checker::location_assignments, location_provider::LocationQuery},
        constraints::{
            compute_insertion_cost::{
                activity_insertion_cost, activity_status, route_constraints_fulfilled,
                route_insertion_cost,
            },
            constraint::ConstraintStatus,
            transport_cost::marginal_transport_cost,
        },
        insertion::{ActivityGap, InsertionEvent, InsertionResult, NewActivity},
        insertion_context::{ActivityInsertionContext, InsertionContext, RouteInsertionContext},
        solution::{route::RouteStop, route_id::RouteIdx},
    },
};

use super::{RouteGaps, best_loadable_location, insertion_result};

/// Finds the cheapest position of a destination in one route.
///
/// Existing trips are scanned gap by gap. A `BreakTrip` status prunes the rest
/// of the trip it was raised in, the scan resumes at the next trip. When the
/// route needs a new trip for the job, the destination is also tried at the
/// tail of the route followed by a fresh base.
pub struct DestinationInsertionCalculator<'a> {
    context: &'a InsertionContext<'a>,
}

impl<'a> DestinationInsertionCalculator<'a> {
    pub fn new(context: &'a InsertionContext<'a>) -> Self {
        DestinationInsertionCalculator { context }
    }

    /// Best insertion strictly cheaper than `best_known_cost`, if any.
    ///
    /// Fails with `PoolExhausted` when only a new trip could take the job and
    /// no base is left to close it.
    pub fn evaluate(
        &self,
        route_id: RouteIdx,
        job_id: JobIdx,
        vehicle_id: VehicleIdx,
        departure_time: Timestamp,
        best_known_cost: f64,
    ) -> Result<Option<InsertionResult>> {
        let context = self.context;
        let route_context = RouteInsertionContext {
            problem: context.problem(),
            solution: context.solution,
            route_id,
            vehicle_id,
            departure_time,
            activity_id: ActivityId::Destination(job_id),
        };

        if !route_constraints_fulfilled(context.constraints, &route_context) {
            debug!(%route_id, %job_id, "route constraints not fulfilled");
            return Ok(None);
        }

        let route_cost = route_insertion_cost(context.constraints, &route_context);
        let mut best = self.scan_trips(&route_context, job_id, route_cost, best_known_cost)?;

        if context.allow_new_trips && context.run_states().is_base_required(route_id) {
            let Some(base_id) = context.solution.bases().peek_free() else {
                return match best {
                    Some(result) => Ok(Some(result)),
                    None => Err(MultiTripError::PoolExhausted),
                };
            };

            let best_cost = best.as_ref().map_or(best_known_cost, |result| result.cost);
            if let Some(result) =
                self.open_trip(&route_context, job_id, base_id, route_cost, best_cost)?
            {
                best = Some(result);
            }
        }

        if best.is_none() {
            debug!(%route_id, %job_id, "no insertion position");
        }

        Ok(best)
    }

    fn scan_trips(
        &self,
        route_context: &RouteInsertionContext,
        job_id: JobIdx,
        route_cost: f64,
        best_known_cost: f64,
    ) -> Result<Option<InsertionResult>> {
        let context = self.context;
        let problem = route_context.problem;
        let route_id = route_context.route_id;
        let vehicle = route_context.vehicle();
        let run_states = context.run_states();
        let location_id = problem.destination(job_id).location_id();

        let mut best: Option<(usize, usize)> = None;
        let mut best_cost = best_known_cost;
        let mut broken_run = None;

        let gaps = RouteGaps::new(
            problem,
            context.solution.bases(),
            route_context.route(),
            vehicle,
            route_context.departure_time,
        );

        for (gap, run_index) in gaps {
            if broken_run == Some(run_index) {
                continue;
            }

            let activity_context = ActivityInsertionContext {
                route: route_context,
                daily_volume: context.daily_volume,
                new_activity: NewActivity::Destination(job_id),
                gap,
                run_index,
                run_load: run_states.run_load_or(route_id, run_index, &EMPTY_CAPACITY),
                unload_location_id: run_states.unload_location(route_id, run_index),
            };

            match activity_status(context.constraints, &activity_context)? {
                ConstraintStatus::BreakTrip => {
                    broken_run = Some(run_index);
                    continue;
                }
                ConstraintStatus::ContinueScan => continue,
                ConstraintStatus::Fulfilled => {}
            }

            let cost = route_cost
                + activity_insertion_cost(context.constraints, &activity_context)
                + marginal_transport_cost(
                    problem,
                    vehicle,
                    gap.previous_location_id,
                    location_id,
                    gap.next_location_id,
                );

            if cost < best_cost {
                best_cost = cost;
                best = Some((gap.position, run_index));
            }
        }

        Ok(best.map(|(position, run_index)| {
            insertion_result(
                route_context,
                best_cost,
                position,
                run_index,
                [InsertionEvent::InsertActivity {
                    route_id,
                    position,
                    activity_id: ActivityId::Destination(job_id),
                }],
            )
        }))
    }

    /// Destination appended to the route and closed by `base_id`. Both stops must
    /// pass the hard checks, the base location must absorb the whole new trip.
    fn open_trip(
        &self,
        route_context: &RouteInsertionContext,
        job_id: JobIdx,
        base_id: BaseIdx,
        route_cost: f64,
        best_known_cost: f64,
    ) -> Result<Option<InsertionResult>> {
        let context = self.context;
        let problem = route_context.problem;
        let route_id = route_context.route_id;
        let vehicle = route_context.vehicle();
        let run_states = context.run_states();
        let destination = problem.destination(job_id);
        let destination_location_id = destination.location_id();

        let Some((tail_gap, run_index)) = RouteGaps::new(
            problem,
            context.solution.bases(),
            route_context.route(),
            vehicle,
            route_context.departure_time,
        )
        .last() else {
            return Ok(None);
        };

        let open_load = run_states.run_load_or(route_id, run_index, &EMPTY_CAPACITY);
        let trip_load = open_load + destination.demand();

        let assigned_locations = location_assignments(context.solution, route_id);
        let query = LocationQuery {
            vehicle,
            is_last_trip: true,
            trip_index: run_index,
            fill_percent: trip_load.fill_percent(vehicle.trip_capacity(run_index)),
            assigned_locations: &assigned_locations,
            previous_location_id: Some(destination_location_id),
            next_location_id: tail_gap.next_location_id,
        };

        let Some(location_id) = best_loadable_location(
            problem,
            context.location_provider,
            context.daily_volume,
            &query,
            &trip_load,
        )?
        else {
            debug!(%route_id, %job_id, "no loadable location for a new trip");
            return Ok(None);
        };

        let destination_context = ActivityInsertionContext {
            route: route_context,
            daily_volume: context.daily_volume,
            new_activity: NewActivity::Destination(job_id),
            gap: ActivityGap {
                next: RouteStop::Activity(ActivityId::Base(base_id)),
                next_location_id: Some(location_id),
                ..tail_gap
            },
            run_index,
            run_load: open_load,
            unload_location_id: Some(location_id),
        };

        if !activity_status(context.constraints, &destination_context)?.is_fulfilled() {
            return Ok(None);
        }

        let destination_departure = destination_context
            .new_activity
            .end_time(problem, destination_context.new_arrival());
        let base_arrival = destination_departure
            + problem.travel_time(vehicle, destination_location_id, location_id);
        let service_duration =
            context
                .service_time_provider
                .base_service_time(vehicle, location_id, base_arrival);

        let base_context = ActivityInsertionContext {
            route: route_context,
            daily_volume: context.daily_volume,
            new_activity: NewActivity::Base {
                base_id,
                location_id,
                service_duration,
            },
            gap: ActivityGap {
                position: tail_gap.position + 1,
                previous: RouteStop::Activity(ActivityId::Destination(job_id)),
                next: RouteStop::End,
                previous_location_id: Some(destination_location_id),
                next_location_id: tail_gap.next_location_id,
                previous_departure: destination_departure,
            },
            run_index,
            run_load: &trip_load,
            unload_location_id: Some(location_id),
        };

        if !activity_status(context.constraints, &base_context)?.is_fulfilled() {
            return Ok(None);
        }

        // Detour through the base, then through the destination in front of it.
        let transport_cost = marginal_transport_cost(
            problem,
            vehicle,
            tail_gap.previous_location_id,
            location_id,
            tail_gap.next_location_id,
        ) + marginal_transport_cost(
            problem,
            vehicle,
            tail_gap.previous_location_id,
            destination_location_id,
            Some(location_id),
        );

        let cost = route_cost
            + activity_insertion_cost(context.constraints, &destination_context)
            + activity_insertion_cost(context.constraints, &base_context)
            + transport_cost;

        if cost >= best_known_cost {
            return Ok(None);
        }

        Ok(Some(insertion_result(
            route_context,
            cost,
            tail_gap.position,
            run_index,
            [
                InsertionEvent::InsertActivity {
                    route_id,
                    position: tail_gap.position,
                    activity_id: ActivityId::Destination(job_id),
                },
                InsertionEvent::InsertActivity {
                    route_id,
                    position: tail_gap.position + 1,
                    activity_id: ActivityId::Base(base_id),
                },
                InsertionEvent::AssignBase {
                    base_id,
                    location_id,
                    service_duration,
                },
            ],
        )))
    }
}
