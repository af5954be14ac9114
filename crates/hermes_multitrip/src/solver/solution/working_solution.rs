use std::{collections::BTreeSet, sync::Arc};

use jiff::{SignedDuration, Timestamp};

use crate::{
    error::{MultiTripError, Result},
    problem::{
        base::BaseIdx,
        job::{ActivityId, JobIdx},
        location::LocationIdx,
        vehicle::VehicleIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        bases::base_pool::BasePool,
        solution::{route::WorkingSolutionRoute, route_id::RouteIdx},
        state::{run_state::RunStateStore, trip_tracker},
    },
    utils::enumerate_idx::EnumerateIdx,
};

/// Routes plus everything derived from them: the base pool, the per-trip run
/// state and the set of unassigned destinations.
#[derive(Clone)]
pub struct WorkingSolution {
    problem: Arc<VehicleRoutingProblem>,
    routes: Vec<WorkingSolutionRoute>,
    bases: BasePool,
    run_states: RunStateStore,
    unassigned_jobs: BTreeSet<JobIdx>,
}

impl WorkingSolution {
    pub fn new(problem: Arc<VehicleRoutingProblem>) -> Self {
        let bases = BasePool::for_problem(&problem);
        Self::with_base_pool(problem, bases)
    }

    pub fn with_base_pool(problem: Arc<VehicleRoutingProblem>, bases: BasePool) -> Self {
        let routes = problem
            .vehicles()
            .iter()
            .enumerate_idx()
            .map(|(vehicle_id, _)| WorkingSolutionRoute::empty(&problem, vehicle_id))
            .collect::<Vec<_>>();
        let unassigned_jobs = (0..problem.destinations().len())
            .map(JobIdx::new)
            .collect();

        WorkingSolution {
            run_states: RunStateStore::new(routes.len()),
            problem,
            routes,
            bases,
            unassigned_jobs,
        }
    }

    pub fn problem(&self) -> &VehicleRoutingProblem {
        self.problem.as_ref()
    }

    pub fn problem_arc(&self) -> Arc<VehicleRoutingProblem> {
        Arc::clone(&self.problem)
    }

    pub fn routes(&self) -> &[WorkingSolutionRoute] {
        &self.routes
    }

    pub fn route(&self, route_id: RouteIdx) -> &WorkingSolutionRoute {
        &self.routes[route_id]
    }

    pub fn route_ids(&self) -> impl Iterator<Item = RouteIdx> + use<> {
        (0..self.routes.len()).map(RouteIdx::new)
    }

    pub fn non_empty_routes_iter(&self) -> impl Iterator<Item = &WorkingSolutionRoute> {
        self.routes.iter().filter(|route| !route.is_empty())
    }

    pub fn bases(&self) -> &BasePool {
        &self.bases
    }

    pub fn run_states(&self) -> &RunStateStore {
        &self.run_states
    }

    pub fn run_states_mut(&mut self) -> &mut RunStateStore {
        &mut self.run_states
    }

    pub fn unassigned_jobs(&self) -> &BTreeSet<JobIdx> {
        &self.unassigned_jobs
    }

    pub fn has_unassigned(&self) -> bool {
        !self.unassigned_jobs.is_empty()
    }

    pub fn is_unassigned(&self, job_id: JobIdx) -> bool {
        self.unassigned_jobs.contains(&job_id)
    }

    pub fn route_of_job(&self, job_id: JobIdx) -> Option<RouteIdx> {
        self.routes
            .iter()
            .enumerate_idx()
            .find(|(_, route)| route.contains_activity(ActivityId::Destination(job_id)))
            .map(|(route_id, _)| route_id)
    }

    pub fn total_transport_costs(&self) -> f64 {
        self.non_empty_routes_iter()
            .map(|route| route.transport_costs(&self.problem, &self.bases))
            .sum()
    }

    pub fn trip_count(&self) -> usize {
        self.route_ids()
            .map(|route_id| self.run_states.run_count_or(route_id, 0))
            .sum()
    }

    /// To check if two working solutions are identical, we compare vehicles,
    /// activity sequences and the locations assigned to their bases.
    pub fn is_identical(&self, other: &WorkingSolution) -> bool {
        if self.routes.len() != other.routes.len() {
            return false;
        }

        self.routes.iter().zip(&other.routes).all(|(route, other_route)| {
            route.vehicle_id == other_route.vehicle_id
                && route.activity_ids == other_route.activity_ids
                && route.activity_ids.iter().all(|activity| match activity {
                    ActivityId::Base(base_id) => {
                        self.bases.base(*base_id).location_id()
                            == other.bases.base(*base_id).location_id()
                    }
                    ActivityId::Destination(_) => true,
                })
        })
    }

    /// Recomputes times, trip loads, unload locations and time slack of one route.
    pub fn refresh_route(&mut self, route_id: RouteIdx) {
        let route = &mut self.routes[route_id];
        route.update_activity_data(&self.problem, &self.bases);
        trip_tracker::refresh_route(
            &self.problem,
            route_id,
            route,
            &self.bases,
            &mut self.run_states,
        );
    }

    pub fn refresh_all_routes(&mut self) {
        for route_id in self.route_ids() {
            self.refresh_route(route_id);
        }
    }

    /// Rebuilds the free set of the base pool from the routes.
    pub fn refresh_bases(&mut self) {
        self.bases.refresh(&self.routes);
    }

    pub(crate) fn insert_activity(
        &mut self,
        route_id: RouteIdx,
        position: usize,
        activity_id: ActivityId,
    ) -> Result<()> {
        let route = &mut self.routes[route_id];
        if position > route.len() {
            return Err(MultiTripError::InconsistentState(format!(
                "position {position} is out of bounds for route {route_id}"
            )));
        }

        match activity_id {
            ActivityId::Destination(job_id) => {
                if !self.unassigned_jobs.remove(&job_id) {
                    return Err(MultiTripError::InconsistentState(format!(
                        "destination {job_id} is already assigned"
                    )));
                }
            }
            ActivityId::Base(base_id) => {
                if !self.bases.take(base_id) {
                    return Err(MultiTripError::InconsistentState(format!(
                        "base {base_id} is already taken"
                    )));
                }
            }
        }

        route.insert(position, activity_id);
        Ok(())
    }

    /// Removes the activity at `position`. Destinations go back to the
    /// unassigned set, bases go back to the pool.
    pub(crate) fn remove_activity(&mut self, route_id: RouteIdx, position: usize) -> ActivityId {
        let activity_id = self.routes[route_id].remove(position);
        match activity_id {
            ActivityId::Destination(job_id) => {
                self.unassigned_jobs.insert(job_id);
            }
            ActivityId::Base(base_id) => {
                self.bases.release(base_id);
            }
        }

        activity_id
    }

    pub fn remove_destination(&mut self, job_id: JobIdx) -> Option<RouteIdx> {
        let route_id = self.route_of_job(job_id)?;
        let position = self.routes[route_id].position_of(ActivityId::Destination(job_id))?;
        self.remove_activity(route_id, position);

        Some(route_id)
    }

    pub(crate) fn assign_base(
        &mut self,
        base_id: BaseIdx,
        location_id: LocationIdx,
        service_duration: SignedDuration,
    ) {
        self.bases.assign(base_id, location_id, service_duration);
    }

    pub(crate) fn switch_vehicle(
        &mut self,
        route_id: RouteIdx,
        vehicle_id: VehicleIdx,
        departure: Timestamp,
    ) {
        self.routes[route_id].set_vehicle(vehicle_id, departure);
    }

    /// Removes bases sitting at the start of a route or right after another base.
    pub fn clear_double_bases(&mut self, route_id: RouteIdx) -> usize {
        trip_tracker::clear_double_bases(&mut self.routes[route_id], &mut self.bases)
    }

    pub fn reset_route(&mut self, route_id: RouteIdx) {
        let route = &mut self.routes[route_id];
        for activity_id in route.activity_ids.drain(..) {
            match activity_id {
                ActivityId::Destination(job_id) => {
                    self.unassigned_jobs.insert(job_id);
                }
                ActivityId::Base(base_id) => {
                    self.bases.release(base_id);
                }
            }
        }

        route.reset(&self.problem, &self.bases);
        self.run_states.clear_route(route_id);
    }
}
