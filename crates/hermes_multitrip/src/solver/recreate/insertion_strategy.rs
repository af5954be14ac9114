use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use rand::{SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{MultiTripError, Result},
    problem::{
        job::{ActivityId, JobIdx},
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::{
        base_placement::BasePlacementOptimizer,
        bases::{
            daily_volume::DailyUnloadVolumeTracker,
            load_checker::mark_required_routes,
            location_provider::{BaseLocationProvider, DefaultBaseLocationProvider},
            service_time_provider::{BaseServiceTimeProvider, VehicleUnloadServiceTime},
        },
        calculator::{
            base_insertion::BaseInsertionCalculator,
            destination_insertion::DestinationInsertionCalculator,
        },
        constraints::constraint::{Constraint, default_constraints},
        insertion::{InsertionEvent, InsertionResult},
        insertion_context::InsertionContext,
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

use super::{
    listeners::{InsertionListener, InsertionListeners},
    recreate_params::RecreateParams,
};

/// Best insertion over every route, one job at a time.
///
/// Evaluation only reads the solution. The chosen insertion is then committed
/// as a whole before the next job is looked at, so every job sees the run state
/// left by the previous one.
pub struct InsertionStrategy {
    params: RecreateParams,
    constraints: Vec<Constraint>,
    location_provider: Box<dyn BaseLocationProvider>,
    service_time_provider: Box<dyn BaseServiceTimeProvider>,
    thread_pool: Option<rayon::ThreadPool>,
    listeners: InsertionListeners,
    is_stopped: Arc<AtomicBool>,
}

impl InsertionStrategy {
    pub fn new(problem: &VehicleRoutingProblem, params: RecreateParams) -> Result<Self> {
        let thread_pool = if params.insertion_threads.is_parallel() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(params.insertion_threads.number_of_threads())
                .build()
                .map_err(|error| MultiTripError::ThreadPool(error.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(InsertionStrategy {
            constraints: default_constraints(problem, params.time_window_weight),
            location_provider: Box::new(DefaultBaseLocationProvider::from_problem(problem)),
            service_time_provider: Box::new(VehicleUnloadServiceTime),
            thread_pool,
            listeners: InsertionListeners::default(),
            is_stopped: Arc::new(AtomicBool::new(false)),
            params,
        })
    }

    pub fn with_location_provider<P>(mut self, location_provider: P) -> Self
    where
        P: BaseLocationProvider + 'static,
    {
        self.location_provider = Box::new(location_provider);
        self
    }

    pub fn with_service_time_provider<P>(mut self, service_time_provider: P) -> Self
    where
        P: BaseServiceTimeProvider + 'static,
    {
        self.service_time_provider = Box::new(service_time_provider);
        self
    }

    pub fn add_listener<L>(&mut self, listener: Arc<parking_lot::Mutex<L>>)
    where
        L: InsertionListener + Send + Sync + 'static,
    {
        self.listeners.add(listener);
    }

    pub fn params(&self) -> &RecreateParams {
        &self.params
    }

    /// Handle that stops running and future passes between two jobs.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.is_stopped)
    }

    pub fn stop(&self) {
        self.is_stopped.store(true, Ordering::Relaxed);
    }

    /// Inserts every unassigned job, in the order of the configured sort strategy.
    pub fn recreate(&self, solution: &mut WorkingSolution) -> Result<Vec<JobIdx>> {
        let mut unassigned_jobs = solution.unassigned_jobs().iter().copied().collect::<Vec<_>>();
        let mut rng = SmallRng::seed_from_u64(self.params.seed);
        self.params.sort_strategy.sort_unassigned_jobs(
            solution.problem(),
            &mut unassigned_jobs,
            &mut rng,
        );

        self.insert_jobs(solution, &unassigned_jobs)
    }

    /// One recreate pass over `jobs`, in the given order. Returns the jobs still
    /// unassigned afterwards, including those dropped by base placement.
    #[instrument(skip_all, fields(jobs = jobs.len()))]
    pub fn insert_jobs(
        &self,
        solution: &mut WorkingSolution,
        jobs: &[JobIdx],
    ) -> Result<Vec<JobIdx>> {
        solution.refresh_bases();
        solution.refresh_all_routes();

        let mut daily_volume = DailyUnloadVolumeTracker::from_problem(solution.problem());
        daily_volume.rebuild(solution)?;

        let mut allow_new_trips = true;
        let mut inserted = 0;

        for &job_id in jobs {
            if self.is_stopped.load(Ordering::Relaxed) {
                warn!(%job_id, "recreate pass cancelled");
                break;
            }

            if !solution.is_unassigned(job_id) {
                continue;
            }

            mark_required_routes(solution, &daily_volume, job_id)?;

            let Some(result) =
                self.best_insertion(solution, &daily_volume, job_id, &mut allow_new_trips)?
            else {
                debug!(%job_id, "no feasible insertion");
                continue;
            };

            self.commit(solution, &mut daily_volume, &result)?;
            self.listeners.job_inserted(solution, &result);
            inserted += 1;
        }

        let dropped = BasePlacementOptimizer::new(
            self.location_provider.as_ref(),
            self.service_time_provider.as_ref(),
        )
        .optimize(solution, &mut daily_volume)?;

        let unassigned = solution.unassigned_jobs().iter().copied().collect::<Vec<_>>();
        info!(
            inserted,
            dropped = dropped.len(),
            unassigned = unassigned.len(),
            trips = solution.trip_count(),
            "recreate pass done"
        );

        Ok(unassigned)
    }

    /// Forces a free base into a route at the first feasible gap.
    pub fn insert_base(
        &self,
        solution: &mut WorkingSolution,
        route_id: RouteIdx,
    ) -> Result<Option<InsertionResult>> {
        solution.refresh_bases();
        solution.refresh_route(route_id);

        let mut daily_volume = DailyUnloadVolumeTracker::from_problem(solution.problem());
        daily_volume.rebuild(solution)?;

        let base_id = solution
            .bases()
            .peek_free()
            .ok_or(MultiTripError::PoolExhausted)?;

        let result = {
            let context = self.insertion_context(solution, &daily_volume, true);
            let route = solution.route(route_id);
            BaseInsertionCalculator::new(&context).evaluate(
                route_id,
                base_id,
                route.vehicle_id(),
                route.departure_time(solution.problem()),
            )?
        };

        if let Some(result) = &result {
            self.commit(solution, &mut daily_volume, result)?;
        }

        Ok(result)
    }

    fn insertion_context<'a>(
        &'a self,
        solution: &'a WorkingSolution,
        daily_volume: &'a DailyUnloadVolumeTracker,
        allow_new_trips: bool,
    ) -> InsertionContext<'a> {
        InsertionContext {
            solution,
            daily_volume,
            constraints: &self.constraints,
            location_provider: self.location_provider.as_ref(),
            service_time_provider: self.service_time_provider.as_ref(),
            allow_new_trips,
        }
    }

    /// Lowest cost over all routes. Ties go to the lowest route index whatever
    /// the number of threads.
    fn best_insertion(
        &self,
        solution: &WorkingSolution,
        daily_volume: &DailyUnloadVolumeTracker,
        job_id: JobIdx,
        allow_new_trips: &mut bool,
    ) -> Result<Option<InsertionResult>> {
        let problem = solution.problem();
        let context = self.insertion_context(solution, daily_volume, *allow_new_trips);
        let calculator = DestinationInsertionCalculator::new(&context);

        let evaluate = |route_id: RouteIdx, best_known_cost: f64| {
            let route = solution.route(route_id);
            calculator.evaluate(
                route_id,
                job_id,
                route.vehicle_id(),
                route.departure_time(problem),
                best_known_cost,
            )
        };

        let mut best: Option<InsertionResult> = None;
        let mut pool_exhausted = false;

        match &self.thread_pool {
            Some(thread_pool) => {
                let route_ids = solution.route_ids().collect::<Vec<_>>();
                let outcomes = thread_pool.install(|| {
                    route_ids
                        .par_iter()
                        .map(|&route_id| evaluate(route_id, f64::INFINITY))
                        .collect::<Vec<_>>()
                });

                for outcome in outcomes {
                    keep_best(&mut best, &mut pool_exhausted, outcome)?;
                }
            }
            None => {
                for route_id in solution.route_ids() {
                    let best_known_cost = best.as_ref().map_or(f64::INFINITY, |b| b.cost);
                    keep_best(
                        &mut best,
                        &mut pool_exhausted,
                        evaluate(route_id, best_known_cost),
                    )?;
                }
            }
        }

        if pool_exhausted && *allow_new_trips {
            warn!(%job_id, "base pool exhausted, no new trips for the rest of the pass");
            *allow_new_trips = false;
        }

        Ok(best)
    }

    /// Applies the events of `result` in order. Every event is checked before the
    /// first one is applied, so a rejected result leaves the solution untouched.
    fn commit(
        &self,
        solution: &mut WorkingSolution,
        daily_volume: &mut DailyUnloadVolumeTracker,
        result: &InsertionResult,
    ) -> Result<()> {
        validate_events(solution, result)?;

        for event in &result.events {
            match *event {
                InsertionEvent::InsertActivity {
                    route_id,
                    position,
                    activity_id,
                } => solution.insert_activity(route_id, position, activity_id)?,
                InsertionEvent::AssignBase {
                    base_id,
                    location_id,
                    service_duration,
                } => solution.assign_base(base_id, location_id, service_duration),
                InsertionEvent::SwitchVehicle {
                    route_id,
                    vehicle_id,
                    departure_time,
                } => {
                    solution.switch_vehicle(route_id, vehicle_id, departure_time);
                    self.listeners.vehicle_switched(route_id, vehicle_id);
                }
            }
        }

        solution.refresh_route(result.route_id);

        if result.opens_trip() {
            return daily_volume.rebuild(solution);
        }

        let unload_location_id = solution
            .run_states()
            .unload_location(result.route_id, result.run_index);
        if let (Some(location_id), Some(job_id)) = (unload_location_id, result.inserted_job()) {
            daily_volume.add_volume(location_id, solution.problem().destination(job_id).demand())?;
        }

        Ok(())
    }
}

fn keep_best(
    best: &mut Option<InsertionResult>,
    pool_exhausted: &mut bool,
    outcome: Result<Option<InsertionResult>>,
) -> Result<()> {
    match outcome {
        Ok(Some(result)) => {
            if best.as_ref().is_none_or(|current| result.cost < current.cost) {
                *best = Some(result);
            }
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(MultiTripError::PoolExhausted) => {
            *pool_exhausted = true;
            Ok(())
        }
        Err(error) => Err(error),
    }
}

fn validate_events(solution: &WorkingSolution, result: &InsertionResult) -> Result<()> {
    let mut inserted = 0;

    for event in &result.events {
        let InsertionEvent::InsertActivity {
            route_id,
            position,
            activity_id,
        } = *event
        else {
            continue;
        };

        if position > solution.route(route_id).len() + inserted {
            return Err(MultiTripError::InconsistentState(format!(
                "position {position} is out of bounds for route {route_id}"
            )));
        }

        let available = match activity_id {
            ActivityId::Destination(job_id) => solution.is_unassigned(job_id),
            ActivityId::Base(base_id) => solution.bases().is_free(base_id),
        };
        if !available {
            return Err(MultiTripError::InconsistentState(format!(
                "{activity_id} is already part of a route"
            )));
        }

        inserted += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use crate::{
        problem::{
            base::BaseIdx, capacity::Capacity, location::LocationIdx, vehicle::VehicleIdx,
        },
        solver::{
            bases::nearest_location_provider::NearestBaseLocationProvider,
            recreate::{recreate_params::Threads, sort_strategy::BestInsertionSortStrategy},
        },
        test_utils::{TestProblemBuilder, TestStop, create_location_grid, create_test_working_solution},
    };

    use super::*;

    fn create_strategy(problem: &VehicleRoutingProblem) -> InsertionStrategy {
        InsertionStrategy::new(problem, RecreateParams::default()).unwrap()
    }

    fn unload_volume(solution: &WorkingSolution, location_id: usize) -> Capacity {
        let mut daily_volume = DailyUnloadVolumeTracker::from_problem(solution.problem());
        daily_volume.rebuild(solution).unwrap();
        daily_volume
            .volume(LocationIdx::new(location_id))
            .unwrap()
            .clone()
    }

    #[test]
    fn test_base_between_full_trips() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(1, 10))
                .destinations(vec![(1, 10.0), (2, 10.0)])
                .unload_sites(vec![9])
                .vehicle_capacity(10.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));

        let unassigned = create_strategy(&problem).recreate(&mut solution).unwrap();

        assert!(unassigned.is_empty());
        assert_eq!(
            solution.route(RouteIdx::new(0)).activity_ids(),
            &[
                ActivityId::Destination(JobIdx::new(0)),
                ActivityId::Base(BaseIdx::new(0)),
                ActivityId::Destination(JobIdx::new(1)),
                ActivityId::Base(BaseIdx::new(1)),
            ]
        );
    }

    #[test]
    fn test_unit_destinations_fill_two_trips() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(5, 5))
                .destinations((1..24).map(|location| (location, 1.0)).collect())
                .unload_sites(vec![24])
                .vehicle_capacity(15.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));

        let unassigned = create_strategy(&problem).recreate(&mut solution).unwrap();

        let route_id = RouteIdx::new(0);
        assert!(unassigned.is_empty());
        assert_eq!(solution.route(route_id).len(), 25);
        assert_eq!(solution.trip_count(), 2);
        assert_eq!(
            solution.run_states().run_load(route_id, 0),
            Some(&Capacity::from_vec(vec![15.0]))
        );
        assert_eq!(
            solution.run_states().run_load(route_id, 1),
            Some(&Capacity::from_vec(vec![8.0]))
        );
    }

    #[test]
    fn test_first_trip_capacity_limits_first_trip() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(1, 10))
                .destinations(vec![(1, 4.0), (2, 4.0), (3, 4.0)])
                .unload_sites(vec![9])
                .vehicle_capacity(10.0)
                .first_trip_capacity(5.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));

        let unassigned = create_strategy(&problem).recreate(&mut solution).unwrap();

        let route_id = RouteIdx::new(0);
        let run_states = solution.run_states();
        assert!(unassigned.is_empty());
        assert_eq!(solution.trip_count(), 2);
        assert_eq!(
            run_states.run_load(route_id, 0),
            Some(&Capacity::from_vec(vec![4.0]))
        );
        assert_eq!(
            run_states.run_load(route_id, 1),
            Some(&Capacity::from_vec(vec![8.0]))
        );
    }

    #[test]
    fn test_nearest_provider_spreads_trips() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(1, 10))
                .destinations(vec![(1, 10.0), (2, 10.0)])
                .unload_sites(vec![3, 9])
                .vehicle_capacity(10.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));
        let strategy = create_strategy(&problem)
            .with_location_provider(NearestBaseLocationProvider::from_problem(&problem, 1, Some(1)));

        let unassigned = strategy.recreate(&mut solution).unwrap();

        let route_id = RouteIdx::new(0);
        assert!(unassigned.is_empty());
        assert_eq!(solution.trip_count(), 2);
        assert_eq!(
            solution.run_states().unload_location(route_id, 0),
            Some(LocationIdx::new(3))
        );
        assert_eq!(
            solution.run_states().unload_location(route_id, 1),
            Some(LocationIdx::new(9))
        );
        assert_eq!(unload_volume(&solution, 3), Capacity::from_vec(vec![10.0]));
        assert_eq!(unload_volume(&solution, 9), Capacity::from_vec(vec![10.0]));
    }

    #[test]
    fn test_daily_cap_moves_excess_to_other_location() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(1, 10))
                .destinations(vec![(1, 6.0), (2, 6.0), (3, 6.0)])
                .capped_unload_sites(vec![(8, 10.0)])
                .unload_sites(vec![9])
                .vehicle_capacity(10.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));

        let unassigned = create_strategy(&problem).recreate(&mut solution).unwrap();

        assert!(unassigned.is_empty());
        assert_eq!(solution.trip_count(), 3);
        assert!(unload_volume(&solution, 8).is_less_or_equal(&Capacity::from_vec(vec![10.0])));
        assert_eq!(unload_volume(&solution, 9), Capacity::from_vec(vec![12.0]));
    }

    #[test]
    fn test_daily_cap_leaves_excess_unassigned() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(1, 10))
                .destinations(vec![(1, 6.0), (2, 6.0), (3, 6.0)])
                .capped_unload_sites(vec![(9, 10.0)])
                .vehicle_capacity(10.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));

        let unassigned = create_strategy(&problem).recreate(&mut solution).unwrap();

        assert_eq!(unassigned, vec![JobIdx::new(1), JobIdx::new(2)]);
        assert_eq!(unload_volume(&solution, 9), Capacity::from_vec(vec![6.0]));
    }

    #[test]
    fn test_same_seed_same_routes() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(4, 4))
                .destinations((1..15).map(|location| (location, 2.0)).collect())
                .unload_sites(vec![15])
                .vehicle_capacity(6.0)
                .vehicle_count(3)
                .build(),
        );

        let solve = |threads| {
            let params = RecreateParams {
                sort_strategy: BestInsertionSortStrategy::Random,
                seed: 7,
                insertion_threads: threads,
                ..RecreateParams::default()
            };
            let mut solution = WorkingSolution::new(Arc::clone(&problem));
            InsertionStrategy::new(&problem, params)
                .unwrap()
                .recreate(&mut solution)
                .unwrap();
            solution
        };

        let single = solve(Threads::Single);
        assert!(single.is_identical(&solve(Threads::Single)));
        assert!(single.is_identical(&solve(Threads::Multi(3))));
        assert!(!single.has_unassigned());
    }

    #[test]
    fn test_stop_leaves_jobs_unassigned() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(1, 10))
                .destinations(vec![(1, 1.0), (2, 1.0)])
                .unload_sites(vec![9])
                .vehicle_capacity(10.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));
        let strategy = create_strategy(&problem);
        strategy.stop();

        let unassigned = strategy.recreate(&mut solution).unwrap();

        assert_eq!(unassigned, vec![JobIdx::new(0), JobIdx::new(1)]);
        assert!(solution.route(RouteIdx::new(0)).is_empty());
    }

    #[derive(Default)]
    struct CountingListener {
        inserted: Vec<JobIdx>,
        switched: usize,
    }

    impl InsertionListener for CountingListener {
        fn job_inserted(&mut self, _solution: &WorkingSolution, result: &InsertionResult) {
            self.inserted.extend(result.inserted_job());
        }

        fn vehicle_switched(&mut self, _route_id: RouteIdx, _vehicle_id: VehicleIdx) {
            self.switched += 1;
        }
    }

    #[test]
    fn test_listeners_see_every_insertion() {
        let problem = Arc::new(
            TestProblemBuilder::new(create_location_grid(1, 10))
                .destinations(vec![(1, 4.0), (2, 4.0), (3, 4.0)])
                .unload_sites(vec![9])
                .vehicle_capacity(10.0)
                .build(),
        );
        let mut solution = WorkingSolution::new(Arc::clone(&problem));
        let listener = Arc::new(Mutex::new(CountingListener::default()));
        let mut strategy = create_strategy(&problem);
        strategy.add_listener(Arc::clone(&listener));

        strategy.recreate(&mut solution).unwrap();

        let listener = listener.lock();
        assert_eq!(
            listener.inserted,
            vec![JobIdx::new(0), JobIdx::new(1), JobIdx::new(2)]
        );
        assert_eq!(listener.switched, 0);
    }

    #[test]
    fn test_insert_base_closes_open_trip() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(1, 3.0), (2, 3.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();
        let mut solution = create_test_working_solution(
            Arc::new(problem),
            vec![vec![TestStop::D(0), TestStop::D(1)]],
        );
        let strategy = create_strategy(solution.problem());

        let result = strategy
            .insert_base(&mut solution, RouteIdx::new(0))
            .unwrap()
            .unwrap();

        assert_eq!(result.position, 1);
        assert_eq!(
            solution.route(RouteIdx::new(0)).activity(1),
            ActivityId::Base(BaseIdx::new(0))
        );
        assert_eq!(
            solution.run_states().unload_location(RouteIdx::new(0), 0),
            Some(LocationIdx::new(9))
        );
    }

    #[test]
    fn test_commit_rejects_stale_result() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(1, 3.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();
        let mut solution = create_test_working_solution(Arc::new(problem), vec![vec![]]);
        let strategy = create_strategy(solution.problem());
        let mut daily_volume = DailyUnloadVolumeTracker::from_problem(solution.problem());

        let result = {
            let context = strategy.insertion_context(&solution, &daily_volume, true);
            DestinationInsertionCalculator::new(&context)
                .evaluate(
                    RouteIdx::new(0),
                    JobIdx::new(0),
                    solution.route(RouteIdx::new(0)).vehicle_id(),
                    solution.route(RouteIdx::new(0)).departure_time(solution.problem()),
                    f64::INFINITY,
                )
                .unwrap()
                .unwrap()
        };

        strategy
            .commit(&mut solution, &mut daily_volume, &result)
            .unwrap();
        let committed = solution.clone();

        assert!(matches!(
            strategy.commit(&mut solution, &mut daily_volume, &result),
            Err(MultiTripError::InconsistentState(_))
        ));
        assert!(solution.is_identical(&committed));
        assert_eq!(
            daily_volume.volume(LocationIdx::new(9)).unwrap(),
            &Capacity::from_vec(vec![3.0])
        );
    }
}
