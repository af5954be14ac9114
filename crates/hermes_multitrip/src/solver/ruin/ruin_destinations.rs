use std::{collections::BTreeSet, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, instrument};

use crate::{
    problem::job::JobIdx,
    solver::{
        recreate::listeners::{RuinListener, RuinListeners},
        solution::working_solution::WorkingSolution,
    },
};

/// Removes destinations from their routes and repairs the trips left behind.
///
/// A base that ends up opening a route or following another base closes an
/// empty trip. It goes back to the pool and the trips after it are renumbered.
#[derive(Default)]
pub struct DestinationRuin {
    listeners: RuinListeners,
}

impl DestinationRuin {
    pub fn add_listener<L>(&mut self, listener: Arc<Mutex<L>>)
    where
        L: RuinListener + Send + Sync + 'static,
    {
        self.listeners.add(listener);
    }

    /// Returns the jobs actually removed. Jobs that were already unassigned
    /// are skipped.
    #[instrument(skip_all, fields(jobs = jobs.len()))]
    pub fn ruin(&self, solution: &mut WorkingSolution, jobs: &[JobIdx]) -> Vec<JobIdx> {
        self.listeners.ruin_started(solution, jobs);

        let mut removed = Vec::with_capacity(jobs.len());
        let mut touched_routes = BTreeSet::new();

        for &job_id in jobs {
            if let Some(route_id) = solution.remove_destination(job_id) {
                touched_routes.insert(route_id);
                removed.push(job_id);
            }
        }

        for route_id in touched_routes {
            let removed_bases = solution.clear_double_bases(route_id);
            if removed_bases > 0 {
                debug!(%route_id, removed_bases, "released bases of empty trips");
            }
            solution.refresh_route(route_id);
        }

        self.listeners.ruin_ended(solution, &removed);
        removed
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        problem::{base::BaseIdx, capacity::Capacity, job::ActivityId},
        solver::solution::route_id::RouteIdx,
        test_utils::{TestProblemBuilder, TestStop, create_location_grid, create_test_working_solution},
    };

    use super::*;

    fn create_solution() -> WorkingSolution {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(1, 4.0), (2, 5.0), (3, 6.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();

        create_test_working_solution(
            Arc::new(problem),
            vec![vec![
                TestStop::D(0),
                TestStop::B(0, 9),
                TestStop::D(1),
                TestStop::B(1, 9),
                TestStop::D(2),
                TestStop::B(2, 9),
            ]],
        )
    }

    #[test]
    fn test_ruin_renumbers_trips() {
        let mut solution = create_solution();
        let route_id = RouteIdx::new(0);

        let removed = DestinationRuin::default().ruin(&mut solution, &[JobIdx::new(1)]);

        assert_eq!(removed, vec![JobIdx::new(1)]);
        assert!(solution.is_unassigned(JobIdx::new(1)));
        assert!(solution.bases().is_free(BaseIdx::new(1)));
        assert_eq!(
            solution.route(route_id).activity_ids(),
            &[
                ActivityId::Destination(JobIdx::new(0)),
                ActivityId::Base(BaseIdx::new(0)),
                ActivityId::Destination(JobIdx::new(2)),
                ActivityId::Base(BaseIdx::new(2)),
            ]
        );

        let run_states = solution.run_states();
        assert_eq!(run_states.run_count(route_id), Some(2));
        assert_eq!(
            run_states.run_load(route_id, 1),
            Some(&Capacity::from_vec(vec![6.0]))
        );
    }

    #[test]
    fn test_ruin_first_trip_drops_leading_base() {
        let mut solution = create_solution();
        let route_id = RouteIdx::new(0);

        DestinationRuin::default().ruin(&mut solution, &[JobIdx::new(0), JobIdx::new(0)]);

        assert_eq!(solution.route(route_id).activity(0), ActivityId::Destination(JobIdx::new(1)));
        assert_eq!(solution.run_states().run_count(route_id), Some(2));
        assert_eq!(
            solution.run_states().run_load(route_id, 0),
            Some(&Capacity::from_vec(vec![5.0]))
        );
    }

    #[derive(Default)]
    struct RecordingListener {
        started: Vec<JobIdx>,
        ended: Vec<JobIdx>,
    }

    impl RuinListener for RecordingListener {
        fn ruin_started(&mut self, _solution: &WorkingSolution, jobs: &[JobIdx]) {
            self.started.extend_from_slice(jobs);
        }

        fn ruin_ended(&mut self, _solution: &WorkingSolution, removed: &[JobIdx]) {
            self.ended.extend_from_slice(removed);
        }
    }

    #[test]
    fn test_ruin_notifies_listeners() {
        let mut solution = create_solution();
        solution.remove_destination(JobIdx::new(2));

        let listener = Arc::new(Mutex::new(RecordingListener::default()));
        let mut ruin = DestinationRuin::default();
        ruin.add_listener(Arc::clone(&listener));

        ruin.ruin(&mut solution, &[JobIdx::new(0), JobIdx::new(2)]);

        let listener = listener.lock();
        assert_eq!(listener.started, vec![JobIdx::new(0), JobIdx::new(2)]);
        assert_eq!(listener.ended, vec![JobIdx::new(0)]);
    }
}
