use std::fmt::Display;

use jiff::Timestamp;
use rand::{rngs::SmallRng, seq::SliceRandom};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::problem::{job::JobIdx, vehicle_routing_problem::VehicleRoutingProblem};

/// Order in which a recreate pass visits the unassigned jobs.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BestInsertionSortStrategy {
    #[default]
    AsGiven,
    Random,
    Demand,
    Far,
    Close,
    TimeWindow,
}

impl Display for BestInsertionSortStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AsGiven => write!(f, "AsGiven"),
            Self::Random => write!(f, "Random"),
            Self::Demand => write!(f, "Demand"),
            Self::Far => write!(f, "Far"),
            Self::Close => write!(f, "Close"),
            Self::TimeWindow => write!(f, "TimeWindow"),
        }
    }
}

impl BestInsertionSortStrategy {
    /// Sorts are stable so that equal keys keep their job order.
    pub fn sort_unassigned_jobs(
        &self,
        problem: &VehicleRoutingProblem,
        unassigned_jobs: &mut [JobIdx],
        rng: &mut SmallRng,
    ) {
        match self {
            BestInsertionSortStrategy::AsGiven => {}
            BestInsertionSortStrategy::Random => {
                unassigned_jobs.shuffle(rng);
            }
            BestInsertionSortStrategy::Demand => unassigned_jobs.sort_by(|a, b| {
                // Only the first dimension, good enough for ordering.
                let first_demand_a = problem.destination(*a).demand().get(0);
                let first_demand_b = problem.destination(*b).demand().get(0);

                first_demand_a.total_cmp(&first_demand_b)
            }),
            BestInsertionSortStrategy::Far => {
                unassigned_jobs.sort_by_key(|&job_id| {
                    let location_id = problem.destination(job_id).location_id();
                    -problem.average_cost_from_depot(location_id).round() as i64
                });
            }
            BestInsertionSortStrategy::Close => {
                unassigned_jobs.sort_by_key(|&job_id| {
                    let location_id = problem.destination(job_id).location_id();
                    problem.average_cost_from_depot(location_id).round() as i64
                });
            }
            BestInsertionSortStrategy::TimeWindow => {
                unassigned_jobs.sort_by_key(|&job_id| {
                    problem
                        .destination(job_id)
                        .time_window()
                        .end()
                        .unwrap_or(Timestamp::MAX)
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use crate::test_utils::{TestProblemBuilder, create_location_grid};

    use super::*;

    fn jobs(ids: &[usize]) -> Vec<JobIdx> {
        ids.iter().copied().map(JobIdx::new).collect()
    }

    #[test]
    fn test_sort_by_demand_and_distance() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(5, 3.0), (1, 1.0), (8, 2.0)])
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();
        let mut rng = SmallRng::seed_from_u64(1);

        let mut unassigned = jobs(&[0, 1, 2]);
        BestInsertionSortStrategy::Demand.sort_unassigned_jobs(&problem, &mut unassigned, &mut rng);
        assert_eq!(unassigned, jobs(&[1, 2, 0]));

        BestInsertionSortStrategy::Far.sort_unassigned_jobs(&problem, &mut unassigned, &mut rng);
        assert_eq!(unassigned, jobs(&[2, 0, 1]));

        BestInsertionSortStrategy::Close.sort_unassigned_jobs(&problem, &mut unassigned, &mut rng);
        assert_eq!(unassigned, jobs(&[1, 0, 2]));

        BestInsertionSortStrategy::AsGiven.sort_unassigned_jobs(&problem, &mut unassigned, &mut rng);
        assert_eq!(unassigned, jobs(&[1, 0, 2]));
    }

    #[test]
    fn test_random_is_seeded() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations((1..9).map(|location| (location, 1.0)).collect())
            .unload_sites(vec![9])
            .vehicle_capacity(10.0)
            .build();

        let shuffle = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut unassigned = jobs(&[0, 1, 2, 3, 4, 5, 6, 7]);
            BestInsertionSortStrategy::Random.sort_unassigned_jobs(
                &problem,
                &mut unassigned,
                &mut rng,
            );
            unassigned
        };

        assert_eq!(shuffle(42), shuffle(42));
    }
}
