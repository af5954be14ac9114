use std::sync::Arc;

use jiff::SignedDuration;

use crate::problem::location::LocationIdx;

use super::location::Location;

pub type Distance = f64;
pub type Time = f64;
pub type Cost = f64;

/// Flat distance, time and cost matrices.
/// The entry for a pair of locations lives at `from * num_locations + to`.
pub struct TravelMatrices {
    distances: Arc<Vec<Distance>>,
    times: Arc<Vec<Time>>,
    costs: Arc<Vec<Cost>>,
    num_locations: usize,
}

impl TravelMatrices {
    pub fn new(
        distances: Vec<Vec<Distance>>,
        times: Vec<Vec<Time>>,
        costs: Option<Vec<Vec<Cost>>>,
    ) -> Self {
        let num_locations = distances.len();
        let distances = Arc::new(distances.into_iter().flatten().collect::<Vec<_>>());
        let times = Arc::new(times.into_iter().flatten().collect::<Vec<_>>());
        let costs = match costs {
            Some(costs) => Arc::new(costs.into_iter().flatten().collect()),
            None => Arc::clone(&distances),
        };

        TravelMatrices {
            distances,
            times,
            costs,
            num_locations,
        }
    }

    /// Euclidean matrices where distance, time (in seconds) and cost share one value.
    pub fn from_euclidean(locations: &[Location], round: bool) -> Self {
        let num_locations = locations.len();
        let mut distances: Vec<Distance> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                let distance = from.euclidean_distance(to);
                distances[i * num_locations + j] = if round { distance.round() } else { distance };
            }
        }

        let distances = Arc::new(distances);

        TravelMatrices {
            times: Arc::clone(&distances),
            costs: Arc::clone(&distances),
            distances,
            num_locations,
        }
    }

    #[cfg(test)]
    pub fn from_constant(num_locations: usize, time: f64, distance: f64, cost: f64) -> Self {
        let size = num_locations * num_locations;
        TravelMatrices {
            distances: Arc::new(vec![distance; size]),
            times: Arc::new(vec![time; size]),
            costs: Arc::new(vec![cost; size]),
            num_locations,
        }
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        if from == to {
            return 0.0;
        }

        self.distances[self.index(from, to)]
    }

    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        if from == to {
            return SignedDuration::ZERO;
        }

        SignedDuration::from_secs_f64(self.times[self.index(from, to)])
    }

    #[inline(always)]
    pub fn travel_cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        if from == to {
            return 0.0;
        }

        self.costs[self.index(from, to)]
    }

    pub fn max_cost(&self) -> Cost {
        self.costs.iter().copied().fold(0.0, f64::max)
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}
