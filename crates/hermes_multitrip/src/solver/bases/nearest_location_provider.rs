use rstar::{RTree, primitives::GeomWithData};

use crate::problem::{location::LocationIdx, vehicle_routing_problem::VehicleRoutingProblem};

use super::location_provider::{BaseLocationProvider, LocationQuery};

type IndexedLocation = GeomWithData<[f64; 2], LocationIdx>;

/// Offers the `k` unload locations closest to the stop before the base.
///
/// Locations already used by `max_trips_per_location` trips of the route are
/// skipped. If nothing survives the filter every location is offered.
pub struct NearestBaseLocationProvider {
    tree: RTree<IndexedLocation>,
    points: Vec<[f64; 2]>,
    locations: Vec<LocationIdx>,
    k: usize,
    max_trips_per_location: Option<usize>,
}

impl NearestBaseLocationProvider {
    pub fn new(
        problem: &VehicleRoutingProblem,
        locations: Vec<LocationIdx>,
        k: usize,
        max_trips_per_location: Option<usize>,
    ) -> Self {
        let points = problem
            .locations()
            .iter()
            .map(<[f64; 2]>::from)
            .collect::<Vec<_>>();

        let tree = RTree::bulk_load(
            locations
                .iter()
                .map(|&location_id| IndexedLocation::new(points[location_id.get()], location_id))
                .collect(),
        );

        NearestBaseLocationProvider {
            tree,
            points,
            locations,
            k,
            max_trips_per_location,
        }
    }

    pub fn from_problem(
        problem: &VehicleRoutingProblem,
        k: usize,
        max_trips_per_location: Option<usize>,
    ) -> Self {
        Self::new(
            problem,
            problem.unload_location_ids(),
            k,
            max_trips_per_location,
        )
    }

    fn is_saturated(&self, query: &LocationQuery, location_id: LocationIdx) -> bool {
        self.max_trips_per_location
            .is_some_and(|max| query.assigned_count(location_id) >= max)
    }
}

impl BaseLocationProvider for NearestBaseLocationProvider {
    fn available_locations(&self, query: &LocationQuery) -> Vec<LocationIdx> {
        let Some(previous_location_id) = query.previous_location_id else {
            return self.locations.clone();
        };

        let candidates = self
            .tree
            .nearest_neighbor_iter(&self.points[previous_location_id.get()])
            .map(|indexed| indexed.data)
            .filter(|&location_id| !self.is_saturated(query, location_id))
            .take(self.k)
            .collect::<Vec<_>>();

        if candidates.is_empty() {
            self.locations.clone()
        } else {
            candidates
        }
    }

    fn all_locations(&self) -> &[LocationIdx] {
        &self.locations
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        solver::bases::location_provider::LocationAssignment,
        test_utils::{TestProblemBuilder, create_location_grid},
    };

    use super::*;

    #[test]
    fn test_returns_k_nearest_to_previous_stop() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(4, 1.0)])
            .unload_sites(vec![1, 5, 9])
            .vehicle_capacity(10.0)
            .build();
        let provider = NearestBaseLocationProvider::from_problem(&problem, 2, None);
        let vehicle = &problem.vehicles()[0];

        let query = LocationQuery {
            vehicle,
            is_last_trip: true,
            trip_index: 0,
            fill_percent: 50.0,
            assigned_locations: &[],
            previous_location_id: Some(LocationIdx::new(8)),
            next_location_id: None,
        };

        assert_eq!(
            provider.available_locations(&query),
            vec![LocationIdx::new(9), LocationIdx::new(5)]
        );
    }

    #[test]
    fn test_skips_saturated_locations_and_falls_back() {
        let problem = TestProblemBuilder::new(create_location_grid(1, 10))
            .destinations(vec![(4, 1.0)])
            .unload_sites(vec![5, 9])
            .vehicle_capacity(10.0)
            .build();
        let provider = NearestBaseLocationProvider::from_problem(&problem, 1, Some(1));
        let vehicle = &problem.vehicles()[0];

        let assigned = [LocationAssignment {
            location_id: LocationIdx::new(5),
            count: 1,
        }];
        let mut query = LocationQuery {
            vehicle,
            is_last_trip: false,
            trip_index: 1,
            fill_percent: 100.0,
            assigned_locations: &assigned,
            previous_location_id: Some(LocationIdx::new(4)),
            next_location_id: None,
        };
        assert_eq!(
            provider.available_locations(&query),
            vec![LocationIdx::new(9)]
        );

        let saturated = [
            LocationAssignment {
                location_id: LocationIdx::new(5),
                count: 1,
            },
            LocationAssignment {
                location_id: LocationIdx::new(9),
                count: 2,
            },
        ];
        query.assigned_locations = &saturated;
        assert_eq!(provider.available_locations(&query), provider.all_locations());
    }
}
