use std::sync::Arc;

use jiff::SignedDuration;

use crate::{
    problem::{
        base::BaseIdx,
        capacity::Capacity,
        destination::{Destination, DestinationBuilder},
        job::{ActivityId, JobIdx},
        location::{Location, LocationIdx},
        time_window::TimeWindow,
        travel_cost_matrix::TravelMatrices,
        unload_site::UnloadSite,
        vehicle::{Vehicle, VehicleBuilder},
        vehicle_profile::VehicleProfile,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::solution::{route_id::RouteIdx, working_solution::WorkingSolution},
};

pub fn create_location_grid(rows: usize, cols: usize) -> Vec<Location> {
    let mut locations = Vec::new();

    for y in 0..rows {
        for x in 0..cols {
            let location = Location::from_cartesian(x as f64, y as f64);
            locations.push(location);
        }
    }

    locations
}

pub fn create_locations(locations: Vec<(f64, f64)>) -> Vec<Location> {
    locations
        .iter()
        .map(|&(x, y)| Location::from_cartesian(x, y))
        .collect()
}

/// One destination per `(location, demand)` pair, single dimension demand.
pub fn create_basic_destinations(destinations: Vec<(usize, f64)>) -> Vec<Destination> {
    destinations
        .iter()
        .enumerate()
        .map(|(index, &(location_id, demand))| {
            let mut builder = DestinationBuilder::default();

            builder
                .set_location_id(location_id)
                .set_external_id(index.to_string())
                .set_demand(Capacity::from_vec(vec![demand]));
            builder.build().unwrap()
        })
        .collect()
}

pub fn create_basic_vehicles(location_ids: Vec<usize>, capacity: f64) -> Vec<Vehicle> {
    location_ids
        .iter()
        .enumerate()
        .map(|(index, &location_id)| {
            let mut builder = VehicleBuilder::default();
            builder
                .set_depot_location_id(location_id)
                .set_vehicle_id(index.to_string())
                .set_profile_id(0)
                .set_capacity(Capacity::from_vec(vec![capacity]));
            builder.build().unwrap()
        })
        .collect()
}

/// Problem on euclidean travel times, every vehicle leaves from location 0
/// and does not return.
pub struct TestProblemBuilder {
    locations: Vec<Location>,
    destinations: Vec<(usize, f64)>,
    time_windows: Vec<(usize, TimeWindow)>,
    unload_sites: Vec<UnloadSite>,
    vehicle_capacity: f64,
    first_trip_capacity: Option<f64>,
    vehicle_count: usize,
}

impl TestProblemBuilder {
    pub fn new(locations: Vec<Location>) -> Self {
        TestProblemBuilder {
            locations,
            destinations: Vec::new(),
            time_windows: Vec::new(),
            unload_sites: Vec::new(),
            vehicle_capacity: 0.0,
            first_trip_capacity: None,
            vehicle_count: 1,
        }
    }

    pub fn destinations(mut self, destinations: Vec<(usize, f64)>) -> Self {
        self.destinations = destinations;
        self
    }

    /// Time windows keyed by destination index.
    pub fn time_windows(mut self, time_windows: Vec<(usize, TimeWindow)>) -> Self {
        self.time_windows = time_windows;
        self
    }

    pub fn unload_sites(mut self, location_ids: Vec<usize>) -> Self {
        self.unload_sites.extend(
            location_ids
                .into_iter()
                .map(|location_id| UnloadSite::new(LocationIdx::new(location_id), None)),
        );
        self
    }

    pub fn capped_unload_sites(mut self, sites: Vec<(usize, f64)>) -> Self {
        self.unload_sites
            .extend(sites.into_iter().map(|(location_id, daily_capacity)| {
                UnloadSite::new(
                    LocationIdx::new(location_id),
                    Some(Capacity::from_vec(vec![daily_capacity])),
                )
            }));
        self
    }

    pub fn vehicle_capacity(mut self, capacity: f64) -> Self {
        self.vehicle_capacity = capacity;
        self
    }

    pub fn first_trip_capacity(mut self, capacity: f64) -> Self {
        self.first_trip_capacity = Some(capacity);
        self
    }

    pub fn vehicle_count(mut self, count: usize) -> Self {
        self.vehicle_count = count;
        self
    }

    pub fn build(self) -> VehicleRoutingProblem {
        let destinations = self
            .destinations
            .iter()
            .enumerate()
            .map(|(index, &(location_id, demand))| {
                let mut builder = DestinationBuilder::default();
                builder
                    .set_location_id(location_id)
                    .set_external_id(index.to_string())
                    .set_demand(Capacity::from_vec(vec![demand]));

                if let Some((_, time_window)) =
                    self.time_windows.iter().find(|(job, _)| *job == index)
                {
                    builder.set_time_window(time_window.clone());
                }

                builder.build().unwrap()
            })
            .collect();

        let vehicles = (0..self.vehicle_count)
            .map(|index| {
                let mut builder = VehicleBuilder::default();
                builder
                    .set_depot_location_id(0)
                    .set_vehicle_id(index.to_string())
                    .set_profile_id(0)
                    .set_return(false)
                    .set_capacity(Capacity::from_vec(vec![self.vehicle_capacity]));

                if let Some(first_trip_capacity) = self.first_trip_capacity {
                    builder.set_first_trip_capacity(Capacity::from_vec(vec![first_trip_capacity]));
                }

                builder.build().unwrap()
            })
            .collect();

        let mut builder = VehicleRoutingProblemBuilder::default();
        builder
            .add_vehicle_profile(VehicleProfile::new(
                "test_profile".to_owned(),
                TravelMatrices::from_euclidean(&self.locations, false),
            ))
            .set_destinations(destinations)
            .set_vehicles(vehicles)
            .set_unload_sites(self.unload_sites)
            .set_locations(self.locations);

        builder.build().unwrap()
    }
}

/// A stop of a test route: a destination index, or a base index with the
/// location it unloads at.
#[derive(Debug, Clone, Copy)]
pub enum TestStop {
    D(usize),
    B(usize, usize),
}

/// Builds route `i` for vehicle `i` from the given stops. Bases unload with a
/// zero service duration.
pub fn create_test_working_solution(
    problem: Arc<VehicleRoutingProblem>,
    routes: Vec<Vec<TestStop>>,
) -> WorkingSolution {
    let mut solution = WorkingSolution::new(problem);

    for (route_id, stops) in routes.iter().enumerate() {
        let route_id = RouteIdx::new(route_id);
        for (position, stop) in stops.iter().enumerate() {
            match *stop {
                TestStop::D(job_id) => solution
                    .insert_activity(
                        route_id,
                        position,
                        ActivityId::Destination(JobIdx::new(job_id)),
                    )
                    .unwrap(),
                TestStop::B(base_id, location_id) => {
                    let base_id = BaseIdx::new(base_id);
                    solution
                        .insert_activity(route_id, position, ActivityId::Base(base_id))
                        .unwrap();
                    solution.assign_base(
                        base_id,
                        LocationIdx::new(location_id),
                        SignedDuration::ZERO,
                    );
                }
            }
        }
    }

    solution.refresh_all_routes();
    solution
}
