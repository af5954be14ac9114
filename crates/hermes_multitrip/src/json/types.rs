use anyhow::{Context, bail};
use jiff::{SignedDuration, Timestamp};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    problem::{
        capacity::Capacity,
        destination::{Destination, DestinationBuilder},
        job::ActivityId,
        location::{Location, LocationIdx},
        time_window::TimeWindow,
        travel_cost_matrix::TravelMatrices,
        unload_site::UnloadSite,
        vehicle::{VehicleBuilder, VehicleShift},
        vehicle_profile::VehicleProfile,
        vehicle_routing_problem::{VehicleRoutingProblem, VehicleRoutingProblemBuilder},
    },
    solver::{
        recreate::recreate_params::RecreateParams,
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

pub trait FromProblem<T> {
    fn from_problem(value: T, problem: &VehicleRoutingProblem) -> Self;
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "MultiTripProblem")]
pub struct JsonMultiTripProblem {
    pub id: Option<String>,
    pub locations: Vec<JsonLocation>,
    pub destinations: Vec<JsonDestination>,
    pub vehicle_profiles: Vec<JsonVehicleProfile>,
    pub vehicles: Vec<JsonVehicle>,
    pub unload_sites: Vec<JsonUnloadSite>,

    /// Recreate parameters, command line flags take precedence
    pub params: Option<RecreateParams>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Location")]
pub struct JsonLocation {
    pub coordinates: [f64; 2],
}

impl FromProblem<&Location> for JsonLocation {
    fn from_problem(value: &Location, _problem: &VehicleRoutingProblem) -> Self {
        JsonLocation {
            coordinates: [value.x(), value.y()],
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Destination")]
pub struct JsonDestination {
    pub id: String,
    pub location_id: usize,
    pub demand: Option<Vec<f64>>,
    pub duration: Option<SignedDuration>,
    pub time_window: Option<TimeWindow>,
}

impl FromProblem<&Destination> for JsonDestination {
    fn from_problem(value: &Destination, _problem: &VehicleRoutingProblem) -> Self {
        JsonDestination {
            id: value.external_id().to_owned(),
            location_id: value.location_id().get(),
            demand: Some(value.demand().iter().collect()),
            duration: value.duration().into(),
            time_window: value
                .has_time_window()
                .then(|| value.time_window().clone()),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "VehicleProfile")]
pub struct JsonVehicleProfile {
    pub id: String,
    pub matrices: JsonTravelMatrices,
}

/// Travel matrices of a profile. Times are in seconds.
#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case", rename = "TravelMatrices")]
pub enum JsonTravelMatrices {
    /// Euclidean distance between coordinates, used as distance, time and cost
    Euclidean {
        #[serde(default)]
        round: bool,
    },
    Explicit {
        distances: Vec<Vec<f64>>,
        times: Vec<Vec<f64>>,
        costs: Option<Vec<Vec<f64>>>,
    },
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Vehicle")]
pub struct JsonVehicle {
    pub id: String,
    pub profile: String,
    pub shift: Option<JsonVehicleShift>,
    pub capacity: Option<Vec<f64>>,
    pub first_trip_capacity: Option<Vec<f64>>,
    pub depot_location_id: Option<usize>,
    pub should_return_to_depot: Option<bool>,
    pub unload_duration: Option<SignedDuration>,
    pub maximum_destinations: Option<usize>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "VehicleShift")]
pub struct JsonVehicleShift {
    pub earliest_start: Option<Timestamp>,
    pub latest_end: Option<Timestamp>,
}

impl From<&VehicleShift> for JsonVehicleShift {
    fn from(value: &VehicleShift) -> Self {
        JsonVehicleShift {
            earliest_start: value.earliest_start(),
            latest_end: value.latest_end(),
        }
    }
}

impl From<JsonVehicleShift> for VehicleShift {
    fn from(value: JsonVehicleShift) -> Self {
        VehicleShift::new(value.earliest_start, value.latest_end)
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "UnloadSite")]
pub struct JsonUnloadSite {
    pub location_id: usize,

    /// Volume the site accepts over the whole horizon, unlimited when absent
    pub daily_capacity: Option<Vec<f64>>,
}

impl JsonMultiTripProblem {
    #[instrument(skip_all, level = "debug")]
    pub fn build_problem(self) -> Result<VehicleRoutingProblem, anyhow::Error> {
        let mut builder = VehicleRoutingProblemBuilder::default();

        let locations = self
            .locations
            .iter()
            .map(|location| Location::from_cartesian(location.coordinates[0], location.coordinates[1]))
            .collect::<Vec<_>>();

        let destinations = self
            .destinations
            .into_iter()
            .map(|destination| {
                let mut builder = DestinationBuilder::default();

                builder.set_location_id(destination.location_id);
                builder.set_external_id(destination.id.clone());

                if let Some(demand) = destination.demand {
                    builder.set_demand(Capacity::from_vec(demand));
                }

                if let Some(duration) = destination.duration {
                    builder.set_duration(duration);
                }

                if let Some(time_window) = destination.time_window {
                    builder.set_time_window(time_window);
                }

                builder
                    .build()
                    .with_context(|| format!("invalid destination {}", destination.id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        builder.set_destinations(destinations);

        let vehicles = self
            .vehicles
            .into_iter()
            .map(|vehicle| {
                let mut builder = VehicleBuilder::default();

                builder.set_vehicle_id(vehicle.id.clone());

                let Some(position) = self
                    .vehicle_profiles
                    .iter()
                    .position(|profile| profile.id == vehicle.profile)
                else {
                    bail!(
                        "vehicle {} references unknown profile {}",
                        vehicle.id,
                        vehicle.profile
                    );
                };
                builder.set_profile_id(position);

                if let Some(shift) = vehicle.shift {
                    builder.set_vehicle_shift(shift.into());
                }

                if let Some(capacity) = vehicle.capacity {
                    builder.set_capacity(Capacity::from_vec(capacity));
                }

                if let Some(capacity) = vehicle.first_trip_capacity {
                    builder.set_first_trip_capacity(Capacity::from_vec(capacity));
                }

                if let Some(depot_location_id) = vehicle.depot_location_id {
                    builder.set_depot_location_id(depot_location_id);
                }

                if let Some(should_return) = vehicle.should_return_to_depot {
                    builder.set_return(should_return);
                }

                if let Some(unload_duration) = vehicle.unload_duration {
                    builder.set_unload_duration(unload_duration);
                }

                if let Some(maximum) = vehicle.maximum_destinations {
                    builder.set_maximum_destinations(maximum);
                }

                builder
                    .build()
                    .with_context(|| format!("invalid vehicle {}", vehicle.id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        builder.set_vehicles(vehicles);

        builder.set_vehicle_profiles(
            self.vehicle_profiles
                .into_iter()
                .map(|profile| {
                    let matrices = match profile.matrices {
                        JsonTravelMatrices::Euclidean { round } => {
                            TravelMatrices::from_euclidean(&locations, round)
                        }
                        JsonTravelMatrices::Explicit {
                            distances,
                            times,
                            costs,
                        } => TravelMatrices::new(distances, times, costs),
                    };
                    VehicleProfile::new(profile.id, matrices)
                })
                .collect(),
        );

        builder.set_unload_sites(
            self.unload_sites
                .into_iter()
                .map(|site| {
                    UnloadSite::new(
                        LocationIdx::new(site.location_id),
                        site.daily_capacity.map(Capacity::from_vec),
                    )
                })
                .collect(),
        );

        builder.set_locations(locations);
        builder.build().context("failed to build the problem")
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Solution")]
pub struct JsonSolution {
    pub routes: Vec<JsonRoute>,
    pub unassigned: Vec<JsonDestination>,
    pub transport_costs: f64,
    pub trip_count: usize,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "Route")]
pub struct JsonRoute {
    pub vehicle_id: String,
    pub departure_time: Timestamp,
    pub end_time: Timestamp,
    pub transport_costs: f64,
    pub trip_count: usize,
    pub activities: Vec<JsonActivity>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case", rename = "Activity")]
pub enum JsonActivity {
    Destination {
        id: String,
        location_id: usize,
        trip: usize,
        arrival_time: Timestamp,
        departure_time: Timestamp,
        waiting_duration: SignedDuration,
    },
    Base {
        id: String,
        location_id: Option<usize>,
        trip: usize,
        arrival_time: Timestamp,
        departure_time: Timestamp,

        /// Volume unloaded at this stop
        load: Vec<f64>,
    },
}

impl From<&WorkingSolution> for JsonSolution {
    fn from(solution: &WorkingSolution) -> Self {
        let problem = solution.problem();

        JsonSolution {
            routes: solution
                .route_ids()
                .filter(|&route_id| !solution.route(route_id).is_empty())
                .map(|route_id| json_route(solution, route_id))
                .collect(),
            unassigned: solution
                .unassigned_jobs()
                .iter()
                .map(|&job_id| JsonDestination::from_problem(problem.destination(job_id), problem))
                .collect(),
            transport_costs: solution.total_transport_costs(),
            trip_count: solution.trip_count(),
        }
    }
}

fn json_route(solution: &WorkingSolution, route_id: RouteIdx) -> JsonRoute {
    let problem = solution.problem();
    let bases = solution.bases();
    let run_states = solution.run_states();
    let route = solution.route(route_id);

    let mut trip = 0;
    let activities = route
        .activity_ids()
        .iter()
        .enumerate()
        .map(|(position, &activity_id)| match activity_id {
            ActivityId::Destination(job_id) => {
                let destination = problem.destination(job_id);
                JsonActivity::Destination {
                    id: destination.external_id().to_owned(),
                    location_id: destination.location_id().get(),
                    trip,
                    arrival_time: route.arrival_time(position),
                    departure_time: route.activity_departure_time(position),
                    waiting_duration: route.waiting_duration(position),
                }
            }
            ActivityId::Base(base_id) => {
                let activity = JsonActivity::Base {
                    id: bases.base(base_id).external_id().to_owned(),
                    location_id: bases.base(base_id).location_id().map(|id| id.get()),
                    trip,
                    arrival_time: route.arrival_time(position),
                    departure_time: route.activity_departure_time(position),
                    load: run_states
                        .run_load(route_id, trip)
                        .map(|load| load.iter().collect())
                        .unwrap_or_default(),
                };
                trip += 1;
                activity
            }
        })
        .collect();

    JsonRoute {
        vehicle_id: problem.vehicle(route.vehicle_id()).external_id().to_owned(),
        departure_time: route.departure_time(problem),
        end_time: route.end_arrival_time(),
        transport_costs: route.transport_costs(problem, bases),
        trip_count: run_states.run_count_or(route_id, 0),
        activities,
    }
}
