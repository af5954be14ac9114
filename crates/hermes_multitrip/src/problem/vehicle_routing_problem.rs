use fxhash::FxHashMap;
use jiff::SignedDuration;

use crate::{
    error::{MultiTripError, Result},
    problem::{
        destination::Destination,
        job::JobIdx,
        unload_site::UnloadSite,
        vehicle_profile::VehicleProfile,
    },
    utils::enumerate_idx::EnumerateIdx,
};

use super::{
    location::{Location, LocationIdx},
    travel_cost_matrix::{Cost, Distance},
    vehicle::{Vehicle, VehicleIdx},
};

type PrecomputedAverageCostFromDepot = Vec<Cost>;

pub struct VehicleRoutingProblem {
    locations: Vec<Location>,
    vehicles: Vec<Vehicle>,
    vehicle_profiles: Vec<VehicleProfile>,
    destinations: Vec<Destination>,
    unload_sites: Vec<UnloadSite>,
    unload_site_by_location: FxHashMap<LocationIdx, usize>,

    has_time_windows: bool,

    precomputed_average_cost_from_depot: PrecomputedAverageCostFromDepot,
    precomputed_max_destination_cost: Cost,
}

struct VehicleRoutingProblemParams {
    locations: Vec<Location>,
    vehicles: Vec<Vehicle>,
    vehicle_profiles: Vec<VehicleProfile>,
    destinations: Vec<Destination>,
    unload_sites: Vec<UnloadSite>,
}

impl VehicleRoutingProblem {
    fn new(params: VehicleRoutingProblemParams) -> Self {
        let unload_site_by_location = params
            .unload_sites
            .iter()
            .enumerate()
            .map(|(index, site)| (site.location_id(), index))
            .collect();

        let precomputed_average_cost_from_depot =
            VehicleRoutingProblem::precompute_average_cost_from_depot(
                &params.locations,
                &params.vehicles,
                &params.vehicle_profiles,
            );

        let precomputed_max_destination_cost =
            VehicleRoutingProblem::precompute_max_destination_cost(
                &params.destinations,
                &params.vehicles,
                &params.vehicle_profiles,
            );

        Self {
            has_time_windows: params.destinations.iter().any(|d| d.has_time_window()),
            locations: params.locations,
            vehicles: params.vehicles,
            vehicle_profiles: params.vehicle_profiles,
            destinations: params.destinations,
            unload_sites: params.unload_sites,
            unload_site_by_location,
            precomputed_average_cost_from_depot,
            precomputed_max_destination_cost,
        }
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn destination(&self, job_id: JobIdx) -> &Destination {
        &self.destinations[job_id]
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleIdx) -> &Vehicle {
        &self.vehicles[vehicle_id]
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, location_id: LocationIdx) -> &Location {
        &self.locations[location_id]
    }

    pub fn unload_sites(&self) -> &[UnloadSite] {
        &self.unload_sites
    }

    pub fn unload_site_at(&self, location_id: LocationIdx) -> Option<&UnloadSite> {
        self.unload_site_by_location
            .get(&location_id)
            .map(|&index| &self.unload_sites[index])
    }

    pub fn unload_location_ids(&self) -> Vec<LocationIdx> {
        self.unload_sites.iter().map(|site| site.location_id()).collect()
    }

    pub fn has_time_windows(&self) -> bool {
        self.has_time_windows
    }

    pub fn time_window_count(&self) -> usize {
        self.destinations
            .iter()
            .filter(|destination| destination.has_time_window())
            .count()
    }

    fn profile(&self, vehicle: &Vehicle) -> &VehicleProfile {
        &self.vehicle_profiles[vehicle.profile_id().get()]
    }

    #[inline(always)]
    pub fn travel_distance(
        &self,
        vehicle: &Vehicle,
        from: LocationIdx,
        to: LocationIdx,
    ) -> Distance {
        self.profile(vehicle).travel_distance(from, to)
    }

    #[inline(always)]
    pub fn travel_time(
        &self,
        vehicle: &Vehicle,
        from: LocationIdx,
        to: LocationIdx,
    ) -> SignedDuration {
        self.profile(vehicle).travel_time(from, to)
    }

    #[inline(always)]
    pub fn travel_cost(&self, vehicle: &Vehicle, from: LocationIdx, to: LocationIdx) -> Cost {
        self.profile(vehicle).travel_cost(from, to)
    }

    /// Zero when either end is missing, e.g. a route without a return to the depot.
    #[inline(always)]
    pub fn travel_cost_or_zero(
        &self,
        vehicle: &Vehicle,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
    ) -> Cost {
        match (from, to) {
            (Some(from), Some(to)) => self.travel_cost(vehicle, from, to),
            _ => 0.0,
        }
    }

    #[inline(always)]
    pub fn travel_time_or_zero(
        &self,
        vehicle: &Vehicle,
        from: Option<LocationIdx>,
        to: Option<LocationIdx>,
    ) -> SignedDuration {
        match (from, to) {
            (Some(from), Some(to)) => self.travel_time(vehicle, from, to),
            _ => SignedDuration::ZERO,
        }
    }

    pub fn average_cost_from_depot(&self, location_id: LocationIdx) -> Cost {
        self.precomputed_average_cost_from_depot[location_id.get()]
    }

    /// Largest travel cost between two destinations.
    pub fn max_destination_cost(&self) -> Cost {
        self.precomputed_max_destination_cost
    }

    fn precompute_average_cost_from_depot(
        locations: &[Location],
        vehicles: &[Vehicle],
        profiles: &[VehicleProfile],
    ) -> PrecomputedAverageCostFromDepot {
        if vehicles.is_empty() {
            return vec![0.0; locations.len()];
        }

        locations
            .iter()
            .enumerate_idx()
            .map(|(location_id, _): (LocationIdx, &Location)| {
                vehicles
                    .iter()
                    .filter_map(|vehicle| {
                        vehicle.depot_location_id().map(|depot_location_id| {
                            profiles[vehicle.profile_id().get()]
                                .travel_cost(depot_location_id, location_id)
                        })
                    })
                    .sum::<Cost>()
                    / vehicles.len() as Cost
            })
            .collect()
    }

    fn precompute_max_destination_cost(
        destinations: &[Destination],
        vehicles: &[Vehicle],
        profiles: &[VehicleProfile],
    ) -> Cost {
        let Some(vehicle) = vehicles.first() else {
            return 0.0;
        };
        let profile = &profiles[vehicle.profile_id().get()];

        let mut max = 0.0_f64;
        for from in destinations {
            for to in destinations {
                max = max.max(profile.travel_cost(from.location_id(), to.location_id()));
            }
        }

        max
    }
}

#[derive(Default)]
pub struct VehicleRoutingProblemBuilder {
    locations: Option<Vec<Location>>,
    destinations: Option<Vec<Destination>>,
    vehicles: Option<Vec<Vehicle>>,
    vehicle_profiles: Option<Vec<VehicleProfile>>,
    unload_sites: Option<Vec<UnloadSite>>,
}

impl VehicleRoutingProblemBuilder {
    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut VehicleRoutingProblemBuilder {
        self.locations = Some(locations);
        self
    }

    pub fn set_destinations(
        &mut self,
        destinations: Vec<Destination>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.destinations = Some(destinations);
        self
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) -> &mut VehicleRoutingProblemBuilder {
        self.vehicles = Some(vehicles);
        self
    }

    pub fn add_vehicle_profile(
        &mut self,
        profile: VehicleProfile,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.vehicle_profiles
            .get_or_insert_with(Vec::new)
            .push(profile);
        self
    }

    pub fn set_vehicle_profiles(
        &mut self,
        profiles: Vec<VehicleProfile>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.vehicle_profiles = Some(profiles);
        self
    }

    pub fn set_unload_sites(
        &mut self,
        unload_sites: Vec<UnloadSite>,
    ) -> &mut VehicleRoutingProblemBuilder {
        self.unload_sites = Some(unload_sites);
        self
    }

    pub fn build(self) -> Result<VehicleRoutingProblem> {
        let locations = self
            .locations
            .ok_or(MultiTripError::MissingField("locations"))?;
        let destinations = self
            .destinations
            .ok_or(MultiTripError::MissingField("destinations"))?;
        let vehicles = self
            .vehicles
            .ok_or(MultiTripError::MissingField("vehicles"))?;
        let vehicle_profiles = self
            .vehicle_profiles
            .ok_or(MultiTripError::MissingField("vehicle_profiles"))?;
        let unload_sites = self.unload_sites.unwrap_or_default();

        let in_range = |location_id: LocationIdx| location_id.get() < locations.len();

        if let Some(destination) = destinations.iter().find(|d| !in_range(d.location_id())) {
            return Err(MultiTripError::InvalidProblem(format!(
                "destination {} references unknown location {}",
                destination.external_id(),
                destination.location_id()
            )));
        }

        if let Some(site) = unload_sites.iter().find(|s| !in_range(s.location_id())) {
            return Err(MultiTripError::InvalidProblem(format!(
                "unload site references unknown location {}",
                site.location_id()
            )));
        }

        for vehicle in &vehicles {
            if vehicle.profile_id().get() >= vehicle_profiles.len() {
                return Err(MultiTripError::InvalidProblem(format!(
                    "vehicle {} references unknown profile {}",
                    vehicle.external_id(),
                    vehicle.profile_id()
                )));
            }

            if vehicle.depot_location_id().is_some_and(|depot| !in_range(depot)) {
                return Err(MultiTripError::InvalidProblem(format!(
                    "vehicle {} references an unknown depot",
                    vehicle.external_id()
                )));
            }
        }

        for profile in &vehicle_profiles {
            if profile.travel_costs().num_locations() != locations.len() {
                return Err(MultiTripError::InvalidProblem(format!(
                    "matrices of profile {} do not match the number of locations",
                    profile.external_id()
                )));
            }
        }

        Ok(VehicleRoutingProblem::new(VehicleRoutingProblemParams {
            locations,
            vehicles,
            vehicle_profiles,
            destinations,
            unload_sites,
        }))
    }
}
