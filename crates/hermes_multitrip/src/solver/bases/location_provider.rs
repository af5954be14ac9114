use crate::problem::{
    location::LocationIdx, vehicle::Vehicle, vehicle_routing_problem::VehicleRoutingProblem,
};

/// How many trips of a route already unload at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationAssignment {
    pub location_id: LocationIdx,
    pub count: usize,
}

/// Context of a base placement, handed to the location provider.
pub struct LocationQuery<'a> {
    pub vehicle: &'a Vehicle,
    pub is_last_trip: bool,
    pub trip_index: usize,
    pub fill_percent: f64,
    pub assigned_locations: &'a [LocationAssignment],
    pub previous_location_id: Option<LocationIdx>,
    pub next_location_id: Option<LocationIdx>,
}

impl LocationQuery<'_> {
    pub fn assigned_count(&self, location_id: LocationIdx) -> usize {
        self.assigned_locations
            .iter()
            .find(|assignment| assignment.location_id == location_id)
            .map_or(0, |assignment| assignment.count)
    }
}

/// Candidate unload locations for a base. Results are not filtered by daily
/// volume, the caller does that.
pub trait BaseLocationProvider: Send + Sync {
    fn available_locations(&self, query: &LocationQuery) -> Vec<LocationIdx>;

    fn all_locations(&self) -> &[LocationIdx];
}

/// Same fixed list whatever the context.
#[derive(Debug, Clone)]
pub struct DefaultBaseLocationProvider {
    locations: Vec<LocationIdx>,
}

impl DefaultBaseLocationProvider {
    pub fn new(locations: Vec<LocationIdx>) -> Self {
        DefaultBaseLocationProvider { locations }
    }

    pub fn from_problem(problem: &VehicleRoutingProblem) -> Self {
        Self::new(problem.unload_location_ids())
    }
}

impl BaseLocationProvider for DefaultBaseLocationProvider {
    fn available_locations(&self, _query: &LocationQuery) -> Vec<LocationIdx> {
        self.locations.clone()
    }

    fn all_locations(&self) -> &[LocationIdx] {
        &self.locations
    }
}
