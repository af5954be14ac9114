use jiff::SignedDuration;

use crate::{
    define_index_newtype,
    problem::{
        location::LocationIdx,
        travel_cost_matrix::{Cost, Distance, TravelMatrices},
    },
};

define_index_newtype!(VehicleProfileIdx, VehicleProfile);

/// Travel oracle shared by every vehicle of one profile.
pub struct VehicleProfile {
    external_id: String,
    travel_costs: TravelMatrices,
}

impl VehicleProfile {
    pub fn new(external_id: String, travel_costs: TravelMatrices) -> Self {
        Self {
            external_id,
            travel_costs,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[inline(always)]
    pub fn travel_distance(&self, from: LocationIdx, to: LocationIdx) -> Distance {
        self.travel_costs.travel_distance(from, to)
    }

    #[inline(always)]
    pub fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> SignedDuration {
        self.travel_costs.travel_time(from, to)
    }

    #[inline(always)]
    pub fn travel_cost(&self, from: LocationIdx, to: LocationIdx) -> Cost {
        self.travel_costs.travel_cost(from, to)
    }

    pub fn travel_costs(&self) -> &TravelMatrices {
        &self.travel_costs
    }
}
