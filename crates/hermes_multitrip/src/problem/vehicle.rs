use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    define_index_newtype,
    error::{MultiTripError, Result},
    problem::vehicle_profile::VehicleProfileIdx,
};

use super::{capacity::Capacity, location::LocationIdx};

define_index_newtype!(VehicleIdx, Vehicle);

#[derive(Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    vehicle_profile_id: VehicleProfileIdx,
    shift: Option<VehicleShift>,
    capacity: Capacity,
    first_trip_capacity: Option<Capacity>,
    depot_location_id: Option<LocationIdx>,
    should_return_to_depot: bool,
    unload_duration: Option<SignedDuration>,
    maximum_destinations: Option<usize>,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn profile_id(&self) -> VehicleProfileIdx {
        self.vehicle_profile_id
    }

    pub fn shift(&self) -> Option<&VehicleShift> {
        self.shift.as_ref()
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    pub fn first_trip_capacity(&self) -> Option<&Capacity> {
        self.first_trip_capacity.as_ref()
    }

    /// Capacity available to the trip at `run_index`. The first trip may be smaller.
    pub fn trip_capacity(&self, run_index: usize) -> &Capacity {
        match (&self.first_trip_capacity, run_index) {
            (Some(first), 0) => first,
            _ => &self.capacity,
        }
    }

    pub fn depot_location_id(&self) -> Option<LocationIdx> {
        self.depot_location_id
    }

    pub fn should_return_to_depot(&self) -> bool {
        self.should_return_to_depot
    }

    pub fn end_location_id(&self) -> Option<LocationIdx> {
        if self.should_return_to_depot {
            self.depot_location_id
        } else {
            None
        }
    }

    pub fn earliest_start_time(&self) -> Option<Timestamp> {
        self.shift.as_ref().and_then(|shift| shift.earliest_start)
    }

    pub fn latest_end_time(&self) -> Option<Timestamp> {
        self.shift.as_ref().and_then(|shift| shift.latest_end)
    }

    /// Departure used when the route has no fixed start yet.
    pub fn departure_time(&self) -> Timestamp {
        self.earliest_start_time().unwrap_or(Timestamp::UNIX_EPOCH)
    }

    pub fn unload_duration(&self) -> SignedDuration {
        self.unload_duration.unwrap_or(SignedDuration::ZERO)
    }

    pub fn maximum_destinations(&self) -> Option<usize> {
        self.maximum_destinations
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VehicleShift {
    pub(crate) earliest_start: Option<Timestamp>,
    pub(crate) latest_end: Option<Timestamp>,
}

impl VehicleShift {
    pub fn new(earliest_start: Option<Timestamp>, latest_end: Option<Timestamp>) -> Self {
        VehicleShift {
            earliest_start,
            latest_end,
        }
    }

    pub fn earliest_start(&self) -> Option<Timestamp> {
        self.earliest_start
    }

    pub fn latest_end(&self) -> Option<Timestamp> {
        self.latest_end
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    vehicle_profile_id: Option<usize>,
    shift: Option<VehicleShift>,
    capacity: Option<Capacity>,
    first_trip_capacity: Option<Capacity>,
    depot_location_id: Option<usize>,
    should_return_to_depot: Option<bool>,
    unload_duration: Option<SignedDuration>,
    maximum_destinations: Option<usize>,
}

impl VehicleBuilder {
    pub fn set_profile_id(&mut self, vehicle_profile_id: usize) -> &mut VehicleBuilder {
        self.vehicle_profile_id = Some(vehicle_profile_id);
        self
    }

    pub fn set_vehicle_id(&mut self, external_id: String) -> &mut VehicleBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_vehicle_shift(&mut self, shift: VehicleShift) -> &mut VehicleBuilder {
        self.shift = Some(shift);
        self
    }

    pub fn set_capacity(&mut self, capacity: Capacity) -> &mut VehicleBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_first_trip_capacity(&mut self, capacity: Capacity) -> &mut VehicleBuilder {
        self.first_trip_capacity = Some(capacity);
        self
    }

    pub fn set_depot_location_id(&mut self, depot_location_id: usize) -> &mut VehicleBuilder {
        self.depot_location_id = Some(depot_location_id);
        self
    }

    pub fn set_return(&mut self, should_return_to_depot: bool) -> &mut VehicleBuilder {
        self.should_return_to_depot = Some(should_return_to_depot);
        self
    }

    pub fn set_unload_duration(&mut self, duration: SignedDuration) -> &mut VehicleBuilder {
        self.unload_duration = Some(duration);
        self
    }

    pub fn set_maximum_destinations(&mut self, maximum: usize) -> &mut VehicleBuilder {
        self.maximum_destinations = Some(maximum);
        self
    }

    pub fn build(self) -> Result<Vehicle> {
        let capacity = self.capacity.unwrap_or(Capacity::EMPTY);
        if capacity.is_negative()
            || self
                .first_trip_capacity
                .as_ref()
                .is_some_and(|first| first.is_negative())
        {
            return Err(MultiTripError::InvalidProblem(
                "vehicle capacity cannot be negative".into(),
            ));
        }

        Ok(Vehicle {
            external_id: self
                .external_id
                .ok_or(MultiTripError::MissingField("external_id"))?,
            vehicle_profile_id: self.vehicle_profile_id.unwrap_or(0).into(),
            shift: self.shift,
            capacity,
            first_trip_capacity: self.first_trip_capacity,
            depot_location_id: self.depot_location_id.map(|id| id.into()),
            should_return_to_depot: self.should_return_to_depot.unwrap_or(false),
            unload_duration: self.unload_duration,
            maximum_destinations: self.maximum_destinations,
        })
    }
}
