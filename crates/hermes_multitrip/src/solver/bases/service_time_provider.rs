use jiff::{SignedDuration, Timestamp};

use crate::problem::{location::LocationIdx, vehicle::Vehicle};

/// Time a vehicle spends unloading at a base.
pub trait BaseServiceTimeProvider: Send + Sync {
    fn base_service_time(
        &self,
        vehicle: &Vehicle,
        location_id: LocationIdx,
        arrival: Timestamp,
    ) -> SignedDuration;
}

/// Uses the unload duration configured on the vehicle.
#[derive(Default, Clone, Copy, Debug)]
pub struct VehicleUnloadServiceTime;

impl BaseServiceTimeProvider for VehicleUnloadServiceTime {
    fn base_service_time(
        &self,
        vehicle: &Vehicle,
        _location_id: LocationIdx,
        _arrival: Timestamp,
    ) -> SignedDuration {
        vehicle.unload_duration()
    }
}
