use super::{capacity::Capacity, location::LocationIdx};

/// Candidate unload location with an optional cap on the volume unloaded per day.
#[derive(Debug, Clone)]
pub struct UnloadSite {
    location_id: LocationIdx,
    daily_capacity: Option<Capacity>,
}

impl UnloadSite {
    pub fn new(location_id: LocationIdx, daily_capacity: Option<Capacity>) -> Self {
        UnloadSite {
            location_id,
            daily_capacity,
        }
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn daily_capacity(&self) -> Option<&Capacity> {
        self.daily_capacity.as_ref()
    }
}
