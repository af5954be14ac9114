use jiff::SignedDuration;

use crate::define_index_newtype;

use super::location::LocationIdx;

define_index_newtype!(BaseIdx, Base);

/// Depot placeholder. Location and service duration stay unset until the base
/// closes a trip in some route.
#[derive(Debug, Clone)]
pub struct Base {
    external_id: String,
    location_id: Option<LocationIdx>,
    service_duration: SignedDuration,
}

impl Base {
    pub fn new(external_id: String) -> Self {
        Base {
            external_id,
            location_id: None,
            service_duration: SignedDuration::ZERO,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location_id(&self) -> Option<LocationIdx> {
        self.location_id
    }

    pub fn service_duration(&self) -> SignedDuration {
        self.service_duration
    }

    pub fn is_assigned(&self) -> bool {
        self.location_id.is_some()
    }

    pub fn assign(&mut self, location_id: LocationIdx, service_duration: SignedDuration) {
        self.location_id = Some(location_id);
        self.service_duration = service_duration;
    }

    pub fn clear_assignment(&mut self) {
        self.location_id = None;
        self.service_duration = SignedDuration::ZERO;
    }
}
