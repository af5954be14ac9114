use jiff::SignedDuration;

use crate::error::{MultiTripError, Result};

use super::{capacity::Capacity, location::LocationIdx, time_window::TimeWindow};

/// Immutable demand point.
#[derive(Debug, Clone)]
pub struct Destination {
    external_id: String,
    location_id: LocationIdx,
    demand: Capacity,
    duration: SignedDuration,
    time_window: TimeWindow,
}

impl Destination {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn location_id(&self) -> LocationIdx {
        self.location_id
    }

    pub fn demand(&self) -> &Capacity {
        &self.demand
    }

    pub fn duration(&self) -> SignedDuration {
        self.duration
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn has_time_window(&self) -> bool {
        !self.time_window.is_empty()
    }
}

#[derive(Default)]
pub struct DestinationBuilder {
    external_id: Option<String>,
    location_id: Option<usize>,
    demand: Option<Capacity>,
    duration: Option<SignedDuration>,
    time_window: Option<TimeWindow>,
}

impl DestinationBuilder {
    pub fn set_external_id(&mut self, external_id: String) -> &mut DestinationBuilder {
        self.external_id = Some(external_id);
        self
    }

    pub fn set_location_id(&mut self, location_id: usize) -> &mut DestinationBuilder {
        self.location_id = Some(location_id);
        self
    }

    pub fn set_demand(&mut self, demand: Capacity) -> &mut DestinationBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_duration(&mut self, duration: SignedDuration) -> &mut DestinationBuilder {
        self.duration = Some(duration);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut DestinationBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn build(self) -> Result<Destination> {
        let demand = self.demand.unwrap_or(Capacity::EMPTY);
        if demand.is_negative() {
            return Err(MultiTripError::InvalidProblem(
                "destination demand cannot be negative".into(),
            ));
        }

        Ok(Destination {
            external_id: self
                .external_id
                .ok_or(MultiTripError::MissingField("external_id"))?,
            location_id: self
                .location_id
                .ok_or(MultiTripError::MissingField("location_id"))?
                .into(),
            demand,
            duration: self.duration.unwrap_or(SignedDuration::ZERO),
            time_window: self.time_window.unwrap_or_default(),
        })
    }
}
