use jiff::Timestamp;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Serialize, Clone, Default, PartialEq, JsonSchema)]
pub struct TimeWindow {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindow {
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> Option<Timestamp> {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Seconds between the arrival and the window opening. Negative when arriving after it.
    pub fn start_miss(&self, arrival: Timestamp) -> Option<f64> {
        self.start
            .map(|start| start.duration_since(arrival).as_secs_f64())
    }

    /// Seconds past the window closing. Negative while still inside it.
    pub fn end_miss(&self, arrival: Timestamp) -> Option<f64> {
        self.end.map(|end| arrival.duration_since(end).as_secs_f64())
    }

    pub fn earliness(&self, arrival: Timestamp) -> f64 {
        self.start_miss(arrival).unwrap_or(0.0).max(0.0)
    }

    pub fn lateness(&self, arrival: Timestamp) -> f64 {
        self.end_miss(arrival).unwrap_or(0.0).max(0.0)
    }

    /// False when a vehicle leaving at `departure` is already past the window end.
    /// Lateness at such a window is not counted.
    pub fn is_reachable_from(&self, departure: Timestamp) -> bool {
        self.end.is_none_or(|end| departure <= end)
    }

    /// Service start at `arrival`, delayed to the window opening if needed.
    pub fn service_start(&self, arrival: Timestamp) -> Timestamp {
        match self.start {
            Some(start) if start > arrival => start,
            _ => arrival,
        }
    }
}

#[derive(Default)]
pub struct TimeWindowBuilder {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindowBuilder {
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    pub fn build(self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}
