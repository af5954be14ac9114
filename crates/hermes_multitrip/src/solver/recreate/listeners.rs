use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    problem::{job::JobIdx, vehicle::VehicleIdx},
    solver::{
        insertion::InsertionResult,
        solution::{route_id::RouteIdx, working_solution::WorkingSolution},
    },
};

/// Notified after each committed insertion. Return values are never consumed.
pub trait InsertionListener {
    fn job_inserted(&mut self, _solution: &WorkingSolution, _result: &InsertionResult) {}

    fn vehicle_switched(&mut self, _route_id: RouteIdx, _vehicle_id: VehicleIdx) {}
}

/// Notified around a ruin of destinations.
pub trait RuinListener {
    fn ruin_started(&mut self, _solution: &WorkingSolution, _jobs: &[JobIdx]) {}

    fn ruin_ended(&mut self, _solution: &WorkingSolution, _removed: &[JobIdx]) {}
}

pub type InsertionListenerHandle = Arc<Mutex<dyn InsertionListener + Send + Sync + 'static>>;
pub type RuinListenerHandle = Arc<Mutex<dyn RuinListener + Send + Sync + 'static>>;

#[derive(Default, Clone)]
pub struct InsertionListeners {
    listeners: Vec<InsertionListenerHandle>,
}

impl InsertionListeners {
    pub fn add(&mut self, listener: InsertionListenerHandle) {
        self.listeners.push(listener);
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn job_inserted(&self, solution: &WorkingSolution, result: &InsertionResult) {
        for listener in &self.listeners {
            listener.lock().job_inserted(solution, result);
        }
    }

    pub fn vehicle_switched(&self, route_id: RouteIdx, vehicle_id: VehicleIdx) {
        for listener in &self.listeners {
            listener.lock().vehicle_switched(route_id, vehicle_id);
        }
    }
}

#[derive(Default, Clone)]
pub struct RuinListeners {
    listeners: Vec<RuinListenerHandle>,
}

impl RuinListeners {
    pub fn add(&mut self, listener: RuinListenerHandle) {
        self.listeners.push(listener);
    }

    pub fn ruin_started(&self, solution: &WorkingSolution, jobs: &[JobIdx]) {
        for listener in &self.listeners {
            listener.lock().ruin_started(solution, jobs);
        }
    }

    pub fn ruin_ended(&self, solution: &WorkingSolution, removed: &[JobIdx]) {
        for listener in &self.listeners {
            listener.lock().ruin_ended(solution, removed);
        }
    }
}
