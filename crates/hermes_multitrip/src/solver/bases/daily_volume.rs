use crate::{
    error::{MultiTripError, Result},
    problem::{
        capacity::Capacity, location::LocationIdx, unload_site::UnloadSite,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::working_solution::WorkingSolution,
};

/// Volume unloaded per location over one solved horizon.
///
/// Slots are dense over the index range of the unload sites. Locations inside
/// the range without a site never have a cap.
#[derive(Debug, Clone, Default)]
pub struct DailyUnloadVolumeTracker {
    offset: usize,
    volumes: Vec<Capacity>,
    capacities: Vec<Option<Capacity>>,
}

impl DailyUnloadVolumeTracker {
    pub fn new(sites: &[UnloadSite]) -> Self {
        let Some(min) = sites.iter().map(|site| site.location_id().get()).min() else {
            return Self::default();
        };
        let max = sites
            .iter()
            .map(|site| site.location_id().get())
            .max()
            .unwrap_or(min);

        let len = max - min + 1;
        let mut capacities = vec![None; len];
        for site in sites {
            capacities[site.location_id().get() - min] = site.daily_capacity().cloned();
        }

        DailyUnloadVolumeTracker {
            offset: min,
            volumes: vec![Capacity::EMPTY; len],
            capacities,
        }
    }

    pub fn from_problem(problem: &VehicleRoutingProblem) -> Self {
        Self::new(problem.unload_sites())
    }

    fn slot(&self, location_id: LocationIdx) -> Result<usize> {
        location_id
            .get()
            .checked_sub(self.offset)
            .filter(|&index| index < self.volumes.len())
            .ok_or_else(|| {
                MultiTripError::InconsistentState(format!(
                    "location {location_id} is not tracked for daily volume"
                ))
            })
    }

    pub fn add_volume(&mut self, location_id: LocationIdx, volume: &Capacity) -> Result<()> {
        let slot = self.slot(location_id)?;
        self.volumes[slot] += volume;
        Ok(())
    }

    pub fn volume(&self, location_id: LocationIdx) -> Result<&Capacity> {
        let slot = self.slot(location_id)?;
        Ok(&self.volumes[slot])
    }

    pub fn daily_capacity(&self, location_id: LocationIdx) -> Result<Option<&Capacity>> {
        let slot = self.slot(location_id)?;
        Ok(self.capacities[slot].as_ref())
    }

    /// Whether `location_id` can still absorb `additional` today.
    pub fn is_loadable(&self, location_id: LocationIdx, additional: &Capacity) -> Result<bool> {
        let slot = self.slot(location_id)?;
        Ok(match &self.capacities[slot] {
            Some(capacity) => (&self.volumes[slot] + additional).is_less_or_equal(capacity),
            None => true,
        })
    }

    pub fn clear(&mut self) {
        self.volumes.iter_mut().for_each(Capacity::reset);
    }

    /// Clears and adds the load of every closed trip at its unload location.
    pub fn rebuild(&mut self, solution: &WorkingSolution) -> Result<()> {
        self.clear();

        let run_states = solution.run_states();
        for route_id in solution.route_ids() {
            for run_index in 0..run_states.run_count_or(route_id, 0) {
                let (Some(location_id), Some(load)) = (
                    run_states.unload_location(route_id, run_index),
                    run_states.run_load(route_id, run_index),
                ) else {
                    continue;
                };

                self.add_volume(location_id, load)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_tracker() -> DailyUnloadVolumeTracker {
        DailyUnloadVolumeTracker::new(&[
            UnloadSite::new(LocationIdx::new(4), Some(Capacity::from_vec(vec![10.0]))),
            UnloadSite::new(LocationIdx::new(7), None),
        ])
    }

    #[test]
    fn test_is_loadable_against_cap() {
        let mut tracker = create_tracker();
        let location_id = LocationIdx::new(4);

        assert!(tracker.is_loadable(location_id, &Capacity::from_vec(vec![10.0])).unwrap());
        tracker
            .add_volume(location_id, &Capacity::from_vec(vec![6.0]))
            .unwrap();
        assert!(tracker.is_loadable(location_id, &Capacity::from_vec(vec![4.0])).unwrap());
        assert!(!tracker.is_loadable(location_id, &Capacity::from_vec(vec![5.0])).unwrap());

        tracker.clear();
        assert!(tracker.volume(location_id).unwrap().is_empty());
    }

    #[test]
    fn test_uncapped_location_is_always_loadable() {
        let tracker = create_tracker();
        let huge = Capacity::from_vec(vec![1e9]);

        assert!(tracker.is_loadable(LocationIdx::new(7), &huge).unwrap());
        assert!(tracker.is_loadable(LocationIdx::new(5), &huge).unwrap());
    }

    #[test]
    fn test_out_of_range_is_inconsistent_state() {
        let mut tracker = create_tracker();

        assert!(matches!(
            tracker.is_loadable(LocationIdx::new(2), &Capacity::EMPTY),
            Err(MultiTripError::InconsistentState(_))
        ));
        assert!(matches!(
            tracker.add_volume(LocationIdx::new(8), &Capacity::EMPTY),
            Err(MultiTripError::InconsistentState(_))
        ));
    }
}
