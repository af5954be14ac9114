use fixedbitset::FixedBitSet;
use jiff::SignedDuration;

use crate::{
    error::{MultiTripError, Result},
    problem::{
        base::{Base, BaseIdx},
        job::ActivityId,
        location::LocationIdx,
        vehicle_routing_problem::VehicleRoutingProblem,
    },
    solver::solution::route::WorkingSolutionRoute,
};

/// Arena of interchangeable bases. A base is either free or embedded in exactly
/// one route; the location it carries is only meaningful while taken.
#[derive(Clone, Debug)]
pub struct BasePool {
    bases: Vec<Base>,
    free: FixedBitSet,
}

impl BasePool {
    pub fn new(size: usize) -> Self {
        Self::from_bases((0..size).map(|index| Base::new(format!("base{index}"))).collect())
    }

    pub fn from_bases(bases: Vec<Base>) -> Self {
        let mut free = FixedBitSet::with_capacity(bases.len());
        free.insert_range(..);

        BasePool { bases, free }
    }

    /// One base per destination is the most trips a pass can ever open.
    pub fn for_problem(problem: &VehicleRoutingProblem) -> Self {
        Self::new(problem.destinations().len().max(1))
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn base(&self, base_id: BaseIdx) -> &Base {
        &self.bases[base_id]
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub fn assign(
        &mut self,
        base_id: BaseIdx,
        location_id: LocationIdx,
        service_duration: SignedDuration,
    ) {
        self.bases[base_id].assign(location_id, service_duration);
    }

    pub fn is_free(&self, base_id: BaseIdx) -> bool {
        self.free.contains(base_id.get())
    }

    pub fn free_count(&self) -> usize {
        self.free.count_ones(..)
    }

    /// Lowest free base, without taking it.
    pub fn peek_free(&self) -> Option<BaseIdx> {
        self.free.ones().next().map(BaseIdx::new)
    }

    pub fn take_free_base(&mut self) -> Result<BaseIdx> {
        let base_id = self.peek_free().ok_or(MultiTripError::PoolExhausted)?;
        self.free.set(base_id.get(), false);
        Ok(base_id)
    }

    /// Marks `base_id` as taken. Returns false if it already was.
    pub fn take(&mut self, base_id: BaseIdx) -> bool {
        if !self.is_free(base_id) {
            return false;
        }

        self.free.set(base_id.get(), false);
        true
    }

    /// Hands `base_id` back to the pool and forgets its location.
    /// Releasing a free base is a no-op that returns false.
    pub fn release(&mut self, base_id: BaseIdx) -> bool {
        if self.is_free(base_id) {
            return false;
        }

        self.free.insert(base_id.get());
        self.bases[base_id].clear_assignment();
        true
    }

    /// Rebuilds the free set as the full pool minus the bases found in `routes`.
    pub fn refresh(&mut self, routes: &[WorkingSolutionRoute]) {
        self.free.insert_range(..);

        for route in routes {
            for activity_id in route.activity_ids() {
                if let ActivityId::Base(base_id) = activity_id {
                    self.free.set(base_id.get(), false);
                }
            }
        }

        for index in self.free.ones() {
            self.bases[index].clear_assignment();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_free_base_in_id_order() {
        let mut pool = BasePool::new(2);

        assert_eq!(pool.take_free_base(), Ok(BaseIdx::new(0)));
        assert_eq!(pool.take_free_base(), Ok(BaseIdx::new(1)));
        assert_eq!(pool.take_free_base(), Err(MultiTripError::PoolExhausted));

        assert!(pool.release(BaseIdx::new(0)));
        assert_eq!(pool.peek_free(), Some(BaseIdx::new(0)));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pool = BasePool::new(1);
        let base_id = BaseIdx::new(0);

        assert!(pool.take(base_id));
        assert!(!pool.take(base_id));
        pool.assign(base_id, LocationIdx::new(3), SignedDuration::from_mins(5));
        assert!(pool.base(base_id).is_assigned());

        assert!(pool.release(base_id));
        assert!(!pool.release(base_id));
        assert!(!pool.base(base_id).is_assigned());
        assert_eq!(pool.free_count(), 1);
    }
}
