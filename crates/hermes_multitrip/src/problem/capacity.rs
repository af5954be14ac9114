use std::ops::{Add, AddAssign, Index};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

type Vector = SmallVec<[f64; 2]>;

/// Shared empty load for callers that need a `&'static Capacity`.
pub static EMPTY_CAPACITY: Capacity = Capacity::EMPTY;

/// Multi-dimensional load. Missing dimensions read as zero.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Capacity(Vector);

impl Capacity {
    pub const EMPTY: Capacity = Capacity(Vector::new_const());

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        let mut vec = SmallVec::with_capacity(dimensions);
        vec.resize(dimensions, 0.0);
        Capacity(vec)
    }

    pub fn from_vec(vec: Vec<f64>) -> Self {
        Capacity(SmallVec::from_vec(vec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&value| value == 0.0)
    }

    pub fn is_negative(&self) -> bool {
        self.0.iter().any(|&value| value < 0.0)
    }

    #[inline]
    pub fn get(&self, index: usize) -> f64 {
        self.0.get(index).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn reset(&mut self) {
        self.0.clear();
    }

    pub fn update(&mut self, other: &Capacity) {
        self.0.clone_from(&other.0);
    }

    /// Element-wise maximum with `other`.
    pub fn update_max(&mut self, other: &Capacity) {
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a = a.max(*b);
        }
    }

    pub fn is_less_or_equal(&self, other: &Capacity) -> bool {
        let len = self.len().max(other.len());
        (0..len).all(|index| self.get(index) <= other.get(index))
    }

    pub fn is_greater_or_equal(&self, other: &Capacity) -> bool {
        other.is_less_or_equal(self)
    }

    /// Share of `capacity` used by the first dimension, in percent.
    pub fn fill_percent(&self, capacity: &Capacity) -> f64 {
        let total = capacity.get(0);
        if total <= 0.0 {
            return 0.0;
        }

        self.get(0) / total * 100.0
    }
}

impl Index<usize> for Capacity {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AddAssign<&Capacity> for Capacity {
    fn add_assign(&mut self, rhs: &Capacity) {
        if self.0.len() < rhs.0.len() {
            self.0.resize(rhs.0.len(), 0.0);
        }

        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a += *b;
        }
    }
}

impl Add<&Capacity> for &Capacity {
    type Output = Capacity;

    fn add(self, rhs: &Capacity) -> Self::Output {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_extends_dimensions() {
        let a = Capacity::from_vec(vec![1.0]);
        let b = Capacity::from_vec(vec![2.0, 3.0]);

        let sum = &a + &b;
        assert_eq!(sum, Capacity::from_vec(vec![3.0, 3.0]));
    }

    #[test]
    fn test_is_less_or_equal_treats_missing_as_zero() {
        let load = Capacity::from_vec(vec![10.0]);
        let capacity = Capacity::from_vec(vec![10.0, 5.0]);

        assert!(load.is_less_or_equal(&capacity));
        assert!(!capacity.is_less_or_equal(&load));
        assert!(capacity.is_greater_or_equal(&load));
    }

    #[test]
    fn test_empty_vs_zero() {
        assert!(Capacity::EMPTY.is_empty());
        assert!(Capacity::with_dimensions(2).is_empty());
        assert_eq!(Capacity::EMPTY.len(), 0);
        assert_eq!(Capacity::with_dimensions(2).len(), 2);
    }

    #[test]
    fn test_fill_percent() {
        let load = Capacity::from_vec(vec![5.0]);
        assert_eq!(load.fill_percent(&Capacity::from_vec(vec![20.0])), 25.0);
        assert_eq!(load.fill_percent(&Capacity::EMPTY), 0.0);
    }
}
