use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::sort_strategy::BestInsertionSortStrategy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Threads {
    Single,
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.number_of_threads() > 1
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields, rename = "RecreateParams")]
pub struct RecreateParams {
    pub sort_strategy: BestInsertionSortStrategy,

    /// Seeds the random job ordering
    pub seed: u64,

    /// Threads evaluating routes for one job
    pub insertion_threads: Threads,

    pub time_window_weight: f64,
}

impl Default for RecreateParams {
    fn default() -> Self {
        RecreateParams {
            sort_strategy: BestInsertionSortStrategy::AsGiven,
            seed: 2427121,
            insertion_threads: Threads::Single,
            time_window_weight: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_params_use_defaults() {
        let params: RecreateParams =
            serde_json::from_str(r#"{ "seed": 7, "insertion_threads": { "Multi": 4 } }"#).unwrap();

        assert_eq!(params.seed, 7);
        assert_eq!(params.insertion_threads, Threads::Multi(4));
        assert_eq!(params.sort_strategy, BestInsertionSortStrategy::AsGiven);
        assert_eq!(params.time_window_weight, 1.0);
    }

    #[test]
    fn test_number_of_threads() {
        assert_eq!(Threads::Single.number_of_threads(), 1);
        assert_eq!(Threads::Multi(3).number_of_threads(), 3);
        assert_eq!(Threads::Multi(0).number_of_threads(), 1);
        assert!(Threads::Auto.number_of_threads() >= 1);
        assert!(!Threads::Single.is_parallel());
    }
}
