use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MultiTripError {
    /// No free base is left to close a new trip. The recreate pass stops opening trips.
    #[error("no free base left in the pool")]
    PoolExhausted,

    /// A lookup addressed state that was never initialized.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, MultiTripError>;
