pub mod base_placement;
pub mod bases;
pub mod calculator;
pub mod constraints;
pub mod insertion;
pub mod insertion_context;
pub mod recreate;
pub mod ruin;
pub mod solution;
pub mod state;
