pub mod insertion_strategy;
pub mod listeners;
pub mod recreate_params;
pub mod sort_strategy;
