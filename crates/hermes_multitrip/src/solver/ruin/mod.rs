pub mod ruin_destinations;
