use crate::{error::Result, solver::insertion_context::ActivityInsertionContext};

use super::{
    base_sequence_constraint::BaseSequenceConstraint,
    capacity_constraint::CapacityConstraint,
    constraint::{ConstraintStatus, ScoreLevel},
    daily_volume_constraint::DailyVolumeConstraint,
    time_window_constraint::TimeWindowConstraint,
};

pub trait ActivityConstraint {
    fn score_level(&self) -> ScoreLevel;

    /// Hard check at one gap. Soft constraints are always fulfilled.
    fn fulfilled(&self, _context: &ActivityInsertionContext) -> Result<ConstraintStatus> {
        Ok(ConstraintStatus::Fulfilled)
    }

    /// Soft cost added by the insertion. Hard constraints cost nothing.
    fn insertion_cost(&self, _context: &ActivityInsertionContext) -> f64 {
        0.0
    }
}

#[derive(Clone)]
pub enum ActivityConstraintType {
    Capacity(CapacityConstraint),
    DailyVolume(DailyVolumeConstraint),
    BaseSequence(BaseSequenceConstraint),
    TimeWindow(TimeWindowConstraint),
}

impl ActivityConstraintType {
    pub fn constraint_name(&self) -> &'static str {
        match self {
            ActivityConstraintType::Capacity(_) => "capacity",
            ActivityConstraintType::DailyVolume(_) => "daily_volume",
            ActivityConstraintType::BaseSequence(_) => "base_sequence",
            ActivityConstraintType::TimeWindow(_) => "time_window",
        }
    }
}

impl ActivityConstraint for ActivityConstraintType {
    fn score_level(&self) -> ScoreLevel {
        match self {
            ActivityConstraintType::Capacity(c) => c.score_level(),
            ActivityConstraintType::DailyVolume(c) => c.score_level(),
            ActivityConstraintType::BaseSequence(c) => c.score_level(),
            ActivityConstraintType::TimeWindow(c) => c.score_level(),
        }
    }

    fn fulfilled(&self, context: &ActivityInsertionContext) -> Result<ConstraintStatus> {
        match self {
            ActivityConstraintType::Capacity(c) => c.fulfilled(context),
            ActivityConstraintType::DailyVolume(c) => c.fulfilled(context),
            ActivityConstraintType::BaseSequence(c) => c.fulfilled(context),
            ActivityConstraintType::TimeWindow(c) => c.fulfilled(context),
        }
    }

    fn insertion_cost(&self, context: &ActivityInsertionContext) -> f64 {
        match self {
            ActivityConstraintType::Capacity(c) => c.insertion_cost(context),
            ActivityConstraintType::DailyVolume(c) => c.insertion_cost(context),
            ActivityConstraintType::BaseSequence(c) => c.insertion_cost(context),
            ActivityConstraintType::TimeWindow(c) => c.insertion_cost(context),
        }
    }
}
