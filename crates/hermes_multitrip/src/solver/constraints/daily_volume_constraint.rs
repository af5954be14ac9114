use crate::{
    error::Result,
    solver::{insertion::NewActivity, insertion_context::ActivityInsertionContext},
};

use super::{
    activity_constraint::ActivityConstraint,
    constraint::{ConstraintStatus, ScoreLevel},
};

/// The unload location of the receiving trip must absorb the added demand.
/// A base must be able to absorb the load of the trip it closes.
#[derive(Clone)]
pub struct DailyVolumeConstraint;

impl ActivityConstraint for DailyVolumeConstraint {
    fn score_level(&self) -> ScoreLevel {
        ScoreLevel::Hard
    }

    fn fulfilled(&self, context: &ActivityInsertionContext) -> Result<ConstraintStatus> {
        match context.new_activity {
            NewActivity::Destination(job_id) => {
                let Some(location_id) = context.unload_location_id else {
                    return Ok(ConstraintStatus::Fulfilled);
                };

                let demand = context.problem().destination(job_id).demand();
                if context.daily_volume.is_loadable(location_id, demand)? {
                    Ok(ConstraintStatus::Fulfilled)
                } else {
                    Ok(ConstraintStatus::BreakTrip)
                }
            }
            NewActivity::Base { location_id, .. } => {
                if context
                    .daily_volume
                    .is_loadable(location_id, context.run_load)?
                {
                    Ok(ConstraintStatus::Fulfilled)
                } else {
                    Ok(ConstraintStatus::ContinueScan)
                }
            }
        }
    }
}
