use std::fmt::Display;

use serde::Serialize;

use crate::define_index_newtype;

use super::{base::BaseIdx, destination::Destination};

define_index_newtype!(JobIdx, Destination);

/// Stop inside a route: either a destination or a base taken from the pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ActivityId {
    Destination(JobIdx),
    Base(BaseIdx),
}

impl ActivityId {
    pub fn is_base(&self) -> bool {
        matches!(self, ActivityId::Base(_))
    }

    pub fn is_destination(&self) -> bool {
        matches!(self, ActivityId::Destination(_))
    }

    pub fn job_id(&self) -> Option<JobIdx> {
        match self {
            ActivityId::Destination(job_id) => Some(*job_id),
            ActivityId::Base(_) => None,
        }
    }

    pub fn base_id(&self) -> Option<BaseIdx> {
        match self {
            ActivityId::Base(base_id) => Some(*base_id),
            ActivityId::Destination(_) => None,
        }
    }
}

impl Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityId::Destination(job_id) => write!(f, "D({job_id})"),
            ActivityId::Base(base_id) => write!(f, "B({base_id})"),
        }
    }
}
