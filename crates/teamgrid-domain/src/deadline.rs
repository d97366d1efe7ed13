use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use teamgrid_core::{GridError, GridResult};
use uuid::Uuid;

use crate::assignment::SubjectRef;

pub type DeadlineId = Uuid;

/// Number of per-day positions reserved for deadline entries, separate from
/// the person/block assignment grid.
pub const SLOTS_PER_DAY: u8 = 2;

/// One of the two fixed per-day deadline positions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct DeadlineSlot(u8);

impl DeadlineSlot {
    pub fn new(slot: u8) -> GridResult<Self> {
        if slot < SLOTS_PER_DAY {
            Ok(Self(slot))
        } else {
            Err(GridError::Validation(format!(
                "deadline slot {} out of range 0..{}",
                slot, SLOTS_PER_DAY
            )))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for DeadlineSlot {
    type Error = GridError;

    fn try_from(value: u8) -> GridResult<Self> {
        Self::new(value)
    }
}

impl From<DeadlineSlot> for u8 {
    fn from(value: DeadlineSlot) -> u8 {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeadlineKind {
    Deadline,
    InternalDeadline,
    Milestone,
}

/// A dated marker shown above the grid: client deadline, internal deadline,
/// or milestone. At most one entry per (date, slot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineEntry {
    pub id: Option<DeadlineId>,
    pub date: NaiveDate,
    pub slot: DeadlineSlot,
    pub kind: DeadlineKind,
    pub subject: Option<SubjectRef>,
    pub description: String,
}

impl DeadlineEntry {
    pub fn new(
        date: NaiveDate,
        slot: DeadlineSlot,
        kind: DeadlineKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            date,
            slot,
            kind,
            subject: None,
            description: description.into(),
        }
    }

    pub fn with_subject(mut self, subject: SubjectRef) -> Self {
        self.subject = Some(subject);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_bounds() {
        assert!(DeadlineSlot::new(0).is_ok());
        assert!(DeadlineSlot::new(1).is_ok());
        assert!(DeadlineSlot::new(2).is_err());
    }
}
