use chrono::NaiveDate;
use std::collections::HashMap;
use teamgrid_core::{GridError, GridResult};

use crate::deadline::{DeadlineEntry, DeadlineSlot};

/// Occupancy map for the per-day deadline slots above the grid. At most one
/// entry per (date, slot).
#[derive(Debug, Default)]
pub struct DeadlineBoard {
    slots: HashMap<(NaiveDate, DeadlineSlot), DeadlineEntry>,
}

impl DeadlineBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn get(&self, date: NaiveDate, slot: DeadlineSlot) -> Option<&DeadlineEntry> {
        self.slots.get(&(date, slot))
    }

    pub fn is_free(&self, date: NaiveDate, slot: DeadlineSlot) -> bool {
        !self.slots.contains_key(&(date, slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeadlineEntry> {
        self.slots.values()
    }

    /// Insert an entry fetched from the persistence collaborator.
    pub fn insert_loaded(&mut self, entry: DeadlineEntry) {
        self.slots.insert((entry.date, entry.slot), entry);
    }

    pub fn place(&mut self, entry: DeadlineEntry) -> GridResult<()> {
        let key = (entry.date, entry.slot);
        if self.slots.contains_key(&key) {
            return Err(GridError::OccupiedCell(format!(
                "deadline slot {} on {}",
                entry.slot.index(),
                entry.date
            )));
        }
        self.slots.insert(key, entry);
        Ok(())
    }

    /// Move an entry to another (date, slot). Valid iff the target is free.
    pub fn relocate(
        &mut self,
        from: (NaiveDate, DeadlineSlot),
        to: (NaiveDate, DeadlineSlot),
    ) -> GridResult<()> {
        if from == to {
            return Ok(());
        }
        if !self.slots.contains_key(&from) {
            return Err(GridError::NotFound(format!(
                "no deadline in slot {} on {}",
                from.1.index(),
                from.0
            )));
        }
        if self.slots.contains_key(&to) {
            return Err(GridError::OccupiedCell(format!(
                "deadline slot {} on {}",
                to.1.index(),
                to.0
            )));
        }
        let mut entry = self.slots.remove(&from).expect("presence checked above");
        entry.date = to.0;
        entry.slot = to.1;
        self.slots.insert(to, entry);
        Ok(())
    }

    pub fn remove(&mut self, date: NaiveDate, slot: DeadlineSlot) -> Option<DeadlineEntry> {
        self.slots.remove(&(date, slot))
    }
}
