use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use teamgrid_core::{GridError, GridResult};
use teamgrid_domain::{
    Assignment, AssignmentContent, AssignmentId, CellKey, DeadlineEntry, DeadlineId,
    BLOCKS_PER_DAY,
};
use uuid::Uuid;

use crate::traits::{
    AssignmentApi, AssignmentPatch, DateSpan, DeadlineApi, DeadlinePatch, PersistedAssignment,
    SettingsStore,
};

/// In-process backend implementing the full collaborator contract. Serves as
/// the local/offline mode and as the source of truth in tests; occupancy is
/// re-checked here so a reload after a rejected write resynchronizes the
/// client against consistent data.
#[derive(Default)]
pub struct MemoryBackend {
    assignments: Mutex<HashMap<AssignmentId, PersistedAssignment>>,
    deadlines: Mutex<HashMap<DeadlineId, DeadlineEntry>>,
    settings: Mutex<HashMap<(String, String), serde_json::Value>>,
    fail_next: Mutex<Option<GridError>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange for the next API call to fail with the given error. Used by
    /// tests to drive the reload-on-failure path.
    pub fn fail_next_with(&self, error: GridError) {
        *self.fail_next.lock().expect("fail_next lock") = Some(error);
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.lock().expect("assignments lock").len()
    }

    fn take_failure(&self) -> GridResult<()> {
        match self.fail_next.lock().expect("fail_next lock").take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn range_taken(
        assignments: &HashMap<AssignmentId, PersistedAssignment>,
        cell: &CellKey,
        span: u8,
        ignore: Option<AssignmentId>,
    ) -> bool {
        let start = cell.block.index();
        let end = start + span;
        assignments.iter().any(|(other_id, existing)| {
            if Some(*other_id) == ignore || !existing.cell.same_column(cell) {
                return false;
            }
            let other_start = existing.cell.block.index();
            let other_end = other_start + existing.assignment.span.blocks();
            start < other_end && other_start < end
        })
    }
}

#[async_trait]
impl AssignmentApi for MemoryBackend {
    async fn create(
        &self,
        cell: CellKey,
        content: AssignmentContent,
    ) -> GridResult<Assignment> {
        self.take_failure()?;
        let mut assignments = self.assignments.lock().expect("assignments lock");

        if cell.block.index() + content.span.blocks() > BLOCKS_PER_DAY {
            return Err(GridError::SpanOverflow {
                block: cell.block.index(),
                span: content.span.blocks(),
                max: BLOCKS_PER_DAY,
            });
        }
        if Self::range_taken(&assignments, &cell, content.span.blocks(), None) {
            return Err(GridError::OccupiedCell(cell.encode()));
        }

        let id = Uuid::new_v4();
        let assignment = Assignment::from_content(Some(id), content);
        assignments.insert(
            id,
            PersistedAssignment { cell, assignment: assignment.clone() },
        );
        tracing::debug!("Created assignment {id}");
        Ok(assignment)
    }

    async fn update(&self, id: AssignmentId, patch: AssignmentPatch) -> GridResult<Assignment> {
        self.take_failure()?;
        let mut assignments = self.assignments.lock().expect("assignments lock");

        let current = assignments
            .get(&id)
            .ok_or_else(|| GridError::NotFound(format!("assignment {id}")))?;
        let cell = patch.cell.clone().unwrap_or_else(|| current.cell.clone());
        let span = patch.span.unwrap_or(current.assignment.span);

        if cell.block.index() + span.blocks() > BLOCKS_PER_DAY {
            return Err(GridError::SpanOverflow {
                block: cell.block.index(),
                span: span.blocks(),
                max: BLOCKS_PER_DAY,
            });
        }
        if Self::range_taken(&assignments, &cell, span.blocks(), Some(id)) {
            return Err(GridError::OccupiedCell(cell.encode()));
        }

        let entry = assignments.get_mut(&id).expect("presence checked above");
        entry.cell = cell;
        entry.assignment.span = span;
        if let Some(label) = patch.label {
            entry.assignment.label = label;
        }
        if let Some(note) = patch.note {
            entry.assignment.note = Some(note);
        }
        if let Some(subject) = patch.subject {
            entry.assignment.subject = Some(subject);
        }
        tracing::debug!("Updated assignment {id}");
        Ok(entry.assignment.clone())
    }

    async fn delete(&self, id: AssignmentId) -> GridResult<()> {
        self.take_failure()?;
        let removed = self
            .assignments
            .lock()
            .expect("assignments lock")
            .remove(&id);
        match removed {
            Some(_) => {
                tracing::debug!("Deleted assignment {id}");
                Ok(())
            }
            None => Err(GridError::NotFound(format!("assignment {id}"))),
        }
    }

    async fn list(&self, range: DateSpan) -> GridResult<Vec<PersistedAssignment>> {
        self.take_failure()?;
        let assignments = self.assignments.lock().expect("assignments lock");
        Ok(assignments
            .values()
            .filter(|entry| range.contains(entry.cell.date))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DeadlineApi for MemoryBackend {
    async fn create(&self, mut entry: DeadlineEntry) -> GridResult<DeadlineEntry> {
        self.take_failure()?;
        let mut deadlines = self.deadlines.lock().expect("deadlines lock");

        if deadlines
            .values()
            .any(|existing| existing.date == entry.date && existing.slot == entry.slot)
        {
            return Err(GridError::OccupiedCell(format!(
                "deadline slot {} on {}",
                entry.slot.index(),
                entry.date
            )));
        }

        let id = Uuid::new_v4();
        entry.id = Some(id);
        deadlines.insert(id, entry.clone());
        tracing::debug!("Created deadline {id}");
        Ok(entry)
    }

    async fn update(&self, id: DeadlineId, patch: DeadlinePatch) -> GridResult<DeadlineEntry> {
        self.take_failure()?;
        let mut deadlines = self.deadlines.lock().expect("deadlines lock");

        let current = deadlines
            .get(&id)
            .ok_or_else(|| GridError::NotFound(format!("deadline {id}")))?;
        let date = patch.date.unwrap_or(current.date);
        let slot = patch.slot.unwrap_or(current.slot);

        if deadlines.values().any(|existing| {
            existing.id != Some(id) && existing.date == date && existing.slot == slot
        }) {
            return Err(GridError::OccupiedCell(format!(
                "deadline slot {} on {}",
                slot.index(),
                date
            )));
        }

        let entry = deadlines.get_mut(&id).expect("presence checked above");
        entry.date = date;
        entry.slot = slot;
        if let Some(kind) = patch.kind {
            entry.kind = kind;
        }
        if let Some(subject) = patch.subject {
            entry.subject = Some(subject);
        }
        if let Some(description) = patch.description {
            entry.description = description;
        }
        tracing::debug!("Updated deadline {id}");
        Ok(entry.clone())
    }

    async fn delete(&self, id: DeadlineId) -> GridResult<()> {
        self.take_failure()?;
        let removed = self.deadlines.lock().expect("deadlines lock").remove(&id);
        match removed {
            Some(_) => Ok(()),
            None => Err(GridError::NotFound(format!("deadline {id}"))),
        }
    }

    async fn list(&self, range: DateSpan) -> GridResult<Vec<DeadlineEntry>> {
        self.take_failure()?;
        let deadlines = self.deadlines.lock().expect("deadlines lock");
        Ok(deadlines
            .values()
            .filter(|entry| range.contains(entry.date))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsStore for MemoryBackend {
    async fn get(&self, scope: &str, key: &str) -> GridResult<Option<serde_json::Value>> {
        self.take_failure()?;
        let settings = self.settings.lock().expect("settings lock");
        Ok(settings.get(&(scope.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, scope: &str, key: &str, value: serde_json::Value) -> GridResult<()> {
        self.take_failure()?;
        self.settings
            .lock()
            .expect("settings lock")
            .insert((scope.to_string(), key.to_string()), value);
        Ok(())
    }
}
