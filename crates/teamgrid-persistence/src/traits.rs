use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use teamgrid_core::GridResult;
use teamgrid_domain::{
    Assignment, AssignmentContent, AssignmentId, CellKey, DeadlineEntry, DeadlineId,
    DeadlineKind, DeadlineSlot, Span, SubjectRef,
};

/// Inclusive date range, used for windowed list calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateSpan {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// An assignment as the collaborator returns it: content plus the cell it
/// occupies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAssignment {
    pub cell: CellKey,
    pub assignment: Assignment,
}

/// Partial update for an assignment. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignmentPatch {
    pub cell: Option<CellKey>,
    pub span: Option<Span>,
    pub label: Option<String>,
    pub note: Option<String>,
    pub subject: Option<SubjectRef>,
}

impl AssignmentPatch {
    pub fn relocate(cell: CellKey) -> Self {
        Self { cell: Some(cell), ..Self::default() }
    }

    pub fn resize(span: Span, cell: Option<CellKey>) -> Self {
        Self { span: Some(span), cell, ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.cell.is_none()
            && self.span.is_none()
            && self.label.is_none()
            && self.note.is_none()
            && self.subject.is_none()
    }
}

/// Partial update for a deadline entry. A relocation carries date and slot
/// together in one call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadlinePatch {
    pub date: Option<NaiveDate>,
    pub slot: Option<DeadlineSlot>,
    pub kind: Option<DeadlineKind>,
    pub subject: Option<SubjectRef>,
    pub description: Option<String>,
}

impl DeadlinePatch {
    pub fn relocate(date: NaiveDate, slot: DeadlineSlot) -> Self {
        Self {
            date: Some(date),
            slot: Some(slot),
            ..Self::default()
        }
    }
}

/// Remote CRUD surface for assignments. Failures are either validation
/// errors (the request itself was rejected) or transport errors (network or
/// server trouble); callers treat the two classes differently.
#[async_trait]
pub trait AssignmentApi: Send + Sync {
    async fn create(&self, cell: CellKey, content: AssignmentContent)
        -> GridResult<Assignment>;
    async fn update(&self, id: AssignmentId, patch: AssignmentPatch) -> GridResult<Assignment>;
    async fn delete(&self, id: AssignmentId) -> GridResult<()>;
    async fn list(&self, range: DateSpan) -> GridResult<Vec<PersistedAssignment>>;
}

/// Remote CRUD surface for deadline entries, keyed by (date, slot).
#[async_trait]
pub trait DeadlineApi: Send + Sync {
    async fn create(&self, entry: DeadlineEntry) -> GridResult<DeadlineEntry>;
    async fn update(&self, id: DeadlineId, patch: DeadlinePatch) -> GridResult<DeadlineEntry>;
    async fn delete(&self, id: DeadlineId) -> GridResult<()>;
    async fn list(&self, range: DateSpan) -> GridResult<Vec<DeadlineEntry>>;
}

/// Durable key/value settings, scoped. Used for the quarter window and the
/// roster order. A missing key reads as `Ok(None)`.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, scope: &str, key: &str) -> GridResult<Option<serde_json::Value>>;
    async fn set(&self, scope: &str, key: &str, value: serde_json::Value) -> GridResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_span_normalizes_order() {
        let a = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let span = DateSpan::new(b, a);
        assert_eq!(span.from, a);
        assert_eq!(span.to, b);
        assert!(span.contains(a));
        assert!(span.contains(b));
        assert!(!span.contains(b + chrono::Duration::days(1)));
    }

    #[test]
    fn test_empty_patch() {
        assert!(AssignmentPatch::default().is_empty());
        assert!(!AssignmentPatch::resize(Span::ONE, None).is_empty());
    }
}
