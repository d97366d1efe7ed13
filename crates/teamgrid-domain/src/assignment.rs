use serde::{Deserialize, Serialize};
use teamgrid_core::{GridError, GridResult};
use uuid::Uuid;

use crate::cell::BLOCKS_PER_DAY;

pub type AssignmentId = Uuid;

/// What a piece of work is about: a project task or client-level work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectRef {
    Project(Uuid),
    Client(Uuid),
}

/// Number of consecutive blocks an assignment occupies within one day, 1..=4.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Span(u8);

impl Span {
    pub const ONE: Span = Span(1);

    pub fn new(span: u8) -> GridResult<Self> {
        if (1..=BLOCKS_PER_DAY).contains(&span) {
            Ok(Self(span))
        } else {
            Err(GridError::Validation(format!(
                "span {} out of range 1..={}",
                span, BLOCKS_PER_DAY
            )))
        }
    }

    /// Clamp an arbitrary signed span value into 1..=max.
    pub fn clamped(raw: i16, max: u8) -> Self {
        let max = max.clamp(1, BLOCKS_PER_DAY);
        Self(raw.clamp(1, max as i16) as u8)
    }

    pub fn blocks(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Span {
    type Error = GridError;

    fn try_from(value: u8) -> GridResult<Self> {
        Self::new(value)
    }
}

impl From<Span> for u8 {
    fn from(value: Span) -> u8 {
        value.0
    }
}

/// Content fields of an assignment, without identity or position. This is
/// what the clipboard snapshots and what a create call sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentContent {
    pub subject: Option<SubjectRef>,
    pub label: String,
    pub note: Option<String>,
    pub span: Span,
}

/// A piece of work placed on the grid. `id` is present once the entry has
/// been persisted. `subject == None` marks a status entry (absence or other
/// unavailability) rather than a project task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Option<AssignmentId>,
    pub subject: Option<SubjectRef>,
    pub label: String,
    pub note: Option<String>,
    pub span: Span,
}

impl Assignment {
    pub fn task(subject: SubjectRef, label: impl Into<String>, span: Span) -> Self {
        Self {
            id: None,
            subject: Some(subject),
            label: label.into(),
            note: None,
            span,
        }
    }

    pub fn status(label: impl Into<String>, span: Span) -> Self {
        Self {
            id: None,
            subject: None,
            label: label.into(),
            note: None,
            span,
        }
    }

    pub fn from_content(id: Option<AssignmentId>, content: AssignmentContent) -> Self {
        Self {
            id,
            subject: content.subject,
            label: content.label,
            note: content.note,
            span: content.span,
        }
    }

    pub fn content(&self) -> AssignmentContent {
        AssignmentContent {
            subject: self.subject,
            label: self.label.clone(),
            note: self.note.clone(),
            span: self.span,
        }
    }

    pub fn is_status(&self) -> bool {
        self.subject.is_none()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
