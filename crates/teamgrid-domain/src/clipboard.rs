use serde::{Deserialize, Serialize};

use crate::assignment::{AssignmentContent, AssignmentId};
use crate::cell::CellKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardMode {
    /// Plain copy: the snapshot can be pasted repeatedly.
    Copy,
    /// Copy-then-delete-source: cleared after a single paste attempt.
    Reposition,
}

/// Where a repositioned assignment came from, so the paste can issue the
/// compensating delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardSource {
    pub cell: CellKey,
    pub id: AssignmentId,
}

/// The single clipboard slot: a content snapshot plus, in reposition mode,
/// a reference to the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardEntry {
    pub content: AssignmentContent,
    pub mode: ClipboardMode,
    pub source: Option<ClipboardSource>,
}

impl ClipboardEntry {
    pub fn copy_of(content: AssignmentContent) -> Self {
        Self {
            content,
            mode: ClipboardMode::Copy,
            source: None,
        }
    }

    pub fn reposition_of(content: AssignmentContent, cell: CellKey, id: AssignmentId) -> Self {
        Self {
            content,
            mode: ClipboardMode::Reposition,
            source: Some(ClipboardSource { cell, id }),
        }
    }

    pub fn is_reposition(&self) -> bool {
        self.mode == ClipboardMode::Reposition
    }
}
