use teamgrid_core::{GridError, GridResult};
use teamgrid_domain::{
    Assignment, AssignmentStore, CellKey, ClipboardEntry, ClipboardMode, BLOCKS_PER_DAY,
};
use teamgrid_persistence::AssignmentApi;

/// Result of a successful paste. The warning variant covers reposition mode
/// when the compensating delete of the source failed: the paste itself
/// stands, the duplicate is recoverable by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    Pasted,
    PastedWithWarning(String),
}

/// One-slot clipboard plus the copy / paste / reposition operations.
#[derive(Debug, Default)]
pub struct CopyPasteEngine {
    slot: Option<ClipboardEntry>,
}

impl CopyPasteEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self) -> Option<&ClipboardEntry> {
        self.slot.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.is_some()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Snapshot the assignment's content fields. Plain copy: no source
    /// reference, the snapshot can be pasted any number of times.
    pub fn copy(&mut self, store: &AssignmentStore, cell: &CellKey) -> GridResult<()> {
        let assignment = store
            .get(cell)
            .ok_or_else(|| GridError::NotFound(format!("no assignment at {cell}")))?;
        self.slot = Some(ClipboardEntry::copy_of(assignment.content()));
        tracing::debug!("Copied assignment at {cell}");
        Ok(())
    }

    /// Snapshot plus source reference, so the paste deletes the original.
    /// Requires a persisted source; without an id there is nothing to delete.
    pub fn copy_for_reposition(
        &mut self,
        store: &AssignmentStore,
        cell: &CellKey,
    ) -> GridResult<()> {
        let assignment = store
            .get(cell)
            .ok_or_else(|| GridError::NotFound(format!("no assignment at {cell}")))?;
        let id = assignment
            .id
            .ok_or_else(|| GridError::Validation("assignment is not persisted yet".into()))?;
        self.slot = Some(ClipboardEntry::reposition_of(
            assignment.content(),
            cell.clone(),
            id,
        ));
        tracing::debug!("Copied assignment at {cell} for reposition");
        Ok(())
    }

    /// Paste the clipboard at `target`.
    ///
    /// A local occupancy or overflow failure leaves the clipboard unchanged.
    /// Once the create succeeds, a reposition clipboard is spent: the
    /// compensating delete of the source runs as a deliberately non-atomic
    /// second step, and its failure downgrades to a warning rather than
    /// undoing the paste.
    pub async fn paste(
        &mut self,
        store: &mut AssignmentStore,
        api: &dyn AssignmentApi,
        target: CellKey,
    ) -> GridResult<PasteOutcome> {
        let entry = self
            .slot
            .as_ref()
            .ok_or_else(|| GridError::Validation("clipboard is empty".into()))?;
        let content = entry.content.clone();

        if target.block.index() + content.span.blocks() > BLOCKS_PER_DAY {
            return Err(GridError::SpanOverflow {
                block: target.block.index(),
                span: content.span.blocks(),
                max: BLOCKS_PER_DAY,
            });
        }
        if store.occupied_range(&target.person, target.date, target.block, content.span, None)
        {
            return Err(GridError::OccupiedCell(target.encode()));
        }

        let created = api.create(target.clone(), content).await?;
        store.place(target.clone(), created)?;

        // The create landed; in reposition mode the clipboard is spent now,
        // whatever happens to the delete below.
        let source = match self.slot.as_ref().map(|e| e.mode) {
            Some(ClipboardMode::Reposition) => {
                self.slot.take().and_then(|entry| entry.source)
            }
            _ => None,
        };

        let Some(source) = source else {
            return Ok(PasteOutcome::Pasted);
        };
        match api.delete(source.id).await {
            Ok(()) => {
                store.remove(&source.cell);
                tracing::debug!("Repositioned assignment to {target}");
                Ok(PasteOutcome::Pasted)
            }
            Err(e) => {
                tracing::warn!("Reposition delete of source failed: {e}");
                Ok(PasteOutcome::PastedWithWarning(
                    "copied but original could not be removed".to_string(),
                ))
            }
        }
    }
}
