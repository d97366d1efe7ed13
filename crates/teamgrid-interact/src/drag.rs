use chrono::NaiveDate;
use teamgrid_core::{GridError, GridResult};
use teamgrid_domain::{
    Assignment, AssignmentId, AssignmentStore, CellKey, DeadlineBoard, DeadlineId,
    DeadlineSlot, Span, BLOCKS_PER_DAY,
};

/// Which edge of an assignment an edge-drag grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeGrip {
    Top,
    Bottom,
}

#[derive(Debug, Clone)]
pub struct TaskDrag {
    pub source: CellKey,
    pub id: AssignmentId,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EdgeDrag {
    pub grip: EdgeGrip,
    pub id: AssignmentId,
    /// Origin and span captured when the drag started; the release diff and
    /// any cancel revert against these.
    pub start_cell: CellKey,
    pub start_span: Span,
    /// Live origin, tracked across top-edge relocations.
    pub current_origin: CellKey,
}

#[derive(Debug, Clone)]
pub struct DeadlineDrag {
    pub from: (NaiveDate, DeadlineSlot),
    pub id: DeadlineId,
}

#[derive(Debug, Clone)]
pub struct RosterDrag {
    pub from_index: usize,
}

/// One active drag at a time; a new drag cannot start until the current one
/// drops or cancels.
#[derive(Debug, Clone, Default)]
pub enum DragState {
    #[default]
    Idle,
    Task(TaskDrag),
    Edge(EdgeDrag),
    Deadline(DeadlineDrag),
    Roster(RosterDrag),
}

/// What a finished drag asks the persistence collaborator to do. Local
/// state has already been mutated optimistically when a commit is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragCommit {
    MoveAssignment {
        id: AssignmentId,
        to: CellKey,
    },
    ResizeAssignment {
        id: AssignmentId,
        span: Span,
        /// Present when a top-edge drag moved the origin.
        new_origin: Option<CellKey>,
    },
    MoveDeadline {
        id: DeadlineId,
        date: NaiveDate,
        slot: DeadlineSlot,
    },
}

/// State machine for task relocation, edge resizing, deadline-slot moves,
/// and roster reordering. Edge drags mutate the store on every pointer move
/// without touching the network; the single persistence commit is produced
/// at release, and only when something actually changed.
#[derive(Debug)]
pub struct DragController {
    state: DragState,
    block_height_px: f32,
}

impl DragController {
    pub fn new(block_height_px: f32) -> Self {
        Self {
            state: DragState::Idle,
            block_height_px,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    fn ensure_idle(&self) -> GridResult<()> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(GridError::Validation("a drag is already active".into()))
        }
    }

    // --- task relocation ---

    /// Start dragging the assignment at `source`. Only persisted entries can
    /// be dragged; an unsaved one has no id to commit against.
    pub fn begin_task_drag(
        &mut self,
        store: &AssignmentStore,
        source: CellKey,
    ) -> GridResult<()> {
        self.ensure_idle()?;
        let assignment = store
            .get(&source)
            .ok_or_else(|| GridError::NotFound(format!("no assignment at {source}")))?;
        let id = persisted_id(assignment)?;
        self.state = DragState::Task(TaskDrag {
            source,
            id,
            span: assignment.span,
        });
        Ok(())
    }

    /// Whether `to` is a legal drop for the current task drag: the target
    /// range stays inside the day and holds nothing but the dragged item.
    pub fn can_drop_task(&self, store: &AssignmentStore, to: &CellKey) -> bool {
        let DragState::Task(drag) = &self.state else {
            return false;
        };
        if to.block.index() + drag.span.blocks() > BLOCKS_PER_DAY {
            return false;
        }
        !store.occupied_range(&to.person, to.date, to.block, drag.span, Some(&drag.source))
    }

    /// Drop the dragged task. An invalid target cancels the drag and leaves
    /// the store untouched (no commit).
    pub fn drop_task(
        &mut self,
        store: &mut AssignmentStore,
        to: CellKey,
    ) -> GridResult<Option<DragCommit>> {
        if !matches!(self.state, DragState::Task(_)) {
            return Err(GridError::Validation("no task drag active".into()));
        }
        if !self.can_drop_task(store, &to) {
            tracing::debug!("Task drop on invalid target {to}; drag cancelled");
            self.state = DragState::Idle;
            return Ok(None);
        }
        let DragState::Task(drag) = std::mem::take(&mut self.state) else {
            unreachable!("matched above");
        };
        if to == drag.source {
            return Ok(None);
        }
        store.move_assignment(&drag.source, to.clone())?;
        Ok(Some(DragCommit::MoveAssignment { id: drag.id, to }))
    }

    // --- edge resize ---

    pub fn begin_edge_drag(
        &mut self,
        store: &AssignmentStore,
        cell: CellKey,
        grip: EdgeGrip,
    ) -> GridResult<()> {
        self.ensure_idle()?;
        let assignment = store
            .get(&cell)
            .ok_or_else(|| GridError::NotFound(format!("no assignment at {cell}")))?;
        let id = persisted_id(assignment)?;
        self.state = DragState::Edge(EdgeDrag {
            grip,
            id,
            start_cell: cell.clone(),
            start_span: assignment.span,
            current_origin: cell,
        });
        Ok(())
    }

    /// Apply the pointer's primary-axis displacement since drag start,
    /// in pixels with down positive. Converted to whole blocks; the store
    /// mutation is local only. Running into a neighbor keeps the last
    /// valid extent instead of failing the drag.
    pub fn update_edge_drag(
        &mut self,
        store: &mut AssignmentStore,
        displacement_px: f32,
    ) -> GridResult<()> {
        let DragState::Edge(drag) = &mut self.state else {
            return Err(GridError::Validation("no edge drag active".into()));
        };
        let blocks = (displacement_px / self.block_height_px).round() as i8;

        match drag.grip {
            EdgeGrip::Bottom => {
                let current = store
                    .get(&drag.start_cell)
                    .ok_or_else(|| {
                        GridError::Internal("edge-dragged assignment vanished".into())
                    })?
                    .span;
                let desired = drag.start_span.blocks() as i8 + blocks;
                let step = desired - current.blocks() as i8;
                if step != 0 {
                    match store.resize_from_bottom_edge(&drag.start_cell, step) {
                        Ok(_) | Err(GridError::OccupiedCell(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
            }
            EdgeGrip::Top => {
                // Up is negative displacement; a positive delta grows the
                // assignment upward.
                match store.resize_from_top_edge(&drag.start_cell, -blocks) {
                    Ok(origin) => drag.current_origin = origin,
                    Err(GridError::OccupiedCell(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// Release the edge drag. Diffs the final origin/span against the values
    /// captured at drag start and yields at most one commit; if nothing
    /// changed, no persistence call is made at all.
    pub fn release_edge_drag(
        &mut self,
        store: &AssignmentStore,
    ) -> GridResult<Option<DragCommit>> {
        if !matches!(self.state, DragState::Edge(_)) {
            return Err(GridError::Validation("no edge drag active".into()));
        }
        let DragState::Edge(drag) = std::mem::take(&mut self.state) else {
            unreachable!("matched above");
        };
        let assignment = store.get(&drag.current_origin).ok_or_else(|| {
            GridError::Internal("edge-dragged assignment vanished".into())
        })?;

        let span_changed = assignment.span != drag.start_span;
        let origin_changed = drag.current_origin != drag.start_cell;
        if !span_changed && !origin_changed {
            return Ok(None);
        }
        Ok(Some(DragCommit::ResizeAssignment {
            id: drag.id,
            span: assignment.span,
            new_origin: origin_changed.then(|| drag.current_origin.clone()),
        }))
    }

    /// Abort the active drag. For an edge drag the local resize steps are
    /// rolled back to the origin and span captured at drag start.
    pub fn cancel(&mut self, store: &mut AssignmentStore) {
        if let DragState::Edge(drag) = std::mem::take(&mut self.state) {
            if let Some(mut assignment) = store.remove(&drag.current_origin) {
                assignment.span = drag.start_span;
                store.insert_loaded(drag.start_cell, assignment);
            }
        }
    }

    // --- deadline relocation ---

    pub fn begin_deadline_drag(
        &mut self,
        board: &DeadlineBoard,
        from: (NaiveDate, DeadlineSlot),
    ) -> GridResult<()> {
        self.ensure_idle()?;
        let entry = board.get(from.0, from.1).ok_or_else(|| {
            GridError::NotFound(format!("no deadline in slot {} on {}", from.1.index(), from.0))
        })?;
        let id = entry
            .id
            .ok_or_else(|| GridError::Validation("deadline is not persisted yet".into()))?;
        self.state = DragState::Deadline(DeadlineDrag { from, id });
        Ok(())
    }

    /// Drop the dragged deadline. Valid iff the target slot is empty; the
    /// commit carries date and slot together.
    pub fn drop_deadline(
        &mut self,
        board: &mut DeadlineBoard,
        to: (NaiveDate, DeadlineSlot),
    ) -> GridResult<Option<DragCommit>> {
        let DragState::Deadline(drag) = &self.state else {
            return Err(GridError::Validation("no deadline drag active".into()));
        };
        if to != drag.from && !board.is_free(to.0, to.1) {
            tracing::debug!("Deadline drop on occupied slot; drag cancelled");
            self.state = DragState::Idle;
            return Ok(None);
        }
        let DragState::Deadline(drag) = std::mem::take(&mut self.state) else {
            unreachable!("matched above");
        };
        if to == drag.from {
            return Ok(None);
        }
        board.relocate(drag.from, to)?;
        Ok(Some(DragCommit::MoveDeadline {
            id: drag.id,
            date: to.0,
            slot: to.1,
        }))
    }

    // --- roster reordering ---

    pub fn begin_roster_drag(&mut self, from_index: usize) -> GridResult<()> {
        self.ensure_idle()?;
        self.state = DragState::Roster(RosterDrag { from_index });
        Ok(())
    }

    /// Drop the dragged roster row at a new index. Purely local; the order
    /// is persisted only on an explicit save.
    pub fn drop_roster<T>(&mut self, roster: &mut Vec<T>, to_index: usize) -> GridResult<()> {
        if !matches!(self.state, DragState::Roster(_)) {
            return Err(GridError::Validation("no roster drag active".into()));
        }
        let DragState::Roster(drag) = std::mem::take(&mut self.state) else {
            unreachable!("matched above");
        };
        if drag.from_index >= roster.len() || drag.from_index == to_index {
            return Ok(());
        }
        let person = roster.remove(drag.from_index);
        let to_index = to_index.min(roster.len());
        roster.insert(to_index, person);
        Ok(())
    }
}

/// Shared check used by begin paths that need a persisted assignment.
pub(crate) fn persisted_id(assignment: &Assignment) -> GridResult<AssignmentId> {
    assignment
        .id
        .ok_or_else(|| GridError::Validation("assignment is not persisted yet".into()))
}
