use chrono::NaiveDate;
use std::collections::HashMap;
use teamgrid_core::{GridError, GridResult};

use crate::assignment::{Assignment, Span};
use crate::cell::{BlockIndex, CellKey, PersonId, BLOCKS_PER_DAY};

/// In-memory occupancy map from cell identity to assignment.
///
/// An assignment stored under (person, date, block) with span `s` claims
/// blocks `block..block+s`. The store enforces that claimed ranges never
/// overlap and never run past the last block of the day. Every mutating
/// operation either fully applies or leaves the map untouched.
#[derive(Debug, Default)]
pub struct AssignmentStore {
    cells: HashMap<CellKey, Assignment>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn get(&self, cell: &CellKey) -> Option<&Assignment> {
        self.cells.get(cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &Assignment)> {
        self.cells.iter()
    }

    /// Insert an entry fetched from the persistence collaborator. The server
    /// is the source of truth on reload, so no occupancy check is applied.
    pub fn insert_loaded(&mut self, cell: CellKey, assignment: Assignment) {
        self.cells.insert(cell, assignment);
    }

    pub fn remove(&mut self, cell: &CellKey) -> Option<Assignment> {
        self.cells.remove(cell)
    }

    /// The assignment whose claimed range covers the given block, together
    /// with its origin cell.
    pub fn assignment_at(
        &self,
        person: &PersonId,
        date: NaiveDate,
        block: BlockIndex,
    ) -> Option<(&CellKey, &Assignment)> {
        self.cells.iter().find(|(key, assignment)| {
            key.person == *person
                && key.date == date
                && key.block.index() <= block.index()
                && block.index() < key.block.index() + assignment.span.blocks()
        })
    }

    /// True if any block in `block..block+span` is already claimed by an
    /// assignment other than the one at `ignore` (the item being moved).
    pub fn occupied_range(
        &self,
        person: &PersonId,
        date: NaiveDate,
        block: BlockIndex,
        span: Span,
        ignore: Option<&CellKey>,
    ) -> bool {
        let start = block.index();
        let end = (start + span.blocks()).min(BLOCKS_PER_DAY);
        (start..end).any(|b| {
            let b = BlockIndex::new(b).expect("block within day");
            match self.assignment_at(person, date, b) {
                Some((origin, _)) => Some(origin) != ignore,
                None => false,
            }
        })
    }

    /// Place an assignment at a cell. Fails if the claimed range runs past
    /// the day or any of its blocks is taken.
    pub fn place(&mut self, cell: CellKey, assignment: Assignment) -> GridResult<()> {
        Self::check_overflow(cell.block, assignment.span)?;
        if self.occupied_range(&cell.person, cell.date, cell.block, assignment.span, None) {
            return Err(GridError::OccupiedCell(cell.encode()));
        }
        self.cells.insert(cell, assignment);
        Ok(())
    }

    /// Relocate an assignment to a new cell, keeping its content and span.
    /// The source cell is not a conflict during the occupancy scan.
    pub fn move_assignment(&mut self, from: &CellKey, to: CellKey) -> GridResult<()> {
        let assignment = self
            .cells
            .get(from)
            .ok_or_else(|| GridError::NotFound(format!("no assignment at {from}")))?;
        let span = assignment.span;

        Self::check_overflow(to.block, span)?;
        if self.occupied_range(&to.person, to.date, to.block, span, Some(from)) {
            return Err(GridError::OccupiedCell(to.encode()));
        }

        let assignment = self.cells.remove(from).expect("presence checked above");
        self.cells.insert(to, assignment);
        Ok(())
    }

    /// Grow or shrink the span from the bottom edge. `delta` is in whole
    /// blocks relative to the current span, positive growing downward. The
    /// origin never changes; the result is clamped into 1..=(blocks left in
    /// the day). Returns the new span.
    pub fn resize_from_bottom_edge(&mut self, cell: &CellKey, delta: i8) -> GridResult<Span> {
        let assignment = self
            .cells
            .get(cell)
            .ok_or_else(|| GridError::NotFound(format!("no assignment at {cell}")))?;

        let max = BLOCKS_PER_DAY - cell.block.index();
        let new_span = Span::clamped(assignment.span.blocks() as i16 + delta as i16, max);

        if new_span.blocks() > assignment.span.blocks()
            && self.grown_range_occupied(cell, cell.block, new_span)
        {
            return Err(GridError::OccupiedCell(cell.encode()));
        }

        self.cells
            .get_mut(cell)
            .expect("presence checked above")
            .span = new_span;
        Ok(new_span)
    }

    /// Move the top edge while holding the bottom edge fixed. `cell` is the
    /// origin captured when the drag started and `delta` the whole blocks
    /// the edge has moved up since then (negative moves it down). Earlier
    /// steps of the same drag may already have relocated the origin, so the
    /// live entry is located by scanning the (person, date) column rather
    /// than trusting the possibly stale key. Returns the current origin cell.
    pub fn resize_from_top_edge(&mut self, cell: &CellKey, delta: i8) -> GridResult<CellKey> {
        let (origin, span) = self.locate_for_top_resize(cell)?;
        let bottom = origin.block.index() + span.blocks() - 1;

        let new_block = (cell.block.index() as i8 - delta).clamp(0, bottom as i8) as u8;
        let new_block = BlockIndex::new(new_block)?;
        let new_span = Span::new(bottom - new_block.index() + 1)?;
        let new_origin = origin.at_block(new_block);

        if new_block.index() < origin.block.index()
            && self.grown_range_occupied(&origin, new_block, new_span)
        {
            return Err(GridError::OccupiedCell(new_origin.encode()));
        }

        if new_origin == origin {
            return Ok(origin);
        }
        let mut assignment = self.cells.remove(&origin).expect("located above");
        assignment.span = new_span;
        self.cells.insert(new_origin.clone(), assignment);
        Ok(new_origin)
    }

    /// Find the live entry for a top-edge resize. The exact key wins; when
    /// the origin has drifted, the entry covering the reference block is
    /// next (origin moved up); otherwise the nearest origin below the
    /// reference block (origin moved down — the vacated blocks above it
    /// cannot have been reclaimed mid-drag).
    fn locate_for_top_resize(&self, cell: &CellKey) -> GridResult<(CellKey, Span)> {
        if let Some(assignment) = self.cells.get(cell) {
            return Ok((cell.clone(), assignment.span));
        }
        if let Some((origin, assignment)) =
            self.assignment_at(&cell.person, cell.date, cell.block)
        {
            return Ok((origin.clone(), assignment.span));
        }
        self.cells
            .iter()
            .filter(|(key, _)| key.same_column(cell) && key.block > cell.block)
            .min_by_key(|(key, _)| key.block)
            .map(|(key, assignment)| (key.clone(), assignment.span))
            .ok_or_else(|| GridError::NotFound(format!("no assignment near {cell}")))
    }

    fn grown_range_occupied(&self, origin: &CellKey, block: BlockIndex, span: Span) -> bool {
        self.occupied_range(&origin.person, origin.date, block, span, Some(origin))
    }

    fn check_overflow(block: BlockIndex, span: Span) -> GridResult<()> {
        if block.index() + span.blocks() > BLOCKS_PER_DAY {
            return Err(GridError::SpanOverflow {
                block: block.index(),
                span: span.blocks(),
                max: BLOCKS_PER_DAY,
            });
        }
        Ok(())
    }
}
