pub mod assignment;
pub mod cell;
pub mod clipboard;
pub mod deadline;
pub mod deadline_board;
pub mod quarter;
pub mod store;

pub use assignment::{Assignment, AssignmentContent, AssignmentId, Span, SubjectRef};
pub use cell::{BlockIndex, CellKey, PersonId, BLOCKS_PER_DAY};
pub use clipboard::{ClipboardEntry, ClipboardMode, ClipboardSource};
pub use deadline::{DeadlineEntry, DeadlineId, DeadlineKind, DeadlineSlot, SLOTS_PER_DAY};
pub use deadline_board::DeadlineBoard;
pub use quarter::Quarter;
pub use store::AssignmentStore;
