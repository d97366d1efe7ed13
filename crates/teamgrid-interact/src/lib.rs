pub mod controller;
pub mod drag;
pub mod engine;
pub mod gesture;
pub mod notice;
pub mod reload;
pub mod roster;
pub mod window;

pub use controller::{Action, GridController};
pub use drag::{DragCommit, DragController, DragState, EdgeGrip};
pub use engine::{CopyPasteEngine, PasteOutcome};
pub use gesture::{ClickGestureResolver, GestureEvent, GestureTarget, PointerKind};
pub use notice::Notice;
pub use reload::reload_window;
pub use roster::Roster;
pub use window::{QuarterPrompt, QuarterWindowManager, WindowEdge};
