pub mod json_settings_store;
pub mod memory;
pub mod traits;

pub use json_settings_store::JsonSettingsStore;
pub use memory::MemoryBackend;
pub use traits::{
    AssignmentApi, AssignmentPatch, DateSpan, DeadlineApi, DeadlinePatch, PersistedAssignment,
    SettingsStore,
};
