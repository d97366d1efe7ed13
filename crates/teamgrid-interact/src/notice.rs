use crate::window::QuarterPrompt;

/// User-facing outcome of an operation, drained by the embedding surface.
/// Errors block, warnings inform, prompts ask for a window extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Warning(String),
    QuarterPrompt(QuarterPrompt),
}
