pub mod confirm;
pub mod copier;
pub mod export;
pub mod filter;
pub mod loader;
pub mod reset;
pub mod workflow;

pub use confirm::{AlwaysYes, Confirm, ConsolePrompt, Scripted};
pub use workflow::{Migration, Stage, StageOutcome, WorkflowReport};
