//! Supervisor orchestration engine for the Waypoint trip planner.
//!
//! A run seeds a conversation with the system instruction and the user's
//! request, then alternates between one reasoning-endpoint call and one
//! concurrent dispatch batch until the endpoint answers in plain text or the
//! turn bound is reached. Progress is reported as an ordered stream of
//! [`ProgressEvent`]s that always ends with [`ProgressEvent::Done`].

mod action_registry;
mod conversation;
mod directory;
mod dispatch;
mod events;
mod supervisor;
mod turn_executor;

use thiserror::Error;
use waypoint_ai::WaypointAiError;

pub use action_registry::{
    specialist_action_name, ActionKind, ActionRegistry, SpecialistAction, PLAN_ACTION_NAME,
};
pub use conversation::{ConversationState, PlanStep, RunPhase, RunState};
pub use directory::SpecialistDirectory;
pub use dispatch::{DispatchCoordinator, DispatchOutcome};
pub use events::{ProgressEvent, ProgressSink};
pub use supervisor::{RunOutcome, RunReport, Supervisor};
pub use turn_executor::{TurnExecutor, TurnOutcome};

pub const DEFAULT_MODEL: &str = "databricks-claude-sonnet-4-5";
pub const DEFAULT_MAX_TURNS: usize = 15;
pub const DEFAULT_MAX_TOKENS: u32 = 4_096;
pub const TASK_DISPLAY_CHARS: usize = 150;

/// Public struct `SupervisorConfig` holding the per-process orchestration knobs.
///
/// # Examples
///
/// ```
/// use waypoint_supervisor::SupervisorConfig;
///
/// let config = SupervisorConfig {
///     max_turns: 4,
///     ..SupervisorConfig::default()
/// };
///
/// assert_eq!(config.max_turns, 4);
/// assert_eq!(config.max_tokens, Some(4096));
/// ```
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub model: String,
    /// Overrides the prompt rendered from the action registry.
    pub system_prompt: Option<String>,
    pub max_turns: usize,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub task_display_chars: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            max_turns: DEFAULT_MAX_TURNS,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            temperature: None,
            task_display_chars: TASK_DISPLAY_CHARS,
        }
    }
}

#[derive(Debug, Error)]
/// Conditions that terminate a run. Everything else is absorbed into the
/// conversation.
pub enum SupervisorError {
    #[error("Model API error: {0}")]
    Model(#[from] WaypointAiError),
    #[error("Supervisor reached maximum turns without completing.")]
    MaxTurnsExceeded(usize),
}

#[cfg(test)]
mod tests;
