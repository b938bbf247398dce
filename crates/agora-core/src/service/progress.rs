//! Progress callbacks for long-running commands.

use agora_types::conversation::ProgressStage;

/// Receives the stages of a simulation or one-off question as they happen.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, stage: ProgressStage);
}

/// Discards every stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _stage: ProgressStage) {}
}
