use crate::api::types::PuppetId;

pub type StageResult<T> = Result<T, StageError>;

/// Failures of stage-level puppet bookkeeping.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("no puppet with id {0} is on stage")]
    PuppetNotFound(PuppetId),

    #[error("a puppet with id {0} is already on stage")]
    IdOccupied(PuppetId),
}

/// Failures that stop a cutscene at the offending action.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CutsceneError {
    #[error("unknown actor \"{0}\"")]
    UnknownActor(String),

    #[error("cutscene target {0} is not on stage")]
    TargetNotFound(PuppetId),

    #[error("cannot add puppet: id {0} is already on stage")]
    IdOccupied(PuppetId),

    #[error("invalid \"{command}\" action: {reason}")]
    InvalidAction { command: String, reason: String },

    #[error("nested script failed: {0}")]
    Nested(Box<CutsceneError>),
}

impl CutsceneError {
    pub fn invalid(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

impl From<StageError> for CutsceneError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::PuppetNotFound(id) => Self::TargetNotFound(id),
            StageError::IdOccupied(id) => Self::IdOccupied(id),
        }
    }
}

/// Failures parsing the line-oriented cutscene text format.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: action must end with ';' or ','")]
    MissingTerminator { line: usize },

    #[error("line {line}: \"{command}\" needs a {argument}")]
    MissingArgument {
        line: usize,
        command: String,
        argument: &'static str,
    },

    #[error("line {line}: empty action")]
    EmptyAction { line: usize },
}

/// Failures reported by a renderer backend.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("snapshot unavailable: {0}")]
    Snapshot(String),
}
