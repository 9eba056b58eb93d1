//! Cutscenes: scripted sequences of stage actions.
//!
//! A cutscene walks its action list with a cursor. A `wait` action blocks the cursor until
//! it resolves (a timer, the next frame, a nested script). Any other action fires and the
//! cursor moves on in the same tick. Nothing here owns time: the host calls
//! [`Cutscene::tick`] once per frame with the elapsed milliseconds.

pub mod commands;
pub mod script;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::error::CutsceneError;
use crate::api::types::PuppetId;
use crate::core::time::Countdown;
use crate::puppet::PuppetTemplate;
use crate::stage::Stage;

pub use script::parse_script;

/// Named puppet templates a script can put on stage.
pub type Actors = HashMap<String, PuppetTemplate>;

/// Largest slot index, positive or negative, a script may name.
pub const MAX_SLOT: i32 = 1_000_000;

/// One step of a script: a command name, the wait flag, and command-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub command: String,
    #[serde(default)]
    pub wait: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Action {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            wait: false,
            fields: Map::new(),
        }
    }

    /// Block the cursor until this action resolves.
    pub fn waiting(mut self) -> Self {
        self.wait = true;
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// A puppet id, written as a number or a numeric string.
    pub fn puppet_id(&self, key: &str) -> Result<PuppetId, CutsceneError> {
        let value = self
            .field(key)
            .ok_or_else(|| self.invalid(format!("missing \"{key}\"")))?;
        let id = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        id.and_then(|id| u32::try_from(id).ok())
            .map(PuppetId)
            .ok_or_else(|| self.invalid(format!("\"{key}\" is not a puppet id: {value}")))
    }

    /// The `target` puppet id.
    pub fn target(&self) -> Result<PuppetId, CutsceneError> {
        self.puppet_id("target")
    }

    /// A text field. Numbers are accepted and rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.field(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// A numeric field, written as a number or a numeric string.
    pub fn number(&self, key: &str) -> Result<Option<f64>, CutsceneError> {
        let Some(value) = self.field(key) else {
            return Ok(None);
        };
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number
            .map(Some)
            .ok_or_else(|| self.invalid(format!("\"{key}\" is not a number: {value}")))
    }

    /// A slot index. Fractions are truncated; indices beyond `MAX_SLOT` either way are rejected.
    pub fn slot(&self, key: &str) -> Result<Option<i32>, CutsceneError> {
        match self.number(key)? {
            Some(n) if n.is_finite() && n.abs() <= f64::from(MAX_SLOT) => Ok(Some(n as i32)),
            Some(n) => Err(self.invalid(format!("\"{key}\" is out of range: {n}"))),
            None => Ok(None),
        }
    }

    /// A boolean field. The strings `"true"`/`"false"` count.
    pub fn flag(&self, key: &str) -> Result<Option<bool>, CutsceneError> {
        let Some(value) = self.field(key) else {
            return Ok(None);
        };
        match value {
            Value::Bool(b) => Ok(Some(*b)),
            Value::String(s) if s == "true" => Ok(Some(true)),
            Value::String(s) if s == "false" => Ok(Some(false)),
            _ => Err(self.invalid(format!("\"{key}\" is not a boolean: {value}"))),
        }
    }

    pub fn invalid(&self, reason: impl Into<String>) -> CutsceneError {
        CutsceneError::invalid(self.command.clone(), reason)
    }
}

/// What the stage handlers see while an action runs.
pub struct ActionContext<'a> {
    pub stage: &'a mut Stage,
    pub actors: &'a Rc<Actors>,
    pub commands: &'a Rc<CommandTable>,
}

/// How an action resolves.
pub enum Pending {
    /// Finished on the spot.
    Done,
    /// Finishes on the next tick.
    NextFrame,
    /// Finishes when the countdown runs out.
    Delay(Countdown),
    /// Finishes when the nested script finishes. The nested script is not started yet.
    Script(Box<Cutscene>),
}

/// A command handler.
pub type Command = Rc<dyn Fn(&mut ActionContext<'_>, &Action) -> Result<Pending, CutsceneError>>;

/// Command names to handlers. Hosts may register their own commands.
#[derive(Clone, Default)]
pub struct CommandTable {
    commands: HashMap<String, Command>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `run`, `add`, `set`, `remove`, `delay`, `move`, `facingLeft`, `babble`, `emote`
    /// and `jiggle`.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        commands::register_builtins(&mut table);
        table
    }

    /// Add or replace a command.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&mut ActionContext<'_>, &Action) -> Result<Pending, CutsceneError> + 'static,
    {
        self.commands.insert(name.into(), Rc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<Command> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("CommandTable").field("commands", &names).finish()
    }
}

/// Observable state of a cutscene.
#[derive(Debug, Clone, PartialEq)]
pub enum CutsceneStatus {
    Idle,
    Running,
    Finished,
    Failed(CutsceneError),
}

enum State {
    Idle,
    Running,
    Waiting(Blocker),
    /// Out of actions; completion fires on the next tick.
    Completing,
    Finished,
    Failed(CutsceneError),
}

enum Blocker {
    NextFrame,
    Delay(Countdown),
    Script(Box<Cutscene>),
}

/// A running (or runnable) script.
pub struct Cutscene {
    actions: Vec<Action>,
    cursor: usize,
    actors: Rc<Actors>,
    commands: Rc<CommandTable>,
    state: State,
    /// Nested scripts started without waiting.
    background: Vec<Cutscene>,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl Cutscene {
    pub fn new(actions: Vec<Action>, actors: Rc<Actors>) -> Self {
        Self {
            actions,
            cursor: 0,
            actors,
            commands: Rc::new(CommandTable::with_builtins()),
            state: State::Idle,
            background: Vec::new(),
            on_complete: None,
        }
    }

    /// Load a JSON array of action records.
    pub fn from_json(json: &str, actors: Rc<Actors>) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?, actors))
    }

    pub fn with_commands(mut self, commands: Rc<CommandTable>) -> Self {
        self.commands = commands;
        self
    }

    /// Called once, on the tick after the last action resolves. Not called on failure.
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Index of the next action to run.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> CutsceneStatus {
        match &self.state {
            State::Idle => CutsceneStatus::Idle,
            State::Running | State::Waiting(_) | State::Completing => CutsceneStatus::Running,
            State::Finished => CutsceneStatus::Finished,
            State::Failed(err) => CutsceneStatus::Failed(err.clone()),
        }
    }

    /// Finished or failed, with no parallel tracks left running.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Finished | State::Failed(_)) && self.background.is_empty()
    }

    /// Run actions up to the first one that waits.
    pub fn start(&mut self, stage: &mut Stage) -> Result<(), CutsceneError> {
        if !matches!(self.state, State::Idle) {
            return Ok(());
        }
        log::info!("cutscene started with {} actions", self.actions.len());
        self.state = State::Running;
        self.advance(stage)
    }

    /// Advance timers and nested scripts by `delta` ms, resuming the cursor when the
    /// blocking action resolves.
    pub fn tick(&mut self, stage: &mut Stage, delta: f32) -> Result<(), CutsceneError> {
        self.background.retain_mut(|track| {
            if let Err(err) = track.tick(stage, delta) {
                log::error!("parallel script failed: {}", err);
            }
            !track.is_done()
        });

        match std::mem::replace(&mut self.state, State::Running) {
            State::Running => self.advance(stage),
            State::Waiting(Blocker::NextFrame) => self.advance(stage),
            State::Waiting(Blocker::Delay(mut countdown)) => {
                if countdown.tick(delta) {
                    self.advance(stage)
                } else {
                    self.state = State::Waiting(Blocker::Delay(countdown));
                    Ok(())
                }
            }
            State::Waiting(Blocker::Script(mut nested)) => {
                if let Err(err) = nested.tick(stage, delta) {
                    return Err(self.fail(CutsceneError::Nested(Box::new(err))));
                }
                if nested.is_done() {
                    self.advance(stage)
                } else {
                    self.state = State::Waiting(Blocker::Script(nested));
                    Ok(())
                }
            }
            State::Completing => {
                self.state = State::Finished;
                log::info!("cutscene finished");
                if let Some(callback) = self.on_complete.take() {
                    callback();
                }
                Ok(())
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    fn advance(&mut self, stage: &mut Stage) -> Result<(), CutsceneError> {
        while let Some(action) = self.actions.get(self.cursor).cloned() {
            let Some(command) = self.commands.get(&action.command) else {
                log::warn!("unknown cutscene command \"{}\"; ending script", action.command);
                self.state = State::Completing;
                return Ok(());
            };

            let mut ctx = ActionContext {
                stage: &mut *stage,
                actors: &self.actors,
                commands: &self.commands,
            };
            let pending = match command(&mut ctx, &action) {
                Ok(pending) => pending,
                Err(err) => return Err(self.fail(err)),
            };
            self.cursor += 1;

            let blocker = match pending {
                Pending::Done => None,
                Pending::NextFrame => Some(Blocker::NextFrame),
                Pending::Delay(countdown) => Some(Blocker::Delay(countdown)),
                Pending::Script(mut nested) => {
                    let started = nested.start(stage);
                    if action.wait {
                        if let Err(err) = started {
                            return Err(self.fail(CutsceneError::Nested(Box::new(err))));
                        }
                        Some(Blocker::Script(nested))
                    } else {
                        match started {
                            Ok(()) => self.background.push(*nested),
                            Err(err) => log::error!("parallel script failed: {}", err),
                        }
                        None
                    }
                }
            };

            if action.wait {
                if let Some(blocker) = blocker {
                    self.state = State::Waiting(blocker);
                    return Ok(());
                }
            }
        }

        self.state = State::Completing;
        Ok(())
    }

    fn fail(&mut self, err: CutsceneError) -> CutsceneError {
        log::error!("cutscene failed at action {}: {}", self.cursor, err);
        self.state = State::Failed(err.clone());
        err
    }
}

impl fmt::Debug for Cutscene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cutscene")
            .field("actions", &self.actions.len())
            .field("cursor", &self.cursor)
            .field("status", &self.status())
            .field("background", &self.background.len())
            .finish_non_exhaustive()
    }
}
