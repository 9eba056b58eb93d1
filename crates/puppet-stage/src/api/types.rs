use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage-assigned handle for a live puppet.
/// Templates and detached puppets carry no id at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuppetId(pub u32);

impl fmt::Display for PuppetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a node in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Handle returned when registering a generic puppet listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u32);

/// Payload handed to generic puppet listeners.
/// `x`/`y` are in stage (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PuppetEvent {
    pub puppet: PuppetId,
    pub x: f32,
    pub y: f32,
}
