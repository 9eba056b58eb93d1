// extensions/tween.rs
//
// Node tweens: alpha and scale transitions played on scene graph nodes.
// Used for layer entrance animations; times are in milliseconds.
//
// Usage:
//   let mut tweens = TweenState::new();
//   tweens.add(&mut graph, node, Tween::alpha(0.0, 1.0, 300.0, Easing::QuadOut));
//   tweens.tick(dt_ms, &mut graph);

use glam::Vec2;

use super::easing::{ease, Easing};
use crate::api::types::NodeId;
use crate::core::scene::SceneGraph;

/// What property a tween animates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenTarget {
    /// Animate node alpha.
    Alpha { from: f32, to: f32 },
    /// Animate node scale.
    Scale { from: Vec2, to: Vec2 },
}

/// A single tween animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: TweenTarget,
    /// Duration in milliseconds.
    pub duration: f32,
    /// Milliseconds to hold the `from` value before starting.
    pub delay: f32,
    /// Elapsed time, delay included.
    pub elapsed: f32,
    pub easing: Easing,
}

impl Tween {
    fn new(target: TweenTarget, duration: f32, easing: Easing) -> Self {
        Self {
            target,
            duration,
            delay: 0.0,
            elapsed: 0.0,
            easing,
        }
    }

    /// Create an alpha tween.
    pub fn alpha(from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        Self::new(TweenTarget::Alpha { from, to }, duration, easing)
    }

    /// Create a scale tween.
    pub fn scale(from: Vec2, to: Vec2, duration: f32, easing: Easing) -> Self {
        Self::new(TweenTarget::Scale { from, to }, duration, easing)
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Normalized progress [0, 1], excluding the delay.
    pub fn progress(&self) -> f32 {
        let active = self.elapsed - self.delay;
        if active <= 0.0 {
            0.0
        } else if self.duration <= 0.0 {
            1.0
        } else {
            (active / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }

    fn apply(&self, node: NodeId, graph: &mut SceneGraph) {
        let t = self.progress();
        let Some(n) = graph.get_mut(node) else { return };
        match self.target {
            TweenTarget::Alpha { from, to } => {
                n.alpha = ease(from, to, t, self.easing);
            }
            TweenTarget::Scale { from, to } => {
                n.local.scale = Vec2::new(
                    ease(from.x, to.x, t, self.easing),
                    ease(from.y, to.y, t, self.easing),
                );
            }
        }
    }
}

/// Manages all active node tweens.
#[derive(Debug, Default)]
pub struct TweenState {
    tweens: Vec<(NodeId, Tween)>,
}

impl TweenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tween. The `from` value is applied immediately so a delayed
    /// entrance does not flash its final state first.
    pub fn add(&mut self, graph: &mut SceneGraph, node: NodeId, tween: Tween) {
        tween.apply(node, graph);
        self.tweens.push((node, tween));
    }

    /// Remove all tweens for a node.
    pub fn remove_node(&mut self, node: NodeId) {
        self.tweens.retain(|(n, _)| *n != node);
    }

    /// Drop tweens whose node no longer exists.
    pub fn prune(&mut self, graph: &SceneGraph) {
        self.tweens.retain(|(n, _)| graph.contains(*n));
    }

    /// Tweens currently running on a node.
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &Tween> + '_ {
        self.tweens.iter().filter(move |(n, _)| *n == node).map(|(_, t)| t)
    }

    /// Advance all tweens by `dt` milliseconds and apply them to the graph.
    /// Returns the number of tweens that completed this tick.
    pub fn tick(&mut self, dt: f32, graph: &mut SceneGraph) -> usize {
        for (node, tween) in self.tweens.iter_mut() {
            tween.elapsed += dt;
            tween.apply(*node, graph);
        }
        let before = self.tweens.len();
        self.tweens.retain(|(_, t)| !t.is_complete());
        before - self.tweens.len()
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }
}
