//! Slot geometry of the puppet layer.
//!
//! Slots `1..=n` are on stage. `0` and `n + 1` are the off-stage staging areas; any other
//! index wraps into `0..=n`.

use glam::Vec2;

/// Narrowest a slot may get before the whole puppet layer shrinks instead.
pub const MIN_SLOT_WIDTH: f32 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotLayout {
    /// Viewport size in pixels.
    pub viewport: Vec2,
    pub slot_count: u32,
    /// Slot width in puppet-layer units.
    pub slot_width: f32,
    /// Uniform scale of the puppet layer.
    pub layer_scale: f32,
    /// Uniform scale of every puppet.
    pub puppet_scale: f32,
}

impl SlotLayout {
    pub fn new(slot_count: u32, puppet_scale: f32, viewport: Vec2) -> Self {
        let mut layout = Self {
            viewport,
            slot_count: slot_count.max(1),
            slot_width: MIN_SLOT_WIDTH,
            layer_scale: 1.0,
            puppet_scale,
        };
        layout.fit(viewport);
        layout
    }

    /// Recompute slot width for a viewport. Below the minimum, the layer shrinks and
    /// slots stay at `MIN_SLOT_WIDTH`.
    pub fn fit(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        let slot_width = viewport.x / self.slot_count as f32;
        if slot_width < MIN_SLOT_WIDTH {
            self.layer_scale = slot_width / MIN_SLOT_WIDTH;
            self.slot_width = MIN_SLOT_WIDTH;
        } else {
            self.layer_scale = 1.0;
            self.slot_width = slot_width;
        }
    }

    /// Baseline puppets stand on, in puppet-layer units.
    pub fn floor_y(&self) -> f32 {
        if self.layer_scale > 0.0 {
            self.viewport.y / self.layer_scale
        } else {
            self.viewport.y
        }
    }

    fn wrap_len(&self) -> i32 {
        self.slot_count as i32 + 1
    }

    /// Slot index folded into `0..=slot_count`.
    pub fn wrap(&self, position: i32) -> i32 {
        position.rem_euclid(self.wrap_len())
    }

    /// Centre of an on-stage slot.
    pub fn slot_x(&self, slot: i32) -> f32 {
        (slot as f32 - 0.5) * self.slot_width
    }

    /// Where a puppet `width` wide is fully past the left edge.
    pub fn left_edge(&self, width: f32) -> f32 {
        -width
    }

    /// Where a puppet `width` wide is fully past the right edge.
    pub fn right_edge(&self, width: f32) -> f32 {
        self.slot_count as f32 * self.slot_width + width
    }

    /// Resting x for a puppet at `position`.
    ///
    /// A wrapped index of 0 is the left staging area for positions at or below zero and
    /// the right one otherwise.
    pub fn resting_x(&self, position: i32, width: f32) -> f32 {
        match self.wrap(position) {
            0 if position <= 0 => self.left_edge(width / 2.0),
            0 => self.right_edge(width / 2.0),
            slot => self.slot_x(slot),
        }
    }

    /// Horizontal position while crossing one slot from `position` towards `direction`.
    ///
    /// `progress` is the travel fraction in `0..=1`; off-stage endpoints clear the viewport
    /// by the full `width`.
    pub fn travel_x(&self, position: i32, direction: i32, progress: f32, width: f32) -> f32 {
        let slot = self.wrap(position);
        let start = match (slot, direction) {
            (0, 1) => self.left_edge(width),
            (0, -1) => self.right_edge(width),
            (0, _) if position <= 0 => self.left_edge(width),
            (0, _) => self.right_edge(width),
            (slot, _) => self.slot_x(slot),
        };
        if direction == 0 || progress >= 1.0 {
            return start;
        }

        let mut next = slot + direction;
        if next < 0 {
            next += self.wrap_len();
        }
        let end = if next <= 0 {
            self.left_edge(width)
        } else if next >= self.wrap_len() {
            self.right_edge(width)
        } else {
            self.slot_x(next)
        };
        start + (end - start) * progress
    }
}
