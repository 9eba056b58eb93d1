// extensions/transform.rs
//
// Local transforms and bounds math for scene graph nodes.
// Pure math: no knowledge of nodes, puppets or the stage.

use glam::{Affine2, Vec2};

/// Local transform data for a node, relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    /// Position relative to parent.
    pub offset: Vec2,
    /// Rotation relative to parent, in radians.
    pub rotation: f32,
    /// Scale multiplier relative to parent. A negative x mirrors the subtree.
    pub scale: Vec2,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl LocalTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    /// Parent-from-local affine: scale, then rotate, then translate.
    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(self.scale, self.rotation, self.offset)
    }
}

/// Axis-aligned rectangle used for node bounds and hit testing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle of the given size centred on the origin (sprites are centre-anchored).
    pub fn centered(size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: -half,
            max: half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn union(self, other: Rect) -> Rect {
        Rect {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Bounding box of this rectangle after an affine transform.
    pub fn transformed(&self, affine: &Affine2) -> Rect {
        let corners = [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ];
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = affine.transform_point2(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Rect { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_applies_scale_before_offset() {
        let t = LocalTransform::new()
            .with_offset(Vec2::new(100.0, 50.0))
            .with_scale(Vec2::splat(2.0));
        let p = t.to_affine().transform_point2(Vec2::new(10.0, 0.0));
        assert!((p - Vec2::new(120.0, 50.0)).length() < 1e-4);
    }

    #[test]
    fn mirrored_rect_keeps_positive_width() {
        let rect = Rect::centered(Vec2::new(40.0, 20.0));
        let flipped = rect.transformed(&LocalTransform::new().with_scale(Vec2::new(-1.0, 1.0)).to_affine());
        assert!((flipped.width() - 40.0).abs() < 1e-4);
        assert!((flipped.height() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::centered(Vec2::splat(2.0));
        let b = Rect::centered(Vec2::splat(2.0))
            .transformed(&LocalTransform::new().with_offset(Vec2::new(10.0, 0.0)).to_affine());
        let u = a.union(b);
        assert_eq!(u.width(), 12.0);
        assert!(u.contains(Vec2::new(5.0, 0.0)));
    }
}
