use glam::Vec2;

use crate::components::animation::SpriteSheet;
use crate::components::emitter::ParticleEmitter;
use crate::extensions::transform::Rect;

/// Identifies which catalog texture a primitive draws.
/// Index into the AssetCatalog's texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

/// What a leaf primitive draws.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    /// Single texture.
    Static,
    /// Looping sprite sheet.
    Animated(SpriteSheet),
    /// Particle emitter; draws its particles, not a texture.
    Emitter(ParticleEmitter),
    /// Placeholder for an asset id the catalog does not know.
    Missing,
}

/// Renderable leaf attached as the sole child of a compiled asset layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Catalog asset this primitive was built from.
    pub asset: String,
    pub texture: Option<TextureId>,
    /// Unscaled size in texture pixels (one cell for sprite sheets).
    pub size: Vec2,
    /// Per-primitive scale from the layer (`scaleX`/`scaleY`).
    pub scale: Vec2,
    pub kind: PrimitiveKind,
}

impl Primitive {
    pub fn missing(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            texture: None,
            size: Vec2::ZERO,
            scale: Vec2::ONE,
            kind: PrimitiveKind::Missing,
        }
    }

    /// Centre-anchored bounds in the owning node's space.
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.size * self.scale)
    }

    /// Frame index to draw (0 for non-animated primitives).
    pub fn frame(&self) -> usize {
        match &self.kind {
            PrimitiveKind::Animated(sheet) => sheet.current_index(),
            _ => 0,
        }
    }

    pub fn emitter(&self) -> Option<&ParticleEmitter> {
        match &self.kind {
            PrimitiveKind::Emitter(e) => Some(e),
            _ => None,
        }
    }

    pub fn emitter_mut(&mut self) -> Option<&mut ParticleEmitter> {
        match &mut self.kind {
            PrimitiveKind::Emitter(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_has_empty_bounds() {
        let p = Primitive::missing("ghost");
        assert_eq!(p.bounds().width(), 0.0);
        assert_eq!(p.frame(), 0);
        assert!(p.texture.is_none());
    }

    #[test]
    fn bounds_follow_scale() {
        let p = Primitive {
            asset: "body".into(),
            texture: Some(TextureId(0)),
            size: Vec2::new(100.0, 50.0),
            scale: Vec2::new(-2.0, 1.0),
            kind: PrimitiveKind::Static,
        };
        assert_eq!(p.bounds().width(), 200.0);
        assert_eq!(p.bounds().height(), 50.0);
    }
}
