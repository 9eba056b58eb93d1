use std::collections::HashMap;

use glam::Vec2;

use crate::assets::manifest::{Asset, AssetKind};
use crate::components::animation::SpriteSheet;
use crate::components::emitter::ParticleEmitter;
use crate::components::layer::LayerSpec;
use crate::components::sprite::{Primitive, PrimitiveKind, TextureId};
use crate::extensions::transform::LocalTransform;

/// Owned asset cache shared by everything a stage builds.
///
/// Entries are looked up by id. Every non-bundle entry gets a stable texture slot the
/// first time it is inserted, so renderers can key uploads by `TextureId`.
/// Mutated only between frames (`Stage::add_asset`, `Stage::reload_assets`).
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    assets: HashMap<String, Asset>,
    textures: HashMap<String, TextureId>,
    next_texture: u32,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `{ id: asset }` JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let assets: HashMap<String, Asset> = serde_json::from_str(json)?;
        Ok(Self::from_assets(assets))
    }

    pub fn from_assets(assets: impl IntoIterator<Item = (String, Asset)>) -> Self {
        let mut catalog = Self::new();
        let mut entries: Vec<_> = assets.into_iter().collect();
        // Stable texture numbering regardless of map iteration order.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (id, asset) in entries {
            catalog.insert(id, asset);
        }
        catalog
    }

    /// Insert or replace an entry. Returns the previous one.
    pub fn insert(&mut self, id: impl Into<String>, asset: Asset) -> Option<Asset> {
        let id = id.into();
        if !asset.is_bundle() && !self.textures.contains_key(&id) {
            self.textures.insert(id.clone(), TextureId(self.next_texture));
            self.next_texture += 1;
        }
        self.assets.insert(id, asset)
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }

    pub fn texture(&self, id: &str) -> Option<TextureId> {
        self.textures.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Asset)> {
        self.assets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// The bundle layers an asset id expands to, if it names a bundle.
    pub fn bundle_layers(&self, id: &str) -> Option<&[LayerSpec]> {
        self.get(id).and_then(Asset::bundle_layers)
    }

    /// Transform of a leaf layer node: layer overrides first, then catalog defaults.
    pub fn leaf_transform(&self, layer: &LayerSpec) -> LocalTransform {
        let asset = layer.id.as_deref().and_then(|id| self.get(id));
        let x = layer.x.or(asset.map(|a| a.x)).unwrap_or(0.0);
        let y = layer.y.or(asset.map(|a| a.y)).unwrap_or(0.0);
        let rotation = layer.rotation.or(asset.map(|a| a.rotation)).unwrap_or(0.0);
        LocalTransform::new()
            .with_offset(Vec2::new(x, y))
            .with_rotation(rotation)
    }

    /// Build the renderable primitive for a leaf layer.
    ///
    /// Unknown ids yield an empty `Missing` primitive so the puppet still builds.
    pub fn primitive(&self, layer: &LayerSpec) -> Primitive {
        let id = layer.id.as_deref().unwrap_or_default();
        let Some(asset) = self.get(id) else {
            log::warn!("unable to load asset \"{}\"", id);
            return Primitive::missing(id);
        };

        let scale = Vec2::new(
            layer.scale_x.unwrap_or(asset.scale_x),
            layer.scale_y.unwrap_or(asset.scale_y),
        );
        let texture_size = Vec2::new(asset.width, asset.height);
        let (kind, size) = match &asset.kind {
            AssetKind::Sprite => (PrimitiveKind::Static, texture_size),
            AssetKind::Animated { cols, rows, num_frames, delay } => {
                let sheet = SpriteSheet::slice(texture_size, *cols, *rows, *num_frames, *delay);
                let size = sheet.frame_size();
                (PrimitiveKind::Animated(sheet), size)
            }
            AssetKind::Particles(config) => {
                (PrimitiveKind::Emitter(ParticleEmitter::new(config.clone())), Vec2::ZERO)
            }
            AssetKind::Bundle { .. } => {
                // Bundles are expanded by the layer builder and never drawn directly.
                log::warn!("bundle \"{}\" used as a drawable asset", id);
                (PrimitiveKind::Missing, Vec2::ZERO)
            }
        };

        Primitive {
            asset: id.to_string(),
            texture: self.texture(id),
            size,
            scale,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::emitter::EmitterConfig;

    fn catalog() -> AssetCatalog {
        let json = r#"{
            "body": { "location": "body.png", "width": 200, "height": 400, "y": -200 },
            "blink": { "type": "animated", "location": "blink.png", "width": 400, "height": 100,
                       "cols": 4, "rows": 1, "numFrames": 4, "delay": 20 },
            "sparkle": { "type": "particles", "emitter": { "rate": 10 } },
            "hat": { "type": "bundle", "layers": [ { "id": "body" } ] }
        }"#;
        AssetCatalog::from_json(json).unwrap()
    }

    #[test]
    fn bundles_get_no_texture_slot() {
        let catalog = catalog();
        assert_eq!(catalog.len(), 4);
        assert!(catalog.texture("hat").is_none());
        assert!(catalog.texture("body").is_some());
        assert_ne!(catalog.texture("body"), catalog.texture("blink"));
    }

    #[test]
    fn replacing_an_asset_keeps_its_texture_slot() {
        let mut catalog = catalog();
        let before = catalog.texture("body");
        let old = catalog.insert("body", Asset::sprite("body2.png", 10.0, 10.0));
        assert!(old.is_some());
        assert_eq!(catalog.texture("body"), before);
        assert_eq!(catalog.get("body").unwrap().location, "body2.png");
    }

    #[test]
    fn static_primitive_uses_layer_scale_over_defaults() {
        let catalog = catalog();
        let mut layer = LayerSpec::asset("body");
        layer.scale_x = Some(-1.0);
        let prim = catalog.primitive(&layer);
        assert_eq!(prim.kind, PrimitiveKind::Static);
        assert_eq!(prim.size, Vec2::new(200.0, 400.0));
        assert_eq!(prim.scale, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn animated_primitive_is_one_cell() {
        let prim = catalog().primitive(&LayerSpec::asset("blink"));
        assert_eq!(prim.size, Vec2::new(100.0, 100.0));
        match prim.kind {
            PrimitiveKind::Animated(sheet) => assert_eq!(sheet.frame_count(), 4),
            other => panic!("expected sheet, got {:?}", other),
        }
    }

    #[test]
    fn particle_primitive_carries_emitter() {
        let prim = catalog().primitive(&LayerSpec::asset("sparkle"));
        let emitter = prim.emitter().expect("emitter");
        assert_eq!(emitter.config, EmitterConfig { rate: 10.0, ..EmitterConfig::default() });
    }

    #[test]
    fn unknown_asset_is_missing() {
        let prim = catalog().primitive(&LayerSpec::asset("ghost"));
        assert_eq!(prim.kind, PrimitiveKind::Missing);
        assert_eq!(prim.asset, "ghost");
    }

    #[test]
    fn leaf_transform_falls_back_to_catalog() {
        let catalog = catalog();
        let t = catalog.leaf_transform(&LayerSpec::asset("body"));
        assert_eq!(t.offset, Vec2::new(0.0, -200.0));
        let t = catalog.leaf_transform(&LayerSpec::asset("body").with_position(5.0, 6.0));
        assert_eq!(t.offset, Vec2::new(5.0, 6.0));
    }
}
