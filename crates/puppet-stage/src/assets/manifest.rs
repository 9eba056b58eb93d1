use serde::{Deserialize, Serialize};

use crate::components::emitter::EmitterConfig;
use crate::components::layer::LayerSpec;

/// What kind of renderable an asset produces.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetKind {
    /// Single static image.
    Sprite,
    /// Sprite sheet cut into `cols × rows` cells, `num_frames` of them used.
    /// `delay` sets playback speed (`20 / delay` frames per 60 Hz tick).
    Animated {
        cols: u32,
        rows: u32,
        num_frames: u32,
        delay: f32,
    },
    /// Particle emitter.
    Particles(EmitterConfig),
    /// Reusable sub-tree of layers, expanded inline where referenced.
    Bundle { layers: Vec<LayerSpec> },
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAsset", into = "RawAsset")]
pub struct Asset {
    /// Path of the texture, relative to the project's asset folder.
    pub location: String,
    pub name: Option<String>,
    /// Default geometry, used when a layer does not override it.
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Texture size in pixels.
    pub width: f32,
    pub height: f32,
    pub kind: AssetKind,
}

impl Asset {
    /// Static image of the given texture size.
    pub fn sprite(location: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            location: location.into(),
            name: None,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            width,
            height,
            kind: AssetKind::Sprite,
        }
    }

    pub fn bundle(layers: Vec<LayerSpec>) -> Self {
        Self {
            kind: AssetKind::Bundle { layers },
            ..Self::sprite("", 0.0, 0.0)
        }
    }

    pub fn with_kind(mut self, kind: AssetKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_bundle(&self) -> bool {
        matches!(self.kind, AssetKind::Bundle { .. })
    }

    pub fn bundle_layers(&self) -> Option<&[LayerSpec]> {
        match &self.kind {
            AssetKind::Bundle { layers } => Some(layers),
            _ => None,
        }
    }
}

/// Wire form of an asset: a flat object with a `type` discriminator.
/// A missing `type` means a static sprite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAsset {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    x: f32,
    y: f32,
    rotation: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale_y: Option<f32>,
    width: f32,
    height: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cols: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delay: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emitter: Option<EmitterConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    layers: Option<Vec<LayerSpec>>,
}

impl From<RawAsset> for Asset {
    fn from(raw: RawAsset) -> Self {
        let kind = match raw.kind.as_deref() {
            None | Some("sprite") => AssetKind::Sprite,
            Some("animated") => {
                let cols = raw.cols.unwrap_or(1).max(1);
                let rows = raw.rows.unwrap_or(1).max(1);
                AssetKind::Animated {
                    cols,
                    rows,
                    num_frames: raw.num_frames.unwrap_or(cols * rows),
                    delay: raw.delay.unwrap_or(20.0),
                }
            }
            Some("particles") => AssetKind::Particles(raw.emitter.unwrap_or_default()),
            Some("bundle") => AssetKind::Bundle {
                layers: raw.layers.unwrap_or_default(),
            },
            Some(other) => {
                log::warn!("unknown asset type \"{}\", treating as sprite", other);
                AssetKind::Sprite
            }
        };
        Asset {
            location: raw.location,
            name: raw.name,
            x: raw.x,
            y: raw.y,
            rotation: raw.rotation,
            scale_x: raw.scale_x.unwrap_or(1.0),
            scale_y: raw.scale_y.unwrap_or(1.0),
            width: raw.width,
            height: raw.height,
            kind,
        }
    }
}

impl From<Asset> for RawAsset {
    fn from(asset: Asset) -> Self {
        let mut raw = RawAsset {
            kind: None,
            location: asset.location,
            name: asset.name,
            x: asset.x,
            y: asset.y,
            rotation: asset.rotation,
            scale_x: Some(asset.scale_x),
            scale_y: Some(asset.scale_y),
            width: asset.width,
            height: asset.height,
            ..RawAsset::default()
        };
        match asset.kind {
            AssetKind::Sprite => raw.kind = Some("sprite".into()),
            AssetKind::Animated { cols, rows, num_frames, delay } => {
                raw.kind = Some("animated".into());
                raw.cols = Some(cols);
                raw.rows = Some(rows);
                raw.num_frames = Some(num_frames);
                raw.delay = Some(delay);
            }
            AssetKind::Particles(config) => {
                raw.kind = Some("particles".into());
                raw.emitter = Some(config);
            }
            AssetKind::Bundle { layers } => {
                raw.kind = Some("bundle".into());
                raw.layers = Some(layers);
            }
        }
        raw
    }
}
