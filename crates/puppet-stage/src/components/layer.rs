//! Declarative layer descriptions, as authored for puppets and environments.

use serde::{Deserialize, Deserializer, Serialize};

use crate::extensions::easing::Easing;

/// Asset id marking where the live puppet layer sits inside an environment.
pub const CHARACTER_PLACEHOLDER: &str = "CHARACTER_PLACEHOLDER";

/// The three stage layers, drawn back-to-front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum StageLayer {
    Background = 0,
    #[default]
    Puppets = 1,
    Foreground = 2,
}

impl StageLayer {
    pub const COUNT: usize = 3;
    pub const ALL: [StageLayer; 3] = [StageLayer::Background, StageLayer::Puppets, StageLayer::Foreground];
}

/// Classifies a layer within its emote group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmoteLayer {
    #[default]
    Base,
    Eyes,
    Mouth,
}

/// Entrance effect played when a layer appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntranceKind {
    #[serde(rename = "FADE")]
    Fade,
    #[serde(rename = "FADE_ZOOM")]
    FadeZoom,
    /// Anything else: the layer just appears.
    #[default]
    #[serde(other)]
    None,
}

/// Entrance animation settings. Durations are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntranceAnimation {
    #[serde(rename = "type")]
    pub kind: EntranceKind,
    pub duration: f32,
    pub delay: f32,
    pub easing: Easing,
}

impl Default for EntranceAnimation {
    fn default() -> Self {
        Self {
            kind: EntranceKind::None,
            duration: 500.0,
            delay: 0.0,
            easing: Easing::Linear,
        }
    }
}

impl EntranceAnimation {
    pub fn new(kind: EntranceKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

/// A node of a puppet or environment description.
///
/// Composite nodes carry `children`; leaves reference the asset catalog by `id`.
/// A leaf whose asset is a bundle expands to the bundle's layers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerSpec {
    #[serde(deserialize_with = "key_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<LayerSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<bool>,
    #[serde(deserialize_with = "key_string", skip_serializing_if = "Option::is_none")]
    pub emote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emote_layer: Option<EmoteLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub babble: Option<bool>,
    #[serde(deserialize_with = "entrance", skip_serializing_if = "Option::is_none")]
    pub animation: Option<EntranceAnimation>,
}

impl LayerSpec {
    /// Leaf referencing a catalog asset.
    pub fn asset(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Composite node.
    pub fn group(children: Vec<LayerSpec>) -> Self {
        Self {
            children: Some(children),
            ..Self::default()
        }
    }

    pub fn with_emote(mut self, emote: impl Into<String>) -> Self {
        self.emote = Some(emote.into());
        self
    }

    pub fn with_emote_layer(mut self, layer: EmoteLayer) -> Self {
        self.emote_layer = Some(layer);
        self
    }

    pub fn with_head(mut self) -> Self {
        self.head = Some(true);
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_animation(mut self, animation: EntranceAnimation) -> Self {
        self.animation = Some(animation);
        self
    }

    /// True when any transform field is set on this node.
    pub fn has_transform(&self) -> bool {
        self.x.is_some()
            || self.y.is_some()
            || self.rotation.is_some()
            || self.scale_x.is_some()
            || self.scale_y.is_some()
    }

    /// Label for diagnostics: the name if set, otherwise the asset id.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<group>")
    }
}

/// Asset ids and emote keys are written as strings or bare numbers.
pub(crate) fn key_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Key>::deserialize(deserializer)?.map(|key| match key {
        Key::Text(s) => s,
        Key::Int(n) => n.to_string(),
        Key::Float(n) => n.to_string(),
    }))
}

/// `animation` is either a full object or just the effect name.
fn entrance<'de, D>(deserializer: D) -> Result<Option<EntranceAnimation>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Form {
        Name(EntranceKind),
        Full(EntranceAnimation),
    }

    Ok(Option::<Form>::deserialize(deserializer)?.map(|form| match form {
        Form::Name(kind) => EntranceAnimation::new(kind),
        Form::Full(animation) => animation,
    }))
}
