//! Shared fixtures for unit tests.

use crate::api::error::RenderError;
use crate::assets::manifest::{Asset, AssetKind};
use crate::assets::registry::AssetCatalog;
use crate::components::emitter::EmitterConfig;
use crate::components::layer::{EmoteLayer, EntranceAnimation, EntranceKind, LayerSpec};
use crate::puppet::PuppetTemplate;
use crate::renderer::traits::{FrameData, Renderer};

/// Sprites for a small cartoon character, a blink sheet and a particle effect.
pub(crate) fn test_catalog() -> AssetCatalog {
    let mut catalog = AssetCatalog::new();
    let mut body = Asset::sprite("body.png", 200.0, 400.0);
    body.y = -200.0;
    catalog.insert("body", body);
    catalog.insert("head", Asset::sprite("head.png", 160.0, 160.0));
    catalog.insert("eyes", Asset::sprite("eyes.png", 100.0, 40.0));
    catalog.insert("mouth", Asset::sprite("mouth.png", 60.0, 30.0));
    catalog.insert("smile", Asset::sprite("smile.png", 70.0, 30.0));
    catalog.insert(
        "blink",
        Asset::sprite("blink.png", 400.0, 40.0).with_kind(AssetKind::Animated {
            cols: 4,
            rows: 1,
            num_frames: 4,
            delay: 20.0,
        }),
    );
    catalog.insert(
        "sparkle",
        Asset::sprite("", 0.0, 0.0).with_kind(AssetKind::Particles(EmitterConfig::default())),
    );
    catalog
}

fn face(emote: &str, eyes: &str, mouth: &str) -> LayerSpec {
    LayerSpec::group(vec![
        LayerSpec::asset(eyes)
            .with_emote_layer(EmoteLayer::Eyes)
            .with_position(0.0, -20.0),
        LayerSpec::asset(mouth)
            .with_emote_layer(EmoteLayer::Mouth)
            .with_position(0.0, 30.0),
    ])
    .with_emote(emote)
}

/// Body, head, a neutral face and a happy one. No entrance animations.
pub(crate) fn josh_template() -> PuppetTemplate {
    let head = LayerSpec::group(vec![
        LayerSpec::asset("head"),
        face("0", "eyes", "mouth"),
        face("happy", "eyes", "smile"),
    ])
    .with_head()
    .with_position(0.0, -480.0);
    PuppetTemplate::new(LayerSpec::group(vec![LayerSpec::asset("body"), head]))
}

/// Like josh, with a fading head and a legacy blink layer cycled while babbling.
pub(crate) fn babbler_template() -> PuppetTemplate {
    let mut blink = LayerSpec::asset("blink")
        .with_emote_layer(EmoteLayer::Eyes)
        .with_position(0.0, -20.0);
    blink.babble = Some(true);
    let head = LayerSpec::group(vec![
        LayerSpec::asset("head").with_animation(EntranceAnimation::new(EntranceKind::Fade)),
        face("0", "eyes", "mouth"),
        face("happy", "eyes", "smile"),
        blink,
    ])
    .with_head()
    .with_position(0.0, -480.0);
    PuppetTemplate::new(LayerSpec::group(vec![LayerSpec::asset("body"), head]))
}

/// Renderer that records the instance count of every drawn frame.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub frames: Vec<usize>,
    pub size: Option<(u32, u32)>,
    pub fail_snapshot: bool,
}

impl Renderer for RecordingRenderer {
    fn backend(&self) -> &'static str {
        "recording"
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }

    fn draw(&mut self, frame: &FrameData<'_>) {
        self.frames.push(frame.instances.len());
    }

    fn snapshot(&mut self) -> Result<Vec<u8>, RenderError> {
        if self.fail_snapshot {
            Err(RenderError::Snapshot("no surface".into()))
        } else {
            Ok(vec![0u8; 4])
        }
    }
}
