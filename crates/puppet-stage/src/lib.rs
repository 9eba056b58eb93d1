pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod input;
pub mod assets;
pub mod extensions;
pub mod puppet;
pub mod stage;
pub mod cutscene;
pub mod runner;
pub mod project;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types at crate root for convenience
pub use api::error::{CutsceneError, RenderError, ScriptError, StageError, StageResult};
pub use api::types::{ListenerId, NodeId, PuppetEvent, PuppetId};
pub use assets::manifest::{Asset, AssetKind};
pub use assets::registry::AssetCatalog;
pub use components::animation::SpriteSheet;
pub use components::emitter::{EmitterConfig, ParticleEmitter};
pub use components::layer::{
    EmoteLayer, EntranceAnimation, EntranceKind, LayerSpec, StageLayer, CHARACTER_PLACEHOLDER,
};
pub use components::sprite::{Primitive, PrimitiveKind, TextureId};
pub use core::rng::Rng;
pub use core::scene::{Node, SceneGraph};
pub use core::time::Countdown;
pub use renderer::instance::{RenderBuffer, RenderInstance};
pub use renderer::traits::{FrameData, Renderer};
pub use input::queue::{InputEvent, InputQueue};
pub use puppet::{Puppet, PuppetMut, PuppetTemplate, DEFAULT_EMOTE, MOVE_DURATION, SETTLE_POINT};
pub use stage::{SlotLayout, Stage, StageConfig, StageContext};
pub use cutscene::{
    parse_script, Action, ActionContext, Actors, CommandTable, Cutscene, CutsceneStatus, Pending,
};
pub use runner::Director;
pub use project::Project;

// Extensions: easing, transforms and tweens
pub use extensions::{ease, lerp, Easing, LocalTransform, Rect, Tween, TweenState, TweenTarget};
