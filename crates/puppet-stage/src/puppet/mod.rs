//! Puppets: one compiled layer tree plus its movement and babble state.

pub mod builder;

use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{NodeId, PuppetId};
use crate::assets::registry::AssetCatalog;
use crate::components::layer::{key_string, EmoteLayer, LayerSpec};
use crate::core::scene::SceneGraph;
use crate::stage::layout::SlotLayout;
use crate::stage::StageContext;

pub use builder::{
    AssetBinding, BabblePool, CompiledLayers, EmoteGroup, Entrance, HeadNode, LayerBuilder,
    DEFAULT_EMOTE,
};

/// Seconds a puppet takes to cross one slot.
pub const MOVE_DURATION: f32 = 0.75;
/// Fraction of a slot crossing spent travelling; the rest is the arrival bounce.
pub const SETTLE_POINT: f32 = 0.6;

const DEFAULT_EYE_BABBLE_MS: f32 = 2000.0;
const DEFAULT_MOUTH_BABBLE_MS: f32 = 270.0;
/// Settle time of the head after deadbones babbling stops.
const DEADBONES_SETTLE_MS: f32 = 200.0;

/// Authored puppet description, as stored in a project's `actors` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PuppetTemplate {
    /// Slot the puppet starts in.
    pub position: i32,
    pub facing_left: bool,
    #[serde(deserialize_with = "key_string", skip_serializing_if = "Option::is_none")]
    pub emote: Option<String>,
    /// Wobble the head instead of swapping eye and mouth art.
    pub deadbones_style: bool,
    /// Base time between eye changes while babbling, in ms.
    pub eye_babble_duration: f32,
    /// Base time between mouth changes while babbling, in ms.
    pub mouth_babble_duration: f32,
    pub layers: LayerSpec,
}

impl Default for PuppetTemplate {
    fn default() -> Self {
        Self {
            position: 1,
            facing_left: false,
            emote: None,
            deadbones_style: false,
            eye_babble_duration: DEFAULT_EYE_BABBLE_MS,
            mouth_babble_duration: DEFAULT_MOUTH_BABBLE_MS,
            layers: LayerSpec::default(),
        }
    }
}

impl PuppetTemplate {
    pub fn new(layers: LayerSpec) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A live (or detached) puppet.
///
/// Scene nodes belong to the stage's graph; the puppet only records their ids.
/// `position`/`target` are slot indices and may sit in the off-stage staging areas.
/// Not `Clone`: each puppet is the only owner of its nodes.
#[derive(Debug)]
pub struct Puppet {
    id: Option<PuppetId>,
    template: PuppetTemplate,
    root: NodeId,
    head: Vec<HeadNode>,
    emotes: BTreeMap<String, EmoteGroup>,
    particles: Vec<NodeId>,
    bindings: Vec<AssetBinding>,
    babble_pool: BabblePool,
    entrances: HashMap<NodeId, Entrance>,
    emote: String,

    pub position: i32,
    pub target: i32,
    pub facing_left: bool,
    /// Latched travel direction: 0 while idle, ±1 while crossing a slot.
    pub direction: i32,
    /// Progress through one slot crossing: 0 idle, travel below `SETTLE_POINT`, bounce above.
    pub moving_anim: f32,
    pub jiggling: bool,
    pub babbling: bool,

    pub eyes_anim: f32,
    pub eyes_duration: f32,
    pub mouth_anim: f32,
    pub mouth_duration: f32,
    pub eye_babble_duration: f32,
    pub mouth_babble_duration: f32,

    pub deadbones_style: bool,
    pub deadbones_anim: f32,
    pub deadbones_duration: f32,
    pub deadbones_start_y: f32,
    pub deadbones_target_y: f32,
    pub deadbones_start_rotation: f32,
    pub deadbones_target_rotation: f32,
}

impl Puppet {
    /// Compile `template` into the stage graph. The root is left detached.
    pub(crate) fn build(
        template: &PuppetTemplate,
        id: Option<PuppetId>,
        catalog: &AssetCatalog,
        ctx: &mut StageContext,
        layout: &SlotLayout,
    ) -> Self {
        let compiled = LayerBuilder::new(catalog, &mut ctx.graph, &mut ctx.tweens, ctx.animations)
            .build(&template.layers);
        // Placement and facing go on a wrapper so the authored top-level transform survives.
        let root = ctx.graph.create();
        ctx.graph.add_child(root, compiled.root);
        let or_default = |value: f32, default: f32| if value > 0.0 { value } else { default };

        let mut puppet = Self {
            id,
            template: template.clone(),
            root,
            head: compiled.head,
            emotes: compiled.emotes,
            particles: compiled.particles,
            bindings: compiled.bindings,
            babble_pool: compiled.babble,
            entrances: compiled.entrances,
            emote: DEFAULT_EMOTE.to_string(),
            position: template.position,
            target: template.position,
            facing_left: template.facing_left,
            direction: 0,
            moving_anim: 0.0,
            jiggling: false,
            babbling: false,
            eyes_anim: 0.0,
            eyes_duration: 0.0,
            mouth_anim: 0.0,
            mouth_duration: 0.0,
            eye_babble_duration: or_default(template.eye_babble_duration, DEFAULT_EYE_BABBLE_MS),
            mouth_babble_duration: or_default(
                template.mouth_babble_duration,
                DEFAULT_MOUTH_BABBLE_MS,
            ),
            deadbones_style: template.deadbones_style,
            deadbones_anim: 0.0,
            deadbones_duration: 0.0,
            deadbones_start_y: 0.0,
            deadbones_target_y: 0.0,
            deadbones_start_rotation: 0.0,
            deadbones_target_rotation: 0.0,
        };

        // Everything starts visible, so the first emote replays no entrances.
        let emote = template.emote.as_deref().unwrap_or(DEFAULT_EMOTE);
        puppet.change_emote(ctx, emote);
        puppet.update_position(&mut ctx.graph, layout);
        puppet
    }

    pub fn id(&self) -> Option<PuppetId> {
        self.id
    }

    /// The description this puppet was built from.
    pub fn template(&self) -> &PuppetTemplate {
        &self.template
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current emote key. May name a group the puppet lacks; `"0"` is shown then.
    pub fn emote(&self) -> &str {
        &self.emote
    }

    pub fn emotes(&self) -> &BTreeMap<String, EmoteGroup> {
        &self.emotes
    }

    pub fn head(&self) -> &[HeadNode] {
        &self.head
    }

    pub fn particles(&self) -> &[NodeId] {
        &self.particles
    }

    pub fn bindings(&self) -> &[AssetBinding] {
        &self.bindings
    }

    pub fn babble_pool(&self) -> &BabblePool {
        &self.babble_pool
    }

    /// At rest in its target slot with no animation running.
    pub fn is_idle(&self) -> bool {
        self.position == self.target && self.moving_anim == 0.0
    }

    fn shown_group(&self) -> Option<&EmoteGroup> {
        self.emotes
            .get(&self.emote)
            .or_else(|| self.emotes.get(DEFAULT_EMOTE))
    }

    /// Hide every emote group, then show `key` (or `"0"` if the puppet lacks it).
    /// Nodes that were hidden and become visible replay their entrance animation.
    pub(crate) fn change_emote(&mut self, ctx: &mut StageContext, key: &str) {
        self.emote = key.to_string();

        let shown: Vec<NodeId> = self
            .shown_group()
            .map(|group| group.nodes().collect())
            .unwrap_or_default();
        let revealed: Vec<NodeId> = shown
            .iter()
            .copied()
            .filter(|&node| !ctx.graph.is_visible(node))
            .collect();

        for node in self.emotes.values().flat_map(EmoteGroup::nodes) {
            ctx.graph.set_visible(node, false);
        }
        for &node in &shown {
            ctx.graph.set_visible(node, true);
        }

        if ctx.animations {
            for node in revealed {
                if let Some(entrance) = self.entrances.get(&node) {
                    builder::play_entrance(&mut ctx.graph, &mut ctx.tweens, node, entrance);
                }
            }
        }
        ctx.dirty = true;
    }

    /// Start or stop babbling. Repeating the current state does nothing.
    pub(crate) fn set_babbling(&mut self, ctx: &mut StageContext, active: bool) {
        if self.babbling == active {
            return;
        }
        self.babbling = active;
        if active {
            return;
        }

        let emote = self.emote.clone();
        self.change_emote(ctx, &emote);
        if self.deadbones_style {
            self.deadbones_anim = 0.0;
            self.deadbones_duration = DEADBONES_SETTLE_MS;
            self.deadbones_start_y = 0.0;
            self.deadbones_target_y = 0.0;
            self.deadbones_start_rotation = 0.0;
            self.deadbones_target_rotation = 0.0;
        }
    }

    /// Play the arrival bounce in place. Ignored while already moving or bouncing.
    pub fn jiggle(&mut self) {
        if self.moving_anim == 0.0 {
            self.moving_anim = SETTLE_POINT;
            self.jiggling = true;
        }
    }

    /// Send the puppet towards slot `target`, turning to face the way it will walk.
    pub fn walk_to(&mut self, target: i32) {
        self.target = target;
        self.moving_anim = 0.0;
        if target > self.position {
            self.facing_left = false;
        } else if target != self.position {
            self.facing_left = true;
        }
    }

    fn facing_sign(&self) -> f32 {
        if self.facing_left {
            -1.0
        } else {
            1.0
        }
    }

    /// Mirror the root to match `facing_left` without touching placement.
    pub(crate) fn apply_facing(&self, graph: &mut SceneGraph, layout: &SlotLayout) {
        let sign = self.facing_sign();
        if let Some(local) = graph.local_mut(self.root) {
            local.scale.x = sign * layout.puppet_scale;
        }
    }

    /// Place the root at its resting spot: scale, facing, baseline and slot x.
    pub(crate) fn update_position(&self, graph: &mut SceneGraph, layout: &SlotLayout) {
        let sign = self.facing_sign();
        if let Some(local) = graph.local_mut(self.root) {
            local.scale = Vec2::new(sign * layout.puppet_scale, layout.puppet_scale);
            local.offset.y = layout.floor_y();
        }
        let width = graph.width(self.root);
        if let Some(local) = graph.local_mut(self.root) {
            local.offset.x = layout.resting_x(self.position, width);
        }
    }

    /// Babble candidates for one face part: every emote group with art for it, then
    /// every legacy babble layer.
    fn babble_candidates(&self, part: EmoteLayer) -> Vec<Vec<NodeId>> {
        self.emotes
            .values()
            .map(|group| group.bucket(part))
            .filter(|nodes| !nodes.is_empty())
            .map(|nodes| nodes.to_vec())
            .chain(self.babble_pool.get(part).iter().map(|&node| vec![node]))
            .collect()
    }

    /// Hide all candidates for `part` and show one picked at random.
    fn babble(&self, ctx: &mut StageContext, part: EmoteLayer) {
        let candidates = self.babble_candidates(part);
        for node in candidates.iter().flatten() {
            ctx.graph.set_visible(*node, false);
        }

        let picked = if candidates.is_empty() {
            self.emotes
                .get(DEFAULT_EMOTE)
                .map(|group| group.bucket(part).to_vec())
                .unwrap_or_default()
        } else {
            candidates[ctx.rng.next_index(candidates.len())].clone()
        };
        for node in picked {
            ctx.graph.set_visible(node, true);
        }
        ctx.dirty = true;
    }

    pub(crate) fn update_eye_babble(&mut self, ctx: &mut StageContext) {
        self.babble(ctx, EmoteLayer::Eyes);
        self.eyes_anim = 0.0;
        self.eyes_duration = (0.1 + ctx.rng.next_f32()) * self.eye_babble_duration;
    }

    pub(crate) fn update_mouth_babble(&mut self, ctx: &mut StageContext) {
        self.babble(ctx, EmoteLayer::Mouth);
        self.mouth_anim = 0.0;
        self.mouth_duration = (0.1 + ctx.rng.next_f32()) * self.mouth_babble_duration;
    }

    /// True when the shown emote brings its own eyes, which eye babble leaves alone.
    pub fn emote_owns_eyes(&self) -> bool {
        self.emote != DEFAULT_EMOTE
            && self
                .emotes
                .get(&self.emote)
                .is_some_and(|group| !group.eyes.is_empty())
    }

    /// Offset every head node from its authored pose.
    pub(crate) fn pose_head(&self, graph: &mut SceneGraph, y: f32, rotation: f32) {
        for head in &self.head {
            if let Some(local) = graph.local_mut(head.node) {
                local.offset.y = head.y + y;
                local.rotation = head.rotation + rotation;
            }
        }
    }

    /// Visit every leaf of the authored tree that references `asset`, with its parent
    /// layer (`None` when the whole description is that leaf).
    pub fn apply_to_asset<F>(&self, asset: &str, mut callback: F)
    where
        F: FnMut(Option<&LayerSpec>, &LayerSpec),
    {
        fn walk<'a, F>(asset: &str, parent: Option<&'a LayerSpec>, layer: &'a LayerSpec, callback: &mut F)
        where
            F: FnMut(Option<&LayerSpec>, &LayerSpec),
        {
            match &layer.children {
                Some(children) => {
                    for child in children {
                        walk(asset, Some(layer), child, callback);
                    }
                }
                None if layer.id.as_deref() == Some(asset) => callback(parent, layer),
                None => {}
            }
        }
        walk(asset, None, &self.template.layers, &mut callback);
    }

    /// Re-place the puppet, re-apply its emote and optionally re-seed babble.
    pub(crate) fn refresh(&mut self, ctx: &mut StageContext, layout: &SlotLayout, update_babble: bool) {
        self.update_position(&mut ctx.graph, layout);
        let emote = self.emote.clone();
        self.change_emote(ctx, &emote);
        if !update_babble {
            return;
        }

        if self.deadbones_style {
            self.deadbones_anim = 0.0;
            self.deadbones_duration = 100.0 + ctx.rng.next_f32() * 200.0;
            self.deadbones_start_y = 10.0 - ctx.rng.next_f32() * 20.0;
            self.deadbones_start_rotation = 0.1 - ctx.rng.next_f32() * 0.2;
            self.pose_head(&mut ctx.graph, self.deadbones_start_y, self.deadbones_start_rotation);
            self.deadbones_target_y = 10.0 - ctx.rng.next_f32() * 20.0;
            self.deadbones_target_rotation = 0.1 - ctx.rng.next_f32() * 0.2;
        } else {
            self.update_eye_babble(ctx);
            self.update_mouth_babble(ctx);
        }
    }

    /// Carry stage identity over from the puppet this one replaces.
    pub(crate) fn inherit_from(&mut self, ctx: &mut StageContext, old: &Puppet) {
        self.id = old.id;
        self.position = old.position;
        self.target = old.target;
        self.facing_left = old.facing_left;
        self.babbling = old.babbling;
        self.change_emote(ctx, &old.emote);
    }
}

/// Mutable access to one puppet together with the stage state it draws into.
pub struct PuppetMut<'a> {
    puppet: &'a mut Puppet,
    ctx: &'a mut StageContext,
    layout: &'a SlotLayout,
}

impl<'a> PuppetMut<'a> {
    pub(crate) fn new(puppet: &'a mut Puppet, ctx: &'a mut StageContext, layout: &'a SlotLayout) -> Self {
        Self { puppet, ctx, layout }
    }

    /// Show emote `key`, falling back to `"0"`. Marks the stage dirty.
    pub fn change_emote(&mut self, key: &str) {
        self.puppet.change_emote(self.ctx, key);
    }

    pub fn set_babbling(&mut self, active: bool) {
        self.puppet.set_babbling(self.ctx, active);
    }

    pub fn jiggle(&mut self) {
        self.puppet.jiggle();
        self.ctx.dirty = true;
    }

    /// Walk to slot `target`. Facing only changes when the target is elsewhere.
    pub fn walk_to(&mut self, target: i32) {
        self.puppet.walk_to(target);
        self.puppet.apply_facing(&mut self.ctx.graph, self.layout);
        self.ctx.dirty = true;
    }

    pub fn set_facing_left(&mut self, facing_left: bool) {
        self.puppet.facing_left = facing_left;
        self.puppet.apply_facing(&mut self.ctx.graph, self.layout);
        self.ctx.dirty = true;
    }

    pub fn update_position(&mut self) {
        self.puppet.update_position(&mut self.ctx.graph, self.layout);
        self.ctx.dirty = true;
    }

    pub fn update_eye_babble(&mut self) {
        self.puppet.update_eye_babble(self.ctx);
    }

    pub fn update_mouth_babble(&mut self) {
        self.puppet.update_mouth_babble(self.ctx);
    }

    /// Re-place, re-apply the emote and optionally re-seed babble.
    pub fn update(&mut self, update_babble: bool) {
        self.puppet.refresh(self.ctx, self.layout, update_babble);
    }
}

impl Deref for PuppetMut<'_> {
    type Target = Puppet;

    fn deref(&self) -> &Puppet {
        self.puppet
    }
}

impl DerefMut for PuppetMut<'_> {
    fn deref_mut(&mut self) -> &mut Puppet {
        self.puppet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::layer::{EntranceAnimation, EntranceKind};
    use crate::test_support::{babbler_template, josh_template, test_catalog};

    fn setup() -> (AssetCatalog, StageContext, SlotLayout) {
        let layout = SlotLayout::new(5, 1.0, Vec2::new(2500.0, 1000.0));
        (test_catalog(), StageContext::new(true), layout)
    }

    fn visible(ctx: &StageContext, puppet: &Puppet) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = ctx
            .graph
            .descendants(puppet.root())
            .into_iter()
            .filter(|&n| ctx.graph.is_visible(n))
            .collect();
        nodes.sort();
        nodes
    }

    #[test]
    fn template_defaults() {
        let template: PuppetTemplate = serde_json::from_str(r#"{ "layers": { "id": "body" } }"#).unwrap();
        assert_eq!(template.position, 1);
        assert_eq!(template.eye_babble_duration, 2000.0);
        assert_eq!(template.mouth_babble_duration, 270.0);
        assert_eq!(template.emote, None);

        let template: PuppetTemplate =
            serde_json::from_str(r#"{ "emote": 2, "facingLeft": true, "deadbonesStyle": true }"#).unwrap();
        assert_eq!(template.emote.as_deref(), Some("2"));
        assert!(template.facing_left);
        assert!(template.deadbones_style);
    }

    #[test]
    fn build_shows_the_template_emote() {
        let (catalog, mut ctx, layout) = setup();
        let mut template = josh_template();
        template.emote = Some("happy".into());
        let puppet = Puppet::build(&template, None, &catalog, &mut ctx, &layout);
        assert_eq!(puppet.emote(), "happy");
        for node in puppet.emotes()["happy"].nodes() {
            assert!(ctx.graph.is_visible(node));
        }
        for node in puppet.emotes()[DEFAULT_EMOTE].nodes() {
            assert!(!ctx.graph.is_visible(node));
        }
    }

    #[test]
    fn change_emote_is_idempotent() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.change_emote(&mut ctx, "happy");
        let first = visible(&ctx, &puppet);
        let tweens = ctx.tweens.len();
        puppet.change_emote(&mut ctx, "happy");
        assert_eq!(visible(&ctx, &puppet), first);
        assert_eq!(ctx.tweens.len(), tweens);
    }

    #[test]
    fn unknown_emote_falls_back_to_default() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.change_emote(&mut ctx, "happy");
        puppet.change_emote(&mut ctx, "furious");
        assert_eq!(puppet.emote(), "furious");
        for node in puppet.emotes()[DEFAULT_EMOTE].nodes() {
            assert!(ctx.graph.is_visible(node));
        }
        for node in puppet.emotes()["happy"].nodes() {
            assert!(!ctx.graph.is_visible(node));
        }
    }

    #[test]
    fn puppet_without_default_emote_still_switches() {
        let (catalog, mut ctx, layout) = setup();
        let template = PuppetTemplate::new(LayerSpec::asset("body"));
        let mut puppet = Puppet::build(&template, None, &catalog, &mut ctx, &layout);
        puppet.change_emote(&mut ctx, "anything");
        assert!(puppet.emotes()[DEFAULT_EMOTE].is_empty());
        assert!(ctx.graph.is_visible(puppet.root()));
    }

    #[test]
    fn set_babbling_twice_is_a_no_op() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&babbler_template(), None, &catalog, &mut ctx, &layout);
        puppet.set_babbling(&mut ctx, true);
        puppet.eyes_anim = 120.0;
        puppet.deadbones_duration = 42.0;
        let (eyes_anim, deadbones_duration) = (puppet.eyes_anim, puppet.deadbones_duration);
        puppet.set_babbling(&mut ctx, true);
        assert!(puppet.babbling);
        assert_eq!(puppet.eyes_anim, eyes_anim);
        assert_eq!(puppet.deadbones_duration, deadbones_duration);
    }

    #[test]
    fn stopping_deadbones_settles_to_neutral() {
        let (catalog, mut ctx, layout) = setup();
        let mut template = babbler_template();
        template.deadbones_style = true;
        let mut puppet = Puppet::build(&template, None, &catalog, &mut ctx, &layout);
        puppet.set_babbling(&mut ctx, true);
        puppet.deadbones_target_y = 7.0;
        puppet.set_babbling(&mut ctx, false);
        assert_eq!(puppet.deadbones_target_y, 0.0);
        assert_eq!(puppet.deadbones_start_y, 0.0);
        assert_eq!(puppet.deadbones_duration, DEADBONES_SETTLE_MS);
    }

    /// Josh with a zooming smile and fading neutral eyes.
    fn animated_face_template() -> PuppetTemplate {
        let face = |emote: &str, mouth: &str, animation: Option<EntranceKind>| {
            let mut eyes = LayerSpec::asset("eyes").with_emote_layer(EmoteLayer::Eyes);
            let mut mouth = LayerSpec::asset(mouth).with_emote_layer(EmoteLayer::Mouth);
            match animation {
                Some(EntranceKind::FadeZoom) => {
                    mouth = mouth.with_animation(EntranceAnimation::new(EntranceKind::FadeZoom))
                }
                Some(kind) => eyes = eyes.with_animation(EntranceAnimation::new(kind)),
                None => {}
            }
            LayerSpec::group(vec![eyes, mouth]).with_emote(emote)
        };
        PuppetTemplate::new(LayerSpec::group(vec![
            LayerSpec::asset("body"),
            face("0", "mouth", Some(EntranceKind::Fade)),
            face("happy", "smile", Some(EntranceKind::FadeZoom)),
        ]))
    }

    fn settle_tweens(ctx: &mut StageContext) {
        ctx.tweens.tick(10_000.0, &mut ctx.graph);
        assert!(ctx.tweens.is_empty());
    }

    #[test]
    fn revealed_layers_replay_their_entrance() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&animated_face_template(), None, &catalog, &mut ctx, &layout);
        let smile = puppet.emotes()["happy"].mouth[0];
        settle_tweens(&mut ctx);
        assert!(!ctx.graph.is_visible(smile));

        puppet.change_emote(&mut ctx, "happy");
        assert!(ctx.graph.is_visible(smile));
        assert_eq!(ctx.tweens.for_node(smile).count(), 2);
        assert_eq!(ctx.graph.get(smile).unwrap().alpha, 0.0);

        settle_tweens(&mut ctx);
        assert_eq!(ctx.graph.get(smile).unwrap().alpha, 1.0);
    }

    #[test]
    fn visible_layers_keep_their_entrance_state() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&animated_face_template(), None, &catalog, &mut ctx, &layout);
        let eyes = puppet.emotes()[DEFAULT_EMOTE].eyes[0];
        settle_tweens(&mut ctx);
        assert!(ctx.graph.is_visible(eyes));

        puppet.change_emote(&mut ctx, DEFAULT_EMOTE);
        assert!(ctx.tweens.is_empty());
        assert_eq!(ctx.graph.get(eyes).unwrap().alpha, 1.0);

        puppet.change_emote(&mut ctx, "happy");
        puppet.change_emote(&mut ctx, DEFAULT_EMOTE);
        assert_eq!(ctx.tweens.for_node(eyes).count(), 1);
    }

    #[test]
    fn jiggle_only_from_rest() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.jiggle();
        assert_eq!(puppet.moving_anim, SETTLE_POINT);
        assert!(puppet.jiggling);
        puppet.moving_anim = 0.3;
        puppet.jiggle();
        assert_eq!(puppet.moving_anim, 0.3);
    }

    #[test]
    fn walk_to_turns_only_when_moving() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.position = 3;
        puppet.walk_to(1);
        assert!(puppet.facing_left);
        puppet.walk_to(3);
        assert!(puppet.facing_left);
        puppet.walk_to(5);
        assert!(!puppet.facing_left);
    }

    #[test]
    fn eye_babble_picks_one_candidate() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&babbler_template(), None, &catalog, &mut ctx, &layout);
        for _ in 0..20 {
            puppet.update_eye_babble(&mut ctx);
            let candidates = puppet.babble_candidates(EmoteLayer::Eyes);
            let shown = candidates
                .iter()
                .filter(|nodes| nodes.iter().all(|&n| ctx.graph.is_visible(n)))
                .count();
            assert_eq!(shown, 1);
            assert_eq!(puppet.eyes_anim, 0.0);
            assert!(puppet.eyes_duration >= 0.1 * 2000.0 && puppet.eyes_duration < 1.1 * 2000.0);
        }
    }

    #[test]
    fn mouth_babble_uses_its_own_duration() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&babbler_template(), None, &catalog, &mut ctx, &layout);
        puppet.update_mouth_babble(&mut ctx);
        assert!(puppet.mouth_duration >= 27.0 && puppet.mouth_duration < 297.0);
    }

    #[test]
    fn emote_with_eyes_owns_them() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        assert!(!puppet.emote_owns_eyes());
        puppet.change_emote(&mut ctx, "happy");
        assert!(puppet.emote_owns_eyes());
        puppet.change_emote(&mut ctx, "missing");
        assert!(!puppet.emote_owns_eyes());
    }

    #[test]
    fn apply_to_asset_visits_matching_leaves() {
        let (catalog, mut ctx, layout) = setup();
        let puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        let mut hits = Vec::new();
        puppet.apply_to_asset("eyes", |parent, leaf| {
            hits.push((parent.and_then(|p| p.emote.clone()), leaf.id.clone()));
        });
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|(_, id)| id.as_deref() == Some("eyes")));

        let mut none = 0;
        puppet.apply_to_asset("nothing", |_, _| none += 1);
        assert_eq!(none, 0);
    }

    #[test]
    fn update_position_mirrors_and_places() {
        let (catalog, mut ctx, layout) = setup();
        let mut template = josh_template();
        template.position = 2;
        template.facing_left = true;
        let puppet = Puppet::build(&template, None, &catalog, &mut ctx, &layout);
        let local = *ctx.graph.local(puppet.root()).unwrap();
        assert_eq!(local.scale, Vec2::new(-1.0, 1.0));
        assert_eq!(local.offset, Vec2::new(750.0, 1000.0));
    }

    #[test]
    fn refresh_seeds_deadbones_pose() {
        let (catalog, mut ctx, layout) = setup();
        let mut template = babbler_template();
        template.deadbones_style = true;
        let mut puppet = Puppet::build(&template, None, &catalog, &mut ctx, &layout);
        puppet.refresh(&mut ctx, &layout, true);
        assert!(puppet.deadbones_duration >= 100.0 && puppet.deadbones_duration < 300.0);
        assert!(puppet.deadbones_start_y.abs() <= 10.0);
        let head = puppet.head()[0];
        let local = ctx.graph.local(head.node).unwrap();
        assert_eq!(local.offset.y, head.y + puppet.deadbones_start_y);
    }
}
