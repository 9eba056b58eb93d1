//! Layer tree compilation.
//!
//! Turns a `LayerSpec` tree into scene nodes and collects what the owning puppet
//! animates later: head nodes, emote groups, particle emitters, the legacy babble pool
//! and entrance animations. Conflicting tags are logged and dropped; compilation
//! itself never fails.

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;

use crate::api::types::NodeId;
use crate::assets::registry::AssetCatalog;
use crate::components::layer::{EmoteLayer, EntranceAnimation, EntranceKind, LayerSpec};
use crate::core::scene::SceneGraph;
use crate::extensions::transform::LocalTransform;
use crate::extensions::tween::{Tween, TweenState};

/// Key of the neutral emote every puppet has.
pub const DEFAULT_EMOTE: &str = "0";

/// Zoom factor a `FADE_ZOOM` entrance starts from.
const ZOOM_FROM: f32 = 1.5;

/// Nodes shown together when an emote is active.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmoteGroup {
    pub name: String,
    pub base: Vec<NodeId>,
    pub eyes: Vec<NodeId>,
    pub mouth: Vec<NodeId>,
}

impl EmoteGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn bucket(&self, layer: EmoteLayer) -> &[NodeId] {
        match layer {
            EmoteLayer::Base => &self.base,
            EmoteLayer::Eyes => &self.eyes,
            EmoteLayer::Mouth => &self.mouth,
        }
    }

    fn bucket_mut(&mut self, layer: EmoteLayer) -> &mut Vec<NodeId> {
        match layer {
            EmoteLayer::Base => &mut self.base,
            EmoteLayer::Eyes => &mut self.eyes,
            EmoteLayer::Mouth => &mut self.mouth,
        }
    }

    /// Every node of the group, base first.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.base
            .iter()
            .chain(self.eyes.iter())
            .chain(self.mouth.iter())
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.eyes.is_empty() && self.mouth.is_empty()
    }
}

/// A head-tagged node and its authored pose, which wobble offsets are added to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadNode {
    pub node: NodeId,
    pub y: f32,
    pub rotation: f32,
}

/// A compiled leaf: which asset it draws and where its primitive lives.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBinding {
    pub asset: String,
    /// The leaf as authored, kept to rebuild the primitive after an asset change.
    pub layer: LayerSpec,
    pub node: NodeId,
    pub primitive: NodeId,
}

/// Entrance effect recorded for a node, replayed whenever the node is shown again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entrance {
    pub animation: EntranceAnimation,
    /// Authored scale the zoom settles on.
    pub scale: Vec2,
}

/// Layers tagged `babble` outside any emote, cycled on their own during babble.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BabblePool {
    pub eyes: Vec<NodeId>,
    pub mouth: Vec<NodeId>,
}

impl BabblePool {
    pub fn get(&self, layer: EmoteLayer) -> &[NodeId] {
        match layer {
            EmoteLayer::Eyes => &self.eyes,
            EmoteLayer::Mouth => &self.mouth,
            EmoteLayer::Base => &[],
        }
    }
}

/// Everything a compiled layer tree hands to its puppet.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLayers {
    pub root: NodeId,
    pub head: Vec<HeadNode>,
    pub emotes: BTreeMap<String, EmoteGroup>,
    /// Nodes holding emitter primitives.
    pub particles: Vec<NodeId>,
    pub bindings: Vec<AssetBinding>,
    pub babble: BabblePool,
    pub entrances: HashMap<NodeId, Entrance>,
}

/// Tags a node passes down to its children.
#[derive(Debug, Clone, Default)]
struct Inherited {
    head: bool,
    emote: Option<String>,
    emote_layer: Option<EmoteLayer>,
    babble: bool,
    /// Bundle ids expanded on the way down, for cycle detection.
    bundles: Vec<String>,
}

/// Compiles layer trees into a scene graph.
pub struct LayerBuilder<'a> {
    catalog: &'a AssetCatalog,
    graph: &'a mut SceneGraph,
    tweens: &'a mut TweenState,
    animations: bool,
    head: Vec<HeadNode>,
    emotes: BTreeMap<String, EmoteGroup>,
    particles: Vec<NodeId>,
    bindings: Vec<AssetBinding>,
    babble: BabblePool,
    entrances: HashMap<NodeId, Entrance>,
}

impl<'a> LayerBuilder<'a> {
    /// `animations` gates entrance tweens; they are recorded either way.
    pub fn new(
        catalog: &'a AssetCatalog,
        graph: &'a mut SceneGraph,
        tweens: &'a mut TweenState,
        animations: bool,
    ) -> Self {
        Self {
            catalog,
            graph,
            tweens,
            animations,
            head: Vec::new(),
            emotes: BTreeMap::new(),
            particles: Vec::new(),
            bindings: Vec::new(),
            babble: BabblePool::default(),
            entrances: HashMap::new(),
        }
    }

    /// Compile a whole description. The result always has a `"0"` emote group.
    pub fn build(mut self, layers: &LayerSpec) -> CompiledLayers {
        let root = self.compile(layers, &Inherited::default());
        self.emotes
            .entry(DEFAULT_EMOTE.to_string())
            .or_insert_with(|| EmoteGroup::new(DEFAULT_EMOTE));
        CompiledLayers {
            root,
            head: self.head,
            emotes: self.emotes,
            particles: self.particles,
            bindings: self.bindings,
            babble: self.babble,
            entrances: self.entrances,
        }
    }

    fn compile(&mut self, layer: &LayerSpec, inherited: &Inherited) -> NodeId {
        let node = self.graph.create();
        let mut context = inherited.clone();

        let mut own_head = false;
        if layer.head == Some(true) {
            if inherited.head {
                log::warn!("head layer \"{}\" is already inside a head; ignoring", layer.label());
            } else {
                own_head = true;
                context.head = true;
            }
        }

        if let Some(key) = &layer.emote {
            if let Some(outer) = &inherited.emote {
                log::warn!(
                    "emote \"{}\" on \"{}\" is inside emote \"{}\"; ignoring",
                    key,
                    layer.label(),
                    outer
                );
            } else if self.emotes.contains_key(key) {
                log::warn!("duplicate emote \"{}\" on \"{}\"; keeping the first", key, layer.label());
            } else {
                self.emotes.insert(key.clone(), EmoteGroup::new(key.clone()));
                context.emote = Some(key.clone());
            }
        }

        let mut own_layer = None;
        if let Some(emote_layer) = layer.emote_layer {
            if inherited.emote_layer.is_some() {
                log::warn!(
                    "emote layer on \"{}\" is inside another emote layer; ignoring",
                    layer.label()
                );
            } else {
                own_layer = Some(emote_layer);
                context.emote_layer = Some(emote_layer);
            }
        }

        let own_babble = layer.babble == Some(true) && !inherited.babble;
        if own_babble {
            context.babble = true;
        }

        let catalog = self.catalog;
        if let Some(children) = &layer.children {
            self.apply_group_transform(node, layer);
            self.compile_children(node, children, &context);
        } else if let Some((id, children)) = layer
            .id
            .as_deref()
            .and_then(|id| catalog.bundle_layers(id).map(|children| (id, children)))
        {
            if context.bundles.iter().any(|visited| visited == id) {
                log::warn!("bundle \"{}\" includes itself; stopping expansion", id);
            } else {
                context.bundles.push(id.to_string());
                self.apply_group_transform(node, layer);
                self.compile_children(node, children, &context);
            }
        } else {
            self.compile_leaf(node, layer);
        }

        if own_head {
            let local = self.graph.local(node).copied().unwrap_or_default();
            self.head.push(HeadNode {
                node,
                y: local.offset.y,
                rotation: local.rotation,
            });
        }

        self.file_emote(node, layer, inherited, &context, own_layer, own_babble);

        if let Some(animation) = layer.animation {
            if animation.kind != EntranceKind::None {
                let scale = self.graph.local(node).map(|l| l.scale).unwrap_or(Vec2::ONE);
                let entrance = Entrance { animation, scale };
                if self.animations {
                    play_entrance(self.graph, self.tweens, node, &entrance);
                }
                self.entrances.insert(node, entrance);
            }
        }

        node
    }

    fn compile_children(&mut self, node: NodeId, children: &[LayerSpec], context: &Inherited) {
        for child in children {
            let child = self.compile(child, context);
            self.graph.add_child(node, child);
        }
    }

    fn apply_group_transform(&mut self, node: NodeId, layer: &LayerSpec) {
        if !layer.has_transform() {
            return;
        }
        if let Some(local) = self.graph.local_mut(node) {
            *local = LocalTransform::new()
                .with_offset(Vec2::new(layer.x.unwrap_or(0.0), layer.y.unwrap_or(0.0)))
                .with_rotation(layer.rotation.unwrap_or(0.0))
                .with_scale(Vec2::new(
                    layer.scale_x.unwrap_or(1.0),
                    layer.scale_y.unwrap_or(1.0),
                ));
        }
    }

    fn compile_leaf(&mut self, node: NodeId, layer: &LayerSpec) {
        if let Some(local) = self.graph.local_mut(node) {
            *local = self.catalog.leaf_transform(layer);
        }

        let primitive = self.catalog.primitive(layer);
        let emits = primitive.emitter().is_some();
        let asset = primitive.asset.clone();
        let sprite = self.graph.create();
        self.graph.set_primitive(sprite, Some(primitive));
        self.graph.add_child(node, sprite);

        if emits {
            self.particles.push(sprite);
        }
        self.bindings.push(AssetBinding {
            asset,
            layer: layer.clone(),
            node,
            primitive: sprite,
        });
    }

    /// File `node` into an emote bucket, or into the legacy babble pool.
    ///
    /// A node joins its emote when it opens an emote layer itself, or when it is a leaf
    /// not already covered by an enclosing emote layer.
    fn file_emote(
        &mut self,
        node: NodeId,
        layer: &LayerSpec,
        inherited: &Inherited,
        context: &Inherited,
        own_layer: Option<EmoteLayer>,
        own_babble: bool,
    ) {
        if let Some(key) = &context.emote {
            let bucket = match own_layer {
                Some(emote_layer) => Some(emote_layer),
                None if layer.children.is_none() && inherited.emote_layer.is_none() => {
                    Some(EmoteLayer::Base)
                }
                None => None,
            };
            if let (Some(bucket), Some(group)) = (bucket, self.emotes.get_mut(key)) {
                group.bucket_mut(bucket).push(node);
            }
        } else if own_babble {
            self.graph.set_visible(node, false);
            match context.emote_layer {
                Some(EmoteLayer::Eyes) => self.babble.eyes.push(node),
                Some(EmoteLayer::Mouth) => self.babble.mouth.push(node),
                _ => {}
            }
        }
    }
}

/// Start (or restart) a node's entrance effect.
pub(crate) fn play_entrance(
    graph: &mut SceneGraph,
    tweens: &mut TweenState,
    node: NodeId,
    entrance: &Entrance,
) {
    let EntranceAnimation {
        kind,
        duration,
        delay,
        easing,
    } = entrance.animation;
    match kind {
        EntranceKind::Fade => {
            tweens.remove_node(node);
            tweens.add(graph, node, Tween::alpha(0.0, 1.0, duration, easing).with_delay(delay));
        }
        EntranceKind::FadeZoom => {
            tweens.remove_node(node);
            tweens.add(graph, node, Tween::alpha(0.0, 1.0, duration, easing).with_delay(delay));
            tweens.add(
                graph,
                node,
                Tween::scale(entrance.scale * ZOOM_FROM, entrance.scale, duration, easing)
                    .with_delay(delay),
            );
        }
        EntranceKind::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::manifest::Asset;

    fn catalog() -> AssetCatalog {
        let mut catalog = AssetCatalog::new();
        for id in ["body", "head", "eyes", "mouth", "blink", "talk"] {
            catalog.insert(id, Asset::sprite(format!("{id}.png"), 100.0, 100.0));
        }
        catalog.insert("hat", Asset::bundle(vec![LayerSpec::asset("body"), LayerSpec::asset("head")]));
        catalog.insert("loop", Asset::bundle(vec![LayerSpec::asset("loop")]));
        catalog
    }

    fn compile(layers: &LayerSpec) -> (CompiledLayers, SceneGraph, TweenState) {
        let catalog = catalog();
        let mut graph = SceneGraph::new();
        let mut tweens = TweenState::new();
        let compiled = LayerBuilder::new(&catalog, &mut graph, &mut tweens, true).build(layers);
        (compiled, graph, tweens)
    }

    fn happy_face() -> LayerSpec {
        LayerSpec::group(vec![
            LayerSpec::asset("eyes").with_emote_layer(EmoteLayer::Eyes),
            LayerSpec::asset("mouth").with_emote_layer(EmoteLayer::Mouth),
            LayerSpec::asset("head"),
        ])
        .with_emote("happy")
    }

    #[test]
    fn synthesizes_default_emote() {
        let (compiled, _, _) = compile(&LayerSpec::asset("body"));
        assert!(compiled.emotes[DEFAULT_EMOTE].is_empty());
        assert_eq!(compiled.emotes.len(), 1);
    }

    #[test]
    fn leaf_gets_a_single_primitive_child() {
        let (compiled, graph, _) = compile(&LayerSpec::asset("body").with_position(3.0, -4.0));
        let children = graph.children(compiled.root);
        assert_eq!(children.len(), 1);
        assert!(graph.get(children[0]).unwrap().primitive.is_some());
        assert_eq!(graph.local(compiled.root).unwrap().offset, Vec2::new(3.0, -4.0));
        assert_eq!(compiled.bindings.len(), 1);
        assert_eq!(compiled.bindings[0].asset, "body");
    }

    #[test]
    fn files_emote_layers_into_buckets() {
        let (compiled, _, _) = compile(&LayerSpec::group(vec![LayerSpec::asset("body"), happy_face()]));
        let happy = &compiled.emotes["happy"];
        assert_eq!(happy.eyes.len(), 1);
        assert_eq!(happy.mouth.len(), 1);
        // The untagged head leaf defaults to base; the group node itself is not filed.
        assert_eq!(happy.base.len(), 1);
    }

    #[test]
    fn leaves_inside_an_emote_layer_are_not_filed_twice() {
        let eyes = LayerSpec::group(vec![LayerSpec::asset("eyes"), LayerSpec::asset("blink")])
            .with_emote_layer(EmoteLayer::Eyes);
        let (compiled, _, _) = compile(&LayerSpec::group(vec![eyes]).with_emote("sleepy"));
        let sleepy = &compiled.emotes["sleepy"];
        assert_eq!(sleepy.eyes.len(), 1);
        assert!(sleepy.base.is_empty());
    }

    #[test]
    fn duplicate_and_nested_emotes_are_ignored() {
        let nested = LayerSpec::group(vec![LayerSpec::asset("eyes").with_emote("inner")]).with_emote("outer");
        let first = LayerSpec::asset("mouth").with_emote("dup");
        let second = LayerSpec::asset("head").with_emote("dup");
        let (compiled, _, _) = compile(&LayerSpec::group(vec![nested, first, second]));
        assert!(!compiled.emotes.contains_key("inner"));
        assert_eq!(compiled.emotes["outer"].base.len(), 1);
        assert_eq!(compiled.emotes["dup"].base.len(), 1);
    }

    #[test]
    fn nested_emote_layer_tag_is_ignored() {
        let inner = LayerSpec::asset("mouth").with_emote_layer(EmoteLayer::Mouth);
        let eyes = LayerSpec::group(vec![inner]).with_emote_layer(EmoteLayer::Eyes);
        let (compiled, _, _) = compile(&LayerSpec::group(vec![eyes]).with_emote("wink"));
        let wink = &compiled.emotes["wink"];
        assert_eq!(wink.eyes.len(), 1);
        assert!(wink.mouth.is_empty());
    }

    #[test]
    fn head_inside_head_records_only_the_outer() {
        let layers = LayerSpec::group(vec![LayerSpec::asset("head").with_head()])
            .with_head()
            .with_position(0.0, -120.0);
        let (compiled, _, _) = compile(&layers);
        assert_eq!(compiled.head.len(), 1);
        assert_eq!(compiled.head[0].node, compiled.root);
        assert_eq!(compiled.head[0].y, -120.0);
    }

    #[test]
    fn bundles_expand_inline() {
        let (compiled, graph, _) = compile(&LayerSpec::asset("hat").with_position(0.0, 10.0));
        assert_eq!(graph.children(compiled.root).len(), 2);
        assert_eq!(compiled.bindings.len(), 2);
        assert_eq!(graph.local(compiled.root).unwrap().offset.y, 10.0);
    }

    #[test]
    fn recursive_bundle_stops() {
        let (compiled, graph, _) = compile(&LayerSpec::asset("loop"));
        // root -> loop (expanded once) -> loop (cycle, no children)
        let inner = graph.children(compiled.root);
        assert_eq!(inner.len(), 1);
        assert!(graph.children(inner[0]).is_empty());
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn sibling_bundles_do_not_trip_the_cycle_guard() {
        let (compiled, _, _) = compile(&LayerSpec::group(vec![LayerSpec::asset("hat"), LayerSpec::asset("hat")]));
        assert_eq!(compiled.bindings.len(), 4);
    }

    #[test]
    fn legacy_babble_layers_start_hidden() {
        let mut blink = LayerSpec::asset("blink").with_emote_layer(EmoteLayer::Eyes);
        blink.babble = Some(true);
        let mut talk = LayerSpec::asset("talk").with_emote_layer(EmoteLayer::Mouth);
        talk.babble = Some(true);
        let (compiled, graph, _) = compile(&LayerSpec::group(vec![blink, talk]));
        assert_eq!(compiled.babble.eyes.len(), 1);
        assert_eq!(compiled.babble.mouth.len(), 1);
        assert!(!graph.is_visible(compiled.babble.eyes[0]));
    }

    #[test]
    fn entrance_animations_start_tweens() {
        let mut fade = LayerSpec::asset("body");
        fade.animation = Some(EntranceAnimation::new(EntranceKind::Fade));
        let mut zoom = LayerSpec::asset("head");
        zoom.animation = Some(EntranceAnimation::new(EntranceKind::FadeZoom));
        let mut plain = LayerSpec::asset("eyes");
        plain.animation = Some(EntranceAnimation::new(EntranceKind::None));
        let (compiled, graph, tweens) = compile(&LayerSpec::group(vec![fade, zoom, plain]));
        assert_eq!(tweens.len(), 3);
        assert_eq!(compiled.entrances.len(), 2);
        let children = graph.children(compiled.root);
        assert_eq!(graph.get(children[0]).unwrap().alpha, 0.0);
        assert_eq!(graph.local(children[1]).unwrap().scale, Vec2::splat(1.5));
        assert_eq!(graph.get(children[2]).unwrap().alpha, 1.0);
    }

    #[test]
    fn disabled_animations_record_but_do_not_play() {
        let catalog = catalog();
        let mut graph = SceneGraph::new();
        let mut tweens = TweenState::new();
        let mut fade = LayerSpec::asset("body");
        fade.animation = Some(EntranceAnimation::new(EntranceKind::Fade));
        let compiled = LayerBuilder::new(&catalog, &mut graph, &mut tweens, false).build(&fade);
        assert!(tweens.is_empty());
        assert_eq!(compiled.entrances.len(), 1);
        assert_eq!(graph.get(compiled.root).unwrap().alpha, 1.0);
    }
}
