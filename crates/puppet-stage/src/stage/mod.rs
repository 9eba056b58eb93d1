//! The stage: decoration layers, live puppets and the per-frame tick.
//!
//! The scene is three layer nodes under one root, drawn back to front: background
//! decoration, puppets, foreground decoration. Puppets sit in numbered slots across the
//! puppet layer (see [`layout`]).

mod babble;
pub mod layout;
mod movement;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::error::{StageError, StageResult};
use crate::api::types::{ListenerId, NodeId, PuppetEvent, PuppetId};
use crate::assets::manifest::Asset;
use crate::assets::registry::AssetCatalog;
use crate::components::layer::{LayerSpec, StageLayer, CHARACTER_PLACEHOLDER};
use crate::components::sprite::PrimitiveKind;
use crate::core::rng::Rng;
use crate::core::scene::SceneGraph;
use crate::extensions::transform::LocalTransform;
use crate::extensions::tween::TweenState;
use crate::input::queue::InputEvent;
use crate::puppet::{Puppet, PuppetMut, PuppetTemplate};
use crate::renderer::instance::RenderBuffer;
use crate::renderer::traits::{FrameData, Renderer};
use crate::systems::render::build_render_buffer;

pub use layout::{SlotLayout, MIN_SLOT_WIDTH};
pub use movement::bounce;

/// Stage settings (the "environment" of a project).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageConfig {
    /// Number of on-stage slots.
    pub num_characters: u32,
    /// Uniform scale applied to every puppet.
    pub puppet_scale: f32,
    /// Authored size of the decoration; it is scaled to cover the viewport.
    pub width: f32,
    pub height: f32,
    /// Play entrance animations.
    pub animations: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Decoration. Children before `CHARACTER_PLACEHOLDER` go behind the puppets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<LayerSpec>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            num_characters: 5,
            puppet_scale: 1.0,
            width: 1920.0,
            height: 1080.0,
            animations: true,
            color: None,
            layers: None,
        }
    }
}

impl StageConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn effective_puppet_scale(&self) -> f32 {
        if self.puppet_scale > 0.0 {
            self.puppet_scale
        } else {
            1.0
        }
    }
}

/// Mutable state shared by everything that draws into the stage.
pub struct StageContext {
    pub graph: SceneGraph,
    pub tweens: TweenState,
    pub rng: Rng,
    /// Set by any visible change; cleared by a render.
    pub dirty: bool,
    /// Whether entrance animations play.
    pub animations: bool,
}

impl StageContext {
    pub fn new(animations: bool) -> Self {
        Self {
            graph: SceneGraph::new(),
            tweens: TweenState::new(),
            rng: Rng::default(),
            dirty: true,
            animations,
        }
    }
}

struct Listener {
    id: ListenerId,
    event: String,
    callback: Box<dyn FnMut(&PuppetEvent)>,
}

/// A puppet stage.
pub struct Stage {
    config: StageConfig,
    catalog: AssetCatalog,
    ctx: StageContext,
    layout: SlotLayout,
    root: NodeId,
    layers: [NodeId; StageLayer::COUNT],
    puppets: Vec<Puppet>,
    listeners: Vec<Listener>,
    next_listener: u32,
    buffer: RenderBuffer,
    enabled: bool,
}

impl Stage {
    /// Create a stage at the environment's authored size and build its decoration.
    pub fn new(config: StageConfig, catalog: AssetCatalog) -> Self {
        let mut ctx = StageContext::new(config.animations);
        let root = ctx.graph.create();
        let layers = StageLayer::ALL.map(|_| {
            let layer = ctx.graph.create();
            ctx.graph.add_child(root, layer);
            layer
        });
        let viewport = Vec2::new(config.width, config.height);
        let layout = SlotLayout::new(config.num_characters, config.effective_puppet_scale(), viewport);

        let mut stage = Self {
            config,
            catalog,
            ctx,
            layout,
            root,
            layers,
            puppets: Vec::new(),
            listeners: Vec::new(),
            next_listener: 1,
            buffer: RenderBuffer::with_capacity(256),
            enabled: true,
        };
        stage.resize(None, None);
        stage.update_environment();
        stage
    }

    /// Reseed babble and deadbones randomness.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ctx.rng = Rng::new(seed);
        self
    }

    /// A disabled stage keeps its state but `frame` stops advancing it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.ctx.graph
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn layer(&self, layer: StageLayer) -> NodeId {
        self.layers[layer as usize]
    }

    pub fn is_dirty(&self) -> bool {
        self.ctx.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.ctx.dirty = true;
    }

    /// Fit the stage to a new viewport. Missing dimensions keep their current value.
    pub fn resize(&mut self, width: Option<f32>, height: Option<f32>) {
        let viewport = Vec2::new(
            width.unwrap_or(self.layout.viewport.x),
            height.unwrap_or(self.layout.viewport.y),
        );
        self.layout.fit(viewport);

        let puppet_layer = self.layer(StageLayer::Puppets);
        if let Some(local) = self.ctx.graph.local_mut(puppet_layer) {
            *local = LocalTransform::new().with_scale(Vec2::splat(self.layout.layer_scale));
        }

        let cover = (viewport.x / self.config.width).max(viewport.y / self.config.height);
        let cover = if cover.is_finite() && cover > 0.0 { cover } else { 1.0 };
        for layer in [StageLayer::Background, StageLayer::Foreground] {
            let node = self.layer(layer);
            if let Some(local) = self.ctx.graph.local_mut(node) {
                *local = LocalTransform::new()
                    .with_offset(Vec2::new(viewport.x / 2.0, viewport.y))
                    .with_scale(Vec2::splat(cover));
            }
        }

        for puppet in &self.puppets {
            puppet.update_position(&mut self.ctx.graph, &self.layout);
        }
        self.ctx.dirty = true;
    }

    /// Rebuild background and foreground decoration from the environment's layers.
    pub fn update_environment(&mut self) {
        let background = self.layer(StageLayer::Background);
        let foreground = self.layer(StageLayer::Foreground);
        self.ctx.graph.clear_children(background);
        self.ctx.graph.clear_children(foreground);
        self.ctx.tweens.prune(&self.ctx.graph);

        let children = self
            .config
            .layers
            .as_ref()
            .and_then(|layers| layers.children.clone())
            .unwrap_or_default();

        let mut parent = background;
        let mut count = 0;
        for child in &children {
            if child.id.as_deref() == Some(CHARACTER_PLACEHOLDER) {
                parent = foreground;
                continue;
            }
            let decoration = Puppet::build(
                &PuppetTemplate::new(child.clone()),
                None,
                &self.catalog,
                &mut self.ctx,
                &self.layout,
            );
            if let Some(local) = self.ctx.graph.local_mut(decoration.root()) {
                *local = LocalTransform::default();
            }
            self.ctx.graph.add_child(parent, decoration.root());
            count += 1;
        }
        log::debug!("environment rebuilt with {} decoration layers", count);
        self.ctx.dirty = true;
    }

    /// Build a detached puppet, for handing to [`Stage::set_puppet`].
    ///
    /// Its nodes already live in the stage graph. A puppet that is never set must be
    /// given back through [`Stage::discard_puppet`].
    pub fn create_puppet(&mut self, template: &PuppetTemplate) -> Puppet {
        Puppet::build(template, None, &self.catalog, &mut self.ctx, &self.layout)
    }

    /// Free the nodes and tweens of a puppet that is not on stage.
    pub fn discard_puppet(&mut self, puppet: Puppet) {
        self.ctx.graph.remove(puppet.root());
        self.ctx.tweens.prune(&self.ctx.graph);
    }

    /// Build a puppet from `template` and put it on stage under `id`.
    pub fn add_puppet(&mut self, template: &PuppetTemplate, id: PuppetId) -> StageResult<PuppetMut<'_>> {
        if self.index_of(id).is_some() {
            return Err(StageError::IdOccupied(id));
        }
        let puppet = Puppet::build(template, Some(id), &self.catalog, &mut self.ctx, &self.layout);
        let layer = self.layer(StageLayer::Puppets);
        self.ctx.graph.add_child(layer, puppet.root());
        self.attach_listeners(puppet.root());
        puppet.update_position(&mut self.ctx.graph, &self.layout);
        log::info!("added puppet {} at slot {}", id, puppet.position);

        self.puppets.push(puppet);
        self.ctx.dirty = true;
        let index = self.puppets.len() - 1;
        Ok(PuppetMut::new(&mut self.puppets[index], &mut self.ctx, &self.layout))
    }

    /// Swap the puppet on stage under `id` for `puppet`, keeping its stage identity and
    /// draw order. On failure the new puppet's nodes are dropped.
    pub fn set_puppet(&mut self, id: PuppetId, mut puppet: Puppet) -> StageResult<PuppetMut<'_>> {
        let Some(index) = self.index_of(id) else {
            self.discard_puppet(puppet);
            return Err(StageError::PuppetNotFound(id));
        };

        puppet.inherit_from(&mut self.ctx, &self.puppets[index]);
        self.attach_listeners(puppet.root());

        let layer = self.layer(StageLayer::Puppets);
        let old_root = self.puppets[index].root();
        let slot = self
            .ctx
            .graph
            .detach(old_root)
            .unwrap_or_else(|| self.ctx.graph.children(layer).len());
        self.ctx.graph.insert_child(layer, slot, puppet.root());
        self.ctx.graph.remove(old_root);
        self.ctx.tweens.prune(&self.ctx.graph);
        self.puppets[index] = puppet;
        log::info!("swapped puppet {}", id);

        self.resize(None, None);
        Ok(PuppetMut::new(&mut self.puppets[index], &mut self.ctx, &self.layout))
    }

    /// Take a puppet off stage. Returns false if there was none with `id`.
    pub fn remove_puppet(&mut self, id: PuppetId) -> bool {
        self.ctx.dirty = true;
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let puppet = self.puppets.remove(index);
        self.ctx.graph.remove(puppet.root());
        self.ctx.tweens.prune(&self.ctx.graph);
        log::info!("removed puppet {}", id);
        true
    }

    pub fn clear_puppets(&mut self) {
        for puppet in self.puppets.drain(..) {
            self.ctx.graph.remove(puppet.root());
        }
        self.ctx.tweens.prune(&self.ctx.graph);
        self.ctx.dirty = true;
    }

    /// Walk every puppet off through the edge nearer its current target.
    pub fn banish_puppets(&mut self) {
        let slots = self.layout.slot_count as i32;
        for puppet in &mut self.puppets {
            if puppet.target as f32 > slots as f32 / 2.0 {
                puppet.target = slots + 1;
                puppet.facing_left = false;
            } else {
                puppet.target = 0;
                puppet.facing_left = true;
            }
            puppet.apply_facing(&mut self.ctx.graph, &self.layout);
        }
        self.ctx.dirty = true;
    }

    pub fn get_puppet(&self, id: PuppetId) -> Option<&Puppet> {
        self.puppets.iter().find(|p| p.id() == Some(id))
    }

    pub fn puppet_mut(&mut self, id: PuppetId) -> Option<PuppetMut<'_>> {
        let index = self.index_of(id)?;
        Some(PuppetMut::new(&mut self.puppets[index], &mut self.ctx, &self.layout))
    }

    /// Live puppets in insertion order.
    pub fn puppets(&self) -> &[Puppet] {
        &self.puppets
    }

    /// Rebuild every puppet from its template, e.g. after assets changed.
    pub fn reload_puppets(&mut self) {
        let live: Vec<(PuppetId, PuppetTemplate)> = self
            .puppets
            .iter()
            .filter_map(|p| p.id().map(|id| (id, p.template().clone())))
            .collect();
        for (id, template) in live {
            let puppet = self.create_puppet(&template);
            if let Err(err) = self.set_puppet(id, puppet) {
                log::warn!("reloading puppet {}: {}", id, err);
            }
        }
    }

    /// Insert or replace a catalog entry. Nothing on stage changes until it is updated.
    pub fn add_asset(&mut self, id: impl Into<String>, asset: Asset) -> Option<Asset> {
        self.catalog.insert(id, asset)
    }

    /// Redraw everything that uses asset `id`.
    ///
    /// Drawable leaves get a fresh primitive in place. Puppets whose tree changes shape
    /// (the asset is, or used to be, a bundle) are rebuilt.
    pub fn update_asset(&mut self, id: &str) {
        let bundle = self.catalog.get(id).is_some_and(Asset::is_bundle);
        let mut rebuild = Vec::new();
        for puppet in &self.puppets {
            let mut referenced = false;
            puppet.apply_to_asset(id, |_, _| referenced = true);
            let bound = puppet.bindings().iter().any(|b| b.asset == id);
            if referenced && (bundle || !bound) {
                rebuild.extend(puppet.id());
                continue;
            }
            for binding in puppet.bindings().iter().filter(|b| b.asset == id) {
                let primitive = self.catalog.primitive(&binding.layer);
                self.ctx.graph.set_primitive(binding.primitive, Some(primitive));
            }
        }

        for puppet_id in rebuild {
            let Some(template) = self.get_puppet(puppet_id).map(|p| p.template().clone()) else {
                continue;
            };
            let puppet = self.create_puppet(&template);
            if let Err(err) = self.set_puppet(puppet_id, puppet) {
                log::warn!("rebuilding puppet {}: {}", puppet_id, err);
            }
        }

        if self.config.layers.as_ref().is_some_and(|layers| references(layers, id)) {
            self.update_environment();
        }
        self.ctx.dirty = true;
    }

    /// Rebuild every puppet and the decoration against the current catalog.
    pub fn reload_assets(&mut self) {
        self.reload_puppets();
        self.update_environment();
    }

    /// Register `callback` for pointer `event` ("pointerdown", "pointerup",
    /// "pointermove") on every puppet, present and future.
    pub fn register_listener<F>(&mut self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: FnMut(&PuppetEvent) + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener {
            id,
            event: event.into(),
            callback: Box::new(callback),
        });
        for puppet in &self.puppets {
            self.ctx.graph.add_listener(puppet.root(), id);
        }
        id
    }

    /// Deliver pointer input to the topmost puppet under it.
    /// Returns true if any listener ran.
    pub fn dispatch_input(&mut self, event: InputEvent) -> bool {
        let point = event.position();
        let layer = self.layer(StageLayer::Puppets);
        let graph = &self.ctx.graph;
        let Some(root) = graph
            .children(layer)
            .iter()
            .rev()
            .copied()
            .find(|&root| graph.world_bounds(root).is_some_and(|b| b.contains(point)))
        else {
            return false;
        };
        let Some(puppet) = self.puppets.iter().find(|p| p.root() == root).and_then(Puppet::id) else {
            return false;
        };
        let attached = graph.get(root).map(|n| n.listeners().to_vec()).unwrap_or_default();

        let payload = PuppetEvent {
            puppet,
            x: point.x,
            y: point.y,
        };
        let mut handled = false;
        for listener in self
            .listeners
            .iter_mut()
            .filter(|l| l.event == event.name() && attached.contains(&l.id))
        {
            (listener.callback)(&payload);
            handled = true;
        }
        handled
    }

    /// Advance the stage by `delta` ms: movement then babble for each puppet in insertion
    /// order, then sprite sheets, emitters and tweens.
    pub fn update(&mut self, delta: f32) {
        for puppet in &mut self.puppets {
            if movement::advance(puppet, &mut self.ctx.graph, &self.layout, delta) {
                self.ctx.dirty = true;
            }
            if babble::advance(puppet, &mut self.ctx, delta) {
                self.ctx.dirty = true;
            }
        }

        self.tick_primitives(delta);

        if !self.ctx.tweens.is_empty() {
            self.ctx.dirty = true;
        }
        self.ctx.tweens.tick(delta, &mut self.ctx.graph);
    }

    fn tick_primitives(&mut self, delta: f32) {
        let StageContext { graph, rng, dirty, .. } = &mut self.ctx;
        for node in graph.descendants(self.root) {
            let Some(primitive) = graph.get_mut(node).and_then(|n| n.primitive.as_mut()) else {
                continue;
            };
            match &mut primitive.kind {
                PrimitiveKind::Animated(sheet) => {
                    if sheet.tick(delta) {
                        *dirty = true;
                    }
                }
                PrimitiveKind::Emitter(emitter) => {
                    emitter.tick(delta, rng);
                    if !emitter.particles().is_empty() {
                        *dirty = true;
                    }
                }
                PrimitiveKind::Static | PrimitiveKind::Missing => {}
            }
        }
    }

    /// Draw the whole scene and clear the dirty flag.
    pub fn render(&mut self, renderer: &mut dyn Renderer) {
        build_render_buffer(&self.ctx.graph, self.root, &mut self.buffer);
        renderer.draw(&FrameData {
            instances: &self.buffer.instances,
            viewport: self.layout.viewport,
            clear_color: self.config.color.as_deref(),
        });
        self.ctx.dirty = false;
    }

    /// Render only if something changed since the last render.
    pub fn render_if_dirty(&mut self, renderer: &mut dyn Renderer) -> bool {
        if !self.ctx.dirty {
            return false;
        }
        self.render(renderer);
        true
    }

    /// One host frame: update when enabled, then render if dirty.
    /// Returns true if a frame was drawn.
    pub fn frame(&mut self, delta: f32, renderer: &mut dyn Renderer) -> bool {
        if self.enabled {
            self.update(delta);
        }
        self.render_if_dirty(renderer)
    }

    /// Render and capture the result. Failures are logged, not returned.
    pub fn thumbnail(&mut self, renderer: &mut dyn Renderer) -> Option<Vec<u8>> {
        self.render(renderer);
        match renderer.snapshot() {
            Ok(image) => Some(image),
            Err(err) => {
                log::error!("failed to generate thumbnail: {}", err);
                None
            }
        }
    }

    fn index_of(&self, id: PuppetId) -> Option<usize> {
        self.puppets.iter().position(|p| p.id() == Some(id))
    }

    fn attach_listeners(&mut self, root: NodeId) {
        for listener in &self.listeners {
            self.ctx.graph.add_listener(root, listener.id);
        }
    }
}

/// Does any leaf under `layer` reference asset `id`?
fn references(layer: &LayerSpec, id: &str) -> bool {
    match &layer.children {
        Some(children) => children.iter().any(|child| references(child, id)),
        None => layer.id.as_deref() == Some(id),
    }
}
