//! Retained scene graph: the visual nodes puppets and decorations are built from.
//!
//! Nodes live in a flat arena keyed by `NodeId`. A node with no parent is detached
//! (templates, swapped-out puppets). Removing a node drops its whole subtree.

use std::collections::HashMap;

use glam::Affine2;

use crate::api::types::{ListenerId, NodeId};
use crate::components::sprite::Primitive;
use crate::extensions::transform::{LocalTransform, Rect};

/// A visual node: a transform, visibility, and optionally one primitive.
#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub local: LocalTransform,
    pub alpha: f32,
    pub visible: bool,
    pub primitive: Option<Primitive>,
    /// Generic listeners attached to this node.
    listeners: Vec<ListenerId>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local: LocalTransform::default(),
            alpha: 1.0,
            visible: true,
            primitive: None,
            listeners: Vec::new(),
        }
    }
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    next_id: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached node with default transform.
    pub fn create(&mut self) -> NodeId {
        self.create_with(LocalTransform::default())
    }

    /// Create a detached node with a specific local transform.
    pub fn create_with(&mut self, local: LocalTransform) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                local,
                ..Node::default()
            },
        );
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Append `child` to `parent`, detaching it from any previous parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `child` into `parent` at `index` (clamped), detaching it first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent == child || !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
            return;
        }
        self.detach(child);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
    }

    /// Unlink a node from its parent. The node and its subtree stay alive.
    /// Returns the index it occupied, if it had a parent.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        let mut index = None;
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            index = parent_node.children.iter().position(|&c| c == id);
            parent_node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
        }
        index
    }

    /// Detach and drop a node together with all of its descendants.
    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
    }

    /// Remove every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.remove(child);
        }
    }

    pub fn local(&self, id: NodeId) -> Option<&LocalTransform> {
        self.nodes.get(&id).map(|n| &n.local)
    }

    pub fn local_mut(&mut self, id: NodeId) -> Option<&mut LocalTransform> {
        self.nodes.get_mut(&id).map(|n| &mut n.local)
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.visible = visible;
        }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.visible)
    }

    pub fn set_alpha(&mut self, id: NodeId, alpha: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.alpha = alpha;
        }
    }

    pub fn set_primitive(&mut self, id: NodeId, primitive: Option<Primitive>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.primitive = primitive;
        }
    }

    pub fn add_listener(&mut self, id: NodeId, listener: ListenerId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            if !node.listeners.contains(&listener) {
                node.listeners.push(listener);
            }
        }
    }

    /// Stage-from-local affine for a node, composed up the parent chain.
    pub fn world_affine(&self, id: NodeId) -> Affine2 {
        let mut affine = Affine2::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(&node_id) else { break };
            affine = node.local.to_affine() * affine;
            current = node.parent;
        }
        affine
    }

    /// Bounds of the visible content under `id`, in `id`'s own space.
    pub fn local_bounds(&self, id: NodeId) -> Option<Rect> {
        self.bounds_with(id, Affine2::IDENTITY)
    }

    /// Bounds of the visible content under `id`, in stage space.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        self.bounds_with(id, self.world_affine(id))
    }

    /// Rendered width: local content width times the node's own horizontal scale.
    pub fn width(&self, id: NodeId) -> f32 {
        let scale = self.local(id).map(|l| l.scale.x.abs()).unwrap_or(1.0);
        self.local_bounds(id).map(|b| b.width() * scale).unwrap_or(0.0)
    }

    fn bounds_with(&self, id: NodeId, affine: Affine2) -> Option<Rect> {
        let node = self.nodes.get(&id)?;
        if !node.visible {
            return None;
        }
        let mut bounds = node
            .primitive
            .as_ref()
            .map(|p| p.bounds().transformed(&affine));
        for &child in &node.children {
            let Some(child_node) = self.nodes.get(&child) else { continue };
            let child_affine = affine * child_node.local.to_affine();
            if let Some(child_bounds) = self.bounds_with(child, child_affine) {
                bounds = Some(match bounds {
                    Some(b) => b.union(child_bounds),
                    None => child_bounds,
                });
            }
        }
        bounds
    }

    /// Depth-first, parent-before-children walk of the subtree rooted at `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(&next) {
                out.push(next);
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
