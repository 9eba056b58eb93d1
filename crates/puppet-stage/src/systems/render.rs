use glam::Affine2;

use crate::api::types::NodeId;
use crate::components::sprite::{Primitive, PrimitiveKind};
use crate::core::scene::SceneGraph;
use crate::renderer::instance::{RenderBuffer, RenderInstance};

/// Flatten the visible subtree under `root` into `buffer`, back to front.
///
/// Hidden nodes hide their whole subtree. Alpha multiplies down the tree. Emitters
/// draw one instance per live particle, faded by remaining life.
pub fn build_render_buffer(graph: &SceneGraph, root: NodeId, buffer: &mut RenderBuffer) {
    buffer.clear();
    let parent = graph
        .parent(root)
        .map(|p| graph.world_affine(p))
        .unwrap_or(Affine2::IDENTITY);
    push_node(graph, root, parent, 1.0, buffer);
}

fn push_node(graph: &SceneGraph, id: NodeId, parent: Affine2, parent_alpha: f32, buffer: &mut RenderBuffer) {
    let Some(node) = graph.get(id) else { return };
    if !node.visible {
        return;
    }
    let affine = parent * node.local.to_affine();
    let alpha = parent_alpha * node.alpha;
    if alpha <= 0.0 {
        return;
    }

    if let Some(primitive) = &node.primitive {
        push_primitive(primitive, affine, alpha, buffer);
    }
    for &child in node.children() {
        push_node(graph, child, affine, alpha, buffer);
    }
}

fn push_primitive(primitive: &Primitive, affine: Affine2, alpha: f32, buffer: &mut RenderBuffer) {
    let texture = primitive.texture.map(|t| t.0 as f32).unwrap_or(0.0);
    match &primitive.kind {
        PrimitiveKind::Missing => {}
        PrimitiveKind::Static | PrimitiveKind::Animated(_) => {
            let (scale, rotation, translation) = affine.to_scale_angle_translation();
            buffer.push(RenderInstance {
                x: translation.x,
                y: translation.y,
                rotation,
                scale_x: scale.x * primitive.scale.x,
                scale_y: scale.y * primitive.scale.y,
                alpha,
                texture,
                frame: primitive.frame() as f32,
            });
        }
        PrimitiveKind::Emitter(emitter) => {
            let (scale, rotation, _) = affine.to_scale_angle_translation();
            let lifetime = emitter.config.lifetime.max(f32::EPSILON);
            for particle in emitter.particles() {
                let position = affine.transform_point2(particle.position);
                let size = scale * primitive.scale;
                buffer.push(RenderInstance {
                    x: position.x,
                    y: position.y,
                    rotation,
                    scale_x: size.x,
                    scale_y: size.y,
                    alpha: alpha * (particle.life / lifetime).clamp(0.0, 1.0),
                    texture,
                    frame: 0.0,
                });
            }
        }
    }
}
