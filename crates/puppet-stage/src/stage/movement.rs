//! Per-frame walking between slots.
//!
//! A crossing runs `moving_anim` from 0 to 1 over `MOVE_DURATION` seconds. Below
//! `SETTLE_POINT` the puppet travels; on passing it the puppet lands in the next slot and,
//! if that was the target, bounces until 1. Otherwise the next crossing starts at once.

use std::f32::consts::PI;

use glam::Vec2;

use crate::core::scene::SceneGraph;
use crate::puppet::{Puppet, MOVE_DURATION, SETTLE_POINT};
use crate::stage::layout::SlotLayout;

/// Vertical squash while walking: three half-bounces per slot, two more on arrival.
pub fn bounce(moving_anim: f32) -> f32 {
    1.0 + ((1.0 + moving_anim * 5.0) * PI).sin() / 40.0
}

/// Advance one puppet's walk by `delta` ms. Returns true if anything moved.
pub(crate) fn advance(puppet: &mut Puppet, graph: &mut SceneGraph, layout: &SlotLayout, delta: f32) -> bool {
    if puppet.is_idle() {
        puppet.direction = 0;
        return false;
    }

    if puppet.direction == 0 && puppet.target != puppet.position {
        puppet.direction = puppet.target.saturating_sub(puppet.position).signum();
    }

    let step = delta / (1000.0 * MOVE_DURATION);
    let previous = puppet.moving_anim;
    puppet.moving_anim += step;

    if puppet.moving_anim >= SETTLE_POINT && previous < SETTLE_POINT {
        puppet.position = puppet.position.saturating_add(puppet.direction);
        puppet.direction = 0;
        if puppet.position != puppet.target {
            puppet.moving_anim = 0.0;
        }
    } else if puppet.moving_anim >= 1.0 {
        puppet.moving_anim = 0.0;
        puppet.jiggling = false;
    }

    let facing = if puppet.facing_left { -1.0 } else { 1.0 };
    let current = graph.local(puppet.root()).map(|l| l.scale.x.signum()).unwrap_or(facing);
    let sign = if puppet.moving_anim >= SETTLE_POINT {
        facing
    } else if puppet.direction != 0 {
        puppet.direction as f32
    } else {
        current
    };

    let scale = layout.puppet_scale;
    if let Some(local) = graph.local_mut(puppet.root()) {
        local.scale = Vec2::new(sign * scale, bounce(puppet.moving_anim) * scale);
        local.offset.y = layout.floor_y();
    }

    let width = graph.width(puppet.root());
    let progress = (puppet.moving_anim / SETTLE_POINT).min(1.0);
    let x = layout.travel_x(puppet.position, puppet.direction, progress, width);
    if let Some(local) = graph.local_mut(puppet.root()) {
        local.offset.x = x;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::registry::AssetCatalog;
    use crate::stage::StageContext;
    use crate::test_support::{josh_template, test_catalog};

    fn setup() -> (AssetCatalog, StageContext, SlotLayout) {
        (test_catalog(), StageContext::new(false), SlotLayout::new(5, 1.0, Vec2::new(2500.0, 1000.0)))
    }

    fn walk(from: i32, to: i32, delta: f32) -> (Puppet, StageContext, SlotLayout, usize) {
        let (catalog, mut ctx, layout) = setup();
        let mut template = josh_template();
        template.position = from;
        let mut puppet = Puppet::build(&template, None, &catalog, &mut ctx, &layout);
        puppet.walk_to(to);
        let mut frames = 0;
        while !puppet.is_idle() {
            advance(&mut puppet, &mut ctx.graph, &layout, delta);
            frames += 1;
            assert!(frames < 100_000, "walk {from} -> {to} did not converge at {delta}ms");
        }
        (puppet, ctx, layout, frames)
    }

    #[test]
    fn converges_for_any_step_size() {
        for delta in [0.7, 5.0, 16.0, 33.3, 100.0, 449.0, 450.0, 800.0, 5000.0] {
            for (from, to) in [(1, 4), (4, 1), (0, 3), (6, 2), (2, 2), (3, 0), (3, 6)] {
                let (puppet, ..) = walk(from, to, delta);
                assert_eq!(puppet.position, to);
                assert_eq!(puppet.moving_anim, 0.0);
                assert_eq!(puppet.direction, 0);
            }
        }
    }

    #[test]
    fn converges_under_variable_steps() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.walk_to(5);
        let steps = [3.0, 250.0, 16.0, 1.0, 700.0, 40.0];
        let mut i = 0;
        while !puppet.is_idle() {
            advance(&mut puppet, &mut ctx.graph, &layout, steps[i % steps.len()]);
            i += 1;
            assert!(i < 10_000);
        }
        assert_eq!(puppet.position, 5);
    }

    #[test]
    fn one_slot_takes_one_move_duration() {
        let (puppet, _, _, frames) = walk(1, 2, 10.0);
        assert_eq!(puppet.position, 2);
        // 750ms of animation, plus the frame that resets it.
        assert!((75..=77).contains(&frames), "{frames}");
    }

    #[test]
    fn lands_at_the_settle_point() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.walk_to(2);
        advance(&mut puppet, &mut ctx.graph, &layout, 400.0);
        assert_eq!(puppet.position, 1);
        assert_eq!(puppet.direction, 1);
        advance(&mut puppet, &mut ctx.graph, &layout, 100.0);
        assert_eq!(puppet.position, 2);
        assert_eq!(puppet.direction, 0);
        assert!(puppet.moving_anim > SETTLE_POINT);
        let x = ctx.graph.local(puppet.root()).unwrap().offset.x;
        assert_eq!(x, layout.slot_x(2));
    }

    #[test]
    fn faces_travel_direction_then_resting_facing() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.target = 3;
        puppet.facing_left = true;
        advance(&mut puppet, &mut ctx.graph, &layout, 100.0);
        assert!(ctx.graph.local(puppet.root()).unwrap().scale.x > 0.0);
        while puppet.position != 3 {
            advance(&mut puppet, &mut ctx.graph, &layout, 100.0);
        }
        assert!(ctx.graph.local(puppet.root()).unwrap().scale.x < 0.0);
    }

    #[test]
    fn jiggle_bounces_in_place() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.jiggle();
        let mut frames = 0;
        while !puppet.is_idle() {
            assert!(advance(&mut puppet, &mut ctx.graph, &layout, 16.0));
            frames += 1;
        }
        assert!(frames > 1);
        assert_eq!(puppet.position, 1);
        assert!(!puppet.jiggling);
    }

    #[test]
    fn walk_stays_inside_the_extended_viewport() {
        let (catalog, mut ctx, layout) = setup();
        let mut template = josh_template();
        template.position = 0;
        let mut puppet = Puppet::build(&template, None, &catalog, &mut ctx, &layout);
        puppet.walk_to(6);
        while !puppet.is_idle() {
            advance(&mut puppet, &mut ctx.graph, &layout, 16.0);
            let width = ctx.graph.width(puppet.root());
            let x = ctx.graph.local(puppet.root()).unwrap().offset.x;
            assert!(x >= layout.left_edge(width) - 1e-3);
            assert!(x <= layout.right_edge(width) + 1e-3);
        }
    }

    #[test]
    fn extreme_slots_do_not_overflow() {
        let (catalog, mut ctx, layout) = setup();
        let mut puppet = Puppet::build(&josh_template(), None, &catalog, &mut ctx, &layout);
        puppet.position = i32::MIN;
        puppet.target = i32::MAX;
        advance(&mut puppet, &mut ctx.graph, &layout, 500.0);
        assert_eq!(puppet.position, i32::MIN + 1);

        puppet.position = i32::MAX;
        puppet.target = i32::MAX;
        puppet.direction = 1;
        puppet.moving_anim = 0.5;
        advance(&mut puppet, &mut ctx.graph, &layout, 100.0);
        assert_eq!(puppet.position, i32::MAX);
    }

    #[test]
    fn bounce_is_neutral_at_rest() {
        assert!((bounce(0.0) - 1.0).abs() < 1e-6);
        assert!((bounce(1.0) - 1.0).abs() < 1e-6);
    }
}
