//! Per-frame idle babble: eye and mouth swaps, or the deadbones head wobble.

use crate::puppet::Puppet;
use crate::stage::StageContext;

/// Advance babble timers for one puppet by `delta` ms. Returns true if it animated.
pub(crate) fn advance(puppet: &mut Puppet, ctx: &mut StageContext, delta: f32) -> bool {
    let mut animated = false;

    if puppet.babbling {
        animated = true;
        puppet.eyes_anim += delta;
        puppet.mouth_anim += delta;

        if puppet.eyes_anim >= puppet.eyes_duration && !puppet.emote_owns_eyes() {
            puppet.update_eye_babble(ctx);
        }
        if puppet.mouth_anim >= puppet.mouth_duration {
            puppet.update_mouth_babble(ctx);
        }
    }

    if puppet.deadbones_style && (puppet.babbling || puppet.deadbones_duration != 0.0) {
        animated = true;
        wobble(puppet, ctx, delta);
    }

    animated
}

/// Ease the head towards its wobble target; pick a new one when it arrives.
fn wobble(puppet: &mut Puppet, ctx: &mut StageContext, delta: f32) {
    puppet.deadbones_anim += delta;

    if puppet.deadbones_anim < puppet.deadbones_duration {
        let t = puppet.deadbones_anim / puppet.deadbones_duration;
        let eased = t * t;
        let y = puppet.deadbones_start_y + (puppet.deadbones_target_y - puppet.deadbones_start_y) * eased;
        let rotation = puppet.deadbones_start_rotation
            + (puppet.deadbones_target_rotation - puppet.deadbones_start_rotation) * eased;
        puppet.pose_head(&mut ctx.graph, y, rotation);
        return;
    }

    puppet.deadbones_anim = 0.0;
    if puppet.babbling {
        puppet.deadbones_duration = 100.0 + ctx.rng.next_f32() * 200.0;
        puppet.deadbones_start_y = puppet.deadbones_target_y;
        puppet.deadbones_start_rotation = puppet.deadbones_target_rotation;
        puppet.pose_head(&mut ctx.graph, puppet.deadbones_start_y, puppet.deadbones_start_rotation);
        puppet.deadbones_target_y = 10.0 - ctx.rng.next_f32() * 20.0;
        puppet.deadbones_target_rotation = 0.1 - ctx.rng.next_f32() * 0.2;
    } else {
        puppet.deadbones_duration = 0.0;
        puppet.pose_head(&mut ctx.graph, puppet.deadbones_target_y, puppet.deadbones_target_rotation);
    }
}
