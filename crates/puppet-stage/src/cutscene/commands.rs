//! Built-in cutscene commands.
//!
//! Every command that names a `target` fails when that puppet is not on stage.

use std::rc::Rc;

use serde_json::Value;

use super::{Action, ActionContext, CommandTable, Cutscene, Pending};
use crate::api::error::CutsceneError;
use crate::api::types::PuppetId;
use crate::core::time::Countdown;
use crate::puppet::{PuppetMut, PuppetTemplate, DEFAULT_EMOTE, MOVE_DURATION, SETTLE_POINT};

pub(crate) fn register_builtins(table: &mut CommandTable) {
    table.register("run", run);
    table.register("add", add);
    table.register("set", set);
    table.register("remove", remove);
    table.register("delay", delay);
    table.register("move", walk);
    table.register("facingLeft", facing_left);
    table.register("babble", babble);
    table.register("emote", emote);
    table.register("jiggle", jiggle);
}

/// Milliseconds a `move` blocks for: one travel phase per slot plus one settle.
pub fn move_duration_ms(distance: i32) -> f32 {
    (distance.unsigned_abs() as f32 * MOVE_DURATION * SETTLE_POINT + MOVE_DURATION * (1.0 - SETTLE_POINT)) * 1000.0
}

/// Milliseconds a `jiggle` blocks for: one settle bounce.
pub fn jiggle_duration_ms() -> f32 {
    MOVE_DURATION * (1.0 - SETTLE_POINT) * 1000.0
}

fn wait_for(duration_ms: f32) -> Pending {
    if duration_ms > 0.0 {
        Pending::Delay(Countdown::new(duration_ms))
    } else {
        Pending::NextFrame
    }
}

fn target<'a>(ctx: &'a mut ActionContext<'_>, action: &Action) -> Result<PuppetMut<'a>, CutsceneError> {
    let id = action.target()?;
    ctx.stage
        .puppet_mut(id)
        .ok_or(CutsceneError::TargetNotFound(id))
}

fn actor(ctx: &ActionContext<'_>, action: &Action) -> Result<PuppetTemplate, CutsceneError> {
    let name = action
        .text("name")
        .ok_or_else(|| action.invalid("missing \"name\""))?;
    ctx.actors
        .get(&name)
        .cloned()
        .ok_or(CutsceneError::UnknownActor(name))
}

/// Nested script, as an array of action records or as script text.
fn run(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let actions: Vec<Action> = match action.field("script") {
        Some(Value::String(text)) => {
            super::parse_script(text).map_err(|err| action.invalid(err.to_string()))?
        }
        Some(records) => serde_json::from_value(records.clone())
            .map_err(|err| action.invalid(format!("bad script: {err}")))?,
        None => return Err(action.invalid("missing \"script\"")),
    };
    let nested = Cutscene::new(actions, Rc::clone(ctx.actors)).with_commands(Rc::clone(ctx.commands));
    Ok(Pending::Script(Box::new(nested)))
}

fn add(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let id = action.puppet_id("id")?;
    let mut template = actor(ctx, action)?;
    if let Some(position) = action.slot("position")? {
        template.position = position;
    }
    if let Some(facing_left) = action.flag("facingLeft")? {
        template.facing_left = facing_left;
    }
    if let Some(emote) = action.text("emote") {
        template.emote = Some(emote);
    }
    ctx.stage.add_puppet(&template, id)?;
    Ok(Pending::Done)
}

fn set(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let id = action.target()?;
    let template = actor(ctx, action)?;
    if ctx.stage.get_puppet(id).is_none() {
        return Err(CutsceneError::TargetNotFound(id));
    }
    let puppet = ctx.stage.create_puppet(&template);
    ctx.stage.set_puppet(id, puppet)?;
    Ok(Pending::Done)
}

fn remove(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let id: PuppetId = action.target()?;
    if !ctx.stage.remove_puppet(id) {
        return Err(CutsceneError::TargetNotFound(id));
    }
    Ok(Pending::Done)
}

fn delay(_ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let duration = action
        .number("duration")?
        .ok_or_else(|| action.invalid("missing \"duration\""))?;
    Ok(wait_for(duration as f32))
}

fn walk(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let position = action
        .slot("position")?
        .ok_or_else(|| action.invalid("missing \"position\""))?;
    let mut puppet = target(ctx, action)?;
    puppet.walk_to(position);
    Ok(wait_for(move_duration_ms(position.saturating_sub(puppet.position))))
}

fn facing_left(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let facing_left = action
        .flag("facingLeft")?
        .ok_or_else(|| action.invalid("missing \"facingLeft\""))?;
    target(ctx, action)?.set_facing_left(facing_left);
    Ok(Pending::Done)
}

fn babble(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let mode = action.text("action");
    let mut puppet = target(ctx, action)?;
    let active = match mode.as_deref().unwrap_or("toggle") {
        "toggle" => !puppet.babbling,
        "start" => true,
        "stop" => false,
        other => return Err(action.invalid(format!("unknown babble action \"{other}\""))),
    };
    puppet.set_babbling(active);
    Ok(Pending::Done)
}

fn emote(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    let key = action.text("emote").unwrap_or_else(|| DEFAULT_EMOTE.to_string());
    target(ctx, action)?.change_emote(&key);
    Ok(Pending::Done)
}

fn jiggle(ctx: &mut ActionContext<'_>, action: &Action) -> Result<Pending, CutsceneError> {
    target(ctx, action)?.jiggle();
    Ok(wait_for(jiggle_duration_ms()))
}
