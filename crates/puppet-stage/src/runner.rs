use crate::cutscene::Cutscene;
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::traits::Renderer;
use crate::stage::Stage;

/// Frame driver that wires a stage, its running cutscenes and queued input together.
///
/// The host owns the clock and the drawing surface; it calls [`Director::tick`] once per
/// animation frame with the elapsed milliseconds.
pub struct Director {
    stage: Stage,
    cutscenes: Vec<Cutscene>,
    input: InputQueue,
}

impl Director {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            cutscenes: Vec::new(),
            input: InputQueue::new(),
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn into_stage(self) -> Stage {
        self.stage
    }

    /// Cutscenes still running.
    pub fn cutscenes(&self) -> &[Cutscene] {
        &self.cutscenes
    }

    pub fn is_idle(&self) -> bool {
        self.cutscenes.is_empty()
    }

    /// Start a cutscene. One that fails on its first action is logged and dropped.
    pub fn play(&mut self, mut cutscene: Cutscene) {
        if let Err(err) = cutscene.start(&mut self.stage) {
            log::error!("cutscene failed to start: {}", err);
        }
        if !cutscene.is_done() {
            self.cutscenes.push(cutscene);
        }
    }

    /// Queue a pointer event for the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Run one frame: dispatch input, advance the stage, advance cutscene timers, then draw
    /// if anything changed. Returns true if a frame was drawn.
    pub fn tick(&mut self, delta: f32, renderer: &mut dyn Renderer) -> bool {
        for event in self.input.drain() {
            self.stage.dispatch_input(event);
        }

        if self.stage.is_enabled() {
            self.stage.update(delta);
        }

        let stage = &mut self.stage;
        self.cutscenes.retain_mut(|cutscene| {
            if let Err(err) = cutscene.tick(stage, delta) {
                log::error!("cutscene stopped: {}", err);
            }
            !cutscene.is_done()
        });

        self.stage.render_if_dirty(renderer)
    }

    /// Resize the drawing surface and re-lay the stage for it.
    pub fn resize(&mut self, renderer: &mut dyn Renderer, width: u32, height: u32) {
        renderer.resize(width, height);
        self.stage.resize(Some(width as f32), Some(height as f32));
    }
}
