use glam::Vec2;

/// Pointer input the stage understands. Coordinates are viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A touch/click began.
    PointerDown { x: f32, y: f32 },
    /// A touch/click ended.
    PointerUp { x: f32, y: f32 },
    /// A touch/cursor moved.
    PointerMove { x: f32, y: f32 },
}

impl InputEvent {
    /// Listener event name this input is delivered under.
    pub fn name(&self) -> &'static str {
        match self {
            InputEvent::PointerDown { .. } => "pointerdown",
            InputEvent::PointerUp { .. } => "pointerup",
            InputEvent::PointerMove { .. } => "pointermove",
        }
    }

    pub fn position(&self) -> Vec2 {
        match *self {
            InputEvent::PointerDown { x, y }
            | InputEvent::PointerUp { x, y }
            | InputEvent::PointerMove { x, y } => Vec2::new(x, y),
        }
    }
}

/// A queue of input events.
/// The host pushes events as they arrive; the director drains them once per frame.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
