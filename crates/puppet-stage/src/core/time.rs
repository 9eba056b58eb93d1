/// One-shot countdown measured in milliseconds.
/// Backs cutscene delays; the owner advances it once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    remaining: f32,
    state: CountdownState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownState {
    Running,
    Fired,
    Cancelled,
}

impl Countdown {
    pub fn new(duration_ms: f32) -> Self {
        Self {
            remaining: duration_ms.max(0.0),
            state: CountdownState::Running,
        }
    }

    /// Advance by `delta_ms`. Returns true exactly once, on the tick the countdown expires.
    pub fn tick(&mut self, delta_ms: f32) -> bool {
        if self.state != CountdownState::Running {
            return false;
        }
        self.remaining -= delta_ms;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.state = CountdownState::Fired;
            return true;
        }
        false
    }

    /// Stop the countdown without firing.
    pub fn cancel(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Cancelled;
        }
    }

    /// Milliseconds left before firing.
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.state == CountdownState::Running
    }

    pub fn has_fired(&self) -> bool {
        self.state == CountdownState::Fired
    }
}
