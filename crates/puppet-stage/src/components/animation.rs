//! Sprite-sheet playback for animated assets.
//!
//! A sheet is sliced into `cols × rows` cells, read row-major. Playback runs at
//! `20 / delay` frames per 60 Hz tick, so one frame lasts `delay / 1.2` milliseconds.

use glam::Vec2;

/// Length of one 60 Hz display tick in milliseconds.
const TICK_MS: f32 = 1000.0 / 60.0;

/// One cell of a sliced sprite sheet, in texture pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Looping frame sequence cut from one texture.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteSheet {
    frames: Vec<FrameRect>,
    /// Milliseconds per frame. Zero or less means the sheet never advances.
    frame_duration: f32,
    frame_index: usize,
    frame_timer: f32,
    playing: bool,
}

impl SpriteSheet {
    /// Slice a texture of `texture_size` into frames.
    /// Frames past `num_frames`, or whose cell falls outside the texture, are dropped.
    pub fn slice(texture_size: Vec2, cols: u32, rows: u32, num_frames: u32, delay: f32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let cell = Vec2::new(texture_size.x / cols as f32, texture_size.y / rows as f32);
        let frames = (0..num_frames)
            .filter_map(|i| {
                let col = i % cols;
                let row = i / cols;
                if row >= rows {
                    return None;
                }
                Some(FrameRect {
                    x: col as f32 * cell.x,
                    y: row as f32 * cell.y,
                    width: cell.x,
                    height: cell.y,
                })
            })
            .collect();
        let frame_duration = if delay > 0.0 { TICK_MS * delay / 20.0 } else { 0.0 };
        Self {
            frames,
            frame_duration,
            frame_index: 0,
            frame_timer: 0.0,
            playing: true,
        }
    }

    pub fn frames(&self) -> &[FrameRect] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }

    pub fn current_index(&self) -> usize {
        self.frame_index
    }

    pub fn current_frame(&self) -> Option<&FrameRect> {
        self.frames.get(self.frame_index)
    }

    /// Size of one cell, used for bounds.
    pub fn frame_size(&self) -> Vec2 {
        self.frames
            .first()
            .map(|f| Vec2::new(f.width, f.height))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn resume(&mut self) {
        self.playing = true;
    }

    /// Advance by `dt` milliseconds. Returns true if the frame changed.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.playing || self.frames.len() < 2 || self.frame_duration <= 0.0 {
            return false;
        }

        self.frame_timer += dt;
        let mut frame_changed = false;
        while self.frame_timer >= self.frame_duration {
            self.frame_timer -= self.frame_duration;
            self.frame_index = (self.frame_index + 1) % self.frames.len();
            frame_changed = true;
        }
        frame_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_row_major() {
        let sheet = SpriteSheet::slice(Vec2::new(300.0, 200.0), 3, 2, 5, 20.0);
        assert_eq!(sheet.frame_count(), 5);
        assert_eq!(sheet.frames()[3], FrameRect { x: 0.0, y: 100.0, width: 100.0, height: 100.0 });
        assert_eq!(sheet.frame_size(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn drops_frames_outside_the_sheet() {
        let sheet = SpriteSheet::slice(Vec2::new(200.0, 100.0), 2, 1, 6, 20.0);
        assert_eq!(sheet.frame_count(), 2);
    }

    #[test]
    fn delay_sets_playback_rate() {
        // delay 20 => one frame per 60 Hz tick
        let sheet = SpriteSheet::slice(Vec2::splat(64.0), 2, 2, 4, 20.0);
        assert!((sheet.frame_duration() - TICK_MS).abs() < 1e-4);
    }

    #[test]
    fn playback_loops() {
        let mut sheet = SpriteSheet::slice(Vec2::splat(64.0), 2, 1, 2, 20.0);
        assert!(sheet.tick(TICK_MS + 0.1));
        assert_eq!(sheet.current_index(), 1);
        sheet.tick(TICK_MS);
        assert_eq!(sheet.current_index(), 0);
    }

    #[test]
    fn single_frame_never_advances() {
        let mut sheet = SpriteSheet::slice(Vec2::splat(64.0), 1, 1, 1, 20.0);
        assert!(!sheet.tick(1000.0));
        assert_eq!(sheet.current_index(), 0);
    }
}
