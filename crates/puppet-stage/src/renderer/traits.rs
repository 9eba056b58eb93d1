//! Contract between the stage and a drawing backend.
//!
//! The stage flattens its scene graph into `RenderInstance`s; a backend turns those into
//! pixels. Nothing in this crate draws by itself.

use glam::Vec2;

use super::instance::RenderInstance;
use crate::api::error::RenderError;

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameData<'a> {
    /// Instances in draw order (back to front).
    pub instances: &'a [RenderInstance],
    /// Viewport size in pixels.
    pub viewport: Vec2,
    /// Background colour, if the environment sets one. Transparent otherwise.
    pub clear_color: Option<&'a str>,
}

/// A drawing backend.
///
/// # Example Implementation
///
/// ```ignore
/// struct CanvasRenderer { /* ... */ }
///
/// impl Renderer for CanvasRenderer {
///     fn backend(&self) -> &'static str { "canvas" }
///     fn resize(&mut self, width: u32, height: u32) { /* resize surface */ }
///     fn draw(&mut self, frame: &FrameData<'_>) { /* blit instances */ }
///     fn snapshot(&mut self) -> Result<Vec<u8>, RenderError> { /* read back, encode */ }
/// }
/// ```
pub trait Renderer {
    /// Backend name for diagnostics.
    fn backend(&self) -> &'static str;

    /// Resize the drawing surface.
    fn resize(&mut self, width: u32, height: u32);

    /// Draw one frame.
    fn draw(&mut self, frame: &FrameData<'_>);

    /// Encoded image of the last drawn frame, for thumbnails.
    fn snapshot(&mut self) -> Result<Vec<u8>, RenderError>;
}
