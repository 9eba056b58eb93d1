pub mod instance;
pub mod traits;

pub use instance::{RenderBuffer, RenderInstance};
pub use traits::{FrameData, Renderer};
