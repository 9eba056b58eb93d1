// Animation helpers layered on top of the scene graph: easing curves, node-local
// transforms and the tweens that drive entrance effects.

pub mod easing;
pub mod transform;
pub mod tween;

pub use easing::{ease, lerp, Easing};
pub use transform::{LocalTransform, Rect};
pub use tween::{Tween, TweenState, TweenTarget};
