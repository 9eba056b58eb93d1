pub mod animation;
pub mod emitter;
pub mod layer;
pub mod sprite;
