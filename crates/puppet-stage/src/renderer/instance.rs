use bytemuck::{Pod, Zeroable};

/// Per-instance draw data handed to a renderer backend.
/// 8 floats = 32 bytes stride, uploadable as-is.
///
/// `scale_x`/`scale_y` multiply the texture (or sheet cell) size; a negative `scale_x`
/// draws the texture mirrored.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// X position in viewport pixels.
    pub x: f32,
    /// Y position in viewport pixels.
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Opacity after multiplying every ancestor's alpha.
    pub alpha: f32,
    /// Texture slot (`TextureId`) as a float.
    pub texture: f32,
    /// Sprite-sheet frame index; 0 for static textures.
    pub frame: f32,
}

impl RenderInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Instances for one frame, back to front.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    pub instances: Vec<RenderInstance>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: RenderInstance) {
        self.instances.push(instance);
    }

    pub fn instance_count(&self) -> u32 {
        self.instances.len() as u32
    }

    /// The instances as raw floats, for uploading.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}
