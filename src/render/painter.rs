use crate::{
    foundation::core::{Color, Rect, TargetSize},
    foundation::error::DrawPoolResult,
    foundation::fingerprint::StableHasher,
    render::coords::CoordsBuffer,
    render::framebuffer::FrameBuffer,
    render::texture::TextureRef,
};

/// Blend function used when writing pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CompositionMode {
    /// Source-over alpha blending.
    #[default]
    Normal,
    /// Multiply source and destination colors.
    Multiply,
    /// Additive blending.
    Add,
    /// Overwrite the destination.
    Replace,
    /// Draw behind existing content.
    DestBlending,
    /// Screen-style lightening, used for light maps.
    Light,
}

impl CompositionMode {
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Multiply => 1,
            Self::Add => 2,
            Self::Replace => 3,
            Self::DestBlending => 4,
            Self::Light => 5,
        }
    }
}

/// How the primitives of one submission relate to each other.
///
/// Geometry is always stored as independent rects and triangles, so [`crate::CpuPainter`]
/// rasterizes both modes the same way. The mode only decides whether submissions may be merged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DrawMode {
    /// Independent primitives; batches can be concatenated.
    #[default]
    Triangles,
    /// One connected piece of geometry; never concatenated with another submission.
    TriangleStrip,
}

impl DrawMode {
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Triangles => 0,
            Self::TriangleStrip => 1,
        }
    }
}

/// Snapshot of everything the painter needs besides geometry.
#[derive(Clone, Debug)]
pub struct PainterState {
    /// Texture sampled by textured primitives.
    pub texture: Option<TextureRef>,
    /// Blend function.
    pub composition_mode: CompositionMode,
    /// Fill color, or texture tint. The CPU painter only applies the tint's alpha.
    pub color: Color,
    /// Clip rectangle; `None` disables clipping.
    pub clip_rect: Option<Rect>,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether draws update the destination alpha channel.
    pub alpha_writing: bool,
}

impl Default for PainterState {
    fn default() -> Self {
        Self {
            texture: None,
            composition_mode: CompositionMode::Normal,
            color: Color::WHITE,
            clip_rect: None,
            opacity: 1.0,
            alpha_writing: true,
        }
    }
}

impl PartialEq for PainterState {
    fn eq(&self, other: &Self) -> bool {
        self.texture.as_ref().map(|t| t.id()) == other.texture.as_ref().map(|t| t.id())
            && self.composition_mode == other.composition_mode
            && self.color == other.color
            && self.clip_rect == other.clip_rect
            && self.opacity.to_bits() == other.opacity.to_bits()
            && self.alpha_writing == other.alpha_writing
    }
}

impl PainterState {
    /// State that samples `texture` untinted with default blending.
    pub fn textured(texture: TextureRef) -> Self {
        Self {
            texture: Some(texture),
            ..Self::default()
        }
    }

    pub(crate) fn write_fingerprint(&self, h: &mut StableHasher) {
        match &self.texture {
            Some(t) => {
                h.write_u8(1);
                h.write_u64(t.id().0);
            }
            None => h.write_u8(0),
        }
        h.write_u8(self.composition_mode.tag());
        h.write_u32(self.color.to_u32());
        match self.clip_rect {
            Some(r) => {
                h.write_u8(1);
                h.write_rect(r);
            }
            None => h.write_u8(0),
        }
        h.write_f32(self.opacity);
        h.write_bool(self.alpha_writing);
    }
}

/// Rendering backend that consumes replayed draw objects.
///
/// A target is bracketed by [`Painter::begin_target`] and [`Painter::end_target`]; every submission
/// in between is one [`Painter::execute_state`] followed by one [`Painter::draw_coords`].
pub trait Painter {
    /// Start drawing a fresh target of `size`. Content starts fully transparent.
    fn begin_target(&mut self, size: TargetSize);

    /// Apply the state used by subsequent submissions.
    fn execute_state(&mut self, state: &PainterState);

    /// Submit every primitive of `coords` with the current state.
    fn draw_coords(&mut self, coords: &CoordsBuffer, mode: DrawMode);

    /// Overwrite the whole current target with `color`.
    fn clear(&mut self, color: Color);

    /// Resolve pending work into `target`.
    fn end_target(&mut self, target: &mut FrameBuffer) -> DrawPoolResult<()>;
}

#[cfg(test)]
#[path = "../../tests/unit/render/painter.rs"]
mod tests;
