use crate::{
    foundation::core::{Color, Rect},
    render::painter::{CompositionMode, PainterState},
    render::texture::TextureRef,
};

/// Ambient pen copied into every new draw object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct State {
    /// Blend function for subsequent draws.
    pub composition_mode: CompositionMode,
    /// Clip rectangle; `None` disables clipping.
    pub clip_rect: Option<Rect>,
    /// Opacity scalar in `[0, 1]`.
    pub opacity: f32,
    /// Whether draws update destination alpha.
    pub alpha_writing: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            composition_mode: CompositionMode::Normal,
            clip_rect: None,
            opacity: 1.0,
            alpha_writing: true,
        }
    }
}

impl State {
    /// Painter snapshot for a draw with `color` and `texture` under this pen.
    pub fn painter_state(&self, color: Color, texture: Option<&TextureRef>) -> PainterState {
        PainterState {
            texture: texture.cloned(),
            composition_mode: self.composition_mode,
            color,
            clip_rect: self.clip_rect,
            opacity: self.opacity,
            alpha_writing: self.alpha_writing,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/state.rs"]
mod tests;
