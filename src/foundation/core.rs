use crate::foundation::error::{DrawPoolError, DrawPoolResult};

pub use kurbo::{Point, Rect, Size};

/// Integer pixel size of an offscreen target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TargetSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TargetSize {
    /// Create a size from width and height in pixels.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when the size covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of bytes an RGBA8 surface of this size occupies.
    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }

    /// Rectangle covering the whole target, anchored at the origin.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Convert to the `u16` dimensions accepted by the raster backend.
    pub fn to_u16(self) -> DrawPoolResult<(u16, u16)> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| DrawPoolError::resize(format!("target width {} exceeds u16", self.width)))?;
        let h: u16 = self.height.try_into().map_err(|_| {
            DrawPoolError::resize(format!("target height {} exceeds u16", self.height))
        })?;
        Ok((w, h))
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque white, the neutral tint for textured draws.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Build a color from straight RGBA8 channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Pack as `0xRRGGBBAA`.
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Unpack from `0xRRGGBBAA`.
    pub fn from_u32(v: u32) -> Self {
        let [r, g, b, a] = v.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Alpha channel as a `[0, 1]` factor.
    pub fn alpha_f32(self) -> f32 {
        f32::from(self.a) / 255.0
    }

    /// Scale alpha by `opacity`, clamped to `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Return `true` when the color is fully opaque.
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Convert to premultiplied RGBA8 bytes.
    pub fn to_premul_rgba8(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let premul = |c: u8| -> u8 { (((u16::from(c) * a) + 127) / 255) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Return `true` when a rectangle covers no area (including inverted rects).
pub(crate) fn rect_is_empty(r: Rect) -> bool {
    !(r.width() > 0.0 && r.height() > 0.0)
}

/// Overlap test with a one pixel margin so anti-aliased edges count as touching.
pub(crate) fn rects_touch(a: Rect, b: Rect) -> bool {
    let a = a.inflate(1.0, 1.0);
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
