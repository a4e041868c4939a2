use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::{Color, Rect, TargetSize};
use crate::foundation::error::{DrawPoolError, DrawPoolResult};

/// Process-unique texture identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared handle to an immutable texture.
pub type TextureRef = Arc<Texture>;

/// Premultiplied RGBA8 pixels referenced by painter state.
///
/// Pixels never change after construction; a new image gets a new [`TextureId`], which keeps
/// identity-based batching and modification stamps sound.
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    pixmap: Arc<vello_cpu::Pixmap>,
    smooth: bool,
}

impl Texture {
    /// Build from tightly packed premultiplied RGBA8 bytes.
    pub fn from_rgba8_premul(bytes: &[u8], width: u32, height: u32) -> DrawPoolResult<TextureRef> {
        let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
        Ok(Self::from_pixmap(Arc::new(pixmap), false))
    }

    /// Build a texture filled with one color.
    pub fn solid(width: u32, height: u32, color: Color) -> DrawPoolResult<TextureRef> {
        let (w, h) = texture_dims(width, height)?;
        let px = color.to_premul_rgba8();
        let bytes = px.repeat(usize::from(w) * usize::from(h));
        Self::from_rgba8_premul(&bytes, width, height)
    }

    pub(crate) fn from_pixmap(pixmap: Arc<vello_cpu::Pixmap>, smooth: bool) -> TextureRef {
        Arc::new(Self {
            id: TextureId::next(),
            pixmap,
            smooth,
        })
    }

    /// Identity used for batching decisions.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width in texels.
    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    /// Height in texels.
    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    /// Size in texels.
    pub fn size(&self) -> TargetSize {
        TargetSize::new(self.width(), self.height())
    }

    /// Rectangle covering the whole texture.
    pub fn rect(&self) -> Rect {
        self.size().to_rect()
    }

    /// Whether sampling uses bilinear filtering.
    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    /// Return a handle to the same pixels with a different filtering flag.
    pub fn with_smooth(&self, smooth: bool) -> TextureRef {
        Self::from_pixmap(Arc::clone(&self.pixmap), smooth)
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub(crate) fn pixmap(&self) -> &Arc<vello_cpu::Pixmap> {
        &self.pixmap
    }
}

fn texture_dims(width: u32, height: u32) -> DrawPoolResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| DrawPoolError::texture("texture width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| DrawPoolError::texture("texture height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(DrawPoolError::texture("texture has zero area"));
    }
    Ok((w, h))
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> DrawPoolResult<vello_cpu::Pixmap> {
    let (w, h) = texture_dims(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(DrawPoolError::texture("texture byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/texture.rs"]
mod tests;
