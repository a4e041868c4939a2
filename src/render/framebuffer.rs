use std::path::Path;
use std::sync::Arc;

use crate::{
    foundation::core::{Color, Rect, TargetSize},
    foundation::error::{DrawPoolError, DrawPoolResult},
    render::texture::{Texture, TextureRef},
};

/// Largest edge the raster backend can allocate.
pub const MAX_TARGET_EDGE: u32 = u16::MAX as u32;

/// A rendered target read back as RGBA8 pixels.
///
/// Targets are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)` as stored, `None` when outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Write the frame as a straight-alpha PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> DrawPoolResult<()> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| DrawPoolError::render("frame byte len mismatch"))?;
        img.save(path.as_ref()).map_err(|e| {
            anyhow::Error::new(e).context(format!("failed to write '{}'", path.as_ref().display()))
        })?;
        Ok(())
    }
}

/// Offscreen render target owned by a framed pool.
///
/// Zero-area sizes are valid and hold no pixels; drawing into them is a no-op.
#[derive(Debug)]
pub struct FrameBuffer {
    size: TargetSize,
    max_edge: u32,
    smooth: bool,
    pixmap: Option<Arc<vello_cpu::Pixmap>>,
    texture: Option<TextureRef>,
}

impl FrameBuffer {
    /// Allocate a target of `size`.
    pub fn new(size: TargetSize, smooth: bool) -> DrawPoolResult<Self> {
        Self::with_max_edge(size, smooth, MAX_TARGET_EDGE)
    }

    /// Allocate a target whose edges may never exceed `max_edge` pixels.
    pub fn with_max_edge(size: TargetSize, smooth: bool, max_edge: u32) -> DrawPoolResult<Self> {
        let mut fb = Self {
            size: TargetSize::default(),
            max_edge: max_edge.min(MAX_TARGET_EDGE),
            smooth,
            pixmap: None,
            texture: None,
        };
        fb.resize(size)?;
        Ok(fb)
    }

    /// Reallocate for `size`, keeping the smoothing flag. Contents are discarded.
    ///
    /// Returns `Ok(false)` when the size is unchanged. On error the previous target is kept.
    #[tracing::instrument(skip(self), fields(from = ?self.size))]
    pub fn resize(&mut self, size: TargetSize) -> DrawPoolResult<bool> {
        if size == self.size && (self.pixmap.is_some() || size.is_empty()) {
            return Ok(false);
        }
        if size.width > self.max_edge || size.height > self.max_edge {
            return Err(DrawPoolError::resize(format!(
                "target {}x{} exceeds the {} px limit",
                size.width, size.height, self.max_edge
            )));
        }
        self.pixmap = if size.is_empty() {
            None
        } else {
            let (w, h) = size.to_u16()?;
            Some(Arc::new(vello_cpu::Pixmap::new(w, h)))
        };
        self.size = size;
        self.texture = None;
        tracing::debug!(width = size.width, height = size.height, "framebuffer resized");
        Ok(true)
    }

    /// Current size.
    pub fn size(&self) -> TargetSize {
        self.size
    }

    /// Return `true` when the target holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixmap.is_none()
    }

    /// Rectangle covering the whole target.
    pub fn rect(&self) -> Rect {
        self.size.to_rect()
    }

    /// Toggle bilinear filtering when the target is sampled.
    pub fn set_smooth(&mut self, enabled: bool) {
        if self.smooth != enabled {
            self.smooth = enabled;
            self.texture = None;
        }
    }

    /// Whether sampling uses bilinear filtering.
    pub fn is_smooth(&self) -> bool {
        self.smooth
    }

    /// Fill every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        let px = color.to_premul_rgba8();
        if let Some(pixmap) = self.pixmap_mut() {
            for dst in pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
                dst.copy_from_slice(&px);
            }
        }
    }

    /// Mutable access to the pixels for writing. Invalidates outstanding texture views.
    pub fn pixmap_mut(&mut self) -> Option<&mut vello_cpu::Pixmap> {
        self.texture = None;
        self.pixmap.as_mut().map(Arc::make_mut)
    }

    /// Texture view of the current pixels, `None` for zero-area targets.
    ///
    /// The view keeps its identity until the target is written, resized or re-filtered.
    pub fn texture(&mut self) -> Option<TextureRef> {
        if self.texture.is_none() {
            let pixmap = Arc::clone(self.pixmap.as_ref()?);
            self.texture = Some(Texture::from_pixmap(pixmap, self.smooth));
        }
        self.texture.clone()
    }

    /// Read back the pixels.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.size.width,
            height: self.size.height,
            data: self
                .pixmap
                .as_ref()
                .map(|p| p.data_as_u8_slice().to_vec())
                .unwrap_or_default(),
            premultiplied: true,
        }
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/framebuffer.rs"]
mod tests;
