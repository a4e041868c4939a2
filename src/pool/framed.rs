use std::fmt;

use crate::{
    foundation::core::{Rect, TargetSize},
    foundation::error::DrawPoolResult,
    foundation::fingerprint::fold_stamp,
    pool::pool::Pool,
    pool::settings::PoolSettings,
    render::coords::CoordsBuffer,
    render::framebuffer::{FrameBuffer, FrameRGBA},
    render::painter::{DrawMode, Painter, PainterState},
    render::texture::TextureRef,
};

/// Callback run around a framed pool's replay, outside the recorded content.
pub type DrawHook = Box<dyn FnMut(&mut dyn Painter)>;

/// Modification stamps of a framed pool.
///
/// `current` accumulates a fingerprint of everything recorded this frame; `previous` holds the
/// value `current` had when the cache was last baked. Two frames that record the same content
/// end with the same stamp, so the cache is reused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModificationStatus {
    previous: u64,
    current: u64,
    stale: bool,
    opaque_seq: u64,
}

impl ModificationStatus {
    /// Stamp of the content the cache was baked from.
    pub fn previous(&self) -> u64 {
        self.previous
    }

    /// Stamp of the content recorded since the last reset.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Return `true` when the cache no longer matches the recorded content.
    pub fn has_modification(&self) -> bool {
        self.stale || self.previous != self.current
    }

    pub(crate) fn record(&mut self, op: u64) {
        self.current = fold_stamp(self.current, op);
    }

    /// Fold content that cannot be fingerprinted; never equal to anything recorded before.
    pub(crate) fn record_opaque(&mut self) {
        self.opaque_seq = self.opaque_seq.wrapping_add(1);
        self.record(self.opaque_seq ^ 0xA5A5_5A5A_0000_0000);
    }

    pub(crate) fn update(&mut self) {
        self.previous = self.current;
        self.stale = false;
    }

    pub(crate) fn reset_current(&mut self) {
        self.current = 0;
    }

    pub(crate) fn invalidate(&mut self) {
        self.stale = true;
    }
}

/// Result of [`FramedPool::bake`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BakeOutcome {
    /// The pool is disabled; nothing was done.
    Skipped,
    /// Nothing changed since the last bake; the cached pixels stand.
    Reused,
    /// The recording was replayed into the target.
    Rebaked,
}

/// A [`Pool`] that caches its output in an offscreen target.
///
/// Per frame the owner calls [`FramedPool::begin_frame`], records, then [`FramedPool::bake`]
/// (which replays only when the content changed) and finally [`FramedPool::composite`].
pub struct FramedPool {
    pool: Pool,
    framebuffer: FrameBuffer,
    dest: Option<Rect>,
    src: Option<Rect>,
    before_draw: Option<DrawHook>,
    after_draw: Option<DrawHook>,
}

impl fmt::Debug for FramedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramedPool")
            .field("pool", &self.pool)
            .field("framebuffer", &self.framebuffer)
            .field("dest", &self.dest)
            .field("src", &self.src)
            .field("before_draw", &self.before_draw.is_some())
            .field("after_draw", &self.after_draw.is_some())
            .finish()
    }
}

impl FramedPool {
    /// Create a framed pool with a target of `size` and default settings.
    pub fn new(name: impl Into<String>, size: TargetSize) -> DrawPoolResult<Self> {
        Self::with_settings(name, size, PoolSettings::default())
    }

    /// Create a framed pool with explicit settings.
    pub fn with_settings(
        name: impl Into<String>,
        size: TargetSize,
        settings: PoolSettings,
    ) -> DrawPoolResult<Self> {
        let framebuffer =
            FrameBuffer::with_max_edge(size, settings.default_smooth, settings.max_target_size)?;
        let mut pool = Pool::with_settings(name, settings);
        let mut status = ModificationStatus::default();
        status.invalidate();
        pool.status = Some(status);
        Ok(Self {
            pool,
            framebuffer,
            dest: None,
            src: None,
            before_draw: None,
            after_draw: None,
        })
    }

    /// The recording half.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Mutable access to the recording half.
    pub fn pool_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }

    /// The cached target.
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Reallocate the target. A real size change invalidates the cache.
    ///
    /// On error the previous target and cache state are kept.
    pub fn resize(&mut self, size: TargetSize) -> DrawPoolResult<()> {
        if self.framebuffer.resize(size)? {
            self.status_mut().invalidate();
        }
        Ok(())
    }

    /// Toggle bilinear filtering when the target is composited.
    pub fn set_smooth(&mut self, enabled: bool) {
        self.framebuffer.set_smooth(enabled);
    }

    /// Run `hook` right before each rebake's replay.
    pub fn on_before_draw(&mut self, hook: impl FnMut(&mut dyn Painter) + 'static) {
        self.before_draw = Some(Box::new(hook));
    }

    /// Run `hook` right after each rebake's replay.
    pub fn on_after_draw(&mut self, hook: impl FnMut(&mut dyn Painter) + 'static) {
        self.after_draw = Some(Box::new(hook));
    }

    /// Where the target lands when composited; `None` uses the target's own rect.
    pub fn set_dest(&mut self, dest: Option<Rect>) {
        self.dest = dest;
    }

    /// Composite destination.
    pub fn dest(&self) -> Rect {
        self.dest.unwrap_or_else(|| self.framebuffer.rect())
    }

    /// Region of the target sampled when composited; `None` samples the whole target.
    pub fn set_src(&mut self, src: Option<Rect>) {
        self.src = src;
    }

    /// Composite source.
    pub fn src(&self) -> Rect {
        self.src.unwrap_or_else(|| self.framebuffer.rect())
    }

    /// Current modification stamps.
    pub fn status(&self) -> ModificationStatus {
        self.pool.status.unwrap_or_default()
    }

    /// Return `true` when the cached pixels are out of date.
    pub fn has_modification(&self) -> bool {
        self.status().has_modification()
    }

    /// Mark the current content as baked.
    pub fn update_status(&mut self) {
        self.status_mut().update();
    }

    /// Start accumulating a new content stamp.
    pub fn reset_current_status(&mut self) {
        self.status_mut().reset_current();
    }

    /// Start a new frame: drop the recording and restart the content stamp.
    pub fn begin_frame(&mut self) {
        self.pool.begin_frame();
        self.reset_current_status();
    }

    /// Replay into the target when the content changed.
    #[tracing::instrument(skip(self, painter), fields(pool = %self.pool.name()))]
    pub fn bake(&mut self, painter: &mut dyn Painter) -> DrawPoolResult<BakeOutcome> {
        if !self.pool.is_enabled() {
            return Ok(BakeOutcome::Skipped);
        }
        if !self.has_modification() {
            tracing::debug!("cache reused");
            return Ok(BakeOutcome::Reused);
        }

        painter.begin_target(self.framebuffer.size());
        if let Some(hook) = self.before_draw.as_mut() {
            hook(painter);
        }
        self.pool.replay(painter);
        if let Some(hook) = self.after_draw.as_mut() {
            hook(painter);
        }
        painter.end_target(&mut self.framebuffer)?;
        self.update_status();

        tracing::debug!(objects = self.pool.len(), "cache rebaked");
        Ok(BakeOutcome::Rebaked)
    }

    /// Draw the cached target at [`FramedPool::dest`], sampling [`FramedPool::src`].
    pub fn composite(&mut self, painter: &mut dyn Painter) {
        if !self.pool.is_enabled() {
            return;
        }
        let (dest, src) = (self.dest(), self.src());
        let Some(texture) = self.framebuffer.texture() else {
            return;
        };
        let mut coords = CoordsBuffer::new();
        coords.add_textured_rect(dest, src);
        if coords.is_empty() {
            return;
        }
        painter.execute_state(&PainterState::textured(texture));
        painter.draw_coords(&coords, DrawMode::Triangles);
    }

    /// Texture view of the cached pixels, `None` for zero-area targets.
    pub fn texture(&mut self) -> Option<TextureRef> {
        self.framebuffer.texture()
    }

    /// Read back the cached pixels.
    pub fn snapshot(&self) -> FrameRGBA {
        self.framebuffer.to_frame()
    }

    fn status_mut(&mut self) -> &mut ModificationStatus {
        self.pool.status.get_or_insert_with(ModificationStatus::default)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/framed.rs"]
mod tests;
