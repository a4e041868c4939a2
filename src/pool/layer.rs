use crate::{
    foundation::error::DrawPoolResult,
    pool::framed::{BakeOutcome, FramedPool},
    pool::pool::Pool,
    render::painter::Painter,
};

/// A rendering layer: either a plain pool replayed every frame, or a framed pool that caches its
/// output offscreen.
#[derive(Debug)]
pub enum LayerPool {
    /// Replayed straight into the current target.
    Plain(Pool),
    /// Baked into its own target, then composited.
    Framed(FramedPool),
}

impl From<Pool> for LayerPool {
    fn from(pool: Pool) -> Self {
        Self::Plain(pool)
    }
}

impl From<FramedPool> for LayerPool {
    fn from(pool: FramedPool) -> Self {
        Self::Framed(pool)
    }
}

impl LayerPool {
    /// The recording half, whichever variant this is.
    pub fn pool(&self) -> &Pool {
        match self {
            Self::Plain(p) => p,
            Self::Framed(f) => f.pool(),
        }
    }

    /// Mutable access to the recording half.
    pub fn pool_mut(&mut self) -> &mut Pool {
        match self {
            Self::Plain(p) => p,
            Self::Framed(f) => f.pool_mut(),
        }
    }

    /// Return `true` when this layer owns an offscreen target.
    pub fn has_frame_buffer(&self) -> bool {
        matches!(self, Self::Framed(_))
    }

    /// The framed view, if any.
    pub fn as_framed(&self) -> Option<&FramedPool> {
        match self {
            Self::Framed(f) => Some(f),
            Self::Plain(_) => None,
        }
    }

    /// Mutable framed view, if any.
    pub fn as_framed_mut(&mut self) -> Option<&mut FramedPool> {
        match self {
            Self::Framed(f) => Some(f),
            Self::Plain(_) => None,
        }
    }

    /// Start a new frame.
    pub fn begin_frame(&mut self) {
        match self {
            Self::Plain(p) => p.begin_frame(),
            Self::Framed(f) => f.begin_frame(),
        }
    }

    /// Bring a framed layer's cache up to date. Plain layers have nothing to prepare.
    ///
    /// Must run before the screen target is bound, since baking binds the layer's own target.
    pub fn prepare(&mut self, painter: &mut dyn Painter) -> DrawPoolResult<BakeOutcome> {
        match self {
            Self::Plain(_) => Ok(BakeOutcome::Skipped),
            Self::Framed(f) => f.bake(painter),
        }
    }

    /// Draw into the currently bound target: replay a plain layer, composite a framed one.
    pub fn draw(&mut self, painter: &mut dyn Painter) {
        match self {
            Self::Plain(p) => p.replay(painter),
            Self::Framed(f) => f.composite(painter),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/layer.rs"]
mod tests;
