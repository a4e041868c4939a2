//! Drawpool records 2D draw requests into per-layer command pools and caches static layers in
//! offscreen targets.
//!
//! - Record primitives into a [`Pool`]; requests sharing painter state are merged into one
//!   [`DrawObject`], so a run of same-atlas tiles replays as a single submission
//! - Wrap a pool in a [`FramedPool`] to bake it into its own [`FrameBuffer`] and only re-render
//!   when the recorded content changes
//! - Replay through any [`Painter`]; [`CpuPainter`] rasterizes with `vello_cpu`
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod pool;
mod render;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;

pub use crate::foundation::core::{Color, Point, Rect, Size, TargetSize};
pub use crate::foundation::error::{DrawPoolError, DrawPoolResult};

pub use crate::pool::framed::{BakeOutcome, DrawHook, FramedPool, ModificationStatus};
pub use crate::pool::layer::LayerPool;
pub use crate::pool::method::{DrawMethod, DrawMethodType};
pub use crate::pool::object::{DeferredAction, DrawObject};
pub use crate::pool::pool::Pool;
pub use crate::pool::settings::PoolSettings;
pub use crate::pool::state::State;

pub use crate::render::coords::{CoordsBuffer, MAX_REPEAT_TILES, Primitive};
pub use crate::render::cpu::{CpuPainter, CpuPainterStats};
pub use crate::render::framebuffer::{FrameBuffer, FrameRGBA, MAX_TARGET_EDGE};
pub use crate::render::painter::{CompositionMode, DrawMode, Painter, PainterState};
pub use crate::render::texture::{Texture, TextureId, TextureRef};
