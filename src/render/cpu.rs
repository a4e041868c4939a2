use smallvec::SmallVec;

use crate::{
    foundation::core::{Color, Point, Rect, TargetSize, rect_is_empty},
    foundation::error::{DrawPoolError, DrawPoolResult},
    render::coords::{CoordsBuffer, Primitive},
    render::framebuffer::FrameBuffer,
    render::painter::{CompositionMode, DrawMode, Painter, PainterState},
    render::texture::Texture,
};

/// Counters accumulated by a [`CpuPainter`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuPainterStats {
    /// Targets resolved through [`Painter::end_target`].
    pub targets: u64,
    /// `draw_coords` calls that reached the rasterizer.
    pub submissions: u64,
    /// Primitives rasterized.
    pub primitives: u64,
}

/// [`Painter`] that rasterizes on the CPU with `vello_cpu`.
///
/// The render context is reused across targets of the same size.
pub struct CpuPainter {
    ctx: Option<vello_cpu::RenderContext>,
    size: TargetSize,
    active: bool,
    state: PainterState,
    stats: CpuPainterStats,
}

impl Default for CpuPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuPainter {
    /// Create a painter with no target bound.
    pub fn new() -> Self {
        Self {
            ctx: None,
            size: TargetSize::default(),
            active: false,
            state: PainterState::default(),
            stats: CpuPainterStats::default(),
        }
    }

    /// Counters since construction.
    pub fn stats(&self) -> CpuPainterStats {
        self.stats
    }

    /// Render `f`'s draws into a fresh target of `size` and return it.
    pub fn render_to_new_target(
        &mut self,
        size: TargetSize,
        f: impl FnOnce(&mut Self),
    ) -> DrawPoolResult<FrameBuffer> {
        let mut target = FrameBuffer::new(size, false)?;
        self.begin_target(size);
        f(self);
        self.end_target(&mut target)?;
        Ok(target)
    }
}

impl Painter for CpuPainter {
    fn begin_target(&mut self, size: TargetSize) {
        self.size = size;
        self.state = PainterState::default();
        if size.is_empty() {
            self.active = false;
            return;
        }
        let Ok((w, h)) = size.to_u16() else {
            tracing::warn!(?size, "target exceeds raster limits; draws are dropped");
            self.active = false;
            return;
        };
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        self.ctx = Some(ctx);
        self.active = true;
    }

    fn execute_state(&mut self, state: &PainterState) {
        self.state = state.clone();
    }

    fn draw_coords(&mut self, coords: &CoordsBuffer, _mode: DrawMode) {
        if !self.active || coords.is_empty() {
            return;
        }
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        let state = &self.state;

        let mut opacity = state.opacity.clamp(0.0, 1.0);
        if state.texture.is_some() {
            // Texture tint only carries alpha on this backend.
            opacity *= state.color.alpha_f32();
        }
        if opacity <= 0.0 {
            return;
        }
        if state.clip_rect.is_some_and(rect_is_empty) {
            return;
        }

        self.stats.submissions += 1;
        self.stats.primitives += coords.len() as u64;

        let blend = blend_mode(state.composition_mode);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let image = state.texture.as_deref().map(image_paint);
        let solid = color_to_cpu(state.color.with_opacity(state.opacity.clamp(0.0, 1.0)));

        // Every primitive blends straight into the target, so a batch matches its parts drawn
        // one by one. Clipping is geometric; a clip layer would composite with plain source-over.
        for prim in coords.primitives() {
            let Some(coverage) = Coverage::of(prim, state.clip_rect) else {
                continue;
            };
            let textured = match (image.as_ref(), *prim) {
                (Some(img), Primitive::Rect { dest, src: Some(src), flip_y }) => {
                    Some((img, rect_paint_transform(dest, src, flip_y)))
                }
                (Some(img), Primitive::Triangle { points, tex: Some(tex) }) => {
                    match triangle_paint_transform(tex, points) {
                        Some(tr) => Some((img, tr)),
                        None => continue,
                    }
                }
                _ => None,
            };
            match textured {
                Some((img, tr)) if opacity < 1.0 => {
                    fill_translucent(ctx, &coverage, img, tr, state.composition_mode, opacity);
                    continue;
                }
                Some((img, tr)) => {
                    ctx.set_paint(img.clone());
                    ctx.set_paint_transform(tr);
                }
                None => {
                    ctx.set_paint(solid);
                    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                }
            }
            ctx.set_blend_mode(blend);
            coverage.fill(ctx);
        }

        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
    }

    fn clear(&mut self, color: Color) {
        if !self.active {
            return;
        }
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::new(
            vello_cpu::peniko::Mix::Normal,
            vello_cpu::peniko::Compose::Copy,
        ));
        ctx.set_paint(color_to_cpu(color));
        ctx.fill_rect(&rect_to_cpu(self.size.to_rect()));
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
    }

    fn end_target(&mut self, target: &mut FrameBuffer) -> DrawPoolResult<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if target.size() != self.size {
            return Err(DrawPoolError::render(format!(
                "target is {:?} but painter was bound to {:?}",
                target.size(),
                self.size
            )));
        }
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| DrawPoolError::render("render context missing"))?;
        ctx.flush();
        if let Some(pixmap) = target.pixmap_mut() {
            ctx.render_to_pixmap(pixmap);
        }
        self.stats.targets += 1;
        Ok(())
    }
}

/// Area of one primitive left after clipping, in target space.
#[derive(Debug, PartialEq)]
enum Coverage {
    Rect(Rect),
    Polygon(SmallVec<[Point; 8]>),
}

impl Coverage {
    /// `None` when nothing of `prim` survives `clip`.
    fn of(prim: &Primitive, clip: Option<Rect>) -> Option<Self> {
        match (*prim, clip) {
            (Primitive::Rect { dest, .. }, None) => Some(Self::Rect(dest)),
            (Primitive::Rect { dest, .. }, Some(clip)) => {
                let r = dest.intersect(clip);
                (!rect_is_empty(r)).then_some(Self::Rect(r))
            }
            (Primitive::Triangle { points, .. }, None) => {
                Some(Self::Polygon(SmallVec::from_slice(&points)))
            }
            (Primitive::Triangle { points, .. }, Some(clip)) => {
                let poly = clip_polygon(&points, clip);
                (poly.len() >= 3).then_some(Self::Polygon(poly))
            }
        }
    }

    fn fill(&self, ctx: &mut vello_cpu::RenderContext) {
        match self {
            Self::Rect(r) => ctx.fill_rect(&rect_to_cpu(*r)),
            Self::Polygon(pts) => ctx.fill_path(&polygon_path(pts)),
        }
    }
}

/// Fill `coverage` with `image` at `opacity`, keeping the composition mode.
///
/// The layer spans the whole target, which is harmless for every mode but `Replace`: that one
/// first clears the coverage, then lays the translucent source over the hole.
fn fill_translucent(
    ctx: &mut vello_cpu::RenderContext,
    coverage: &Coverage,
    image: &vello_cpu::Image,
    paint_transform: vello_cpu::kurbo::Affine,
    mode: CompositionMode,
    opacity: f32,
) {
    use vello_cpu::peniko::{BlendMode, Compose, Mix};

    let layer_blend = if mode == CompositionMode::Replace {
        ctx.set_paint(vello_cpu::peniko::Color::TRANSPARENT);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_blend_mode(BlendMode::new(Mix::Normal, Compose::Clear));
        coverage.fill(ctx);
        BlendMode::default()
    } else {
        blend_mode(mode)
    };
    ctx.set_paint(image.clone());
    ctx.set_paint_transform(paint_transform);
    ctx.set_blend_mode(BlendMode::default());
    ctx.push_layer(None, Some(layer_blend), Some(opacity), None, None);
    coverage.fill(ctx);
    ctx.pop_layer();
}

/// Clip a convex polygon against an axis-aligned rect, one edge at a time.
fn clip_polygon(points: &[Point], clip: Rect) -> SmallVec<[Point; 8]> {
    let mut poly: SmallVec<[Point; 8]> = SmallVec::from_slice(points);
    for edge in 0..4 {
        if poly.is_empty() {
            break;
        }
        let inside = |p: Point| match edge {
            0 => p.x >= clip.x0,
            1 => p.x <= clip.x1,
            2 => p.y >= clip.y0,
            _ => p.y <= clip.y1,
        };
        let cross = |a: Point, b: Point| match edge {
            0 | 1 => {
                let x = if edge == 0 { clip.x0 } else { clip.x1 };
                let t = (x - a.x) / (b.x - a.x);
                Point::new(x, a.y + t * (b.y - a.y))
            }
            _ => {
                let y = if edge == 2 { clip.y0 } else { clip.y1 };
                let t = (y - a.y) / (b.y - a.y);
                Point::new(a.x + t * (b.x - a.x), y)
            }
        };
        let mut out = SmallVec::new();
        for (i, &cur) in poly.iter().enumerate() {
            let prev = poly[(i + poly.len() - 1) % poly.len()];
            match (inside(prev), inside(cur)) {
                (true, true) => out.push(cur),
                (true, false) => out.push(cross(prev, cur)),
                (false, true) => {
                    out.push(cross(prev, cur));
                    out.push(cur);
                }
                (false, false) => {}
            }
        }
        poly = out;
    }
    poly
}

fn blend_mode(mode: CompositionMode) -> vello_cpu::peniko::BlendMode {
    use vello_cpu::peniko::{BlendMode, Compose, Mix};

    match mode {
        CompositionMode::Normal => BlendMode::default(),
        CompositionMode::Multiply => BlendMode::new(Mix::Multiply, Compose::SrcOver),
        CompositionMode::Add => BlendMode::new(Mix::Normal, Compose::Plus),
        CompositionMode::Replace => BlendMode::new(Mix::Normal, Compose::Copy),
        CompositionMode::DestBlending => BlendMode::new(Mix::Normal, Compose::DestOver),
        CompositionMode::Light => BlendMode::new(Mix::Screen, Compose::SrcOver),
    }
}

fn image_paint(texture: &Texture) -> vello_cpu::Image {
    let quality = if texture.is_smooth() {
        vello_cpu::peniko::ImageQuality::Medium
    } else {
        vello_cpu::peniko::ImageQuality::Low
    };
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(texture.pixmap().clone()),
        sampler: vello_cpu::peniko::ImageSampler {
            quality,
            ..vello_cpu::peniko::ImageSampler::default()
        },
    }
}

fn color_to_cpu(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn polygon_path(points: &[Point]) -> vello_cpu::kurbo::BezPath {
    let mut p = vello_cpu::kurbo::BezPath::new();
    let mut pts = points.iter().copied().map(point_to_cpu);
    if let Some(first) = pts.next() {
        p.move_to(first);
        for pt in pts {
            p.line_to(pt);
        }
        p.close_path();
    }
    p
}

/// Map texel rect `src` onto `dest`, mirrored vertically when `flip_y`.
fn rect_paint_transform(dest: Rect, src: Rect, flip_y: bool) -> vello_cpu::kurbo::Affine {
    let sx = dest.width() / src.width();
    let sy = dest.height() / src.height();
    let (ty, sy) = if flip_y { (dest.y1, -sy) } else { (dest.y0, sy) };
    vello_cpu::kurbo::Affine::new([
        sx,
        0.0,
        0.0,
        sy,
        dest.x0 - sx * src.x0,
        ty - sy * src.y0,
    ])
}

/// Affine map taking each texel coordinate in `tex` to the matching corner in `points`.
fn triangle_paint_transform(tex: [Point; 3], points: [Point; 3]) -> Option<vello_cpu::kurbo::Affine> {
    let [t0, t1, t2] = tex;
    let [p0, p1, p2] = points;
    let (tx1, ty1) = (t1.x - t0.x, t1.y - t0.y);
    let (tx2, ty2) = (t2.x - t0.x, t2.y - t0.y);
    let det = tx1 * ty2 - tx2 * ty1;
    if det.abs() < f64::EPSILON {
        return None;
    }
    let (px1, py1) = (p1.x - p0.x, p1.y - p0.y);
    let (px2, py2) = (p2.x - p0.x, p2.y - p0.y);

    let a = (px1 * ty2 - px2 * ty1) / det;
    let c = (px2 * tx1 - px1 * tx2) / det;
    let b = (py1 * ty2 - py2 * ty1) / det;
    let d = (py2 * tx1 - py1 * tx2) / det;
    let e = p0.x - (a * t0.x + c * t0.y);
    let f = p0.y - (b * t0.x + d * t0.y);
    Some(vello_cpu::kurbo::Affine::new([a, b, c, d, e, f]))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
