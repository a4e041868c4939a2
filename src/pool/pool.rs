use std::rc::Rc;

use crate::{
    foundation::core::{Color, Point, Rect, rects_touch},
    foundation::error::{DrawPoolError, DrawPoolResult},
    foundation::fingerprint::StableHasher,
    pool::framed::ModificationStatus,
    pool::method::DrawMethod,
    pool::object::DrawObject,
    pool::settings::PoolSettings,
    pool::state::State,
    render::coords::{CoordsBuffer, Primitive},
    render::painter::{CompositionMode, DrawMode, Painter, PainterState},
    render::texture::TextureRef,
};

// Fingerprint tags for edits that are not primitive requests.
const TAG_SET_COMPOSITION: u8 = 0xF0;
const TAG_SET_CLIP: u8 = 0xF1;
const TAG_SET_OPACITY: u8 = 0xF2;
const TAG_COORDS: u8 = 0xF3;

/// Ordered recorder of draw objects for one rendering layer.
///
/// Objects are appended during a frame and dropped by [`Pool::begin_frame`]. Primitive requests
/// are folded into an existing object when the painter state and draw mode match exactly, which
/// turns long runs of same-state draws into a single painter submission.
#[derive(Debug)]
pub struct Pool {
    name: String,
    settings: PoolSettings,
    objects: Vec<DrawObject>,
    state: State,
    enabled: bool,
    search_start: usize,
    pub(crate) status: Option<ModificationStatus>,
}

impl Pool {
    /// Create an enabled pool with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, PoolSettings::default())
    }

    /// Create an enabled pool with explicit settings.
    pub fn with_settings(name: impl Into<String>, settings: PoolSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            objects: Vec::new(),
            state: State::default(),
            enabled: true,
            search_start: 0,
            status: None,
        }
    }

    /// Layer name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settings this pool was built with.
    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Enable or disable recording and replay. Work already replayed is unaffected.
    pub fn set_enable(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the pool records and replays.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Recorded objects, in replay order.
    pub fn objects(&self) -> &[DrawObject] {
        &self.objects
    }

    /// Number of recorded objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Return `true` when nothing has been recorded this frame.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Current ambient pen.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Index where the current recording phase began.
    pub fn search_start(&self) -> usize {
        self.search_start
    }

    /// Start a new recording phase at the current object count.
    ///
    /// Later requests never merge into objects recorded before this point.
    pub fn start_position(&mut self) {
        self.search_start = self.objects.len();
    }

    /// Drop last frame's objects (and any pending deferred actions) and reset the pen.
    pub fn begin_frame(&mut self) {
        self.objects.clear();
        self.search_start = 0;
        self.reset_state();
    }

    /// Set the blend function for later draws, or amend the object at `pos`.
    pub fn set_composition_mode(
        &mut self,
        mode: CompositionMode,
        pos: Option<usize>,
    ) -> DrawPoolResult<()> {
        match pos {
            None => self.state.composition_mode = mode,
            Some(i) => {
                self.object_state_mut(i)?.composition_mode = mode;
                self.note_edit(TAG_SET_COMPOSITION, i, |h| h.write_u8(mode.tag()));
            }
        }
        Ok(())
    }

    /// Set the clip rectangle for later draws, or amend the object at `pos`. `None` disables
    /// clipping.
    pub fn set_clip_rect(&mut self, clip: Option<Rect>, pos: Option<usize>) -> DrawPoolResult<()> {
        match pos {
            None => self.state.clip_rect = clip,
            Some(i) => {
                self.object_state_mut(i)?.clip_rect = clip;
                self.note_edit(TAG_SET_CLIP, i, |h| match clip {
                    Some(r) => {
                        h.write_u8(1);
                        h.write_rect(r);
                    }
                    None => h.write_u8(0),
                });
            }
        }
        Ok(())
    }

    /// Set the opacity for later draws, or amend the object at `pos`.
    pub fn set_opacity(&mut self, opacity: f32, pos: Option<usize>) -> DrawPoolResult<()> {
        match pos {
            None => self.state.opacity = opacity,
            Some(i) => {
                self.object_state_mut(i)?.opacity = opacity;
                self.note_edit(TAG_SET_OPACITY, i, |h| h.write_f32(opacity));
            }
        }
        Ok(())
    }

    /// Toggle alpha writing for later draws.
    pub fn set_alpha_writing(&mut self, enabled: bool) {
        self.state.alpha_writing = enabled;
    }

    /// Disable clipping for later draws.
    pub fn reset_clip_rect(&mut self) {
        self.state.clip_rect = None;
    }

    /// Restore normal blending for later draws.
    pub fn reset_composition_mode(&mut self) {
        self.state.composition_mode = CompositionMode::Normal;
    }

    /// Restore full opacity for later draws.
    pub fn reset_opacity(&mut self) {
        self.state.opacity = 1.0;
    }

    /// Restore the default pen: no clipping, normal blending, full opacity, alpha writing on.
    pub fn reset_state(&mut self) {
        self.reset_clip_rect();
        self.reset_composition_mode();
        self.reset_opacity();
        self.state.alpha_writing = true;
    }

    /// Record a primitive request.
    ///
    /// Returns the index of the object it landed in, or `None` when the pool is disabled or the
    /// request draws nothing. Buffer kinds must go through [`Pool::add_fill_coords`] or
    /// [`Pool::add_texture_coords`].
    pub fn add(
        &mut self,
        color: Color,
        texture: Option<&TextureRef>,
        method: DrawMethod,
        mode: DrawMode,
    ) -> DrawPoolResult<Option<usize>> {
        if method.needs_buffer() {
            return Err(DrawPoolError::MissingBuffer(method.kind()));
        }
        Ok(self.record(color, texture, method, mode))
    }

    /// Solid rectangle.
    pub fn add_filled_rect(&mut self, dest: Rect, color: Color) -> Option<usize> {
        self.record(color, None, DrawMethod::FilledRect { dest }, DrawMode::Triangles)
    }

    /// Solid rectangle through the repeated-fill path.
    pub fn add_repeated_filled_rect(&mut self, dest: Rect, color: Color) -> Option<usize> {
        self.record(
            color,
            None,
            DrawMethod::RepeatedFilledRect { dest },
            DrawMode::Triangles,
        )
    }

    /// Texture region `src` stretched over `dest`, tinted by `color`.
    pub fn add_textured_rect(
        &mut self,
        dest: Rect,
        texture: &TextureRef,
        src: Rect,
        color: Color,
    ) -> Option<usize> {
        self.record(
            color,
            Some(texture),
            DrawMethod::TexturedRect { dest, src },
            DrawMode::Triangles,
        )
    }

    /// Texture region `src` stretched over `dest`, mirrored vertically.
    pub fn add_upside_down_textured_rect(
        &mut self,
        dest: Rect,
        texture: &TextureRef,
        src: Rect,
        color: Color,
    ) -> Option<usize> {
        self.record(
            color,
            Some(texture),
            DrawMethod::UpsideDownTexturedRect { dest, src },
            DrawMode::Triangles,
        )
    }

    /// Texture region `src` tiled unscaled over `dest`.
    pub fn add_repeated_textured_rect(
        &mut self,
        dest: Rect,
        texture: &TextureRef,
        src: Rect,
        color: Color,
    ) -> Option<usize> {
        self.record(
            color,
            Some(texture),
            DrawMethod::RepeatedTexturedRect { dest, src },
            DrawMode::Triangles,
        )
    }

    /// Solid triangle.
    pub fn add_filled_triangle(&mut self, a: Point, b: Point, c: Point, color: Color) -> Option<usize> {
        self.record(
            color,
            None,
            DrawMethod::FilledTriangle { a, b, c },
            DrawMode::Triangles,
        )
    }

    /// Outline of `dest`, `line_width` pixels thick.
    pub fn add_bounding_rect(&mut self, dest: Rect, color: Color, line_width: u32) -> Option<usize> {
        self.record(
            color,
            None,
            DrawMethod::BoundingRect { dest, line_width },
            DrawMode::Triangles,
        )
    }

    /// Solid geometry from a caller-built buffer. The buffer is shared, never copied or extended.
    pub fn add_fill_coords(&mut self, coords: Rc<CoordsBuffer>, color: Color) -> Option<usize> {
        self.record_coords(coords, color, None, DrawMethod::FillCoords, DrawMode::Triangles)
    }

    /// Textured geometry from a caller-built buffer.
    pub fn add_texture_coords(
        &mut self,
        coords: Rc<CoordsBuffer>,
        texture: &TextureRef,
        color: Color,
        mode: DrawMode,
    ) -> Option<usize> {
        self.record_coords(coords, color, Some(texture), DrawMethod::TextureCoords, mode)
    }

    /// Record deferred work that runs in order during replay.
    pub fn add_action(&mut self, action: impl FnOnce(&mut dyn Painter) + 'static) -> Option<usize> {
        if !self.enabled {
            return None;
        }
        self.objects.push(DrawObject::from_action(Box::new(action)));
        if let Some(status) = self.status.as_mut() {
            status.record_opaque();
        }
        Some(self.objects.len() - 1)
    }

    /// Submit every object, in order, to `painter`. Deferred actions are consumed.
    #[tracing::instrument(skip(self, painter), fields(pool = %self.name, objects = self.objects.len()))]
    pub fn replay(&mut self, painter: &mut dyn Painter) {
        if !self.enabled {
            return;
        }
        for obj in &mut self.objects {
            obj.replay(painter);
        }
    }

    fn record(
        &mut self,
        color: Color,
        texture: Option<&TextureRef>,
        method: DrawMethod,
        mode: DrawMode,
    ) -> Option<usize> {
        if !self.enabled {
            return None;
        }
        let bounds = method.bounds()?;
        let state = self.state.painter_state(color, texture);

        let index = match self.find_merge_target(&state, mode, bounds) {
            Some(i) => {
                tracing::trace!(pool = %self.name, index = i, kind = ?method.kind(), "merged draw");
                self.objects[i].push_method(method);
                i
            }
            None => {
                self.objects
                    .push(DrawObject::from_method(state.clone(), method, mode));
                self.objects.len() - 1
            }
        };

        if let Some(status) = self.status.as_mut() {
            let mut h = StableHasher::new();
            // Where the request landed decides what later edits by index amend.
            h.write_u64(index as u64);
            method.write_fingerprint(&mut h);
            state.write_fingerprint(&mut h);
            h.write_u8(mode.tag());
            status.record(h.finish());
        }
        Some(index)
    }

    fn record_coords(
        &mut self,
        coords: Rc<CoordsBuffer>,
        color: Color,
        texture: Option<&TextureRef>,
        kind: DrawMethod,
        mode: DrawMode,
    ) -> Option<usize> {
        if !self.enabled || coords.is_empty() {
            return None;
        }
        let state = self.state.painter_state(color, texture);
        let index = self.objects.len();

        if let Some(status) = self.status.as_mut() {
            let mut h = StableHasher::new();
            h.write_u8(TAG_COORDS);
            h.write_u64(index as u64);
            kind.write_fingerprint(&mut h);
            h.write_u64(coords.len() as u64);
            for p in coords.primitives() {
                write_primitive(&mut h, p);
            }
            state.write_fingerprint(&mut h);
            h.write_u8(mode.tag());
            status.record(h.finish());
        }

        self.objects
            .push(DrawObject::from_coords(state, coords, kind, mode));
        Some(index)
    }

    /// Find an object in the current phase that a request with `state`, `mode` and `bounds` can
    /// be folded into without changing the replayed pixels.
    fn find_merge_target(&self, state: &PainterState, mode: DrawMode, bounds: Rect) -> Option<usize> {
        let reorder = self.settings.reorder_disjoint && state.composition_mode == CompositionMode::Normal;
        let depth = self.settings.merge_search_depth.max(1);

        for (steps, i) in (self.search_start..self.objects.len()).rev().enumerate() {
            if steps >= depth {
                break;
            }
            let obj = &self.objects[i];
            if obj.can_merge(state, mode) {
                return Some(i);
            }
            // Skipping `obj` moves the new primitive before it; only safe when they cannot touch.
            if !reorder || obj.is_reorder_barrier() {
                return None;
            }
            match obj.bounds() {
                Some(b) if !rects_touch(b, bounds) => {}
                _ => return None,
            }
        }
        None
    }

    fn object_state_mut(&mut self, index: usize) -> DrawPoolResult<&mut PainterState> {
        let len = self.objects.len();
        self.objects
            .get_mut(index)
            .map(DrawObject::state_mut)
            .ok_or_else(|| DrawPoolError::index_out_of_range(index, len))
    }

    fn note_edit(&mut self, tag: u8, index: usize, write: impl FnOnce(&mut StableHasher)) {
        if let Some(status) = self.status.as_mut() {
            let mut h = StableHasher::new();
            h.write_u8(tag);
            h.write_u64(index as u64);
            write(&mut h);
            status.record(h.finish());
        }
    }
}

fn write_primitive(h: &mut StableHasher, p: &Primitive) {
    match *p {
        Primitive::Rect { dest, src, flip_y } => {
            h.write_u8(0);
            h.write_rect(dest);
            match src {
                Some(s) => {
                    h.write_u8(1);
                    h.write_rect(s);
                }
                None => h.write_u8(0),
            }
            h.write_bool(flip_y);
        }
        Primitive::Triangle { points, tex } => {
            h.write_u8(1);
            for pt in points {
                h.write_point(pt);
            }
            match tex {
                Some(t) => {
                    h.write_u8(1);
                    for pt in t {
                        h.write_point(pt);
                    }
                }
                None => h.write_u8(0),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/pool.rs"]
mod tests;
