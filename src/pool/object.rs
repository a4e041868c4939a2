use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    foundation::core::Rect,
    pool::method::{DrawMethod, DrawMethodType},
    render::coords::CoordsBuffer,
    render::painter::{CompositionMode, DrawMode, Painter, PainterState},
};

/// Deferred work recorded in place of geometry.
///
/// Runs at most once, when its object is replayed. Objects are dropped when their pool begins the
/// next frame, so an action that was never replayed is dropped with them and cannot outlive the
/// frame it was recorded in.
pub type DeferredAction = Box<dyn FnOnce(&mut dyn Painter)>;

/// One batched unit of rendering work.
pub struct DrawObject {
    state: PainterState,
    coords: Option<Rc<CoordsBuffer>>,
    shared_coords: bool,
    draw_mode: DrawMode,
    methods: SmallVec<[DrawMethod; 4]>,
    action: Option<DeferredAction>,
}

impl fmt::Debug for DrawObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawObject")
            .field("state", &self.state)
            .field("draw_mode", &self.draw_mode)
            .field("methods", &self.methods)
            .field("primitives", &self.coords.as_ref().map_or(0, |c| c.len()))
            .field("shared_coords", &self.shared_coords)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

impl DrawObject {
    pub(crate) fn from_method(state: PainterState, method: DrawMethod, draw_mode: DrawMode) -> Self {
        let mut coords = CoordsBuffer::new();
        method.emit(&mut coords);
        let mut methods = SmallVec::new();
        methods.push(method);
        Self {
            state,
            coords: Some(Rc::new(coords)),
            shared_coords: false,
            draw_mode,
            methods,
            action: None,
        }
    }

    pub(crate) fn from_coords(
        state: PainterState,
        coords: Rc<CoordsBuffer>,
        kind: DrawMethod,
        draw_mode: DrawMode,
    ) -> Self {
        let mut methods = SmallVec::new();
        methods.push(kind);
        Self {
            state,
            coords: Some(coords),
            shared_coords: true,
            draw_mode,
            methods,
            action: None,
        }
    }

    pub(crate) fn from_action(action: DeferredAction) -> Self {
        Self {
            state: PainterState::default(),
            coords: None,
            shared_coords: false,
            draw_mode: DrawMode::Triangles,
            methods: SmallVec::new(),
            action: Some(action),
        }
    }

    /// Painter state applied before this object's geometry.
    pub fn state(&self) -> &PainterState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut PainterState {
        &mut self.state
    }

    /// Primitive assembly mode.
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Requests batched into this object, in recording order.
    pub fn methods(&self) -> &[DrawMethod] {
        &self.methods
    }

    /// Kinds of the batched requests.
    pub fn method_types(&self) -> impl Iterator<Item = DrawMethodType> + '_ {
        self.methods.iter().map(DrawMethod::kind)
    }

    /// Geometry submitted on replay.
    pub fn coords(&self) -> Option<&Rc<CoordsBuffer>> {
        self.coords.as_ref()
    }

    /// Return `true` when the buffer is shared with the caller that built it.
    pub fn has_shared_coords(&self) -> bool {
        self.shared_coords
    }

    /// Return `true` while a deferred action is pending.
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Return `true` when replaying this object submits nothing.
    pub fn is_noop(&self) -> bool {
        self.action.is_none() && self.coords.as_ref().is_none_or(|c| c.is_empty())
    }

    /// Destination bounds of everything this object draws; `None` when unknown or empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.coords.as_ref().and_then(|c| c.bounds())
    }

    /// Return `true` when `state` and `mode` may be folded into this object.
    pub(crate) fn can_merge(&self, state: &PainterState, mode: DrawMode) -> bool {
        self.action.is_none()
            && !self.shared_coords
            && mode == DrawMode::Triangles
            && self.draw_mode == mode
            && self.state == *state
    }

    /// Return `true` when later draws must not be reordered past this object.
    pub(crate) fn is_reorder_barrier(&self) -> bool {
        self.action.is_some()
            || self.state.composition_mode != CompositionMode::Normal
            || self.bounds().is_none()
    }

    pub(crate) fn push_method(&mut self, method: DrawMethod) {
        let coords = self.coords.get_or_insert_with(|| Rc::new(CoordsBuffer::new()));
        method.emit(Rc::make_mut(coords));
        self.methods.push(method);
    }

    pub(crate) fn replay(&mut self, painter: &mut dyn Painter) {
        if let Some(action) = self.action.take() {
            action(painter);
            return;
        }
        let Some(coords) = self.coords.as_ref() else {
            return;
        };
        if coords.is_empty() {
            return;
        }
        painter.execute_state(&self.state);
        painter.draw_coords(coords, self.draw_mode);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/object.rs"]
mod tests;
