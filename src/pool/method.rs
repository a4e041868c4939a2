use crate::{
    foundation::core::{Point, Rect, rect_is_empty},
    foundation::fingerprint::StableHasher,
    render::coords::{CoordsBuffer, triangle_bounds},
};

/// Kind of a recorded primitive request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawMethodType {
    /// Solid geometry from a caller-built buffer.
    FillCoords,
    /// Textured geometry from a caller-built buffer.
    TextureCoords,
    /// Texture region stretched over a rectangle.
    TexturedRect,
    /// Texture region stretched over a rectangle, mirrored vertically.
    UpsideDownTexturedRect,
    /// Texture region tiled over a rectangle.
    RepeatedTexturedRect,
    /// Solid rectangle recorded through the repeated-fill path.
    RepeatedFilledRect,
    /// Solid rectangle.
    FilledRect,
    /// Solid triangle.
    FilledTriangle,
    /// Rectangle outline.
    BoundingRect,
}

impl DrawMethodType {
    fn tag(self) -> u8 {
        match self {
            Self::FillCoords => 0,
            Self::TextureCoords => 1,
            Self::TexturedRect => 2,
            Self::UpsideDownTexturedRect => 3,
            Self::RepeatedTexturedRect => 4,
            Self::RepeatedFilledRect => 5,
            Self::FilledRect => 6,
            Self::FilledTriangle => 7,
            Self::BoundingRect => 8,
        }
    }
}

/// One geometric primitive request.
///
/// Each variant carries only the data its kind uses. The two buffer kinds carry nothing: their
/// geometry is the caller-built buffer stored on the owning object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawMethod {
    /// See [`DrawMethodType::FillCoords`].
    FillCoords,
    /// See [`DrawMethodType::TextureCoords`].
    TextureCoords,
    /// See [`DrawMethodType::TexturedRect`].
    TexturedRect {
        /// Destination rectangle.
        dest: Rect,
        /// Texel-space source rectangle.
        src: Rect,
    },
    /// See [`DrawMethodType::UpsideDownTexturedRect`].
    UpsideDownTexturedRect {
        /// Destination rectangle.
        dest: Rect,
        /// Texel-space source rectangle.
        src: Rect,
    },
    /// See [`DrawMethodType::RepeatedTexturedRect`].
    RepeatedTexturedRect {
        /// Area to tile.
        dest: Rect,
        /// Texel-space tile.
        src: Rect,
    },
    /// See [`DrawMethodType::RepeatedFilledRect`].
    RepeatedFilledRect {
        /// Destination rectangle.
        dest: Rect,
    },
    /// See [`DrawMethodType::FilledRect`].
    FilledRect {
        /// Destination rectangle.
        dest: Rect,
    },
    /// See [`DrawMethodType::FilledTriangle`].
    FilledTriangle {
        /// First corner.
        a: Point,
        /// Second corner.
        b: Point,
        /// Third corner.
        c: Point,
    },
    /// See [`DrawMethodType::BoundingRect`].
    BoundingRect {
        /// Outer edge of the outline.
        dest: Rect,
        /// Line thickness in pixels, drawn inside `dest`.
        line_width: u32,
    },
}

impl DrawMethod {
    /// Kind tag of this request.
    pub fn kind(&self) -> DrawMethodType {
        match self {
            Self::FillCoords => DrawMethodType::FillCoords,
            Self::TextureCoords => DrawMethodType::TextureCoords,
            Self::TexturedRect { .. } => DrawMethodType::TexturedRect,
            Self::UpsideDownTexturedRect { .. } => DrawMethodType::UpsideDownTexturedRect,
            Self::RepeatedTexturedRect { .. } => DrawMethodType::RepeatedTexturedRect,
            Self::RepeatedFilledRect { .. } => DrawMethodType::RepeatedFilledRect,
            Self::FilledRect { .. } => DrawMethodType::FilledRect,
            Self::FilledTriangle { .. } => DrawMethodType::FilledTriangle,
            Self::BoundingRect { .. } => DrawMethodType::BoundingRect,
        }
    }

    /// Return `true` for the kinds whose geometry lives in a caller-built buffer.
    pub fn needs_buffer(&self) -> bool {
        matches!(self, Self::FillCoords | Self::TextureCoords)
    }

    /// Return `true` for the kinds that sample the bound texture.
    pub fn is_textured(&self) -> bool {
        matches!(
            self,
            Self::TextureCoords
                | Self::TexturedRect { .. }
                | Self::UpsideDownTexturedRect { .. }
                | Self::RepeatedTexturedRect { .. }
        )
    }

    /// Destination-space bounds, `None` for buffer kinds and for requests that draw nothing.
    pub fn bounds(&self) -> Option<Rect> {
        let b = match *self {
            Self::FillCoords | Self::TextureCoords => return None,
            Self::TexturedRect { dest, src }
            | Self::UpsideDownTexturedRect { dest, src }
            | Self::RepeatedTexturedRect { dest, src } => {
                if rect_is_empty(src) {
                    return None;
                }
                dest
            }
            Self::RepeatedFilledRect { dest } | Self::FilledRect { dest } => dest,
            Self::BoundingRect { dest, line_width } => {
                if line_width == 0 {
                    return None;
                }
                dest
            }
            Self::FilledTriangle { a, b, c } => {
                let area2 = ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs();
                if area2 == 0.0 {
                    return None;
                }
                triangle_bounds(a, b, c)
            }
        };
        (!rect_is_empty(b)).then_some(b)
    }

    /// Append this request's geometry to `buffer`.
    pub fn emit(&self, buffer: &mut CoordsBuffer) {
        match *self {
            Self::FillCoords | Self::TextureCoords => {}
            Self::TexturedRect { dest, src } => buffer.add_textured_rect(dest, src),
            Self::UpsideDownTexturedRect { dest, src } => buffer.add_upside_down_rect(dest, src),
            Self::RepeatedTexturedRect { dest, src } => buffer.add_repeated_rects(dest, src),
            Self::RepeatedFilledRect { dest } | Self::FilledRect { dest } => buffer.add_rect(dest),
            Self::FilledTriangle { a, b, c } => buffer.add_triangle(a, b, c),
            Self::BoundingRect { dest, line_width } => {
                buffer.add_bounding_rect(dest, f64::from(line_width))
            }
        }
    }

    pub(crate) fn write_fingerprint(&self, h: &mut StableHasher) {
        h.write_u8(self.kind().tag());
        match *self {
            Self::FillCoords | Self::TextureCoords => {}
            Self::TexturedRect { dest, src }
            | Self::UpsideDownTexturedRect { dest, src }
            | Self::RepeatedTexturedRect { dest, src } => {
                h.write_rect(dest);
                h.write_rect(src);
            }
            Self::RepeatedFilledRect { dest } | Self::FilledRect { dest } => h.write_rect(dest),
            Self::FilledTriangle { a, b, c } => {
                h.write_point(a);
                h.write_point(b);
                h.write_point(c);
            }
            Self::BoundingRect { dest, line_width } => {
                h.write_rect(dest);
                h.write_u32(line_width);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/method.rs"]
mod tests;
