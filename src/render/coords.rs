use crate::foundation::core::{Point, Rect, rect_is_empty};

/// Most tiles [`CoordsBuffer::add_repeated_rects`] emits for one request.
pub const MAX_REPEAT_TILES: usize = 16_384;

/// One geometric primitive of a [`CoordsBuffer`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    /// Axis-aligned rectangle, optionally sampling `src` from the bound texture.
    Rect {
        /// Destination rectangle.
        dest: Rect,
        /// Texture source rectangle in texel space.
        src: Option<Rect>,
        /// Sample the source upside down.
        flip_y: bool,
    },
    /// Triangle, optionally with per-corner texture coordinates.
    Triangle {
        /// Destination corners.
        points: [Point; 3],
        /// Texel-space coordinates for each corner.
        tex: Option<[Point; 3]>,
    },
}

impl Primitive {
    /// Destination-space bounding box.
    pub fn bounds(&self) -> Rect {
        match *self {
            Self::Rect { dest, .. } => dest,
            Self::Triangle { points: [a, b, c], .. } => triangle_bounds(a, b, c),
        }
    }
}

/// Ordered geometry submitted in one painter call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoordsBuffer {
    primitives: Vec<Primitive>,
    bounds: Option<Rect>,
}

impl CoordsBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Primitives in submission order.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Return `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Union of every primitive's bounds, `None` when empty.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Drop every primitive.
    pub fn clear(&mut self) {
        self.primitives.clear();
        self.bounds = None;
    }

    fn push(&mut self, p: Primitive) {
        let b = p.bounds();
        self.bounds = Some(match self.bounds {
            Some(prev) => prev.union(b),
            None => b,
        });
        self.primitives.push(p);
    }

    /// Solid rectangle.
    pub fn add_rect(&mut self, dest: Rect) {
        if rect_is_empty(dest) {
            return;
        }
        self.push(Primitive::Rect {
            dest,
            src: None,
            flip_y: false,
        });
    }

    /// Rectangle sampling `src` from the bound texture.
    pub fn add_textured_rect(&mut self, dest: Rect, src: Rect) {
        if rect_is_empty(dest) || rect_is_empty(src) {
            return;
        }
        self.push(Primitive::Rect {
            dest,
            src: Some(src),
            flip_y: false,
        });
    }

    /// Rectangle sampling `src` vertically mirrored.
    pub fn add_upside_down_rect(&mut self, dest: Rect, src: Rect) {
        if rect_is_empty(dest) || rect_is_empty(src) {
            return;
        }
        self.push(Primitive::Rect {
            dest,
            src: Some(src),
            flip_y: true,
        });
    }

    /// Tile `dest` with unscaled copies of `src`, cropping the last row and column.
    ///
    /// Above [`MAX_REPEAT_TILES`] tiles the source is stretched over `dest` as one rect instead.
    pub fn add_repeated_rects(&mut self, dest: Rect, src: Rect) {
        if rect_is_empty(dest) || rect_is_empty(src) {
            return;
        }
        let (tw, th) = (src.width(), src.height());
        let cols = (dest.width() / tw).ceil();
        let rows = (dest.height() / th).ceil();
        // NaN or infinite counts fail this too.
        let fits = cols * rows <= MAX_REPEAT_TILES as f64;
        if !fits {
            tracing::debug!(cols, rows, "repeat tile count over limit; stretching source");
            self.add_textured_rect(dest, src);
            return;
        }
        let (cols, rows) = (cols as usize, rows as usize);
        for row in 0..rows {
            let y = dest.y0 + row as f64 * th;
            let h = th.min(dest.y1 - y);
            for col in 0..cols {
                let x = dest.x0 + col as f64 * tw;
                let w = tw.min(dest.x1 - x);
                let tile = Rect::new(x, y, x + w, y + h);
                if rect_is_empty(tile) {
                    continue;
                }
                self.push(Primitive::Rect {
                    dest: tile,
                    src: Some(Rect::new(src.x0, src.y0, src.x0 + w, src.y0 + h)),
                    flip_y: false,
                });
            }
        }
    }

    /// Solid triangle. Degenerate (zero-area) triangles are dropped.
    pub fn add_triangle(&mut self, a: Point, b: Point, c: Point) {
        if triangle_area2(a, b, c) == 0.0 {
            return;
        }
        self.push(Primitive::Triangle {
            points: [a, b, c],
            tex: None,
        });
    }

    /// Triangle with texel-space coordinates per corner.
    pub fn add_textured_triangle(&mut self, points: [Point; 3], tex: [Point; 3]) {
        let [a, b, c] = points;
        if triangle_area2(a, b, c) == 0.0 {
            return;
        }
        self.push(Primitive::Triangle {
            points,
            tex: Some(tex),
        });
    }

    /// Outline of `dest` made of four non-overlapping strips `line_width` thick, inside `dest`.
    pub fn add_bounding_rect(&mut self, dest: Rect, line_width: f64) {
        if rect_is_empty(dest) || line_width <= 0.0 {
            return;
        }
        let w = line_width.min(dest.width()).min(dest.height());
        let Rect { x0, y0, x1, y1 } = dest;
        self.add_rect(Rect::new(x0, y0, x1 - w, y0 + w));
        self.add_rect(Rect::new(x1 - w, y0, x1, y1 - w));
        self.add_rect(Rect::new(x0 + w, y1 - w, x1, y1));
        self.add_rect(Rect::new(x0, y0 + w, x0 + w, y1));
    }

    /// Append every primitive of `other`.
    pub fn append(&mut self, other: &CoordsBuffer) {
        for p in &other.primitives {
            self.push(*p);
        }
    }
}

fn triangle_area2(a: Point, b: Point, c: Point) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs()
}

pub(crate) fn triangle_bounds(a: Point, b: Point, c: Point) -> Rect {
    Rect::new(
        a.x.min(b.x).min(c.x),
        a.y.min(b.y).min(c.y),
        a.x.max(b.x).max(c.x),
        a.y.max(b.y).max(c.y),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/coords.rs"]
mod tests;
