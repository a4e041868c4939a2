use super::*;

fn r(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect {
    Rect::new(x0, y0, x1, y1)
}

#[test]
fn empty_rects_are_dropped() {
    let mut b = CoordsBuffer::new();
    b.add_rect(r(0.0, 0.0, 0.0, 5.0));
    b.add_textured_rect(r(0.0, 0.0, 5.0, 5.0), r(0.0, 0.0, 0.0, 0.0));
    assert!(b.is_empty());
    assert_eq!(b.bounds(), None);
}

#[test]
fn bounds_accumulate_across_primitives() {
    let mut b = CoordsBuffer::new();
    b.add_rect(r(0.0, 0.0, 4.0, 4.0));
    b.add_triangle(Point::new(10.0, 10.0), Point::new(12.0, 10.0), Point::new(10.0, 15.0));
    assert_eq!(b.len(), 2);
    assert_eq!(b.bounds(), Some(r(0.0, 0.0, 12.0, 15.0)));
}

#[test]
fn degenerate_triangles_are_dropped() {
    let mut b = CoordsBuffer::new();
    b.add_triangle(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0));
    assert!(b.is_empty());
}

#[test]
fn repeated_rects_tile_and_crop() {
    let mut b = CoordsBuffer::new();
    b.add_repeated_rects(r(0.0, 0.0, 10.0, 4.0), r(0.0, 0.0, 4.0, 4.0));
    let prims = b.primitives();
    assert_eq!(prims.len(), 3);
    assert_eq!(
        prims[2],
        Primitive::Rect {
            dest: r(8.0, 0.0, 10.0, 4.0),
            src: Some(r(0.0, 0.0, 2.0, 4.0)),
            flip_y: false,
        }
    );
}

#[test]
fn repeated_rects_stay_bounded_far_from_the_origin() {
    let mut b = CoordsBuffer::new();
    b.add_repeated_rects(r(1e16, 0.0, 1e16 + 4.0, 1.0), r(0.0, 0.0, 1.0, 1.0));
    assert!(b.len() <= 4);
    assert!(b.primitives().iter().all(|p| p.bounds().x0 >= 1e16));
}

#[test]
fn too_many_repeat_tiles_stretch_the_source_once() {
    let mut b = CoordsBuffer::new();
    let dest = r(0.0, 0.0, 10_000.0, 10_000.0);
    let src = r(0.0, 0.0, 1.0, 1.0);
    b.add_repeated_rects(dest, src);
    assert_eq!(
        b.primitives(),
        &[Primitive::Rect {
            dest,
            src: Some(src),
            flip_y: false,
        }]
    );

    let mut at_limit = CoordsBuffer::new();
    at_limit.add_repeated_rects(r(0.0, 0.0, 128.0, 128.0), src);
    assert_eq!(at_limit.len(), MAX_REPEAT_TILES);
}

#[test]
fn bounding_rect_is_four_disjoint_strips() {
    let mut b = CoordsBuffer::new();
    b.add_bounding_rect(r(0.0, 0.0, 10.0, 8.0), 2.0);
    assert_eq!(b.len(), 4);
    let area: f64 = b.primitives().iter().map(|p| p.bounds().area()).sum();
    // Outline area = outer - inner.
    assert_eq!(area, 10.0 * 8.0 - 6.0 * 4.0);
    assert_eq!(b.bounds(), Some(r(0.0, 0.0, 10.0, 8.0)));
}

#[test]
fn append_preserves_order() {
    let mut a = CoordsBuffer::new();
    a.add_rect(r(0.0, 0.0, 1.0, 1.0));
    let mut b = CoordsBuffer::new();
    b.add_rect(r(5.0, 5.0, 6.0, 6.0));
    a.append(&b);
    assert_eq!(a.primitives()[1].bounds(), r(5.0, 5.0, 6.0, 6.0));
}
