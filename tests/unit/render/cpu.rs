use super::*;
use crate::render::framebuffer::FrameRGBA;

fn solid_state(color: Color) -> PainterState {
    PainterState {
        color,
        ..PainterState::default()
    }
}

fn rect_coords(r: Rect) -> CoordsBuffer {
    let mut b = CoordsBuffer::new();
    b.add_rect(r);
    b
}

fn apply(p: vello_cpu::kurbo::Affine, x: f64, y: f64) -> (f64, f64) {
    let q = p * vello_cpu::kurbo::Point::new(x, y);
    (q.x, q.y)
}

#[test]
fn filled_rect_covers_the_target() {
    let mut painter = CpuPainter::new();
    let size = TargetSize::new(8, 8);
    let target = painter
        .render_to_new_target(size, |p| {
            p.execute_state(&solid_state(Color::rgb(255, 0, 0)));
            p.draw_coords(&rect_coords(size.to_rect()), DrawMode::Triangles);
        })
        .unwrap();
    let frame = target.to_frame();
    for px in frame.data.chunks_exact(4) {
        assert_eq!(px, &[255, 0, 0, 255]);
    }
    assert_eq!(painter.stats().submissions, 1);
    assert_eq!(painter.stats().targets, 1);
}

#[test]
fn clip_rect_limits_the_fill() {
    let mut painter = CpuPainter::new();
    let size = TargetSize::new(4, 4);
    let target = painter
        .render_to_new_target(size, |p| {
            p.execute_state(&PainterState {
                clip_rect: Some(Rect::new(0.0, 0.0, 2.0, 2.0)),
                ..solid_state(Color::BLACK)
            });
            p.draw_coords(&rect_coords(size.to_rect()), DrawMode::Triangles);
        })
        .unwrap();
    let frame = target.to_frame();
    assert_eq!(frame.pixel(1, 1), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(3, 3), Some([0, 0, 0, 0]));
}

#[test]
fn zero_opacity_and_empty_clip_skip_submission() {
    let mut painter = CpuPainter::new();
    let size = TargetSize::new(2, 2);
    let target = painter
        .render_to_new_target(size, |p| {
            p.execute_state(&PainterState {
                opacity: 0.0,
                ..PainterState::default()
            });
            p.draw_coords(&rect_coords(size.to_rect()), DrawMode::Triangles);
            p.execute_state(&PainterState {
                clip_rect: Some(Rect::ZERO),
                ..PainterState::default()
            });
            p.draw_coords(&rect_coords(size.to_rect()), DrawMode::Triangles);
        })
        .unwrap();
    assert_eq!(painter.stats().submissions, 0);
    assert!(target.to_frame().data.iter().all(|&b| b == 0));
}

#[test]
fn textured_rect_samples_the_texture() {
    let tex = Texture::solid(2, 2, Color::rgb(0, 0, 255)).unwrap();
    let mut painter = CpuPainter::new();
    let size = TargetSize::new(4, 4);
    let target = painter
        .render_to_new_target(size, |p| {
            p.execute_state(&PainterState::textured(tex.clone()));
            let mut b = CoordsBuffer::new();
            b.add_textured_rect(size.to_rect(), tex.rect());
            p.draw_coords(&b, DrawMode::Triangles);
        })
        .unwrap();
    let frame = target.to_frame();
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(frame.pixel(3, 3), Some([0, 0, 255, 255]));
}

#[test]
fn clear_fills_the_whole_target() {
    let mut painter = CpuPainter::new();
    let target = painter
        .render_to_new_target(TargetSize::new(3, 3), |p| p.clear(Color::rgb(0, 255, 0)))
        .unwrap();
    for px in target.to_frame().data.chunks_exact(4) {
        assert_eq!(px, &[0, 255, 0, 255]);
    }
}

#[test]
fn end_target_rejects_size_mismatch() {
    let mut painter = CpuPainter::new();
    painter.begin_target(TargetSize::new(4, 4));
    let mut other = FrameBuffer::new(TargetSize::new(2, 2), false).unwrap();
    let err = painter.end_target(&mut other).unwrap_err();
    assert!(matches!(err, DrawPoolError::Render(_)));
}

#[test]
fn zero_area_target_is_a_no_op() {
    let mut painter = CpuPainter::new();
    let target = painter
        .render_to_new_target(TargetSize::new(0, 5), |p| {
            p.draw_coords(&rect_coords(Rect::new(0.0, 0.0, 1.0, 1.0)), DrawMode::Triangles);
        })
        .unwrap();
    assert!(target.is_empty());
    assert_eq!(painter.stats(), CpuPainterStats::default());
}

#[test]
fn rect_paint_transform_maps_src_corners_to_dest() {
    let dest = Rect::new(10.0, 20.0, 30.0, 60.0);
    let src = Rect::new(2.0, 4.0, 4.0, 8.0);

    let t = rect_paint_transform(dest, src, false);
    assert_eq!(apply(t, 2.0, 4.0), (10.0, 20.0));
    assert_eq!(apply(t, 4.0, 8.0), (30.0, 60.0));

    let f = rect_paint_transform(dest, src, true);
    assert_eq!(apply(f, 2.0, 4.0), (10.0, 60.0));
    assert_eq!(apply(f, 4.0, 8.0), (30.0, 20.0));
}

#[test]
fn triangle_paint_transform_solves_corner_mapping() {
    let tex = [Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
    let pts = [Point::new(10.0, 10.0), Point::new(18.0, 10.0), Point::new(10.0, 18.0)];
    let t = triangle_paint_transform(tex, pts).unwrap();
    for (s, d) in tex.iter().zip(pts.iter()) {
        let (x, y) = apply(t, s.x, s.y);
        assert!((x - d.x).abs() < 1e-9 && (y - d.y).abs() < 1e-9);
    }

    let collinear = [Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
    assert!(triangle_paint_transform(collinear, pts).is_none());
}

#[test]
fn batched_translucent_overlap_matches_separate_submissions() {
    let size = TargetSize::new(8, 4);
    let state = PainterState {
        opacity: 0.5,
        ..solid_state(Color::rgb(0, 0, 255))
    };
    let a = Rect::new(0.0, 0.0, 6.0, 4.0);
    let b = Rect::new(2.0, 0.0, 8.0, 4.0);

    let mut painter = CpuPainter::new();
    let batched = painter
        .render_to_new_target(size, |p| {
            let mut coords = rect_coords(a);
            coords.add_rect(b);
            p.execute_state(&state);
            p.draw_coords(&coords, DrawMode::Triangles);
        })
        .unwrap()
        .to_frame();
    let separate = painter
        .render_to_new_target(size, |p| {
            p.execute_state(&state);
            p.draw_coords(&rect_coords(a), DrawMode::Triangles);
            p.draw_coords(&rect_coords(b), DrawMode::Triangles);
        })
        .unwrap()
        .to_frame();
    assert_eq!(batched.data, separate.data);
    // The overlap is more opaque than the edges.
    assert!(batched.pixel(4, 1).unwrap()[3] > batched.pixel(0, 1).unwrap()[3]);
}

const BLUE: Color = Color::rgb(0, 0, 255);

fn over_blue(state: PainterState, coords: &CoordsBuffer) -> FrameRGBA {
    CpuPainter::new()
        .render_to_new_target(TargetSize::new(4, 4), |p| {
            p.clear(BLUE);
            p.execute_state(&state);
            p.draw_coords(coords, DrawMode::Triangles);
        })
        .unwrap()
        .to_frame()
}

fn assert_near(got: Option<[u8; 4]>, want: [u8; 4], tol: u8) {
    let got = got.unwrap();
    for (g, w) in got.iter().zip(want) {
        assert!(g.abs_diff(w) <= tol, "got {got:?}, want {want:?}");
    }
}

const MODES: [(CompositionMode, [u8; 4]); 6] = [
    (CompositionMode::Normal, [255, 0, 0, 255]),
    (CompositionMode::Multiply, [0, 0, 0, 255]),
    (CompositionMode::Add, [255, 0, 255, 255]),
    (CompositionMode::Replace, [255, 0, 0, 255]),
    (CompositionMode::DestBlending, [0, 0, 255, 255]),
    (CompositionMode::Light, [255, 0, 255, 255]),
];

#[test]
fn every_composition_mode_blends_with_the_target() {
    let full = TargetSize::new(4, 4).to_rect();
    for (mode, want) in MODES {
        let state = PainterState {
            composition_mode: mode,
            ..solid_state(Color::rgb(255, 0, 0))
        };
        let frame = over_blue(state.clone(), &rect_coords(full));
        assert_eq!(frame.pixel(1, 1), Some(want), "{mode:?}");

        let clipped = over_blue(
            PainterState {
                clip_rect: Some(full),
                ..state.clone()
            },
            &rect_coords(full),
        );
        assert_eq!(clipped.data, frame.data, "{mode:?} under a full clip");

        let half = over_blue(
            PainterState {
                clip_rect: Some(Rect::new(0.0, 0.0, 2.0, 4.0)),
                ..state
            },
            &rect_coords(full),
        );
        assert_eq!(half.pixel(1, 1), Some(want), "{mode:?} inside the clip");
        assert_eq!(half.pixel(3, 1), Some([0, 0, 255, 255]), "{mode:?} outside the clip");
    }
}

#[test]
fn clipped_triangles_keep_their_composition_mode() {
    let mut coords = CoordsBuffer::new();
    coords.add_triangle(Point::new(-4.0, -4.0), Point::new(12.0, -4.0), Point::new(-4.0, 12.0));
    let frame = over_blue(
        PainterState {
            composition_mode: CompositionMode::Add,
            clip_rect: Some(Rect::new(0.0, 0.0, 2.0, 2.0)),
            ..solid_state(Color::rgb(255, 0, 0))
        },
        &coords,
    );
    assert_eq!(frame.pixel(1, 1), Some([255, 0, 255, 255]));
    assert_eq!(frame.pixel(3, 3), Some([0, 0, 255, 255]));
}

#[test]
fn translucent_texture_keeps_its_composition_mode() {
    let tex = Texture::solid(2, 2, Color::rgb(255, 0, 0)).unwrap();
    let mut coords = CoordsBuffer::new();
    coords.add_textured_rect(Rect::new(0.0, 0.0, 4.0, 4.0), tex.rect());
    let cases = [
        (CompositionMode::Normal, [128, 0, 127, 255]),
        (CompositionMode::Multiply, [0, 0, 128, 255]),
        (CompositionMode::Add, [128, 0, 255, 255]),
        (CompositionMode::DestBlending, [0, 0, 255, 255]),
        (CompositionMode::Replace, [255, 0, 0, 128]),
    ];
    for (mode, want) in cases {
        let frame = over_blue(
            PainterState {
                composition_mode: mode,
                opacity: 0.5,
                ..PainterState::textured(tex.clone())
            },
            &coords,
        );
        assert_near(frame.pixel(2, 2), want, 2);
    }

    // Replace only touches the covered pixels.
    let mut corner = CoordsBuffer::new();
    corner.add_textured_rect(Rect::new(0.0, 0.0, 2.0, 2.0), tex.rect());
    let frame = over_blue(
        PainterState {
            composition_mode: CompositionMode::Replace,
            opacity: 0.5,
            ..PainterState::textured(tex.clone())
        },
        &corner,
    );
    assert_near(frame.pixel(1, 1), [255, 0, 0, 128], 2);
    assert_eq!(frame.pixel(3, 3), Some([0, 0, 255, 255]));
}

#[test]
fn batched_additive_overlap_under_a_clip_matches_separate_submissions() {
    let size = TargetSize::new(8, 4);
    let state = PainterState {
        composition_mode: CompositionMode::Add,
        clip_rect: Some(size.to_rect()),
        ..solid_state(Color::rgb(100, 0, 0))
    };
    let a = Rect::new(0.0, 0.0, 6.0, 4.0);
    let b = Rect::new(2.0, 0.0, 8.0, 4.0);

    let mut painter = CpuPainter::new();
    let batched = painter
        .render_to_new_target(size, |p| {
            p.clear(Color::BLACK);
            let mut coords = rect_coords(a);
            coords.add_rect(b);
            p.execute_state(&state);
            p.draw_coords(&coords, DrawMode::Triangles);
        })
        .unwrap()
        .to_frame();
    let separate = painter
        .render_to_new_target(size, |p| {
            p.clear(Color::BLACK);
            p.execute_state(&state);
            p.draw_coords(&rect_coords(a), DrawMode::Triangles);
            p.draw_coords(&rect_coords(b), DrawMode::Triangles);
        })
        .unwrap()
        .to_frame();
    assert_eq!(batched.data, separate.data);
    assert_eq!(batched.pixel(4, 1), Some([200, 0, 0, 255]));
    assert_eq!(batched.pixel(0, 1), Some([100, 0, 0, 255]));
}

#[test]
fn polygon_clip_keeps_the_covered_area() {
    let tri = [Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
    let poly = clip_polygon(&tri, Rect::new(0.0, 0.0, 2.0, 2.0));
    let area = poly
        .iter()
        .zip(poly.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>()
        .abs()
        / 2.0;
    assert!((area - 4.0).abs() < 1e-9);
    assert!(poly.iter().all(|p| (0.0..=2.0).contains(&p.x) && (0.0..=2.0).contains(&p.y)));

    assert!(clip_polygon(&tri, Rect::new(5.0, 5.0, 6.0, 6.0)).is_empty());
}
