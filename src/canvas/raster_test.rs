use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

const W: u32 = 100;
const H: u32 = 100;

fn blank() -> Canvas {
    Canvas::new(W, H, Rgba::WHITE)
}

fn draw(start: (i32, i32), end: (i32, i32), size: i32, color: Rgba) -> DrawEvent {
    DrawEvent::new(Point::new(start.0, start.1), Point::new(end.0, end.1), size, color)
}

fn erase(start: (i32, i32), end: (i32, i32), diameter: f32) -> EraseEvent {
    EraseEvent::new(Point::new(start.0, start.1), Point::new(end.0, end.1), diameter)
}

fn colored(canvas: &Canvas, color: Rgba) -> Vec<(i32, i32)> {
    let mut out = Vec::new();
    for y in 0..canvas.height() as i32 {
        for x in 0..canvas.width() as i32 {
            if canvas.get(x, y) == Some(color) {
                out.push((x, y));
            }
        }
    }
    out
}

// =============================================================
// Interpolation
// =============================================================

#[test]
fn step_count_uses_longer_axis() {
    assert_eq!(step_count(Point::new(0, 0), Point::new(10, 3)), 10);
    assert_eq!(step_count(Point::new(0, 0), Point::new(-2, -7)), 7);
    assert_eq!(step_count(Point::new(5, 5), Point::new(5, 5)), 1);
}

#[test]
fn interpolate_yields_steps_plus_one_points() {
    let points: Vec<Point> = interpolate(Point::new(0, 0), Point::new(4, 2)).collect();
    assert_eq!(points.len(), 5);
    assert_eq!(points.first(), Some(&Point::new(0, 0)));
    assert_eq!(points.last(), Some(&Point::new(4, 2)));
}

#[test]
fn interpolate_has_no_gaps() {
    let points: Vec<Point> = interpolate(Point::new(3, 90), Point::new(71, 12)).collect();
    for pair in points.windows(2) {
        assert!((pair[1].x - pair[0].x).abs() <= 1);
        assert!((pair[1].y - pair[0].y).abs() <= 1);
    }
}

#[test]
fn degenerate_segment_repeats_the_point() {
    let points: Vec<Point> = interpolate(Point::new(7, 7), Point::new(7, 7)).collect();
    assert_eq!(points, vec![Point::new(7, 7), Point::new(7, 7)]);
}

#[test]
fn erase_stride_scales_with_diameter() {
    assert_eq!(erase_stride(4.0), 1);
    assert_eq!(erase_stride(8.0), 1);
    assert_eq!(erase_stride(12.0), 2);
    assert_eq!(erase_stride(40.0), 5);
    assert_eq!(erase_stride(50.0), 6);
    assert_eq!(erase_stride(f32::NAN), 1);
    assert_eq!(erase_stride(-3.0), 1);
}

// =============================================================
// Pen
// =============================================================

#[test]
fn single_point_draw_fills_square() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    let applied = draw_line(&mut canvas, &mut dirty, &draw((10, 10), (10, 10), 4, Rgba::RED));

    assert_eq!(applied, 2);
    let red = colored(&canvas, Rgba::RED);
    assert_eq!(red.len(), 16);
    assert!(red.iter().all(|&(x, y)| (10..14).contains(&x) && (10..14).contains(&y)));
    assert_eq!(dirty.bounds(), Some(Rect::new(10, 10, 14, 14)));
}

#[test]
fn horizontal_line_covers_stamp_width() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    draw_line(&mut canvas, &mut dirty, &draw((10, 10), (20, 10), 4, Rgba::RED));

    for y in 0..H as i32 {
        for x in 0..W as i32 {
            let inside = (10..=23).contains(&x) && (10..=13).contains(&y);
            let expected = if inside { Rgba::RED } else { Rgba::WHITE };
            assert_eq!(canvas.get(x, y), Some(expected), "pixel ({x},{y})");
        }
    }
    assert_eq!(dirty.bounds(), Some(Rect::new(10, 10, 24, 14)));
}

#[test]
fn edge_stamp_is_dropped_not_cropped() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    // Square at x=97 of size 4 would need column 100.
    let applied = draw_line(&mut canvas, &mut dirty, &draw((97, 50), (97, 50), 4, Rgba::RED));
    assert_eq!(applied, 0);
    assert!(colored(&canvas, Rgba::RED).is_empty());
    assert!(!dirty.is_valid());
}

#[test]
fn stamp_flush_with_edge_is_kept() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    draw_line(&mut canvas, &mut dirty, &draw((96, 96), (96, 96), 4, Rgba::RED));
    assert_eq!(canvas.get(99, 99), Some(Rgba::RED));
    assert_eq!(dirty.bounds(), Some(Rect::new(96, 96, 100, 100)));
}

#[test]
fn line_leaving_canvas_keeps_inside_stamps_only() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    draw_line(&mut canvas, &mut dirty, &draw((90, 5), (110, 5), 2, Rgba::BLUE));
    let blue = colored(&canvas, Rgba::BLUE);
    assert!(!blue.is_empty());
    assert!(blue.iter().all(|&(x, y)| x <= 99 && (5..7).contains(&y)));
    assert_eq!(dirty.bounds(), Some(Rect::new(90, 5, 100, 7)));
}

#[test]
fn negative_coordinates_are_dropped() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    let applied = draw_line(&mut canvas, &mut dirty, &draw((-3, -3), (-1, -1), 2, Rgba::RED));
    assert_eq!(applied, 0);
    assert!(colored(&canvas, Rgba::RED).is_empty());
}

#[test]
fn non_positive_size_is_noop() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    assert_eq!(draw_line(&mut canvas, &mut dirty, &draw((1, 1), (9, 9), 0, Rgba::RED)), 0);
    assert_eq!(draw_line(&mut canvas, &mut dirty, &draw((1, 1), (9, 9), -4, Rgba::RED)), 0);
    assert!(!dirty.is_valid());
}

#[test]
fn extreme_coordinates_do_not_overflow() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    draw_line(&mut canvas, &mut dirty, &draw((i32::MAX - 1, 0), (i32::MAX, 0), 8, Rgba::RED));
    draw_line(&mut canvas, &mut dirty, &draw((i32::MIN, i32::MIN), (i32::MIN + 2, i32::MIN), 3, Rgba::RED));
    assert!(colored(&canvas, Rgba::RED).is_empty());
}

// =============================================================
// Eraser
// =============================================================

#[test]
fn erase_disk_resets_to_background() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    let mut patterns = PatternCache::default();
    draw_line(&mut canvas, &mut dirty, &draw((10, 10), (20, 10), 4, Rgba::RED));

    erase_stroke(&mut canvas, &mut dirty, &mut patterns, &erase((15, 10), (15, 10), 50.0), Rgba::WHITE);

    for (x, y) in colored(&canvas, Rgba::RED) {
        let (dx, dy) = (x - 15, y - 10);
        assert!(dx * dx + dy * dy > 625, "({x},{y}) inside the disk stayed red");
    }
    // Radius 25 covers the whole red strip.
    assert!(colored(&canvas, Rgba::RED).is_empty());
}

#[test]
fn erase_keeps_pixels_outside_disk() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    let mut patterns = PatternCache::default();
    draw_line(&mut canvas, &mut dirty, &draw((10, 60), (90, 60), 4, Rgba::RED));

    erase_stroke(&mut canvas, &mut dirty, &mut patterns, &erase((15, 60), (15, 60), 10.0), Rgba::WHITE);

    // Radius 5 disk around (15,60).
    assert_eq!(canvas.get(15, 60), Some(Rgba::WHITE));
    assert_eq!(canvas.get(20, 60), Some(Rgba::WHITE));
    assert_eq!(canvas.get(21, 60), Some(Rgba::RED));
    assert_eq!(canvas.get(80, 62), Some(Rgba::RED));
}

#[test]
fn erase_is_cropped_at_edges() {
    let mut canvas = Canvas::new(W, H, Rgba::RED);
    let mut dirty = DirtyRegion::new();
    let mut patterns = PatternCache::default();

    let applied = erase_stroke(&mut canvas, &mut dirty, &mut patterns, &erase((0, 0), (0, 0), 20.0), Rgba::WHITE);

    assert!(applied > 0);
    assert_eq!(canvas.get(0, 0), Some(Rgba::WHITE));
    assert_eq!(canvas.get(10, 0), Some(Rgba::WHITE));
    assert_eq!(canvas.get(11, 0), Some(Rgba::RED));
    assert_eq!(dirty.bounds(), Some(Rect::new(0, 0, 11, 11)));
}

#[test]
fn erase_entirely_off_canvas_touches_nothing() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    let mut patterns = PatternCache::default();
    let applied = erase_stroke(&mut canvas, &mut dirty, &mut patterns, &erase((-500, -500), (-400, -500), 10.0), Rgba::WHITE);
    assert_eq!(applied, 0);
    assert!(!dirty.is_valid());
}

#[test]
fn erase_on_blank_canvas_changes_nothing() {
    let mut canvas = blank();
    let before = canvas.clone();
    let mut dirty = DirtyRegion::new();
    let mut patterns = PatternCache::default();
    erase_stroke(&mut canvas, &mut dirty, &mut patterns, &erase((10, 10), (80, 70), 35.0), Rgba::WHITE);
    assert_eq!(canvas, before);
}

#[test]
fn strided_erase_always_reaches_end_point() {
    let mut canvas = Canvas::new(200, 50, Rgba::RED);
    let mut dirty = DirtyRegion::new();
    let mut patterns = PatternCache::default();
    // 101 steps, stride 6: the last sampled index is 96, so the end is stamped explicitly.
    erase_stroke(&mut canvas, &mut dirty, &mut patterns, &erase((20, 25), (121, 25), 50.0), Rgba::WHITE);
    assert_eq!(canvas.get(121 + 24, 25), Some(Rgba::WHITE));
    assert_eq!(canvas.get(121 + 26, 25), Some(Rgba::RED));
}

#[test]
fn erase_uses_bucket_radius_for_dirty_bounds() {
    let mut canvas = blank();
    let mut dirty = DirtyRegion::new();
    let mut patterns = PatternCache::default();
    // 22 resolves to the 20 bucket: radius 10.
    erase_stroke(&mut canvas, &mut dirty, &mut patterns, &erase((50, 50), (50, 50), 22.0), Rgba::WHITE);
    assert_eq!(dirty.bounds(), Some(Rect::new(40, 40, 61, 61)));
}

// =============================================================
// Properties
// =============================================================

fn random_event(rng: &mut StdRng) -> crate::event::Event {
    let point = |rng: &mut StdRng| Point::new(rng.random_range(-30..130), rng.random_range(-30..130));
    if rng.random_bool(0.6) {
        let color = Rgba::new(rng.random(), rng.random(), rng.random(), 255);
        draw((point(rng).x, point(rng).y), (point(rng).x, point(rng).y), rng.random_range(1..12), color).into()
    } else {
        erase((point(rng).x, point(rng).y), (point(rng).x, point(rng).y), rng.random_range(5.0..60.0)).into()
    }
}

fn apply(canvas: &mut Canvas, dirty: &mut DirtyRegion, patterns: &mut PatternCache, event: &crate::event::Event) {
    match event {
        crate::event::Event::Draw(e) => {
            draw_line(canvas, dirty, e);
        }
        crate::event::Event::Erase(e) => {
            erase_stroke(canvas, dirty, patterns, e, Rgba::WHITE);
        }
    }
}

#[test]
fn dirty_region_contains_every_changed_pixel() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut patterns = PatternCache::default();
    let mut canvas = blank();

    for _ in 0..40 {
        let before = canvas.clone();
        let mut dirty = DirtyRegion::new();
        for _ in 0..rng.random_range(1..6) {
            let event = random_event(&mut rng);
            apply(&mut canvas, &mut dirty, &mut patterns, &event);
        }
        let rect = dirty.clamped(W, H);
        for y in 0..H as i32 {
            for x in 0..W as i32 {
                if canvas.get(x, y) != before.get(x, y) {
                    let rect = rect.expect("changed pixel without dirty region");
                    assert!(rect.contains(x, y), "({x},{y}) changed outside {rect:?}");
                }
            }
        }
    }
}

#[test]
fn same_events_produce_same_pixels() {
    let mut rng = StdRng::seed_from_u64(42);
    let events: Vec<_> = (0..200).map(|_| random_event(&mut rng)).collect();

    let mut first = blank();
    let mut second = blank();
    let mut patterns_a = PatternCache::default();
    let mut patterns_b = PatternCache::default();
    let mut dirty = DirtyRegion::new();
    for event in &events {
        apply(&mut first, &mut dirty, &mut patterns_a, event);
    }
    for event in &events {
        apply(&mut second, &mut dirty, &mut patterns_b, event);
    }
    assert_eq!(first, second);
}
