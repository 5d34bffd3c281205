use super::*;
use crate::canvas::pixels::Point;

#[derive(Default)]
struct Recorder {
    uploads: Vec<(FlushRegion, Canvas)>,
}

impl DisplayTarget for Recorder {
    fn upload(&mut self, region: FlushRegion, canvas: &Canvas) {
        self.uploads.push((region, canvas.clone()));
    }
}

fn surface(double_buffering: bool) -> CanvasSurface {
    CanvasSurface::initialize(100, 100, Rgba::WHITE).with_double_buffering(double_buffering)
}

fn dot(x: i32, y: i32, size: i32) -> DrawEvent {
    DrawEvent::new(Point::new(x, y), Point::new(x, y), size, Rgba::RED)
}

fn wipe(x: i32, y: i32, diameter: f32) -> EraseEvent {
    EraseEvent::new(Point::new(x, y), Point::new(x, y), diameter)
}

// =============================================================
// Initialization
// =============================================================

#[test]
fn initialize_fills_background() {
    let surface = CanvasSurface::initialize(20, 10, Rgba::BLACK);
    assert_eq!(surface.width(), 20);
    assert_eq!(surface.height(), 10);
    assert!(surface.canvas().pixels().iter().all(|p| *p == Rgba::BLACK));
    assert!(!surface.is_pending());
    assert!(!surface.is_double_buffered());
}

#[test]
fn double_buffering_is_optional() {
    assert!(surface(true).is_double_buffered());
    assert!(!surface(false).is_double_buffered());
}

#[test]
fn custom_buckets_are_used() {
    let buckets = EraserBuckets { min: 20, max: 40, step: 10 };
    let surface = surface(false).with_buckets(buckets);
    assert_eq!(surface.buckets(), buckets);
}

// =============================================================
// Mutation
// =============================================================

#[test]
fn draw_marks_pending_and_dirty() {
    let mut surface = surface(false);
    surface.apply_draw(&dot(10, 10, 4));
    assert!(surface.is_pending());
    assert_eq!(surface.dirty().bounds(), Some(Rect::new(10, 10, 14, 14)));
}

#[test]
fn dropped_draw_leaves_surface_clean() {
    let mut surface = surface(false);
    assert_eq!(surface.apply_draw(&dot(98, 98, 4)), 0);
    assert!(!surface.is_pending());
    assert!(!surface.dirty().is_valid());
}

#[test]
fn batch_matches_sequential_application() {
    let mut buffered = surface(true);
    let mut direct = surface(false);
    for surface in [&mut buffered, &mut direct] {
        surface.apply_draw(&DrawEvent::new(Point::new(0, 50), Point::new(95, 50), 5, Rgba::RED));
    }

    let batch = [wipe(10, 50, 40.0), wipe(60, 52, 35.0), wipe(90, 48, 45.0)];
    buffered.apply_erase_batch(&batch);
    for event in &batch {
        direct.apply_erase(event);
    }

    assert_eq!(buffered.canvas(), direct.canvas());
    assert_eq!(buffered.dirty(), direct.dirty());
}

#[test]
fn shadow_stays_in_sync_across_batches() {
    let mut buffered = surface(true);
    let mut direct = surface(false);

    // Interleave draws and batches so the shadow must catch up each time.
    for round in 0..5 {
        let y = 10 + round * 15;
        let line = DrawEvent::new(Point::new(0, y), Point::new(90, y), 6, Rgba::BLUE);
        buffered.apply_draw(&line);
        direct.apply_draw(&line);

        let batch = [wipe(20 + round * 10, y, 40.0), wipe(70, y + 2, 35.0)];
        buffered.apply_erase_batch(&batch);
        for event in &batch {
            direct.apply_erase(event);
        }
        assert_eq!(buffered.canvas(), direct.canvas(), "round {round}");
    }
}

#[test]
fn empty_batch_is_noop() {
    let mut surface = surface(true);
    assert_eq!(surface.apply_erase_batch(&[]), 0);
    assert!(!surface.is_pending());
}

#[test]
fn mark_pending_without_pixels() {
    let mut surface = surface(false);
    surface.mark_pending();
    assert!(surface.is_pending());
    assert_eq!(surface.flush_region(), FlushRegion::Full);
}

// =============================================================
// Flush
// =============================================================

#[test]
fn small_dirty_area_flushes_partially() {
    let mut surface = surface(false);
    let mut target = Recorder::default();
    surface.apply_draw(&dot(10, 10, 4));

    let region = surface.flush(&mut target);

    assert_eq!(region, FlushRegion::Partial(Rect::new(10, 10, 14, 14)));
    assert_eq!(target.uploads.len(), 1);
    assert_eq!(target.uploads[0].1.get(11, 11), Some(Rgba::RED));
    assert!(!surface.dirty().is_valid());
    assert!(!surface.is_pending());
    // Pixels persist after the flush.
    assert_eq!(surface.canvas().get(11, 11), Some(Rgba::RED));
}

#[test]
fn large_dirty_area_flushes_fully() {
    let mut surface = surface(false);
    let mut target = Recorder::default();
    // 80×80 = 6400 ≥ half of 10000.
    surface.apply_draw(&dot(0, 0, 80));
    assert_eq!(surface.flush(&mut target), FlushRegion::Full);
}

#[test]
fn partial_threshold_is_strict() {
    let mut surface = CanvasSurface::initialize(10, 10, Rgba::WHITE);
    let mut target = Recorder::default();
    // 10×5 = exactly half: not below the threshold.
    surface.apply_draw(&DrawEvent::new(Point::new(0, 0), Point::new(5, 0), 5, Rgba::RED));
    assert_eq!(surface.flush(&mut target), FlushRegion::Full);
}

#[test]
fn custom_ratio_changes_threshold() {
    let mut surface = surface(false).with_partial_ratio(0.001);
    let mut target = Recorder::default();
    surface.apply_draw(&dot(10, 10, 4));
    assert_eq!(surface.flush(&mut target), FlushRegion::Full);
}

#[test]
fn flush_waits_for_interval() {
    let mut surface = surface(false);
    let mut target = Recorder::default();
    let interval = Duration::from_millis(100);
    let t0 = Instant::now();

    assert!(!surface.should_flush_at(t0, interval));
    surface.apply_draw(&dot(1, 1, 2));
    assert!(surface.should_flush_at(t0, interval));
    surface.flush_at(t0, &mut target);

    surface.apply_draw(&dot(5, 5, 2));
    assert!(!surface.should_flush_at(t0 + Duration::from_millis(50), interval));
    assert!(surface.should_flush_at(t0 + Duration::from_millis(100), interval));
}

#[test]
fn flush_region_rect_expands_full() {
    assert_eq!(FlushRegion::Full.rect(30, 20), Rect::new(0, 0, 30, 20));
    let rect = Rect::new(1, 2, 3, 4);
    assert_eq!(FlushRegion::Partial(rect).rect(30, 20), rect);
}
