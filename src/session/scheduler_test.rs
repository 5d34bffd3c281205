use super::*;
use crate::canvas::Point;

fn erase(id: i32, diameter: f32) -> EraseEvent {
    // The x coordinate doubles as an identity for order checks.
    EraseEvent::new(Point::new(id, 0), Point::new(id, 0), diameter)
}

fn ids(events: &[EraseEvent]) -> Vec<i32> {
    events.iter().map(|e| e.start.x).collect()
}

#[test]
fn threshold_is_strict() {
    let scheduler = BatchScheduler::new(30.0, 100, 1000);
    assert!(!scheduler.is_large(30.0));
    assert!(scheduler.is_large(30.5));
    assert!(!scheduler.should_queue(&erase(0, 20.0)));
    assert!(scheduler.should_queue(&erase(0, 40.0)));
}

#[test]
fn small_erase_queues_behind_pending() {
    let mut scheduler = BatchScheduler::new(30.0, 100, 1000);
    scheduler.enqueue(erase(1, 40.0));
    assert!(scheduler.should_queue(&erase(2, 10.0)));
}

#[test]
fn drain_respects_batch_size_and_order() {
    let mut scheduler = BatchScheduler::new(30.0, 3, 100);
    for id in 0..7 {
        assert!(scheduler.enqueue(erase(id, 40.0)).is_empty());
    }
    assert_eq!(ids(&scheduler.drain_batch()), vec![0, 1, 2]);
    assert_eq!(ids(&scheduler.drain_batch()), vec![3, 4, 5]);
    assert_eq!(ids(&scheduler.drain_batch()), vec![6]);
    assert!(scheduler.drain_batch().is_empty());
    assert!(scheduler.is_empty());
}

#[test]
fn full_queue_hands_back_oldest_batch() {
    let mut scheduler = BatchScheduler::new(30.0, 2, 4);
    for id in 0..4 {
        assert!(scheduler.enqueue(erase(id, 40.0)).is_empty());
    }
    let overflow = scheduler.enqueue(erase(4, 40.0));
    assert_eq!(ids(&overflow), vec![0, 1]);
    assert_eq!(scheduler.len(), 3);
    let rest: Vec<i32> = scheduler.pending().map(|e| e.start.x).collect();
    assert_eq!(rest, vec![2, 3, 4]);
}

#[test]
fn capacity_never_below_batch_size() {
    let scheduler = BatchScheduler::new(30.0, 50, 10);
    assert_eq!(scheduler.capacity(), 50);
    let scheduler = BatchScheduler::new(30.0, 0, 0);
    assert_eq!(scheduler.max_batch_size(), 1);
    assert_eq!(scheduler.capacity(), 1);
}

#[test]
fn admission_serializes_with_tag() {
    let json = serde_json::to_value(Admission::Backpressured { drained: 3 }).unwrap();
    assert_eq!(json, serde_json::json!({"admission": "backpressured", "drained": 3}));
}
