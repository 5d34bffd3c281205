use super::*;
use crate::frame::Data;

fn frame(n: i64) -> Frame {
    Frame::request("whiteboard:draw", Data::new()).with_data("n", n)
}

fn numbers(frames: &[Frame]) -> Vec<i64> {
    frames
        .iter()
        .filter_map(|f| f.data.get("n").and_then(serde_json::Value::as_i64))
        .collect()
}

#[test]
fn publish_reaches_sender_too() {
    let fabric = LoopbackFabric::new();
    let mut alice = fabric.join("alice");
    let mut bob = fabric.join("bob");

    assert_eq!(alice.send(frame(1)), 2);

    let at_alice = alice.drain();
    let at_bob = bob.drain();
    assert_eq!(numbers(&at_alice), vec![1]);
    assert_eq!(numbers(&at_bob), vec![1]);
    assert_eq!(at_bob[0].from.as_deref(), Some("alice"));
}

#[test]
fn all_peers_see_same_order() {
    let fabric = LoopbackFabric::new();
    let mut peers: Vec<Peer> = (0..3).map(|i| fabric.join(format!("p{i}"))).collect();

    for n in 0..30 {
        let sender = usize::try_from(n).unwrap() % peers.len();
        peers[sender].send(frame(n));
    }

    let orders: Vec<Vec<i64>> = peers.iter_mut().map(|p| numbers(&p.drain())).collect();
    assert_eq!(orders[0], (0..30).collect::<Vec<_>>());
    assert!(orders.iter().all(|o| *o == orders[0]));
}

#[test]
fn dropped_peer_leaves_fabric() {
    let fabric = LoopbackFabric::new();
    let alice = fabric.join("alice");
    {
        let _bob = fabric.join("bob");
        assert_eq!(fabric.peer_count(), 2);
    }
    assert_eq!(fabric.peer_count(), 1);
    assert_eq!(alice.send(frame(1)), 1);
}

#[test]
fn leave_is_idempotent() {
    let fabric = LoopbackFabric::new();
    let alice = fabric.join("alice");
    fabric.leave(alice.id());
    fabric.leave(alice.id());
    assert_eq!(fabric.peer_count(), 0);
    assert_eq!(alice.name(), "alice");
}

#[test]
fn try_recv_on_empty_is_none() {
    let fabric = LoopbackFabric::new();
    let mut alice = fabric.join("alice");
    assert!(alice.try_recv().is_none());
    assert!(alice.drain().is_empty());
}

#[tokio::test]
async fn recv_waits_for_frame() {
    let fabric = LoopbackFabric::new();
    let mut alice = fabric.join("alice");
    let bob = fabric.join("bob");

    let waiter = tokio::spawn(async move { alice.recv().await });
    bob.send(frame(7));
    let got = waiter.await.unwrap().unwrap();
    assert_eq!(got.data.get("n").and_then(serde_json::Value::as_i64), Some(7));
}
