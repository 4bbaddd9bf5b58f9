//! Reconnection, queue replay, and PAIR exclusivity tests.
//!
//! These tests use a short reconnect interval and deadline-bounded
//! polling loops instead of fixed sleeps.

use std::time::{Duration, Instant};

use strandmq::{
    socket, MemoryHost, Message, Socket, SocketOptions, SocketType,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_options() -> SocketOptions {
    SocketOptions::default().with_reconnect_interval(Duration::from_millis(5))
}

/// Poll both sockets until `receiver` yields a message or the deadline
/// passes.
fn recv_while_pumping(receiver: &mut Socket, other: &mut Socket) -> Option<Vec<bytes::Bytes>> {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        other.poll();
        if let Some(msg) = receiver.try_recv() {
            return Some(msg);
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    None
}

#[test]
fn test_connect_before_bind() {
    init_tracing();

    let mut push = Socket::with_options(SocketType::Push, fast_options());
    push.connect("mem://rc-late/sink").unwrap();
    push.send(Message::new().push_str("early-bird")).unwrap();

    // Nothing exists at the target yet; the pipe must be retrying.
    push.poll();

    let host = MemoryHost::new("mem://rc-late").unwrap();
    let mut pull = socket(SocketType::Pull);
    pull.bind_addr(&host, "mem://rc-late/sink").unwrap();

    let msg = recv_while_pumping(&mut pull, &mut push)
        .expect("queued message should arrive once the bind appears");
    assert_eq!(&msg[0][..], b"early-bird");
}

#[test]
fn test_queue_replay_after_peer_restart() {
    init_tracing();
    let host = MemoryHost::new("mem://rc-restart").unwrap();

    let mut pull = socket(SocketType::Pull);
    pull.bind_addr(&host, "mem://rc-restart/sink").unwrap();

    let mut push = Socket::with_options(SocketType::Push, fast_options());
    push.connect("mem://rc-restart/sink").unwrap();
    push.send(Message::new().push_str("before")).unwrap();
    assert_eq!(
        &recv_while_pumping(&mut pull, &mut push).unwrap()[0][..],
        b"before"
    );

    // Take the receiver down; sends during the outage queue up.
    drop(pull);
    let deadline = Instant::now() + Duration::from_millis(100);
    while Instant::now() < deadline {
        push.poll();
        std::thread::sleep(Duration::from_millis(1));
    }
    push.send(Message::new().push_str("during-outage")).unwrap();

    // Restart the receiver on the same path.
    let mut pull = socket(SocketType::Pull);
    pull.bind_addr(&host, "mem://rc-restart/sink").unwrap();

    let msg = recv_while_pumping(&mut pull, &mut push)
        .expect("queued message should replay after reconnect");
    assert_eq!(&msg[0][..], b"during-outage");
}

#[test]
fn test_subscriber_resubscribes_after_hiccup() {
    init_tracing();
    let host = MemoryHost::new("mem://rc-resub").unwrap();

    let mut xpub = socket(SocketType::XPub);
    xpub.bind_addr(&host, "mem://rc-resub/feed").unwrap();

    let mut sub = Socket::with_options(SocketType::Sub, fast_options());
    sub.connect("mem://rc-resub/feed").unwrap();
    sub.subscribe(&b"news"[..]).unwrap();

    // Let the first connection establish, then kill the publisher.
    let deadline = Instant::now() + Duration::from_millis(100);
    while xpub.try_recv().is_none() {
        sub.poll();
        assert!(Instant::now() < deadline, "subscription never arrived");
    }
    drop(xpub);

    // A new publisher on the same path must learn the subscription from
    // the replay, without the application re-subscribing.
    let mut xpub = socket(SocketType::XPub);
    xpub.bind_addr(&host, "mem://rc-resub/feed").unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    let msg = loop {
        assert!(Instant::now() < deadline, "no message after hiccup");
        sub.poll();
        xpub.poll();
        xpub.send(Message::new().push_str("news.flash")).unwrap();
        if let Some(msg) = sub.try_recv() {
            break msg;
        }
        std::thread::sleep(Duration::from_millis(1));
    };
    assert_eq!(&msg[0][..], b"news.flash");
}

#[test]
fn test_disconnect_stops_reconnecting() {
    init_tracing();

    let mut push = Socket::with_options(SocketType::Push, fast_options());
    push.connect("mem://rc-cancel/sink").unwrap();
    push.disconnect("mem://rc-cancel/sink").unwrap();
    assert!(push.disconnect("mem://rc-cancel/sink").is_err());

    let host = MemoryHost::new("mem://rc-cancel").unwrap();
    let mut pull = socket(SocketType::Pull);
    pull.bind_addr(&host, "mem://rc-cancel/sink").unwrap();

    // The pipe is gone; this send has nowhere to go and must not leak
    // out after the bind appears.
    push.send(Message::new().push_str("ghost")).unwrap();
    let deadline = Instant::now() + Duration::from_millis(100);
    while Instant::now() < deadline {
        push.poll();
        pull.poll();
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(pull.try_recv().is_none());
}

#[test]
fn test_unbind_frees_the_path() {
    init_tracing();
    let host = MemoryHost::new("mem://rc-unbind").unwrap();

    let mut pull = socket(SocketType::Pull);
    pull.bind_addr(&host, "mem://rc-unbind/sink").unwrap();

    let mut other = socket(SocketType::Pull);
    assert!(other.bind_addr(&host, "mem://rc-unbind/sink").is_err());

    pull.unbind("mem://rc-unbind/sink").unwrap();
    assert!(pull.unbind("mem://rc-unbind/sink").is_err());
    other.bind_addr(&host, "mem://rc-unbind/sink").unwrap();
}

#[test]
fn test_pair_binds_one_peer_at_a_time() {
    init_tracing();
    let host = MemoryHost::new("mem://rc-pair").unwrap();

    let mut server = socket(SocketType::Pair);
    server.bind_addr(&host, "mem://rc-pair/peer").unwrap();

    let mut winner = socket(SocketType::Pair);
    winner.connect("mem://rc-pair/peer").unwrap();
    winner.send(Message::new().push_str("claimed")).unwrap();
    for _ in 0..8 {
        winner.poll();
        server.poll();
    }
    assert_eq!(&server.try_recv().unwrap()[0][..], b"claimed");

    // A second peer is rejected; its traffic never surfaces.
    let mut loser = socket(SocketType::Pair);
    loser.connect("mem://rc-pair/peer").unwrap();
    loser.send(Message::new().push_str("intruder")).unwrap();
    for _ in 0..8 {
        loser.poll();
        server.poll();
    }
    assert!(server.try_recv().is_none());

    // The bound peer keeps working both ways.
    server.send(Message::new().push_str("welcome")).unwrap();
    for _ in 0..8 {
        server.poll();
        winner.poll();
    }
    assert_eq!(&winner.try_recv().unwrap()[0][..], b"welcome");
}
