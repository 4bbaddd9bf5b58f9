//! PUSH/PULL pipeline tests.

use strandmq::{socket, MemoryHost, Message, Socket, SocketError, SocketType};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn pump(a: &mut Socket, b: &mut Socket) {
    for _ in 0..8 {
        a.poll();
        b.poll();
    }
}

#[test]
fn test_round_robin_across_workers() {
    init_tracing();
    let host = MemoryHost::new("mem://pl-fanout").unwrap();

    let mut even = socket(SocketType::Pull);
    even.bind_addr(&host, "mem://pl-fanout/even").unwrap();
    let mut odd = socket(SocketType::Pull);
    odd.bind_addr(&host, "mem://pl-fanout/odd").unwrap();

    let mut push = socket(SocketType::Push);
    push.connect("mem://pl-fanout/even").unwrap();
    push.connect("mem://pl-fanout/odd").unwrap();

    for task in ["t0", "t1", "t2", "t3"] {
        push.send(Message::new().push_str(task)).unwrap();
    }
    pump(&mut push, &mut even);
    pump(&mut push, &mut odd);

    // Rotation follows attach order.
    assert_eq!(&even.try_recv().unwrap()[0][..], b"t0");
    assert_eq!(&even.try_recv().unwrap()[0][..], b"t2");
    assert!(even.try_recv().is_none());

    assert_eq!(&odd.try_recv().unwrap()[0][..], b"t1");
    assert_eq!(&odd.try_recv().unwrap()[0][..], b"t3");
    assert!(odd.try_recv().is_none());
}

#[test]
fn test_pull_merges_producers() {
    init_tracing();
    let host = MemoryHost::new("mem://pl-merge").unwrap();

    let mut sink = socket(SocketType::Pull);
    sink.bind_addr(&host, "mem://pl-merge/sink").unwrap();

    let mut left = socket(SocketType::Push);
    left.connect("mem://pl-merge/sink").unwrap();
    left.send(Message::new().push_str("from-left")).unwrap();
    pump(&mut left, &mut sink);

    let mut right = socket(SocketType::Push);
    right.connect("mem://pl-merge/sink").unwrap();
    right.send(Message::new().push_str("from-right")).unwrap();
    pump(&mut right, &mut sink);

    let mut seen = vec![
        sink.try_recv().unwrap()[0].clone(),
        sink.try_recv().unwrap()[0].clone(),
    ];
    seen.sort();
    assert_eq!(&seen[0][..], b"from-left");
    assert_eq!(&seen[1][..], b"from-right");
}

#[test]
fn test_pull_cannot_send() {
    init_tracing();
    let mut pull = socket(SocketType::Pull);
    assert!(matches!(
        pull.send(Message::new().push_str("no")),
        Err(SocketError::NotSupported)
    ));
}

#[test]
fn test_empty_message_rejected() {
    init_tracing();
    let mut push = socket(SocketType::Push);
    assert!(matches!(
        push.send(Message::new()),
        Err(SocketError::EmptyMessage)
    ));
}
