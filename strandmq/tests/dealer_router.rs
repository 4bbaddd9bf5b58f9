//! DEALER/ROUTER integration tests over the in-process transport.

use bytes::Bytes;
use strandmq::{socket, MemoryHost, Message, Socket, SocketError, SocketOptions, SocketType};

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
fn test_dealer_router_round_trip() {
    init_tracing();
    let host = MemoryHost::new("mem://dr-round-trip").unwrap();

    let mut router = socket(SocketType::Router);
    router.bind_addr(&host, "mem://dr-round-trip/svc").unwrap();

    let mut dealer = socket(SocketType::Dealer);
    dealer.connect("mem://dr-round-trip/svc").unwrap();
    dealer.send(Message::new().push_str("ping")).unwrap();

    pump(&mut dealer, &mut router);
    let request = router.try_recv().expect("router should see the request");
    assert_eq!(request.len(), 2);
    assert_eq!(&request[1][..], b"ping");

    // Anonymous peer: auto-assigned routing key.
    let key = request[0].clone();
    assert_eq!(key.len(), 5);
    assert_eq!(key[0], 0x01);

    router.send(vec![key, Bytes::from_static(b"pong")]).unwrap();
    pump(&mut router, &mut dealer);
    let reply = dealer.try_recv().expect("dealer should see the reply");
    assert_eq!(reply.len(), 1);
    assert_eq!(&reply[0][..], b"pong");
}

#[test]
fn test_declared_identity_key() {
    init_tracing();
    let host = MemoryHost::new("mem://dr-identity").unwrap();

    let mut router = socket(SocketType::Router);
    router.bind_addr(&host, "mem://dr-identity/svc").unwrap();

    let options = SocketOptions::default().with_routing_id(&b"worker-1"[..]);
    let mut dealer = Socket::with_options(SocketType::Dealer, options);
    dealer.connect("mem://dr-identity/svc").unwrap();
    dealer.send(Message::new().push_str("hi")).unwrap();

    pump(&mut dealer, &mut router);
    let request = router.try_recv().unwrap();
    assert_eq!(&request[0][..], b"\x00worker-1");

    // The declared key routes back to the right peer.
    router
        .send(vec![request[0].clone(), Bytes::from_static(b"ack")])
        .unwrap();
    pump(&mut router, &mut dealer);
    assert_eq!(&dealer.try_recv().unwrap()[0][..], b"ack");
}

#[test]
fn test_router_keeps_peers_apart() {
    init_tracing();
    let host = MemoryHost::new("mem://dr-two-peers").unwrap();

    let mut router = socket(SocketType::Router);
    router.bind_addr(&host, "mem://dr-two-peers/svc").unwrap();

    let mut alice = socket(SocketType::Dealer);
    alice.connect("mem://dr-two-peers/svc").unwrap();
    alice.send(Message::new().push_str("from-alice")).unwrap();
    pump(&mut alice, &mut router);

    let mut bob = socket(SocketType::Dealer);
    bob.connect("mem://dr-two-peers/svc").unwrap();
    bob.send(Message::new().push_str("from-bob")).unwrap();
    pump(&mut bob, &mut router);

    let first = router.try_recv().unwrap();
    let second = router.try_recv().unwrap();
    assert_eq!(&first[1][..], b"from-alice");
    assert_eq!(&second[1][..], b"from-bob");
    assert_ne!(first[0], second[0]);

    // Reply only to bob; alice must stay silent.
    router
        .send(vec![second[0].clone(), Bytes::from_static(b"bob-only")])
        .unwrap();
    pump(&mut router, &mut bob);
    pump(&mut router, &mut alice);

    assert_eq!(&bob.try_recv().unwrap()[0][..], b"bob-only");
    assert!(alice.try_recv().is_none());
}

#[test]
fn test_router_send_without_routing_key() {
    init_tracing();
    let mut router = socket(SocketType::Router);
    assert!(matches!(
        router.send(Message::new().push_str("naked")),
        Err(SocketError::RoutingKeyMissing)
    ));
}

#[test]
fn test_router_drops_message_for_unknown_peer() {
    init_tracing();
    let mut router = socket(SocketType::Router);

    // Best-effort routing: no error, message is discarded.
    router
        .send(vec![
            Bytes::from_static(b"\x00ghost"),
            Bytes::from_static(b"hello"),
        ])
        .unwrap();
}

#[test]
fn test_dealer_queues_until_peer_appears() {
    init_tracing();
    let mut dealer = socket(SocketType::Dealer);

    // No pipes at all: the message waits in the pending queue.
    dealer.send(Message::new().push_str("early")).unwrap();

    let host = MemoryHost::new("mem://dr-late-bind").unwrap();
    let mut router = socket(SocketType::Router);
    router.bind_addr(&host, "mem://dr-late-bind/svc").unwrap();
    dealer.connect("mem://dr-late-bind/svc").unwrap();

    pump(&mut dealer, &mut router);
    let request = router.try_recv().expect("pending message should flush");
    assert_eq!(&request[1][..], b"early");
}
