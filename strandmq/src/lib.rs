//! Strandmq
//!
//! Broker-less ZeroMQ-style socket patterns over a message-oriented
//! duplex transport: ROUTER/DEALER, REQ/REP, PUB/SUB (plus XPUB/XSUB),
//! PUSH/PULL and PAIR, with multipart framing, transparent
//! reconnection, and prefix-based subscription matching.
//!
//! Sockets are single-owner objects driven by `poll`; the in-tree
//! transport is the in-process channel transport (`mem://` addresses).
//!
//! # Example
//!
//! ```
//! use strandmq::{socket, Message, MemoryHost, SocketType};
//! use std::time::Duration;
//!
//! let host = MemoryHost::new("mem://example").unwrap();
//!
//! let mut pull = socket(SocketType::Pull);
//! pull.bind_addr(&host, "mem://example/sink").unwrap();
//!
//! let mut push = socket(SocketType::Push);
//! push.connect("mem://example/sink").unwrap();
//! push.send(Message::new().push_str("work")).unwrap();
//!
//! push.poll();
//! let msg = pull.recv_timeout(Duration::from_secs(1)).unwrap();
//! assert_eq!(&msg[0][..], b"work");
//! ```

#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod dealer;
mod pair;
mod pattern;
mod publisher;
mod pull;
mod push;
mod rep;
mod req;
mod router;
mod socket;
mod subscriber;
pub mod transport;
mod wire;
mod xpub;
mod xsub;

pub use socket::{socket, Socket, SocketType};
pub use transport::{Host, MemoryHost};

pub use strandmq_core::endpoint::{Endpoint, EndpointError};
pub use strandmq_core::error::{Result, SocketError};
pub use strandmq_core::message::{Frames, Message};
pub use strandmq_core::options::SocketOptions;
pub use strandmq_core::subscription::SubscriptionEvent;
