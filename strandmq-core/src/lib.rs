//! Strandmq Core
//!
//! Runtime-agnostic building blocks for the strandmq pattern engine:
//! - Multipart message type and builder (`message`)
//! - Wire-unit codec for the `[flag][payload]` framing (`codec`)
//! - Endpoint address parsing (`endpoint`)
//! - Socket options (`options`)
//! - Round-robin pipe selection (`load_balancer`)
//! - Partitioned fan-out set (`distribution`)
//! - Subscription tries, single- and multi-subscriber (`trie`, `mtrie`)

#![cfg_attr(not(test), deny(unsafe_code))]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod codec;
pub mod distribution;
pub mod endpoint;
pub mod error;
pub mod load_balancer;
pub mod message;
pub mod mtrie;
pub mod options;
pub mod pipe;
pub mod subscription;
pub mod trie;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::codec::{encode_frames, encode_unit, UnitDecoder, WireError};
    pub use crate::distribution::Distribution;
    pub use crate::endpoint::{Endpoint, EndpointError};
    pub use crate::error::{Result, SocketError};
    pub use crate::load_balancer::LoadBalancer;
    pub use crate::message::{Frames, Message};
    pub use crate::mtrie::MultiTrie;
    pub use crate::options::SocketOptions;
    pub use crate::pipe::PipeId;
    pub use crate::subscription::SubscriptionEvent;
    pub use crate::trie::Trie;
}
