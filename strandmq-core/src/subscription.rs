//! Subscription control frames.
//!
//! XSUB → XPUB subscription changes travel upstream as single-frame
//! messages: `[0x01][topic]` to subscribe, `[0x00][topic]` to
//! unsubscribe. Any other leading byte (or an empty frame) is ordinary
//! data and passes through untouched.

use bytes::{BufMut, Bytes, BytesMut};

/// Leading byte of a subscribe control frame.
pub const SUBSCRIBE: u8 = 0x01;
/// Leading byte of an unsubscribe control frame.
pub const UNSUBSCRIBE: u8 = 0x00;

/// A parsed subscription change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// Subscribe to a topic prefix
    Subscribe(Bytes),
    /// Unsubscribe from a topic prefix
    Unsubscribe(Bytes),
}

impl SubscriptionEvent {
    /// Parse a frame as a subscription change.
    ///
    /// Returns `None` for frames that are not control frames; those are
    /// forwarded as data.
    #[must_use]
    pub fn from_frame(frame: &Bytes) -> Option<Self> {
        let (&flag, topic) = frame.split_first()?;
        match flag {
            SUBSCRIBE => Some(Self::Subscribe(frame.slice_ref(topic))),
            UNSUBSCRIBE => Some(Self::Unsubscribe(frame.slice_ref(topic))),
            _ => None,
        }
    }

    /// Encode this change as a control frame.
    #[must_use]
    pub fn to_frame(&self) -> Bytes {
        let (flag, topic) = match self {
            Self::Subscribe(topic) => (SUBSCRIBE, topic),
            Self::Unsubscribe(topic) => (UNSUBSCRIBE, topic),
        };
        let mut out = BytesMut::with_capacity(1 + topic.len());
        out.put_u8(flag);
        out.put_slice(topic);
        out.freeze()
    }

    /// The topic prefix this change refers to.
    #[must_use]
    pub fn topic(&self) -> &Bytes {
        match self {
            Self::Subscribe(topic) | Self::Unsubscribe(topic) => topic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let event = SubscriptionEvent::Subscribe(Bytes::from_static(b"weather"));
        let frame = event.to_frame();
        assert_eq!(frame[0], SUBSCRIBE);
        assert_eq!(SubscriptionEvent::from_frame(&frame), Some(event));

        let event = SubscriptionEvent::Unsubscribe(Bytes::from_static(b"w"));
        assert_eq!(
            SubscriptionEvent::from_frame(&event.to_frame()),
            Some(event)
        );
    }

    #[test]
    fn test_empty_topic_subscribes_to_everything() {
        let frame = Bytes::from_static(&[SUBSCRIBE]);
        let event = SubscriptionEvent::from_frame(&frame).unwrap();
        assert_eq!(event, SubscriptionEvent::Subscribe(Bytes::new()));
    }

    #[test]
    fn test_data_frames_are_not_control() {
        assert_eq!(SubscriptionEvent::from_frame(&Bytes::new()), None);
        assert_eq!(
            SubscriptionEvent::from_frame(&Bytes::from_static(b"\x02rest")),
            None
        );
    }
}
