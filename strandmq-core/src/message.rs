//! Multipart message type and builder.
//!
//! A message is an ordered, non-empty sequence of binary frames; a frame
//! may be empty (used as an envelope delimiter). Frame order is preserved
//! end-to-end.

use bytes::Bytes;

/// The frames of one multipart message.
pub type Frames = Vec<Bytes>;

/// A multipart message builder with ergonomic frame construction.
///
/// # Examples
///
/// ```
/// use strandmq_core::message::Message;
///
/// let msg = Message::new()
///     .push_str("topic")
///     .push(&b"data"[..])
///     .into_frames();
/// assert_eq!(msg.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Message {
    frames: Frames,
}

impl Message {
    /// Create a new empty message.
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Create a message from existing frames.
    #[must_use]
    pub const fn from_frames(frames: Frames) -> Self {
        Self { frames }
    }

    /// Add a frame from any type that can be converted to `Bytes`.
    #[must_use]
    pub fn push(mut self, frame: impl Into<Bytes>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// Add a string frame (UTF-8 encoded).
    #[must_use]
    pub fn push_str(mut self, s: &str) -> Self {
        self.frames.push(Bytes::copy_from_slice(s.as_bytes()));
        self
    }

    /// Add an empty frame (useful for envelope separation).
    ///
    /// ```
    /// # use strandmq_core::message::Message;
    /// // ROUTER envelope: [identity] [empty] [data]
    /// let msg = Message::new()
    ///     .push(&b"client-id"[..])
    ///     .push_empty()
    ///     .push_str("request");
    /// assert!(msg.frames()[1].is_empty());
    /// ```
    #[must_use]
    pub fn push_empty(mut self) -> Self {
        self.frames.push(Bytes::new());
        self
    }

    /// Get the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the message has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get a reference to the frames.
    #[must_use]
    pub fn frames(&self) -> &[Bytes] {
        &self.frames
    }

    /// Consume the builder and return the frames.
    #[must_use]
    pub fn into_frames(self) -> Frames {
        self.frames
    }

    /// Try to view a frame as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame doesn't exist or isn't valid UTF-8.
    pub fn frame_str(&self, index: usize) -> std::io::Result<&str> {
        let frame = self.frames.get(index).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "frame index out of bounds")
        })?;

        std::str::from_utf8(frame)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl From<Frames> for Message {
    fn from(frames: Frames) -> Self {
        Self { frames }
    }
}

impl From<Message> for Frames {
    fn from(msg: Message) -> Self {
        msg.frames
    }
}

impl From<Bytes> for Message {
    fn from(frame: Bytes) -> Self {
        Self {
            frames: vec![frame],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_builder() {
        let msg = Message::new()
            .push(&b"frame1"[..])
            .push_str("frame2")
            .push_empty()
            .push(vec![1, 2, 3]);

        assert_eq!(msg.len(), 4);
        assert_eq!(msg.frames()[0], b"frame1"[..]);
        assert_eq!(msg.frames()[1], b"frame2"[..]);
        assert_eq!(msg.frames()[2], b""[..]);
        assert_eq!(msg.frames()[3], &[1, 2, 3][..]);
    }

    #[test]
    fn test_into_frames() {
        let frames = Message::new()
            .push_str("hello")
            .push_str("world")
            .into_frames();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], b"hello"[..]);
        assert_eq!(frames[1], b"world"[..]);
    }

    #[test]
    fn test_frame_str() {
        let msg = Message::new().push_str("topic").push(&b"data"[..]);

        assert_eq!(msg.frame_str(0).unwrap(), "topic");
        assert!(msg.frame_str(2).is_err()); // Out of bounds
    }
}
