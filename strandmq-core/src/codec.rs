//! Wire-unit codec.
//!
//! Each wire write/read carries one unit: `[flag: u8][payload]`, where
//! flag `1` means more frames of this message follow and flag `0` marks
//! the last frame. A zero-length unit is a protocol violation and must
//! sever the connection.

use bytes::{BufMut, Bytes, BytesMut};
use smallvec::SmallVec;
use thiserror::Error;

use crate::message::Frames;

/// Flag value: more frames of this message follow.
pub const FLAG_MORE: u8 = 1;
/// Flag value: last frame of this message.
pub const FLAG_LAST: u8 = 0;

/// Wire framing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// A zero-length wire unit was received
    #[error("empty wire unit")]
    EmptyUnit,

    /// The flag byte was neither 0 nor 1
    #[error("invalid frame flag: {0}")]
    InvalidFlag(u8),
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, WireError>;

/// Encode one frame of a message as a wire unit.
#[must_use]
pub fn encode_unit(payload: &[u8], more: bool) -> Bytes {
    let mut out = BytesMut::with_capacity(1 + payload.len());
    out.put_u8(if more { FLAG_MORE } else { FLAG_LAST });
    out.put_slice(payload);
    out.freeze()
}

/// Encode a full multipart message as a sequence of wire units.
///
/// Frames `0..n-1` carry the more flag, the final frame carries the
/// last flag.
#[must_use]
pub fn encode_frames(frames: &[Bytes]) -> SmallVec<[Bytes; 4]> {
    let last = frames.len().saturating_sub(1);
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| encode_unit(frame, i != last))
        .collect()
}

/// Stateful multipart reassembler.
///
/// Feed inbound wire units in arrival order; a complete message is
/// returned once a unit with the last flag is seen.
#[derive(Debug, Default)]
pub struct UnitDecoder {
    frames: Frames,
}

impl UnitDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Consume one wire unit.
    ///
    /// Returns:
    /// - `Ok(Some(frames))` → a full multipart message was assembled
    /// - `Ok(None)` → more units needed
    /// - `Err` → protocol violation; the caller must close the connection
    pub fn push_unit(&mut self, mut unit: Bytes) -> Result<Option<Frames>> {
        if unit.is_empty() {
            return Err(WireError::EmptyUnit);
        }

        let flag = unit.split_to(1)[0];
        self.frames.push(unit);

        match flag {
            FLAG_MORE => Ok(None),
            FLAG_LAST => Ok(Some(std::mem::take(&mut self.frames))),
            other => Err(WireError::InvalidFlag(other)),
        }
    }

    /// Discard any partially assembled message.
    pub fn reset(&mut self) {
        self.frames.clear();
    }

    /// Number of frames buffered for the in-progress message.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.frames.len()
    }
}
