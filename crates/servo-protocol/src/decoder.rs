//! Fixed-Width Frame Decoder
//!
//! Pulls five-byte frames out of a `ByteRing`. There is no start-of-frame
//! marker on the wire, so the decoder trusts that the stream has been
//! aligned to frame boundaries since the first byte. A single lost or
//! duplicated byte misaligns every later frame; `realign` is the only
//! recovery and it must be invoked explicitly.

use crate::error::ProtocolError;
use crate::frame::{CommandFrame, FRAME_WIDTH};
use byte_ring::{ByteRing, ByteSource, IngestReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How the trailing frame byte is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumMode {
    /// Trailing byte is carried but never checked
    #[default]
    Ignore,
    /// Trailing byte must equal the XOR of the first four bytes
    Xor,
}

/// Decoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Frames handed out
    pub frames_decoded: usize,
    /// Frames consumed and discarded for a bad checksum
    pub checksum_failures: usize,
}

/// Turns the buffered byte stream into `CommandFrame`s
#[derive(Debug)]
pub struct FrameDecoder {
    ring: ByteRing,
    scratch: [u8; FRAME_WIDTH],
    checksum_mode: ChecksumMode,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder over `ring`
    ///
    /// The ring must be able to hold more than one frame, otherwise the
    /// decoder could never make progress.
    pub fn new(ring: ByteRing) -> Result<Self, ProtocolError> {
        if ring.capacity() <= FRAME_WIDTH {
            return Err(ProtocolError::CapacityTooSmall {
                capacity: ring.capacity(),
                frame_width: FRAME_WIDTH,
            });
        }
        Ok(Self {
            ring,
            scratch: [0; FRAME_WIDTH],
            checksum_mode: ChecksumMode::Ignore,
            stats: DecoderStats::default(),
        })
    }

    /// Set checksum handling
    pub fn with_checksum_mode(mut self, mode: ChecksumMode) -> Self {
        self.checksum_mode = mode;
        self
    }

    /// Drain a byte source into the underlying ring
    pub fn ingest<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> IngestReport {
        self.ring.ingest(source)
    }

    /// Decode one frame if a whole one is buffered
    ///
    /// Frames failing checksum validation are consumed and reported.
    pub fn try_next_frame(&mut self) -> Result<Option<CommandFrame>, ProtocolError> {
        if self.ring.available() < FRAME_WIDTH {
            return Ok(None);
        }

        self.ring.pop_into(&mut self.scratch)?;
        let frame = CommandFrame::from_bytes(&self.scratch);

        if self.checksum_mode == ChecksumMode::Xor && !frame.checksum_valid() {
            self.stats.checksum_failures += 1;
            return Err(ProtocolError::ChecksumMismatch {
                expected: frame.expected_checksum(),
                actual: frame.checksum,
            });
        }

        self.stats.frames_decoded += 1;
        debug!("Decoded frame {:02X?}", self.scratch);
        Ok(Some(frame))
    }

    /// Decode the next good frame, or `None` once fewer than five bytes remain
    ///
    /// Decode errors are logged and skipped.
    pub fn next_frame(&mut self) -> Option<CommandFrame> {
        loop {
            match self.try_next_frame() {
                Ok(frame) => return frame,
                Err(e) => warn!("Discarding frame: {}", e),
            }
        }
    }

    /// Iterate over every frame currently buffered
    pub fn drain(&mut self) -> impl Iterator<Item = CommandFrame> + '_ {
        std::iter::from_fn(move || self.next_frame())
    }

    /// Discard all buffered bytes so the next byte received starts a frame
    pub fn realign(&mut self) {
        let dropped = self.ring.available();
        self.ring.clear();
        warn!("Realigned frame decoder, dropped {} buffered bytes", dropped);
    }

    /// Get the checksum mode
    pub fn checksum_mode(&self) -> ChecksumMode {
        self.checksum_mode
    }

    /// Get decoder counters
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Borrow the underlying ring
    pub fn ring(&self) -> &ByteRing {
        &self.ring
    }

    /// Mutably borrow the underlying ring
    pub fn ring_mut(&mut self) -> &mut ByteRing {
        &mut self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byte_ring::OverflowPolicy;
    use proptest::prelude::*;

    fn decoder() -> FrameDecoder {
        FrameDecoder::new(ByteRing::with_default_capacity()).unwrap()
    }

    fn feed(decoder: &mut FrameDecoder, bytes: &[u8]) {
        for &b in bytes {
            decoder.ring_mut().push(b).unwrap();
        }
    }

    #[test]
    fn test_rejects_small_ring() {
        let err = FrameDecoder::new(ByteRing::new(FRAME_WIDTH)).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::CapacityTooSmall {
                capacity: 5,
                frame_width: 5
            }
        );
        assert!(FrameDecoder::new(ByteRing::new(FRAME_WIDTH + 1)).is_ok());
    }

    #[test]
    fn test_no_frame_below_width() {
        let mut dec = decoder();
        feed(&mut dec, &[0x01, 45, 135, 0]);
        assert_eq!(dec.next_frame(), None);
        assert_eq!(dec.ring().available(), 4);
    }

    #[test]
    fn test_decodes_servo_frame() {
        let mut dec = decoder();
        feed(&mut dec, &[0x01, 45, 135, 0, 0]);

        let frame = dec.next_frame().unwrap();
        assert_eq!(frame.command, 0x01);
        assert_eq!(frame.payload, [45, 135, 0]);
        assert!(dec.ring().is_empty());
        assert_eq!(dec.stats().frames_decoded, 1);
    }

    #[test]
    fn test_partial_second_frame() {
        let mut dec = decoder();
        feed(&mut dec, &[0x01, 10, 20, 0, 0, 0x01, 30]);

        assert!(dec.next_frame().is_some());
        assert_eq!(dec.next_frame(), None);
        assert_eq!(dec.ring().available(), 2);

        feed(&mut dec, &[40, 0, 0]);
        let frame = dec.next_frame().unwrap();
        assert_eq!(frame.payload, [30, 40, 0]);
    }

    #[test]
    fn test_misalignment_persists() {
        let mut dec = decoder();
        // Link came up mid-frame: two stray bytes precede real frames.
        feed(&mut dec, &[45, 135]);
        feed(&mut dec, &[0x01, 45, 135, 0, 0, 0x01, 90, 90, 0, 0]);

        let frames: Vec<_> = dec.drain().collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].command, 45);
        assert_eq!(frames[1].command, 0);
        assert_eq!(dec.ring().available(), 2);
    }

    #[test]
    fn test_realign_drops_partial_bytes() {
        let mut dec = decoder();
        feed(&mut dec, &[0xEE, 0xEE]);
        dec.realign();
        feed(&mut dec, &[0x01, 1, 2, 0, 0]);
        assert_eq!(dec.next_frame().map(|f| f.payload), Some([1, 2, 0]));
    }

    #[test]
    fn test_xor_mode_skips_corrupt_frame() {
        let mut dec = decoder().with_checksum_mode(ChecksumMode::Xor);
        feed(&mut dec, &[0x01, 45, 135, 0, 0]);
        feed(&mut dec, &CommandFrame::set_servo_positions(60, 120).to_bytes());

        let frame = dec.next_frame().unwrap();
        assert_eq!(frame.payload, [60, 120, 0]);
        assert_eq!(
            dec.stats(),
            DecoderStats {
                frames_decoded: 1,
                checksum_failures: 1
            }
        );
    }

    #[test]
    fn test_xor_mode_surfaces_mismatch() {
        let mut dec = decoder().with_checksum_mode(ChecksumMode::Xor);
        feed(&mut dec, &[0x01, 1, 2, 3, 0]);
        assert_eq!(
            dec.try_next_frame(),
            Err(ProtocolError::ChecksumMismatch {
                expected: 0x01 ^ 1 ^ 2 ^ 3,
                actual: 0
            })
        );
        assert!(dec.ring().is_empty());
    }

    #[test]
    fn test_ignore_mode_accepts_any_trailing_byte() {
        let mut dec = decoder();
        feed(&mut dec, &[0x01, 1, 2, 3, 0x99]);
        assert_eq!(dec.checksum_mode(), ChecksumMode::Ignore);
        assert_eq!(dec.try_next_frame().unwrap().map(|f| f.checksum), Some(0x99));
    }

    #[test]
    fn test_ingest_from_source() {
        let mut dec = FrameDecoder::new(ByteRing::with_policy(8, OverflowPolicy::DropNewest))
            .unwrap();
        let mut source: std::collections::VecDeque<u8> = (0..10).collect();

        let report = dec.ingest(&mut source);
        assert_eq!(report.received, 10);
        assert_eq!(report.overflowed, 2);
        assert_eq!(dec.next_frame().map(|f| f.command), Some(0));
    }

    proptest! {
        #[test]
        fn prop_consumes_whole_frames_only(
            bytes in proptest::collection::vec(any::<u8>(), 0..31),
        ) {
            let mut dec = decoder();
            feed(&mut dec, &bytes);

            let frames: Vec<_> = dec.drain().collect();
            prop_assert_eq!(frames.len(), bytes.len() / FRAME_WIDTH);
            prop_assert_eq!(dec.ring().available(), bytes.len() % FRAME_WIDTH);

            let flat: Vec<u8> = frames.iter().flat_map(|f| f.to_bytes()).collect();
            prop_assert_eq!(&flat[..], &bytes[..flat.len()]);
        }
    }
}
