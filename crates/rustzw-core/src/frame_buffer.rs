use crate::frame::{Frame, OwnedFrame, ACK, CAN, NAK, SOF};
use crate::DecodeError;
use alloc::vec::Vec;

/// One unit read off the serial stream.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Inbound {
    Ack,
    Nak,
    Can,
    Frame(OwnedFrame),
}

/// Accumulates inbound bytes and splits them into control tokens and frames.
///
/// Corrupt input never stalls the stream: the offending bytes are dropped up
/// to the next start-of-frame marker and the cause is reported once.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    dropped: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total bytes discarded while resynchronizing.
    pub fn dropped_bytes(&self) -> usize {
        self.dropped
    }

    /// Extracts the next complete unit.
    ///
    /// Returns `None` when the buffer is empty or holds only the start of a
    /// frame. An `Err` means bytes were dropped; call again to continue.
    pub fn next_inbound(&mut self) -> Option<Result<Inbound, DecodeError>> {
        let first = *self.buf.first()?;
        let token = match first {
            ACK => Inbound::Ack,
            NAK => Inbound::Nak,
            CAN => Inbound::Can,
            SOF => {
                return match Frame::decode(&self.buf) {
                    Ok((frame, used)) => {
                        let owned = frame.to_owned();
                        self.buf.drain(..used);
                        Some(Ok(Inbound::Frame(owned)))
                    }
                    Err(DecodeError::Incomplete) => None,
                    Err(err) => {
                        self.resync();
                        Some(Err(err))
                    }
                };
            }
            other => {
                self.resync();
                return Some(Err(DecodeError::InvalidStartMarker(other)));
            }
        };
        self.buf.remove(0);
        Some(Ok(token))
    }

    /// Gives up on a partially received frame, e.g. after a receive timeout
    /// when a corrupted length byte announced more data than will ever come.
    /// Returns the number of bytes dropped.
    pub fn discard_partial(&mut self) -> usize {
        if self.buf.is_empty() {
            return 0;
        }
        let before = self.dropped;
        self.resync();
        self.dropped - before
    }

    fn resync(&mut self) {
        let skip = self.buf[1..]
            .iter()
            .position(|&b| b == SOF)
            .map_or(self.buf.len(), |p| p + 1);
        self.dropped += skip;
        self.buf.drain(..skip);
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameBuffer, Inbound};
    use crate::frame::{Frame, MessageClass, ACK, CAN, NAK, SOF};
    use crate::DecodeError;

    fn send_data_response() -> Vec<u8> {
        Frame::response(MessageClass::SendData, &[0x01])
            .to_vec()
            .unwrap()
    }

    #[test]
    fn reassembles_frame_split_across_reads() {
        let bytes = send_data_response();
        let mut fb = FrameBuffer::new();
        for b in &bytes[..bytes.len() - 1] {
            fb.push(&[*b]);
            assert!(fb.next_inbound().is_none());
        }
        fb.push(&bytes[bytes.len() - 1..]);
        match fb.next_inbound() {
            Some(Ok(Inbound::Frame(frame))) => {
                assert_eq!(frame.message_class, MessageClass::SendData);
                assert_eq!(frame.payload, vec![0x01]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(fb.is_empty());
    }

    #[test]
    fn control_tokens_interleave_with_frames() {
        let mut fb = FrameBuffer::new();
        fb.push(&[ACK]);
        fb.push(&send_data_response());
        fb.push(&[NAK, CAN]);

        assert_eq!(fb.next_inbound(), Some(Ok(Inbound::Ack)));
        assert!(matches!(fb.next_inbound(), Some(Ok(Inbound::Frame(_)))));
        assert_eq!(fb.next_inbound(), Some(Ok(Inbound::Nak)));
        assert_eq!(fb.next_inbound(), Some(Ok(Inbound::Can)));
        assert_eq!(fb.next_inbound(), None);
    }

    #[test]
    fn garbage_is_dropped_up_to_next_start_marker() {
        let mut fb = FrameBuffer::new();
        fb.push(&[0x42, 0x43]);
        fb.push(&send_data_response());

        assert_eq!(
            fb.next_inbound(),
            Some(Err(DecodeError::InvalidStartMarker(0x42)))
        );
        assert!(matches!(fb.next_inbound(), Some(Ok(Inbound::Frame(_)))));
        assert_eq!(fb.dropped_bytes(), 2);
    }

    #[test]
    fn malformed_frame_resynchronizes_on_following_frame() {
        // No byte inside this frame reads as a start marker.
        let mut bad = Frame::request(
            MessageClass::ApplicationCommandHandler,
            &[0x00, 0x05, 0x03, 0x25, 0x03, 0xFF],
        )
        .to_vec()
        .unwrap();
        let last = bad.len() - 1;
        bad[last] ^= 0x5A;
        let good = send_data_response();

        let mut fb = FrameBuffer::new();
        fb.push(&bad);
        fb.push(&good);

        assert!(matches!(
            fb.next_inbound(),
            Some(Err(DecodeError::ChecksumMismatch { .. }))
        ));
        assert!(matches!(fb.next_inbound(), Some(Ok(Inbound::Frame(_)))));
        assert_eq!(fb.dropped_bytes(), bad.len());
        assert!(fb.is_empty());
    }

    #[test]
    fn discard_partial_unblocks_a_stalled_header() {
        let mut fb = FrameBuffer::new();
        fb.push(&[SOF, 0xF0, 0x00, 0x13]);
        assert!(fb.next_inbound().is_none());
        assert_eq!(fb.discard_partial(), 4);
        assert!(fb.is_empty());
        assert_eq!(fb.discard_partial(), 0);
    }
}
