use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};
use alloc::vec::Vec;

/// Start-of-frame marker.
pub const SOF: u8 = 0x01;
/// Positive acknowledgement of a received frame.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement: the frame was received with a bad checksum.
pub const NAK: u8 = 0x15;
/// The receiver dropped the frame because both sides transmitted at once.
pub const CAN: u8 = 0x18;

/// XOR of every byte from the length byte through the checksum.
pub const CHECKSUM_SENTINEL: u8 = 0xFF;
/// Bytes around the payload: SOF, length, message type, message class, checksum.
pub const FRAME_OVERHEAD: usize = 5;
/// Largest payload whose length still fits the one-octet length field.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize - 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageType {
    Request = 0x00,
    Response = 0x01,
}

impl MessageType {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Request),
            0x01 => Some(Self::Response),
            _ => None,
        }
    }

    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Serial-API function identifier carried by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageClass {
    SerialApiGetInitData,
    ApplicationCommandHandler,
    GetControllerCapabilities,
    SerialApiGetCapabilities,
    SendData,
    GetVersion,
    MemoryGetId,
    IdentifyNode,
    ApplicationUpdate,
    RequestNodeInfo,
    Unknown(u8),
}

impl MessageClass {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x02 => Self::SerialApiGetInitData,
            0x04 => Self::ApplicationCommandHandler,
            0x05 => Self::GetControllerCapabilities,
            0x07 => Self::SerialApiGetCapabilities,
            0x13 => Self::SendData,
            0x15 => Self::GetVersion,
            0x20 => Self::MemoryGetId,
            0x41 => Self::IdentifyNode,
            0x49 => Self::ApplicationUpdate,
            0x60 => Self::RequestNodeInfo,
            v => Self::Unknown(v),
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::SerialApiGetInitData => 0x02,
            Self::ApplicationCommandHandler => 0x04,
            Self::GetControllerCapabilities => 0x05,
            Self::SerialApiGetCapabilities => 0x07,
            Self::SendData => 0x13,
            Self::GetVersion => 0x15,
            Self::MemoryGetId => 0x20,
            Self::IdentifyNode => 0x41,
            Self::ApplicationUpdate => 0x49,
            Self::RequestNodeInfo => 0x60,
            Self::Unknown(v) => v,
        }
    }
}

/// Computes the transmitted checksum for `region`, which spans the length
/// byte through the last payload byte.
pub fn checksum(region: &[u8]) -> u8 {
    !region.iter().fold(0u8, |acc, b| acc ^ b)
}

/// A borrowed serial frame.
///
/// Wire layout: `[SOF][length][message_type][message_class][payload...][checksum]`,
/// where `length` counts `message_type` through the end of `payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub message_type: MessageType,
    pub message_class: MessageClass,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub const fn request(message_class: MessageClass, payload: &'a [u8]) -> Self {
        Self {
            message_type: MessageType::Request,
            message_class,
            payload,
        }
    }

    pub const fn response(message_class: MessageClass, payload: &'a [u8]) -> Self {
        Self {
            message_type: MessageType::Response,
            message_class,
            payload,
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if self.payload.len() > MAX_PAYLOAD_LEN {
            return Err(EncodeError::PayloadTooLarge {
                len: self.payload.len(),
            });
        }
        w.write_u8(SOF)?;
        let region_start = w.position();
        w.write_u8((self.payload.len() + 2) as u8)?;
        w.write_u8(self.message_type.to_u8())?;
        w.write_u8(self.message_class.to_u8())?;
        w.write_all(self.payload)?;
        let cs = checksum(w.written_since(region_start));
        w.write_u8(cs)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut out = alloc::vec![0u8; self.encoded_len()];
        let written = {
            let mut w = Writer::new(&mut out);
            self.encode(&mut w)?;
            w.position()
        };
        out.truncate(written);
        Ok(out)
    }

    /// Decodes one frame from the front of `buf`, returning it together with
    /// the number of bytes it occupies.
    ///
    /// Reports [`DecodeError::Incomplete`] while the announced length is not
    /// yet buffered; nothing is consumed in that case.
    pub fn decode(buf: &'a [u8]) -> Result<(Self, usize), DecodeError> {
        let mut r = Reader::new(buf);
        let sof = r.read_u8().map_err(|_| DecodeError::Incomplete)?;
        if sof != SOF {
            return Err(DecodeError::InvalidStartMarker(sof));
        }
        let length = usize::from(r.read_u8().map_err(|_| DecodeError::Incomplete)?);
        if length < 2 {
            return Err(DecodeError::InvalidLength);
        }
        // Body plus the trailing checksum.
        let rest = r
            .read_exact(length + 1)
            .map_err(|_| DecodeError::Incomplete)?;

        let actual = rest[length];
        let expected = checksum(&buf[1..2 + length]);
        if expected != actual {
            return Err(DecodeError::ChecksumMismatch { expected, actual });
        }

        let message_type = MessageType::from_u8(rest[0]).ok_or(DecodeError::InvalidValue)?;
        let frame = Self {
            message_type,
            message_class: MessageClass::from_u8(rest[1]),
            payload: &rest[2..length],
        };
        Ok((frame, r.position()))
    }

    pub fn to_owned(&self) -> OwnedFrame {
        OwnedFrame {
            message_type: self.message_type,
            message_class: self.message_class,
            payload: self.payload.to_vec(),
        }
    }
}

/// A frame that owns its payload, as produced by [`FrameBuffer`](crate::FrameBuffer).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnedFrame {
    pub message_type: MessageType,
    pub message_class: MessageClass,
    pub payload: Vec<u8>,
}

impl OwnedFrame {
    pub fn as_frame(&self) -> Frame<'_> {
        Frame {
            message_type: self.message_type,
            message_class: self.message_class,
            payload: &self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        checksum, Frame, MessageClass, MessageType, CHECKSUM_SENTINEL, MAX_PAYLOAD_LEN, SOF,
    };
    use crate::encoding::writer::Writer;
    use crate::{DecodeError, EncodeError};
    use proptest::prelude::*;

    fn message_type() -> impl Strategy<Value = MessageType> {
        prop_oneof![Just(MessageType::Request), Just(MessageType::Response)]
    }

    proptest! {
        #[test]
        fn frame_roundtrip(
            ty in message_type(),
            class in any::<u8>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD_LEN),
        ) {
            let frame = Frame {
                message_type: ty,
                message_class: MessageClass::from_u8(class),
                payload: &payload,
            };
            let bytes = frame.to_vec().unwrap();
            let (decoded, used) = Frame::decode(&bytes).unwrap();
            prop_assert_eq!(used, bytes.len());
            prop_assert_eq!(decoded, frame);
            prop_assert_eq!(decoded.message_class.to_u8(), class);
        }

        #[test]
        fn whole_frame_xors_to_sentinel(
            payload in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let bytes = Frame::request(MessageClass::SendData, &payload).to_vec().unwrap();
            let folded = bytes[1..].iter().fold(0u8, |acc, b| acc ^ b);
            prop_assert_eq!(folded, CHECKSUM_SENTINEL);
        }

        // Every byte from the message type on is covered by the checksum, so a
        // single flipped byte there can never be accepted. The length byte is
        // covered too, but a larger value reads as `Incomplete` until enough
        // bytes arrive; see `shortened_length_is_malformed`.
        #[test]
        fn single_byte_corruption_is_malformed(
            payload in proptest::collection::vec(any::<u8>(), 0..64),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut bytes = Frame::request(MessageClass::ApplicationCommandHandler, &payload)
                .to_vec()
                .unwrap();
            let at = 2 + index.index(bytes.len() - 2);
            bytes[at] ^= flip;
            let err = Frame::decode(&bytes).unwrap_err();
            prop_assert!(err.is_malformed(), "unexpected {:?}", err);
        }
    }

    #[test]
    fn shortened_length_is_malformed() {
        let bytes = Frame::request(
            MessageClass::ApplicationCommandHandler,
            &[0x00, 0x05, 0x03, 0x25, 0x03, 0xFF],
        )
        .to_vec()
        .unwrap();
        for length in 0..bytes[1] {
            let mut corrupt = bytes.clone();
            corrupt[1] = length;
            let err = Frame::decode(&corrupt).unwrap_err();
            assert!(err.is_malformed(), "length {length}: {err:?}");
        }
    }

    #[test]
    fn corrupted_start_marker_is_rejected() {
        let mut bytes = Frame::request(MessageClass::GetVersion, &[]).to_vec().unwrap();
        bytes[0] = 0x7E;
        assert_eq!(
            Frame::decode(&bytes).unwrap_err(),
            DecodeError::InvalidStartMarker(0x7E)
        );
    }

    #[test]
    fn short_input_is_incomplete() {
        let bytes = Frame::request(MessageClass::SendData, &[1, 2, 3])
            .to_vec()
            .unwrap();
        for cut in 0..bytes.len() {
            assert_eq!(
                Frame::decode(&bytes[..cut]).unwrap_err(),
                DecodeError::Incomplete,
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn length_below_header_is_invalid() {
        let bytes = [SOF, 0x01, 0x00, 0xFE];
        assert_eq!(
            Frame::decode(&bytes).unwrap_err(),
            DecodeError::InvalidLength
        );
    }

    #[test]
    fn unknown_message_type_is_rejected_after_checksum() {
        let region = [0x02, 0x07, 0x15];
        let bytes = [SOF, region[0], region[1], region[2], checksum(&region)];
        assert_eq!(Frame::decode(&bytes).unwrap_err(), DecodeError::InvalidValue);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = [0u8; MAX_PAYLOAD_LEN + 1];
        let mut buf = [0u8; 512];
        let mut w = Writer::new(&mut buf);
        assert_eq!(
            Frame::request(MessageClass::SendData, &payload)
                .encode(&mut w)
                .unwrap_err(),
            EncodeError::PayloadTooLarge {
                len: MAX_PAYLOAD_LEN + 1
            }
        );
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let mut bytes = Frame::response(MessageClass::SendData, &[0x01])
            .to_vec()
            .unwrap();
        let frame_len = bytes.len();
        bytes.extend_from_slice(&[SOF, 0x03]);
        let (frame, used) = Frame::decode(&bytes).unwrap();
        assert_eq!(used, frame_len);
        assert_eq!(frame.payload, &[0x01]);
    }
}
