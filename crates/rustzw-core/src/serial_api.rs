use crate::encoding::{reader::Reader, writer::Writer};
use crate::frame::{Frame, MessageClass, MAX_PAYLOAD_LEN};
use crate::{DecodeError, EncodeError, NodeId};
use alloc::vec::Vec;

pub const TRANSMIT_OPTION_ACK: u8 = 0x01;
pub const TRANSMIT_OPTION_LOW_POWER: u8 = 0x02;
pub const TRANSMIT_OPTION_AUTO_ROUTE: u8 = 0x04;
pub const TRANSMIT_OPTION_NO_ROUTE: u8 = 0x10;
pub const TRANSMIT_OPTION_EXPLORE: u8 = 0x20;
pub const DEFAULT_TRANSMIT_OPTIONS: u8 =
    TRANSMIT_OPTION_ACK | TRANSMIT_OPTION_AUTO_ROUTE | TRANSMIT_OPTION_EXPLORE;

/// Bytes a SendData request adds around the application command.
const SEND_DATA_OVERHEAD: usize = 4;

/// Outcome reported by the controller in a SendData callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransmitStatus {
    Ok,
    NoAck,
    Fail,
    RoutingNotIdle,
    NoRoute,
    Unknown(u8),
}

impl TransmitStatus {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::Ok,
            0x01 => Self::NoAck,
            0x02 => Self::Fail,
            0x03 => Self::RoutingNotIdle,
            0x04 => Self::NoRoute,
            v => Self::Unknown(v),
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::NoAck => 0x01,
            Self::Fail => 0x02,
            Self::RoutingNotIdle => 0x03,
            Self::NoRoute => 0x04,
            Self::Unknown(v) => v,
        }
    }
}

/// Host-to-controller request that delivers an application command to a node.
///
/// Payload: `[node_id][cmd_len][command...][transmit_options][callback_id]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendDataRequest<'a> {
    pub node_id: NodeId,
    pub command: &'a [u8],
    pub transmit_options: u8,
    pub callback_id: u8,
}

impl<'a> SendDataRequest<'a> {
    pub fn encode_payload(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if self.command.len() + SEND_DATA_OVERHEAD > MAX_PAYLOAD_LEN {
            return Err(EncodeError::PayloadTooLarge {
                len: self.command.len(),
            });
        }
        w.write_u8(self.node_id)?;
        w.write_u8(self.command.len() as u8)?;
        w.write_all(self.command)?;
        w.write_u8(self.transmit_options)?;
        w.write_u8(self.callback_id)
    }

    pub fn decode_payload(payload: &'a [u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        let node_id = r.read_u8()?;
        let len = usize::from(r.read_u8()?);
        let command = r.read_exact(len)?;
        let transmit_options = r.read_u8()?;
        let callback_id = r.read_u8()?;
        Ok(Self {
            node_id,
            command,
            transmit_options,
            callback_id,
        })
    }

    /// Encodes the complete serial frame carrying this request.
    pub fn to_frame_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut payload = alloc::vec![0u8; self.command.len() + SEND_DATA_OVERHEAD];
        let mut w = Writer::new(&mut payload);
        self.encode_payload(&mut w)?;
        Frame::request(MessageClass::SendData, w.as_written()).to_vec()
    }
}

/// Controller's immediate answer to a SendData request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendDataResponse {
    pub accepted: bool,
}

impl SendDataResponse {
    pub fn decode_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        Ok(Self {
            accepted: r.read_u8()? != 0,
        })
    }
}

/// Controller-to-host request reporting how the radio transmission went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendDataCallback {
    pub callback_id: u8,
    pub status: TransmitStatus,
}

impl SendDataCallback {
    pub fn decode_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        let callback_id = r.read_u8()?;
        let status = TransmitStatus::from_u8(r.read_u8()?);
        Ok(Self {
            callback_id,
            status,
        })
    }

    pub fn encode_payload(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(self.callback_id)?;
        w.write_u8(self.status.to_u8())
    }
}

/// An application command received from a node.
///
/// Payload: `[status][node_id][cmd_len][command...]`, where `command` is
/// `[command_class][command][params...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplicationCommand<'a> {
    pub status: u8,
    pub node_id: NodeId,
    pub command: &'a [u8],
}

impl<'a> ApplicationCommand<'a> {
    pub fn decode_payload(payload: &'a [u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        let status = r.read_u8()?;
        let node_id = r.read_u8()?;
        let len = usize::from(r.read_u8()?);
        if len == 0 {
            return Err(DecodeError::InvalidLength);
        }
        let command = r.read_exact(len)?;
        Ok(Self {
            status,
            node_id,
            command,
        })
    }

    pub fn encode_payload(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        if self.command.len() > MAX_PAYLOAD_LEN - 3 {
            return Err(EncodeError::PayloadTooLarge {
                len: self.command.len(),
            });
        }
        w.write_u8(self.status)?;
        w.write_u8(self.node_id)?;
        w.write_u8(self.command.len() as u8)?;
        w.write_all(self.command)
    }

    pub fn command_class(&self) -> Option<u8> {
        self.command.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ApplicationCommand, SendDataCallback, SendDataRequest, SendDataResponse, TransmitStatus,
        DEFAULT_TRANSMIT_OPTIONS,
    };
    use crate::encoding::writer::Writer;
    use crate::frame::{Frame, MessageClass, MessageType};
    use crate::{DecodeError, EncodeError};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn send_data_frame_keeps_node_and_command(
            node_id in any::<u8>(),
            command in proptest::collection::vec(any::<u8>(), 1..64),
            callback_id in any::<u8>(),
        ) {
            let request = SendDataRequest {
                node_id,
                command: &command,
                transmit_options: DEFAULT_TRANSMIT_OPTIONS,
                callback_id,
            };
            let bytes = request.to_frame_vec().unwrap();
            let (frame, _) = Frame::decode(&bytes).unwrap();
            prop_assert_eq!(frame.message_type, MessageType::Request);
            prop_assert_eq!(frame.message_class, MessageClass::SendData);
            let decoded = SendDataRequest::decode_payload(frame.payload).unwrap();
            prop_assert_eq!(decoded, request);
        }
    }

    #[test]
    fn send_data_rejects_oversized_command() {
        let command = [0u8; 250];
        let request = SendDataRequest {
            node_id: 2,
            command: &command,
            transmit_options: DEFAULT_TRANSMIT_OPTIONS,
            callback_id: 1,
        };
        assert_eq!(
            request.to_frame_vec().unwrap_err(),
            EncodeError::PayloadTooLarge { len: 250 }
        );
    }

    #[test]
    fn application_command_decodes_command_slice() {
        let payload = [0x00, 0x07, 0x03, 0x86, 0x14, 0x25];
        let cmd = ApplicationCommand::decode_payload(&payload).unwrap();
        assert_eq!(cmd.node_id, 7);
        assert_eq!(cmd.command_class(), Some(0x86));
        assert_eq!(cmd.command, &[0x86, 0x14, 0x25]);
    }

    #[test]
    fn application_command_requires_declared_bytes() {
        assert_eq!(
            ApplicationCommand::decode_payload(&[0x00, 0x07, 0x04, 0x86]).unwrap_err(),
            DecodeError::UnexpectedEof
        );
        assert_eq!(
            ApplicationCommand::decode_payload(&[0x00, 0x07, 0x00]).unwrap_err(),
            DecodeError::InvalidLength
        );
    }

    #[test]
    fn application_command_encode_matches_decode_layout() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        ApplicationCommand {
            status: 0,
            node_id: 3,
            command: &[0x25, 0x03, 0xFF],
        }
        .encode_payload(&mut w)
        .unwrap();
        assert_eq!(w.as_written(), &[0x00, 0x03, 0x03, 0x25, 0x03, 0xFF]);
    }

    #[test]
    fn response_and_callback_bodies() {
        assert!(SendDataResponse::decode_payload(&[0x01]).unwrap().accepted);
        assert!(!SendDataResponse::decode_payload(&[0x00]).unwrap().accepted);

        let cb = SendDataCallback::decode_payload(&[0x0A, 0x01, 0x00, 0x02]).unwrap();
        assert_eq!(cb.callback_id, 0x0A);
        assert_eq!(cb.status, TransmitStatus::NoAck);
    }
}
