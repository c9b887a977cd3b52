use super::{encode_command, CommandClass};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const SWITCH_BINARY_SET: u8 = 0x01;
pub const SWITCH_BINARY_GET: u8 = 0x02;
pub const SWITCH_BINARY_REPORT: u8 = 0x03;

pub const SWITCH_ON: u8 = 0xFF;
pub const SWITCH_OFF: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchBinaryCommand {
    Set(bool),
    Get,
    Report(bool),
    Unsupported(u8),
}

impl SwitchBinaryCommand {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        Ok(match r.read_u8()? {
            SWITCH_BINARY_SET => Self::Set(r.read_u8()? != SWITCH_OFF),
            SWITCH_BINARY_GET => Self::Get,
            SWITCH_BINARY_REPORT => Self::Report(r.read_u8()? != SWITCH_OFF),
            other => Self::Unsupported(other),
        })
    }
}

pub fn encode_get(w: &mut Writer<'_>) -> Result<(), EncodeError> {
    encode_command(w, CommandClass::SwitchBinary, SWITCH_BINARY_GET, &[])
}

pub fn encode_set(w: &mut Writer<'_>, on: bool) -> Result<(), EncodeError> {
    let value = if on { SWITCH_ON } else { SWITCH_OFF };
    encode_command(w, CommandClass::SwitchBinary, SWITCH_BINARY_SET, &[value])
}

#[cfg(test)]
mod tests {
    use super::{encode_set, SwitchBinaryCommand};
    use crate::encoding::writer::Writer;

    #[test]
    fn any_non_zero_report_means_on() {
        assert_eq!(
            SwitchBinaryCommand::decode(&[0x03, 0x01]).unwrap(),
            SwitchBinaryCommand::Report(true)
        );
        assert_eq!(
            SwitchBinaryCommand::decode(&[0x03, 0x00]).unwrap(),
            SwitchBinaryCommand::Report(false)
        );
    }

    #[test]
    fn set_uses_full_scale_on() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        encode_set(&mut w, true).unwrap();
        assert_eq!(w.as_written(), &[0x25, 0x01, 0xFF]);
    }
}
