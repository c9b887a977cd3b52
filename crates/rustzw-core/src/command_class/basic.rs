use super::{encode_command, CommandClass};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const BASIC_SET: u8 = 0x01;
pub const BASIC_GET: u8 = 0x02;
pub const BASIC_REPORT: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicCommand {
    Set(u8),
    Get,
    Report(u8),
    Unsupported(u8),
}

impl BasicCommand {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        Ok(match r.read_u8()? {
            BASIC_SET => Self::Set(r.read_u8()?),
            BASIC_GET => Self::Get,
            BASIC_REPORT => Self::Report(r.read_u8()?),
            other => Self::Unsupported(other),
        })
    }
}

pub fn encode_get(w: &mut Writer<'_>) -> Result<(), EncodeError> {
    encode_command(w, CommandClass::Basic, BASIC_GET, &[])
}

pub fn encode_set(w: &mut Writer<'_>, value: u8) -> Result<(), EncodeError> {
    encode_command(w, CommandClass::Basic, BASIC_SET, &[value])
}

#[cfg(test)]
mod tests {
    use super::{encode_set, BasicCommand};
    use crate::encoding::writer::Writer;

    #[test]
    fn set_and_report() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        encode_set(&mut w, 0x63).unwrap();
        assert_eq!(w.as_written(), &[0x20, 0x01, 0x63]);
        assert_eq!(
            BasicCommand::decode(&[0x03, 0x63]).unwrap(),
            BasicCommand::Report(0x63)
        );
    }
}
