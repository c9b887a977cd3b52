use super::{encode_command, CommandClass};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const SENSOR_BINARY_GET: u8 = 0x02;
pub const SENSOR_BINARY_REPORT: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorBinaryReport {
    pub triggered: bool,
    /// Sent by version 2 nodes.
    pub sensor_type: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorBinaryCommand {
    Get,
    Report(SensorBinaryReport),
    Unsupported(u8),
}

impl SensorBinaryCommand {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        Ok(match r.read_u8()? {
            SENSOR_BINARY_GET => Self::Get,
            SENSOR_BINARY_REPORT => Self::Report(SensorBinaryReport {
                triggered: r.read_u8()? != 0,
                sensor_type: r.read_optional_u8(),
            }),
            other => Self::Unsupported(other),
        })
    }
}

/// `sensor_type` selects one sensor on version 2 nodes.
pub fn encode_get(w: &mut Writer<'_>, sensor_type: Option<u8>) -> Result<(), EncodeError> {
    match sensor_type {
        Some(t) => encode_command(w, CommandClass::SensorBinary, SENSOR_BINARY_GET, &[t]),
        None => encode_command(w, CommandClass::SensorBinary, SENSOR_BINARY_GET, &[]),
    }
}

#[cfg(test)]
mod tests {
    use super::{SensorBinaryCommand, SensorBinaryReport};

    #[test]
    fn report_with_and_without_type() {
        assert_eq!(
            SensorBinaryCommand::decode(&[0x03, 0xFF]).unwrap(),
            SensorBinaryCommand::Report(SensorBinaryReport {
                triggered: true,
                sensor_type: None,
            })
        );
        assert_eq!(
            SensorBinaryCommand::decode(&[0x03, 0x00, 0x0C]).unwrap(),
            SensorBinaryCommand::Report(SensorBinaryReport {
                triggered: false,
                sensor_type: Some(0x0C),
            })
        );
    }
}
