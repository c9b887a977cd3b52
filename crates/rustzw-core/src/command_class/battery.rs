use super::{encode_command, CommandClass};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const BATTERY_GET: u8 = 0x02;
pub const BATTERY_REPORT: u8 = 0x03;

pub const BATTERY_LOW_WARNING: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BatteryReport {
    /// Percentage, or [`BATTERY_LOW_WARNING`].
    pub level: u8,
}

impl BatteryReport {
    pub const fn is_low(&self) -> bool {
        self.level == BATTERY_LOW_WARNING
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryCommand {
    Get,
    Report(BatteryReport),
    Unsupported(u8),
}

impl BatteryCommand {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        Ok(match r.read_u8()? {
            BATTERY_GET => Self::Get,
            BATTERY_REPORT => Self::Report(BatteryReport {
                level: r.read_u8()?,
            }),
            other => Self::Unsupported(other),
        })
    }
}

pub fn encode_get(w: &mut Writer<'_>) -> Result<(), EncodeError> {
    encode_command(w, CommandClass::Battery, BATTERY_GET, &[])
}
