use super::{encode_command, CommandClass};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const SWITCH_MULTILEVEL_SET: u8 = 0x01;
pub const SWITCH_MULTILEVEL_GET: u8 = 0x02;
pub const SWITCH_MULTILEVEL_REPORT: u8 = 0x03;
pub const SWITCH_MULTILEVEL_START_LEVEL_CHANGE: u8 = 0x04;
pub const SWITCH_MULTILEVEL_STOP_LEVEL_CHANGE: u8 = 0x05;

/// Highest level a dimmer accepts; `0xFF` restores the last non-zero level.
pub const MAX_LEVEL: u8 = 0x63;

const START_LEVEL_CHANGE_DOWN: u8 = 0x40;
const START_LEVEL_CHANGE_IGNORE_START: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchMultilevelCommand {
    Set {
        level: u8,
        /// Present from version 2 on.
        duration: Option<u8>,
    },
    Get,
    Report(u8),
    StartLevelChange {
        up: bool,
        ignore_start_level: bool,
        start_level: u8,
        duration: Option<u8>,
    },
    StopLevelChange,
    Unsupported(u8),
}

impl SwitchMultilevelCommand {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        Ok(match r.read_u8()? {
            SWITCH_MULTILEVEL_SET => Self::Set {
                level: r.read_u8()?,
                duration: r.read_optional_u8(),
            },
            SWITCH_MULTILEVEL_GET => Self::Get,
            SWITCH_MULTILEVEL_REPORT => Self::Report(r.read_u8()?),
            SWITCH_MULTILEVEL_START_LEVEL_CHANGE => {
                let flags = r.read_u8()?;
                Self::StartLevelChange {
                    up: flags & START_LEVEL_CHANGE_DOWN == 0,
                    ignore_start_level: flags & START_LEVEL_CHANGE_IGNORE_START != 0,
                    start_level: r.read_u8()?,
                    duration: r.read_optional_u8(),
                }
            }
            SWITCH_MULTILEVEL_STOP_LEVEL_CHANGE => Self::StopLevelChange,
            other => Self::Unsupported(other),
        })
    }
}

pub fn encode_get(w: &mut Writer<'_>) -> Result<(), EncodeError> {
    encode_command(w, CommandClass::SwitchMultilevel, SWITCH_MULTILEVEL_GET, &[])
}

/// `duration` must only be passed once version 2 has been negotiated.
pub fn encode_set(w: &mut Writer<'_>, level: u8, duration: Option<u8>) -> Result<(), EncodeError> {
    if level > MAX_LEVEL && level != 0xFF {
        return Err(EncodeError::ValueOutOfRange);
    }
    match duration {
        Some(d) => encode_command(
            w,
            CommandClass::SwitchMultilevel,
            SWITCH_MULTILEVEL_SET,
            &[level, d],
        ),
        None => encode_command(
            w,
            CommandClass::SwitchMultilevel,
            SWITCH_MULTILEVEL_SET,
            &[level],
        ),
    }
}

pub fn encode_start_level_change(
    w: &mut Writer<'_>,
    up: bool,
    start_level: Option<u8>,
    duration: Option<u8>,
) -> Result<(), EncodeError> {
    let mut flags = if up { 0 } else { START_LEVEL_CHANGE_DOWN };
    if start_level.is_none() {
        flags |= START_LEVEL_CHANGE_IGNORE_START;
    }
    let start = start_level.unwrap_or(0);
    match duration {
        Some(d) => encode_command(
            w,
            CommandClass::SwitchMultilevel,
            SWITCH_MULTILEVEL_START_LEVEL_CHANGE,
            &[flags, start, d],
        ),
        None => encode_command(
            w,
            CommandClass::SwitchMultilevel,
            SWITCH_MULTILEVEL_START_LEVEL_CHANGE,
            &[flags, start],
        ),
    }
}

pub fn encode_stop_level_change(w: &mut Writer<'_>) -> Result<(), EncodeError> {
    encode_command(
        w,
        CommandClass::SwitchMultilevel,
        SWITCH_MULTILEVEL_STOP_LEVEL_CHANGE,
        &[],
    )
}
