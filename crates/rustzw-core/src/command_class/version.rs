use super::{encode_command, CommandClass};
use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

pub const VERSION_GET: u8 = 0x11;
pub const VERSION_REPORT: u8 = 0x12;
pub const VERSION_COMMAND_CLASS_GET: u8 = 0x13;
pub const VERSION_COMMAND_CLASS_REPORT: u8 = 0x14;

/// Library and firmware versions of a node. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VersionReport {
    pub library_type: u8,
    pub protocol_version: u8,
    pub protocol_sub_version: u8,
    pub application_version: u8,
    pub application_sub_version: u8,
}

/// The version a node implements for one of its command classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandClassVersionReport {
    pub command_class: u8,
    pub version: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCommand {
    Get,
    Report(VersionReport),
    CommandClassGet { command_class: u8 },
    CommandClassReport(CommandClassVersionReport),
    Unsupported(u8),
}

impl VersionCommand {
    /// Decodes `[command][params...]`, i.e. the bytes after the class identifier.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(payload);
        let command = r.read_u8()?;
        Ok(match command {
            VERSION_GET => Self::Get,
            VERSION_REPORT => Self::Report(VersionReport {
                library_type: r.read_u8()?,
                protocol_version: r.read_u8()?,
                protocol_sub_version: r.read_u8()?,
                application_version: r.read_u8()?,
                application_sub_version: r.read_u8()?,
            }),
            VERSION_COMMAND_CLASS_GET => Self::CommandClassGet {
                command_class: r.read_u8()?,
            },
            VERSION_COMMAND_CLASS_REPORT => Self::CommandClassReport(CommandClassVersionReport {
                command_class: r.read_u8()?,
                version: r.read_u8()?,
            }),
            other => Self::Unsupported(other),
        })
    }
}

pub fn encode_get(w: &mut Writer<'_>) -> Result<(), EncodeError> {
    encode_command(w, CommandClass::Version, VERSION_GET, &[])
}

pub fn encode_command_class_get(
    w: &mut Writer<'_>,
    command_class: CommandClass,
) -> Result<(), EncodeError> {
    encode_command(
        w,
        CommandClass::Version,
        VERSION_COMMAND_CLASS_GET,
        &[command_class.to_u8()],
    )
}
