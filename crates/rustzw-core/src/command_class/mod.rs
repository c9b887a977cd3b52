use crate::encoding::writer::Writer;
use crate::EncodeError;

pub mod basic;
pub mod battery;
pub mod registry;
pub mod sensor_binary;
pub mod switch_binary;
pub mod switch_multilevel;
pub mod version;

pub use registry::{CommandClassDescriptor, HandlerKind, Registry};

/// Z-Wave command class identifiers.
///
/// Known classes are named variants; anything else uses
/// [`Other`](Self::Other). Whether a class is *supported* is decided by the
/// [`Registry`], not by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandClass {
    NoOperation,
    Basic,
    SwitchBinary,
    SwitchMultilevel,
    SwitchAll,
    SceneActivation,
    SensorBinary,
    SensorMultilevel,
    Meter,
    ThermostatMode,
    ThermostatSetpoint,
    MultiInstance,
    Configuration,
    Alarm,
    ManufacturerSpecific,
    PowerLevel,
    NodeNaming,
    Battery,
    Clock,
    WakeUp,
    Association,
    Version,
    MultiCmd,
    Other(u8),
}

impl CommandClass {
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::NoOperation => 0x00,
            Self::Basic => 0x20,
            Self::SwitchBinary => 0x25,
            Self::SwitchMultilevel => 0x26,
            Self::SwitchAll => 0x27,
            Self::SceneActivation => 0x2B,
            Self::SensorBinary => 0x30,
            Self::SensorMultilevel => 0x31,
            Self::Meter => 0x32,
            Self::ThermostatMode => 0x40,
            Self::ThermostatSetpoint => 0x43,
            Self::MultiInstance => 0x60,
            Self::Configuration => 0x70,
            Self::Alarm => 0x71,
            Self::ManufacturerSpecific => 0x72,
            Self::PowerLevel => 0x73,
            Self::NodeNaming => 0x77,
            Self::Battery => 0x80,
            Self::Clock => 0x81,
            Self::WakeUp => 0x84,
            Self::Association => 0x85,
            Self::Version => 0x86,
            Self::MultiCmd => 0x8F,
            Self::Other(v) => v,
        }
    }

    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::NoOperation,
            0x20 => Self::Basic,
            0x25 => Self::SwitchBinary,
            0x26 => Self::SwitchMultilevel,
            0x27 => Self::SwitchAll,
            0x2B => Self::SceneActivation,
            0x30 => Self::SensorBinary,
            0x31 => Self::SensorMultilevel,
            0x32 => Self::Meter,
            0x40 => Self::ThermostatMode,
            0x43 => Self::ThermostatSetpoint,
            0x60 => Self::MultiInstance,
            0x70 => Self::Configuration,
            0x71 => Self::Alarm,
            0x72 => Self::ManufacturerSpecific,
            0x73 => Self::PowerLevel,
            0x77 => Self::NodeNaming,
            0x80 => Self::Battery,
            0x81 => Self::Clock,
            0x84 => Self::WakeUp,
            0x85 => Self::Association,
            0x86 => Self::Version,
            0x8F => Self::MultiCmd,
            v => Self::Other(v),
        }
    }
}

/// Writes an application command: `[command_class][command][params...]`.
pub fn encode_command(
    w: &mut Writer<'_>,
    class: CommandClass,
    command: u8,
    params: &[u8],
) -> Result<(), EncodeError> {
    w.write_u8(class.to_u8())?;
    w.write_u8(command)?;
    w.write_all(params)
}
