use crate::queue::Priority;
use rustzw_core::command_class::{
    basic, battery, sensor_binary, switch_binary, switch_multilevel, version,
};
use rustzw_core::{CommandClass, HandlerKind};

/// An outbound operation a binding can ask a node's handler to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Request {
    VersionGet,
    CommandClassVersionGet(CommandClass),
    BasicGet,
    BasicSet(u8),
    SwitchBinaryGet,
    SwitchBinarySet(bool),
    SwitchMultilevelGet,
    SwitchMultilevelSet {
        level: u8,
        duration: Option<u8>,
    },
    SwitchMultilevelStartLevelChange {
        up: bool,
        start_level: Option<u8>,
        duration: Option<u8>,
    },
    SwitchMultilevelStopLevelChange,
    SensorBinaryGet {
        sensor_type: Option<u8>,
    },
    BatteryGet,
}

/// Identifies the node report that answers a Get request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportKey {
    pub command_class: u8,
    pub command: u8,
    /// First parameter byte, when the report echoes the request's argument.
    pub argument: Option<u8>,
}

impl ReportKey {
    /// `command` is a full application command, class identifier first.
    pub fn matches(&self, command: &[u8]) -> bool {
        command.first() == Some(&self.command_class)
            && command.get(1) == Some(&self.command)
            && self.argument.map_or(true, |arg| command.get(2) == Some(&arg))
    }
}

/// When an in-flight request counts as answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// The controller reported a successful transmission.
    Transmitted,
    /// The node sent the matching report.
    Report(ReportKey),
}

impl Request {
    pub fn command_class(&self) -> CommandClass {
        match self {
            Self::VersionGet | Self::CommandClassVersionGet(_) => CommandClass::Version,
            Self::BasicGet | Self::BasicSet(_) => CommandClass::Basic,
            Self::SwitchBinaryGet | Self::SwitchBinarySet(_) => CommandClass::SwitchBinary,
            Self::SwitchMultilevelGet
            | Self::SwitchMultilevelSet { .. }
            | Self::SwitchMultilevelStartLevelChange { .. }
            | Self::SwitchMultilevelStopLevelChange => CommandClass::SwitchMultilevel,
            Self::SensorBinaryGet { .. } => CommandClass::SensorBinary,
            Self::BatteryGet => CommandClass::Battery,
        }
    }

    /// Handler variant able to encode this request.
    pub fn handler_kind(&self) -> HandlerKind {
        match self {
            Self::VersionGet | Self::CommandClassVersionGet(_) => HandlerKind::Version,
            Self::BasicGet | Self::BasicSet(_) => HandlerKind::Basic,
            Self::SwitchBinaryGet | Self::SwitchBinarySet(_) => HandlerKind::SwitchBinary,
            Self::SwitchMultilevelGet
            | Self::SwitchMultilevelSet { .. }
            | Self::SwitchMultilevelStartLevelChange { .. }
            | Self::SwitchMultilevelStopLevelChange => HandlerKind::SwitchMultilevel,
            Self::SensorBinaryGet { .. } => HandlerKind::SensorBinary,
            Self::BatteryGet => HandlerKind::Battery,
        }
    }

    /// Get traffic, negotiation included, sorts ahead of Set traffic.
    pub fn priority(&self) -> Priority {
        match self.correlation() {
            Correlation::Report(_) => Priority::Get,
            Correlation::Transmitted => Priority::Set,
        }
    }

    pub fn correlation(&self) -> Correlation {
        let key = |class: CommandClass, command: u8, argument: Option<u8>| {
            Correlation::Report(ReportKey {
                command_class: class.to_u8(),
                command,
                argument,
            })
        };
        match *self {
            Self::VersionGet => key(CommandClass::Version, version::VERSION_REPORT, None),
            Self::CommandClassVersionGet(class) => key(
                CommandClass::Version,
                version::VERSION_COMMAND_CLASS_REPORT,
                Some(class.to_u8()),
            ),
            Self::BasicGet => key(CommandClass::Basic, basic::BASIC_REPORT, None),
            Self::SwitchBinaryGet => key(
                CommandClass::SwitchBinary,
                switch_binary::SWITCH_BINARY_REPORT,
                None,
            ),
            Self::SwitchMultilevelGet => key(
                CommandClass::SwitchMultilevel,
                switch_multilevel::SWITCH_MULTILEVEL_REPORT,
                None,
            ),
            Self::SensorBinaryGet { .. } => key(
                CommandClass::SensorBinary,
                sensor_binary::SENSOR_BINARY_REPORT,
                None,
            ),
            Self::BatteryGet => key(CommandClass::Battery, battery::BATTERY_REPORT, None),
            Self::BasicSet(_)
            | Self::SwitchBinarySet(_)
            | Self::SwitchMultilevelSet { .. }
            | Self::SwitchMultilevelStartLevelChange { .. }
            | Self::SwitchMultilevelStopLevelChange => Correlation::Transmitted,
        }
    }
}
