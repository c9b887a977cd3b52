use super::CommandClass;
use crate::DecodeError;

/// Which handler variant the controller instantiates for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HandlerKind {
    Version,
    Basic,
    SwitchBinary,
    SwitchMultilevel,
    SensorBinary,
    Battery,
    /// Tracks the negotiated version only.
    Generic,
}

/// Immutable description of a command class this implementation supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CommandClassDescriptor {
    pub class: CommandClass,
    pub label: &'static str,
    /// Highest version this implementation can speak.
    pub max_version: u8,
    pub handler: HandlerKind,
}

impl CommandClassDescriptor {
    pub const fn new(
        class: CommandClass,
        label: &'static str,
        max_version: u8,
        handler: HandlerKind,
    ) -> Self {
        Self {
            class,
            label,
            max_version,
            handler,
        }
    }

    /// Clamps a version reported by a node to what this side supports.
    ///
    /// This is `min(reported, max_version)` with a floor of 1: a node
    /// reporting 0 still gets version 1 instead of staying unnegotiated,
    /// so the class stays usable and negotiation can finish.
    pub fn clamp_version(&self, reported: u8) -> u8 {
        reported.clamp(1, self.max_version.max(1))
    }
}

const fn entry(
    class: CommandClass,
    label: &'static str,
    max_version: u8,
    handler: HandlerKind,
) -> CommandClassDescriptor {
    CommandClassDescriptor::new(class, label, max_version, handler)
}

const STANDARD: &[CommandClassDescriptor] = &[
    entry(CommandClass::NoOperation, "NO_OPERATION", 1, HandlerKind::Generic),
    entry(CommandClass::Basic, "BASIC", 1, HandlerKind::Basic),
    entry(CommandClass::SwitchBinary, "SWITCH_BINARY", 1, HandlerKind::SwitchBinary),
    entry(CommandClass::SwitchMultilevel, "SWITCH_MULTILEVEL", 2, HandlerKind::SwitchMultilevel),
    entry(CommandClass::SwitchAll, "SWITCH_ALL", 1, HandlerKind::Generic),
    entry(CommandClass::SceneActivation, "SCENE_ACTIVATION", 1, HandlerKind::Generic),
    entry(CommandClass::SensorBinary, "SENSOR_BINARY", 2, HandlerKind::SensorBinary),
    entry(CommandClass::SensorMultilevel, "SENSOR_MULTILEVEL", 2, HandlerKind::Generic),
    entry(CommandClass::Meter, "METER", 2, HandlerKind::Generic),
    entry(CommandClass::ThermostatMode, "THERMOSTAT_MODE", 1, HandlerKind::Generic),
    entry(CommandClass::ThermostatSetpoint, "THERMOSTAT_SETPOINT", 1, HandlerKind::Generic),
    entry(CommandClass::MultiInstance, "MULTI_INSTANCE", 2, HandlerKind::Generic),
    entry(CommandClass::Configuration, "CONFIGURATION", 1, HandlerKind::Generic),
    entry(CommandClass::Alarm, "ALARM", 1, HandlerKind::Generic),
    entry(CommandClass::ManufacturerSpecific, "MANUFACTURER_SPECIFIC", 1, HandlerKind::Generic),
    entry(CommandClass::PowerLevel, "POWERLEVEL", 1, HandlerKind::Generic),
    entry(CommandClass::NodeNaming, "NODE_NAMING", 1, HandlerKind::Generic),
    entry(CommandClass::Battery, "BATTERY", 1, HandlerKind::Battery),
    entry(CommandClass::Clock, "CLOCK", 1, HandlerKind::Generic),
    entry(CommandClass::WakeUp, "WAKE_UP", 2, HandlerKind::Generic),
    entry(CommandClass::Association, "ASSOCIATION", 1, HandlerKind::Generic),
    entry(CommandClass::Version, "VERSION", 1, HandlerKind::Version),
    entry(CommandClass::MultiCmd, "MULTI_CMD", 1, HandlerKind::Generic),
];

/// Lookup table from class identifier to descriptor.
///
/// Built once and handed to the controller; lookups index a 256-entry array.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: [Option<CommandClassDescriptor>; 256],
}

impl Registry {
    pub const fn empty() -> Self {
        Self {
            entries: [None; 256],
        }
    }

    /// The classes this implementation ships handlers for.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for descriptor in STANDARD {
            registry.register(*descriptor);
        }
        registry
    }

    /// Adds or replaces a descriptor, returning the one it displaced.
    pub fn register(
        &mut self,
        descriptor: CommandClassDescriptor,
    ) -> Option<CommandClassDescriptor> {
        self.entries[usize::from(descriptor.class.to_u8())].replace(descriptor)
    }

    pub fn lookup(&self, id: u8) -> Result<&CommandClassDescriptor, DecodeError> {
        self.entries[usize::from(id)]
            .as_ref()
            .ok_or(DecodeError::UnknownCommandClass(id))
    }

    pub fn get(&self, class: CommandClass) -> Option<&CommandClassDescriptor> {
        self.entries[usize::from(class.to_u8())].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandClassDescriptor> {
        self.entries.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandClassDescriptor, HandlerKind, Registry};
    use crate::command_class::CommandClass;
    use crate::DecodeError;

    #[test]
    fn standard_table_resolves_known_classes() {
        let registry = Registry::standard();
        let version = registry.lookup(0x86).unwrap();
        assert_eq!(version.class, CommandClass::Version);
        assert_eq!(version.label, "VERSION");
        assert_eq!(version.handler, HandlerKind::Version);
        assert_eq!(registry.get(CommandClass::SwitchMultilevel).unwrap().max_version, 2);
        assert_eq!(registry.len(), 23);
    }

    #[test]
    fn unknown_identifier_is_a_decode_error() {
        let registry = Registry::standard();
        assert_eq!(
            registry.lookup(0xEE).unwrap_err(),
            DecodeError::UnknownCommandClass(0xEE)
        );
    }

    #[test]
    fn registration_extends_and_replaces() {
        let mut registry = Registry::empty();
        assert!(registry.is_empty());
        let vendor = CommandClassDescriptor::new(
            CommandClass::Other(0x91),
            "MANUFACTURER_PROPRIETARY",
            1,
            HandlerKind::Generic,
        );
        assert!(registry.register(vendor).is_none());
        assert_eq!(registry.lookup(0x91).unwrap().label, "MANUFACTURER_PROPRIETARY");

        let upgraded = CommandClassDescriptor { max_version: 3, ..vendor };
        assert_eq!(registry.register(upgraded), Some(vendor));
        assert_eq!(registry.lookup(0x91).unwrap().max_version, 3);
    }

    #[test]
    fn clamp_keeps_reported_version_within_support() {
        let descriptor = CommandClassDescriptor::new(
            CommandClass::SwitchMultilevel,
            "SWITCH_MULTILEVEL",
            2,
            HandlerKind::SwitchMultilevel,
        );
        assert_eq!(descriptor.clamp_version(1), 1);
        assert_eq!(descriptor.clamp_version(2), 2);
        assert_eq!(descriptor.clamp_version(7), 2);
        assert_eq!(descriptor.clamp_version(0), 1);
    }
}
