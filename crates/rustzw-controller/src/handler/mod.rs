//! Per-(node, command class) handlers.
//!
//! A [`CommandClassHandler`] pairs a registry descriptor with the version
//! negotiated for one node and the class-specific state decoded so far. The
//! set of variants is closed: [`HandlerState`] is chosen from the descriptor's
//! [`HandlerKind`], and every other registered class falls back to
//! [`HandlerState::Generic`].

pub mod basic;
pub mod battery;
pub mod sensor_binary;
pub mod switch_binary;
pub mod switch_multilevel;
pub mod version;

use crate::{ControllerError, Request};
use rustzw_core::command_class::battery::BatteryReport;
use rustzw_core::command_class::sensor_binary::SensorBinaryReport;
use rustzw_core::command_class::version::{CommandClassVersionReport, VersionReport};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::{CommandClass, CommandClassDescriptor, DecodeError, HandlerKind};

/// Largest application command any handler builds.
const MAX_REQUEST_LEN: usize = 8;

/// What a decoded application payload means to the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    VersionReport(VersionReport),
    /// The node's version for another class. The node applies it to that
    /// class's handler.
    CommandClassVersion(CommandClassVersionReport),
    Basic(u8),
    SwitchBinary(bool),
    SwitchMultilevel(u8),
    SensorBinary(SensorBinaryReport),
    Battery(BatteryReport),
    /// A sub-command this side does not act on.
    Ignored { command: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerState {
    Version(version::VersionState),
    Basic(basic::BasicState),
    SwitchBinary(switch_binary::SwitchBinaryState),
    SwitchMultilevel(switch_multilevel::SwitchMultilevelState),
    SensorBinary(sensor_binary::SensorBinaryState),
    Battery(battery::BatteryState),
    Generic,
}

impl HandlerState {
    fn for_kind(kind: HandlerKind) -> Self {
        match kind {
            HandlerKind::Version => Self::Version(Default::default()),
            HandlerKind::Basic => Self::Basic(Default::default()),
            HandlerKind::SwitchBinary => Self::SwitchBinary(Default::default()),
            HandlerKind::SwitchMultilevel => Self::SwitchMultilevel(Default::default()),
            HandlerKind::SensorBinary => Self::SensorBinary(Default::default()),
            HandlerKind::Battery => Self::Battery(Default::default()),
            HandlerKind::Generic => Self::Generic,
        }
    }
}

/// One command class as implemented for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandClassHandler {
    descriptor: CommandClassDescriptor,
    /// 0 until negotiated.
    version: u8,
    state: HandlerState,
}

impl CommandClassHandler {
    pub fn new(descriptor: CommandClassDescriptor) -> Self {
        Self {
            descriptor,
            version: 0,
            state: HandlerState::for_kind(descriptor.handler),
        }
    }

    pub fn command_class(&self) -> CommandClass {
        self.descriptor.class
    }

    pub fn descriptor(&self) -> &CommandClassDescriptor {
        &self.descriptor
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn is_negotiated(&self) -> bool {
        self.version != 0
    }

    pub fn state(&self) -> &HandlerState {
        &self.state
    }

    /// Stores the version a node reported, clamped to what this side
    /// supports, and returns the stored value.
    pub fn on_version_negotiated(&mut self, reported: u8) -> u8 {
        self.version = self.descriptor.clamp_version(reported);
        if reported > self.version {
            log::debug!(
                "{} reported version {reported}, using {}",
                self.descriptor.label,
                self.version
            );
        }
        self.version
    }

    /// Decodes `payload`, the application command after its class identifier.
    pub fn decode_application_payload(&mut self, payload: &[u8]) -> Result<Effect, DecodeError> {
        match &mut self.state {
            HandlerState::Version(state) => state.decode(payload),
            HandlerState::Basic(state) => state.decode(payload),
            HandlerState::SwitchBinary(state) => state.decode(payload),
            HandlerState::SwitchMultilevel(state) => state.decode(payload),
            HandlerState::SensorBinary(state) => state.decode(payload),
            HandlerState::Battery(state) => state.decode(payload),
            HandlerState::Generic => {
                let command = payload.first().copied().ok_or(DecodeError::UnexpectedEof)?;
                Ok(Effect::Ignored { command })
            }
        }
    }

    /// Encodes `request` as an application command for the negotiated version.
    pub fn build_request(&self, request: &Request) -> Result<Vec<u8>, ControllerError> {
        if request.handler_kind() != self.descriptor.handler {
            return Err(ControllerError::RequestNotSupported {
                command_class: self.descriptor.class.to_u8(),
            });
        }
        let mut buf = [0u8; MAX_REQUEST_LEN];
        let mut w = Writer::new(&mut buf);
        let version = self.version.max(1);
        match &self.state {
            HandlerState::Version(_) => version::build(&mut w, request),
            HandlerState::Basic(_) => basic::build(&mut w, request),
            HandlerState::SwitchBinary(_) => switch_binary::build(&mut w, request),
            HandlerState::SwitchMultilevel(_) => switch_multilevel::build(&mut w, request, version),
            HandlerState::SensorBinary(_) => sensor_binary::build(&mut w, request, version),
            HandlerState::Battery(_) => battery::build(&mut w, request),
            HandlerState::Generic => Err(ControllerError::RequestNotSupported {
                command_class: self.descriptor.class.to_u8(),
            }),
        }?;
        Ok(w.as_written().to_vec())
    }
}

fn not_supported(request: &Request) -> ControllerError {
    ControllerError::RequestNotSupported {
        command_class: request.command_class().to_u8(),
    }
}

#[cfg(test)]
mod tests {
    use super::{CommandClassHandler, Effect, HandlerState};
    use crate::{ControllerError, Request};
    use rustzw_core::{CommandClass, Registry};

    fn handler(class: CommandClass) -> CommandClassHandler {
        let registry = Registry::standard();
        CommandClassHandler::new(*registry.get(class).unwrap())
    }

    #[test]
    fn starts_unnegotiated_and_clamps() {
        let mut h = handler(CommandClass::SwitchMultilevel);
        assert_eq!(h.version(), 0);
        assert!(!h.is_negotiated());
        assert_eq!(h.on_version_negotiated(4), 2);
        assert_eq!(h.version(), 2);
        assert_eq!(h.on_version_negotiated(1), 1);
    }

    #[test]
    fn request_for_another_class_is_rejected() {
        let h = handler(CommandClass::SwitchBinary);
        let err = h.build_request(&Request::BasicGet).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::RequestNotSupported {
                command_class: 0x25
            }
        ));
    }

    #[test]
    fn generic_handler_ignores_sub_commands() {
        let mut h = handler(CommandClass::Meter);
        assert_eq!(h.state(), &HandlerState::Generic);
        assert_eq!(
            h.decode_application_payload(&[0x02]).unwrap(),
            Effect::Ignored { command: 0x02 }
        );
        assert!(h.decode_application_payload(&[]).is_err());
    }
}
