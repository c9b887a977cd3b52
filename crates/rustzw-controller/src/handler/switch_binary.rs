use super::{not_supported, Effect};
use crate::{ControllerError, Request};
use rustzw_core::command_class::switch_binary::{self, SwitchBinaryCommand};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::DecodeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchBinaryState {
    pub on: Option<bool>,
}

impl SwitchBinaryState {
    pub(crate) fn decode(&mut self, payload: &[u8]) -> Result<Effect, DecodeError> {
        Ok(match SwitchBinaryCommand::decode(payload)? {
            SwitchBinaryCommand::Report(on) => {
                self.on = Some(on);
                Effect::SwitchBinary(on)
            }
            SwitchBinaryCommand::Set(_) => Effect::Ignored {
                command: switch_binary::SWITCH_BINARY_SET,
            },
            SwitchBinaryCommand::Get => Effect::Ignored {
                command: switch_binary::SWITCH_BINARY_GET,
            },
            SwitchBinaryCommand::Unsupported(command) => Effect::Ignored { command },
        })
    }
}

pub(crate) fn build(w: &mut Writer<'_>, request: &Request) -> Result<(), ControllerError> {
    match *request {
        Request::SwitchBinaryGet => switch_binary::encode_get(w)?,
        Request::SwitchBinarySet(on) => switch_binary::encode_set(w, on)?,
        _ => return Err(not_supported(request)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SwitchBinaryState;
    use crate::handler::{CommandClassHandler, Effect};
    use crate::Request;
    use rustzw_core::{CommandClass, Registry};

    #[test]
    fn report_tracks_state() {
        let mut state = SwitchBinaryState::default();
        assert_eq!(state.decode(&[0x03, 0xFF]).unwrap(), Effect::SwitchBinary(true));
        assert_eq!(state.on, Some(true));
        assert_eq!(state.decode(&[0x03, 0x00]).unwrap(), Effect::SwitchBinary(false));
        assert_eq!(state.on, Some(false));
    }

    #[test]
    fn set_encodes_on_and_off() {
        let registry = Registry::standard();
        let h = CommandClassHandler::new(*registry.get(CommandClass::SwitchBinary).unwrap());
        assert_eq!(
            h.build_request(&Request::SwitchBinarySet(true)).unwrap(),
            vec![0x25, 0x01, 0xFF]
        );
        assert_eq!(
            h.build_request(&Request::SwitchBinarySet(false)).unwrap(),
            vec![0x25, 0x01, 0x00]
        );
        assert_eq!(
            h.build_request(&Request::SwitchBinaryGet).unwrap(),
            vec![0x25, 0x02]
        );
    }
}
