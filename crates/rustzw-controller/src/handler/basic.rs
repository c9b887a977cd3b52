use super::{not_supported, Effect};
use crate::{ControllerError, Request};
use rustzw_core::command_class::basic::{self, BasicCommand};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::DecodeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicState {
    pub value: Option<u8>,
}

impl BasicState {
    pub(crate) fn decode(&mut self, payload: &[u8]) -> Result<Effect, DecodeError> {
        Ok(match BasicCommand::decode(payload)? {
            // Nodes send Basic Set unsolicited to announce a local change.
            BasicCommand::Report(value) | BasicCommand::Set(value) => {
                self.value = Some(value);
                Effect::Basic(value)
            }
            BasicCommand::Get => Effect::Ignored {
                command: basic::BASIC_GET,
            },
            BasicCommand::Unsupported(command) => Effect::Ignored { command },
        })
    }
}

pub(crate) fn build(w: &mut Writer<'_>, request: &Request) -> Result<(), ControllerError> {
    match *request {
        Request::BasicGet => basic::encode_get(w)?,
        Request::BasicSet(value) => basic::encode_set(w, value)?,
        _ => return Err(not_supported(request)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::BasicState;
    use crate::handler::Effect;

    #[test]
    fn report_and_unsolicited_set_update_value() {
        let mut state = BasicState::default();
        assert_eq!(state.decode(&[0x03, 0x40]).unwrap(), Effect::Basic(0x40));
        assert_eq!(state.value, Some(0x40));
        assert_eq!(state.decode(&[0x01, 0x00]).unwrap(), Effect::Basic(0));
        assert_eq!(state.value, Some(0));
        assert_eq!(
            state.decode(&[0x02]).unwrap(),
            Effect::Ignored { command: 0x02 }
        );
    }
}
