use super::{not_supported, Effect};
use crate::{ControllerError, Request};
use rustzw_core::command_class::switch_multilevel::{self, SwitchMultilevelCommand};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::DecodeError;

/// Dimming duration is only understood from this version on.
const DURATION_VERSION: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchMultilevelState {
    pub level: Option<u8>,
}

impl SwitchMultilevelState {
    pub(crate) fn decode(&mut self, payload: &[u8]) -> Result<Effect, DecodeError> {
        Ok(match SwitchMultilevelCommand::decode(payload)? {
            SwitchMultilevelCommand::Report(level) => {
                self.level = Some(level);
                Effect::SwitchMultilevel(level)
            }
            SwitchMultilevelCommand::Set { .. } => Effect::Ignored {
                command: switch_multilevel::SWITCH_MULTILEVEL_SET,
            },
            SwitchMultilevelCommand::Get => Effect::Ignored {
                command: switch_multilevel::SWITCH_MULTILEVEL_GET,
            },
            SwitchMultilevelCommand::StartLevelChange { .. } => Effect::Ignored {
                command: switch_multilevel::SWITCH_MULTILEVEL_START_LEVEL_CHANGE,
            },
            SwitchMultilevelCommand::StopLevelChange => Effect::Ignored {
                command: switch_multilevel::SWITCH_MULTILEVEL_STOP_LEVEL_CHANGE,
            },
            SwitchMultilevelCommand::Unsupported(command) => Effect::Ignored { command },
        })
    }
}

pub(crate) fn build(
    w: &mut Writer<'_>,
    request: &Request,
    version: u8,
) -> Result<(), ControllerError> {
    let duration = |d: Option<u8>| d.filter(|_| version >= DURATION_VERSION);
    match *request {
        Request::SwitchMultilevelGet => switch_multilevel::encode_get(w)?,
        Request::SwitchMultilevelSet { level, duration: d } => {
            switch_multilevel::encode_set(w, level, duration(d))?
        }
        Request::SwitchMultilevelStartLevelChange {
            up,
            start_level,
            duration: d,
        } => switch_multilevel::encode_start_level_change(w, up, start_level, duration(d))?,
        Request::SwitchMultilevelStopLevelChange => switch_multilevel::encode_stop_level_change(w)?,
        _ => return Err(not_supported(request)),
    }
    Ok(())
}
