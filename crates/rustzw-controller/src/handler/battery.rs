use super::{not_supported, Effect};
use crate::{ControllerError, Request};
use rustzw_core::command_class::battery::{self, BatteryCommand};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::DecodeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryState {
    pub level: Option<u8>,
}

impl BatteryState {
    pub(crate) fn decode(&mut self, payload: &[u8]) -> Result<Effect, DecodeError> {
        Ok(match BatteryCommand::decode(payload)? {
            BatteryCommand::Report(report) => {
                self.level = Some(report.level);
                Effect::Battery(report)
            }
            BatteryCommand::Get => Effect::Ignored {
                command: battery::BATTERY_GET,
            },
            BatteryCommand::Unsupported(command) => Effect::Ignored { command },
        })
    }
}

pub(crate) fn build(w: &mut Writer<'_>, request: &Request) -> Result<(), ControllerError> {
    match *request {
        Request::BatteryGet => battery::encode_get(w)?,
        _ => return Err(not_supported(request)),
    }
    Ok(())
}
