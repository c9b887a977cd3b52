use super::{not_supported, Effect};
use crate::{ControllerError, Request};
use rustzw_core::command_class::sensor_binary::{self, SensorBinaryCommand};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::DecodeError;

const SENSOR_TYPE_VERSION: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorBinaryState {
    pub triggered: Option<bool>,
    pub sensor_type: Option<u8>,
}

impl SensorBinaryState {
    pub(crate) fn decode(&mut self, payload: &[u8]) -> Result<Effect, DecodeError> {
        Ok(match SensorBinaryCommand::decode(payload)? {
            SensorBinaryCommand::Report(report) => {
                self.triggered = Some(report.triggered);
                if report.sensor_type.is_some() {
                    self.sensor_type = report.sensor_type;
                }
                Effect::SensorBinary(report)
            }
            SensorBinaryCommand::Get => Effect::Ignored {
                command: sensor_binary::SENSOR_BINARY_GET,
            },
            SensorBinaryCommand::Unsupported(command) => Effect::Ignored { command },
        })
    }
}

pub(crate) fn build(
    w: &mut Writer<'_>,
    request: &Request,
    version: u8,
) -> Result<(), ControllerError> {
    match *request {
        Request::SensorBinaryGet { sensor_type } => {
            let sensor_type = sensor_type.filter(|_| version >= SENSOR_TYPE_VERSION);
            sensor_binary::encode_get(w, sensor_type)?
        }
        _ => return Err(not_supported(request)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::SensorBinaryState;
    use crate::handler::{CommandClassHandler, Effect};
    use crate::Request;
    use rustzw_core::command_class::sensor_binary::SensorBinaryReport;
    use rustzw_core::{CommandClass, Registry};

    #[test]
    fn v1_and_v2_reports() {
        let mut state = SensorBinaryState::default();
        assert_eq!(
            state.decode(&[0x03, 0xFF]).unwrap(),
            Effect::SensorBinary(SensorBinaryReport {
                triggered: true,
                sensor_type: None,
            })
        );
        state.decode(&[0x03, 0x00, 0x0C]).unwrap();
        assert_eq!(state.triggered, Some(false));
        assert_eq!(state.sensor_type, Some(0x0C));
    }

    #[test]
    fn sensor_type_only_sent_from_v2() {
        let registry = Registry::standard();
        let mut h = CommandClassHandler::new(*registry.get(CommandClass::SensorBinary).unwrap());
        let get = Request::SensorBinaryGet {
            sensor_type: Some(0x0C),
        };
        assert_eq!(h.build_request(&get).unwrap(), vec![0x30, 0x02]);
        h.on_version_negotiated(2);
        assert_eq!(h.build_request(&get).unwrap(), vec![0x30, 0x02, 0x0C]);
    }
}
