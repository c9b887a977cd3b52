use super::{not_supported, Effect};
use crate::{ControllerError, Request};
use rustzw_core::command_class::version::{self, VersionCommand, VersionReport};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::DecodeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionState {
    pub report: Option<VersionReport>,
}

impl VersionState {
    pub(crate) fn decode(&mut self, payload: &[u8]) -> Result<Effect, DecodeError> {
        Ok(match VersionCommand::decode(payload)? {
            VersionCommand::Report(report) => {
                self.report = Some(report);
                Effect::VersionReport(report)
            }
            VersionCommand::CommandClassReport(report) => Effect::CommandClassVersion(report),
            VersionCommand::Get => Effect::Ignored {
                command: version::VERSION_GET,
            },
            VersionCommand::CommandClassGet { .. } => Effect::Ignored {
                command: version::VERSION_COMMAND_CLASS_GET,
            },
            VersionCommand::Unsupported(command) => Effect::Ignored { command },
        })
    }
}

pub(crate) fn build(w: &mut Writer<'_>, request: &Request) -> Result<(), ControllerError> {
    match *request {
        Request::VersionGet => version::encode_get(w)?,
        Request::CommandClassVersionGet(class) => version::encode_command_class_get(w, class)?,
        _ => return Err(not_supported(request)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::VersionState;
    use crate::handler::{CommandClassHandler, Effect};
    use crate::Request;
    use rustzw_core::command_class::version::{CommandClassVersionReport, VersionReport};
    use rustzw_core::{CommandClass, Registry};

    #[test]
    fn version_report_is_kept_for_inspection() {
        let mut state = VersionState::default();
        let effect = state.decode(&[0x12, 0x03, 0x04, 0x05, 0x01, 0x02]).unwrap();
        let expected = VersionReport {
            library_type: 3,
            protocol_version: 4,
            protocol_sub_version: 5,
            application_version: 1,
            application_sub_version: 2,
        };
        assert_eq!(effect, Effect::VersionReport(expected));
        assert_eq!(state.report, Some(expected));
    }

    #[test]
    fn command_class_report_is_handed_to_the_node() {
        let mut state = VersionState::default();
        assert_eq!(
            state.decode(&[0x14, 0x25, 0x01]).unwrap(),
            Effect::CommandClassVersion(CommandClassVersionReport {
                command_class: 0x25,
                version: 1,
            })
        );
        assert!(state.decode(&[0x14, 0x25]).is_err());
        assert_eq!(
            state.decode(&[0x7F]).unwrap(),
            Effect::Ignored { command: 0x7F }
        );
    }

    #[test]
    fn builds_both_get_requests() {
        let registry = Registry::standard();
        let h = CommandClassHandler::new(*registry.get(CommandClass::Version).unwrap());
        assert_eq!(h.build_request(&Request::VersionGet).unwrap(), vec![0x86, 0x11]);
        assert_eq!(
            h.build_request(&Request::CommandClassVersionGet(CommandClass::Battery))
                .unwrap(),
            vec![0x86, 0x13, 0x80]
        );
    }
}
