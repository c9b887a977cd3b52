#![no_main]

use libfuzzer_sys::fuzz_target;
use rustzw_core::command_class::{
    basic::BasicCommand, battery::BatteryCommand, sensor_binary::SensorBinaryCommand,
    switch_binary::SwitchBinaryCommand, switch_multilevel::SwitchMultilevelCommand,
    version::VersionCommand,
};
use rustzw_core::serial_api::ApplicationCommand;

fuzz_target!(|data: &[u8]| {
    let Ok(app) = ApplicationCommand::decode_payload(data) else {
        return;
    };
    let Some((_, payload)) = app.command.split_first() else {
        return;
    };
    let _ = VersionCommand::decode(payload);
    let _ = BasicCommand::decode(payload);
    let _ = SwitchBinaryCommand::decode(payload);
    let _ = SwitchMultilevelCommand::decode(payload);
    let _ = SensorBinaryCommand::decode(payload);
    let _ = BatteryCommand::decode(payload);
});
