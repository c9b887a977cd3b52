use clap::ValueEnum;
use rustzw_controller::{
    Controller, ControllerConfig, ControllerError, ControllerHandle, EventStream,
};
use rustzw_core::{CommandClass, Registry};
use rustzw_serial::{SerialConfig, SerialTransport};
use std::sync::Arc;

/// CLI-friendly names for the command classes a node is commonly declared with.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CommandClassArg {
    Basic,
    SwitchBinary,
    SwitchMultilevel,
    SensorBinary,
    SensorMultilevel,
    Meter,
    Battery,
    WakeUp,
    Association,
    Configuration,
    ManufacturerSpecific,
}

impl CommandClassArg {
    pub const fn into_command_class(self) -> CommandClass {
        match self {
            Self::Basic => CommandClass::Basic,
            Self::SwitchBinary => CommandClass::SwitchBinary,
            Self::SwitchMultilevel => CommandClass::SwitchMultilevel,
            Self::SensorBinary => CommandClass::SensorBinary,
            Self::SensorMultilevel => CommandClass::SensorMultilevel,
            Self::Meter => CommandClass::Meter,
            Self::Battery => CommandClass::Battery,
            Self::WakeUp => CommandClass::WakeUp,
            Self::Association => CommandClass::Association,
            Self::Configuration => CommandClass::Configuration,
            Self::ManufacturerSpecific => CommandClass::ManufacturerSpecific,
        }
    }
}

/// Opens the serial port and starts a driver on the current runtime.
pub fn start_controller(
    port: &str,
    baud_rate: u32,
    config: ControllerConfig,
) -> Result<(ControllerHandle, EventStream), ControllerError> {
    let serial = SerialConfig::new(port).with_baud_rate(baud_rate);
    let transport = Arc::new(SerialTransport::open(&serial)?);
    let controller = Controller::new(config, Registry::standard());
    let (handle, events, driver) = rustzw_controller::create_controller(transport, controller);
    tokio::spawn(async move {
        if let Err(err) = driver.await {
            eprintln!("controller stopped: {err}");
        }
    });
    Ok((handle, events))
}

/// Parses `"01 03 01 13 01 EF"`, `"010301"` or `"0x01,0x03"` into bytes.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .map(|part| part.trim_start_matches("0x").trim_start_matches("0X"))
        .collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {input:?}"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| format!("invalid hex byte {:?}", &digits[i..i + 2]))
        })
        .collect()
}
