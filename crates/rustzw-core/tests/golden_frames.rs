use rustzw_core::command_class::version::{
    encode_command_class_get, encode_get, CommandClassVersionReport, VersionCommand,
};
use rustzw_core::command_class::{switch_binary, CommandClass};
use rustzw_core::encoding::writer::Writer;
use rustzw_core::frame::{Frame, MessageClass, MessageType};
use rustzw_core::serial_api::{
    ApplicationCommand, SendDataCallback, SendDataRequest, SendDataResponse, TransmitStatus,
    DEFAULT_TRANSMIT_OPTIONS,
};
use rustzw_core::{FrameBuffer, Inbound};

fn send_data(node_id: u8, callback_id: u8, command: &[u8]) -> Vec<u8> {
    SendDataRequest {
        node_id,
        command,
        transmit_options: DEFAULT_TRANSMIT_OPTIONS,
        callback_id,
    }
    .to_frame_vec()
    .unwrap()
}

#[test]
fn version_command_class_get_frame_matches_fixture() {
    let mut cmd = [0u8; 8];
    let mut w = Writer::new(&mut cmd);
    encode_command_class_get(&mut w, CommandClass::SwitchBinary).unwrap();

    assert_eq!(
        send_data(5, 0x01, w.as_written()),
        &[0x01, 0x09, 0x00, 0x13, 0x05, 0x03, 0x86, 0x13, 0x25, 0x25, 0x01, 0x77]
    );
}

#[test]
fn version_get_frame_matches_fixture() {
    let mut cmd = [0u8; 8];
    let mut w = Writer::new(&mut cmd);
    encode_get(&mut w).unwrap();

    assert_eq!(
        send_data(2, 0x0A, w.as_written()),
        &[0x01, 0x08, 0x00, 0x13, 0x02, 0x02, 0x86, 0x11, 0x25, 0x0A, 0x5C]
    );
}

#[test]
fn switch_binary_set_frame_matches_fixture() {
    let mut cmd = [0u8; 8];
    let mut w = Writer::new(&mut cmd);
    switch_binary::encode_set(&mut w, true).unwrap();

    assert_eq!(
        send_data(3, 0x07, w.as_written()),
        &[0x01, 0x09, 0x00, 0x13, 0x03, 0x03, 0x25, 0x01, 0xFF, 0x25, 0x07, 0x1C]
    );
}

#[test]
fn command_class_version_report_fixture_decodes() {
    let bytes = [
        0x01, 0x09, 0x00, 0x04, 0x00, 0x05, 0x04, 0x86, 0x14, 0x25, 0x01, 0x45,
    ];
    let (frame, used) = Frame::decode(&bytes).unwrap();
    assert_eq!(used, bytes.len());
    assert_eq!(frame.message_type, MessageType::Request);
    assert_eq!(frame.message_class, MessageClass::ApplicationCommandHandler);

    let app = ApplicationCommand::decode_payload(frame.payload).unwrap();
    assert_eq!(app.node_id, 5);
    assert_eq!(app.command_class(), Some(CommandClass::Version.to_u8()));
    assert_eq!(
        VersionCommand::decode(&app.command[1..]).unwrap(),
        VersionCommand::CommandClassReport(CommandClassVersionReport {
            command_class: 0x25,
            version: 1,
        })
    );
}

#[test]
fn controller_exchange_splits_into_tokens() {
    let mut fb = FrameBuffer::new();
    // ACK, SendData response (accepted), SendData callback (ok).
    fb.push(&[0x06, 0x01, 0x03, 0x01, 0x13, 0x01, 0xEF]);
    fb.push(&[0x01, 0x04, 0x00, 0x13, 0x01, 0x00, 0xE9]);

    assert_eq!(fb.next_inbound(), Some(Ok(Inbound::Ack)));

    let Some(Ok(Inbound::Frame(response))) = fb.next_inbound() else {
        panic!("expected response frame");
    };
    assert_eq!(response.message_type, MessageType::Response);
    assert!(
        SendDataResponse::decode_payload(&response.payload)
            .unwrap()
            .accepted
    );

    let Some(Ok(Inbound::Frame(callback))) = fb.next_inbound() else {
        panic!("expected callback frame");
    };
    let cb = SendDataCallback::decode_payload(&callback.payload).unwrap();
    assert_eq!(cb.callback_id, 1);
    assert_eq!(cb.status, TransmitStatus::Ok);
    assert!(fb.is_empty());
}
