mod common;

use common::{programmer, SimHid, SimProgrammer};
use pk2_icsp::dispatch::*;
use pk2_icsp::script::opcode::{BUSY_LED_ON, MCLR_GND_OFF, MCLR_GND_ON, VPP_OFF};
use pk2_icsp::Status;
use rstest::rstest;

fn run(p: &mut SimProgrammer, report: &[u8]) -> SimHid {
    let mut hid = SimHid::default();
    hid.send(report);
    p.process_one_cycle(&mut hid);
    assert!(hid.inbound.is_empty());
    assert_eq!(hid.released, 1);
    hid
}

#[test]
fn nothing_pending_sends_nothing() {
    let mut p = programmer(false);
    let mut hid = SimHid::default();
    p.process_one_cycle(&mut hid);
    assert!(hid.outbound.is_empty());
    assert_eq!(hid.released, 0);
}

#[test]
fn command_tags() {
    assert_eq!(Command::try_from(CMD_EXECUTE_SCRIPT), Ok(Command::ExecuteScript));
    assert_eq!(Command::try_from(CMD_UPLOAD_DATA_NOLEN), Ok(Command::UploadDataNoLen));
    assert_eq!(Command::try_from(0xFF), Err(UnknownCommand(0xFF)));
}

#[test]
fn version_reply() {
    let mut p = programmer(false);
    let hid = run(&mut p, &[CMD_GET_VERSION]);
    assert_eq!(hid.outbound.len(), 1);
    assert_eq!(&hid.outbound[0][..3], &[2, 32, 0]);
}

#[test]
fn status_read_clears_one_shot_bits() {
    let mut p = programmer(false);
    p.status.set(Status::ICD_TIMEOUT);
    let hid = run(&mut p, &[CMD_READ_STATUS, CMD_READ_STATUS]);

    assert_eq!(hid.outbound.len(), 2);
    assert_eq!(&hid.outbound[0][..2], &[0x03, 0x05]);
    // Vdd bits persist, the reset and timeout bits are gone
    assert_eq!(&hid.outbound[1][..2], &[0x03, 0x00]);
    assert_eq!(p.status.bits().bits(), 0x0003);
}

#[test]
fn status_read_turns_busy_led_off() {
    let mut p = programmer(false);
    let hid = run(&mut p, &[CMD_EXECUTE_SCRIPT, 1, BUSY_LED_ON, CMD_READ_STATUS]);
    assert_eq!(hid.outbound.len(), 1);
    assert!(!p.board.led);
}

#[test]
fn status_reports_live_vpp_lines() {
    let mut p = programmer(false);
    let hid = run(&mut p, &[CMD_EXECUTE_SCRIPT, 1, MCLR_GND_ON, CMD_READ_STATUS]);
    assert_eq!(&hid.outbound[0][..2], &[0x0F, 0x01]);

    let hid = run(&mut p, &[CMD_EXECUTE_SCRIPT, 2, MCLR_GND_OFF, VPP_OFF, CMD_READ_STATUS]);
    assert_eq!(&hid.outbound[0][..2], &[0x03, 0x00]);
}

#[test]
fn button_is_latched_on_press() {
    let mut p = programmer(false);
    p.board.button = true;
    let hid = run(&mut p, &[CMD_READ_STATUS]);
    assert_eq!(hid.outbound[0][0] & 0x40, 0x40);

    // still held: no new event
    let hid = run(&mut p, &[CMD_READ_STATUS]);
    assert_eq!(hid.outbound[0][0] & 0x40, 0);

    p.board.button = false;
    run(&mut p, &[CMD_NO_OPERATION]);
    p.board.button = true;
    let hid = run(&mut p, &[CMD_READ_STATUS]);
    assert_eq!(hid.outbound[0][0] & 0x40, 0x40);
}

#[test]
fn unknown_tag_drops_rest_of_report() {
    let mut p = programmer(false);
    let hid = run(&mut p, &[CMD_NO_OPERATION, 0x13, CMD_GET_VERSION]);
    assert!(hid.outbound.is_empty());
}

#[test]
fn legacy_voltage_commands_skip_parameters() {
    let mut p = programmer(false);
    let v = CMD_GET_VERSION;
    let hid = run(&mut p, &[CMD_SET_VDD, v, v, v, CMD_SET_VPP, v, v, v, v]);
    assert_eq!(hid.outbound.len(), 1);
}

#[test]
fn download_data_is_length_prefixed() {
    let mut p = programmer(false);
    let hid = run(&mut p, &[CMD_DOWNLOAD_DATA, 3, 0xA, 0xB, 0xC, CMD_GET_VERSION]);
    assert_eq!(p.download.len(), 3);
    assert_eq!(p.download.read_byte(&mut p.status), 0xA);
    assert_eq!(hid.outbound.len(), 1);

    run(&mut p, &[CMD_CLEAR_DOWNLOAD_BUFFER]);
    assert!(p.download.is_empty());
}

#[test]
fn upload_with_length_is_capped_and_zero_filled() {
    let mut p = programmer(false);
    for b in 0..100 {
        p.upload.write_byte(&mut p.status, b);
    }
    let hid = run(&mut p, &[CMD_UPLOAD_DATA, CMD_UPLOAD_DATA]);

    assert_eq!(hid.outbound.len(), 2);
    let first = &hid.outbound[0];
    assert_eq!(first[0], 63);
    assert_eq!(&first[1..], &(0..63).collect::<Vec<u8>>()[..]);

    let second = &hid.outbound[1];
    assert_eq!(second[0], 37);
    assert_eq!(&second[1..38], &(63..100).collect::<Vec<u8>>()[..]);
    assert!(second[38..].iter().all(|&b| b == 0));
    assert!(!p.status.contains(Status::DOWNLOAD_EMPTY));
}

#[test]
fn upload_without_length_sends_full_reports() {
    let mut p = programmer(false);
    for b in 0..70 {
        p.upload.write_byte(&mut p.status, b);
    }
    let hid = run(&mut p, &[CMD_UPLOAD_DATA_NOLEN, CMD_UPLOAD_DATA_NOLEN]);

    assert_eq!(&hid.outbound[0][..], &(0..64).collect::<Vec<u8>>()[..]);
    assert_eq!(&hid.outbound[1][..6], &[64, 65, 66, 67, 68, 69]);
    assert!(hid.outbound[1][6..].iter().all(|&b| b == 0));
}

#[test]
fn clear_upload_buffer_resets_flags() {
    let mut p = programmer(false);
    for b in 0..200 {
        p.upload.write_byte(&mut p.status, b as u8);
    }
    assert!(p.status.contains(Status::UPLOAD_FULL));

    run(&mut p, &[CMD_CLEAR_UPLOAD_BUFFER]);
    assert!(p.upload.is_empty());
    assert!(!p.status.contains(Status::UPLOAD_FULL));
}

#[test]
fn completed_script_continues_report() {
    let mut p = programmer(false);
    let hid = run(&mut p, &[CMD_EXECUTE_SCRIPT, 1, BUSY_LED_ON, CMD_GET_VERSION]);
    assert!(p.board.led);
    assert_eq!(hid.outbound.len(), 1);
}

#[test]
fn halted_script_drops_rest_of_report() {
    let mut p = programmer(false);
    let hid = run(&mut p, &[CMD_EXECUTE_SCRIPT, 2, BUSY_LED_ON, 0x00, CMD_GET_VERSION]);
    assert!(p.board.led);
    assert!(hid.outbound.is_empty());
}

#[test]
fn script_length_past_report_end_is_clipped() {
    let mut p = programmer(false);
    let mut report = [0u8; 64];
    report[0] = CMD_EXECUTE_SCRIPT;
    report[1] = 200;
    report[2..].fill(BUSY_LED_ON);
    let hid = run(&mut p, &report);
    assert!(p.board.led);
    assert!(hid.outbound.is_empty());
}

#[rstest]
#[case::version(CMD_GET_VERSION)]
#[case::status(CMD_READ_STATUS)]
#[case::upload(CMD_UPLOAD_DATA)]
#[case::upload_nolen(CMD_UPLOAD_DATA_NOLEN)]
fn reply_waits_for_free_in_slot(#[case] command: u8) {
    let mut p = programmer(false);
    let mut hid = SimHid::with_busy_slot(3);
    hid.send(&[command]);
    p.process_one_cycle(&mut hid);

    assert_eq!(hid.outbound.len(), 1);
    assert_eq!(hid.busy_checks.get(), 3);
    // one yield per busy check
    assert_eq!(p.wait.yields, 3);
}

#[test]
fn back_to_back_replies_each_wait() {
    let mut p = programmer(false);
    p.upload.write_byte(&mut p.status, 0x42);
    let mut hid = SimHid::with_busy_slot(2);
    hid.send(&[CMD_GET_VERSION, CMD_READ_STATUS, CMD_UPLOAD_DATA, CMD_UPLOAD_DATA_NOLEN]);
    p.process_one_cycle(&mut hid);

    assert_eq!(hid.outbound.len(), 4);
    assert_eq!(p.wait.yields, 4 * 2);
    assert_eq!(&hid.outbound[0][..3], &[2, 32, 0]);
    assert_eq!(&hid.outbound[2][..2], &[1, 0x42]);
}

#[test]
fn commands_without_reply_do_not_wait() {
    let mut p = programmer(false);
    let mut hid = SimHid::with_busy_slot(5);
    hid.send(&[CMD_NO_OPERATION, CMD_CLEAR_UPLOAD_BUFFER, CMD_DOWNLOAD_DATA, 1, 9]);
    p.process_one_cycle(&mut hid);

    assert!(hid.outbound.is_empty());
    assert_eq!(hid.busy_checks.get(), 0);
    assert_eq!(p.wait.yields, 0);
}
