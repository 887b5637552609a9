//! Turns inbound HID reports into buffer, script and status operations.
//!
//! A report is a sequence of commands, each a tag byte followed by its own operands.  Commands
//! are executed in order until the report is used up or an unknown tag is found; an unknown tag
//! silently drops the rest of the report.  Replies go out as one report per reply-producing
//! command.
use log::{debug, trace};
use thiserror::Error;

use crate::board::Board;
use crate::config::REPORT_SIZE;
use crate::port::IcspPort;
use crate::programmer::Programmer;
use crate::script::ScriptEnd;
use crate::status::Status;
use crate::timing::Wait;
use crate::transport::{Report, ReportTransport};

pub const CMD_GET_VERSION: u8 = 0x76;
pub const CMD_NO_OPERATION: u8 = 0x5A;
pub const CMD_SET_VDD: u8 = 0xA0;
pub const CMD_SET_VPP: u8 = 0xA1;
pub const CMD_READ_STATUS: u8 = 0xA2;
pub const CMD_EXECUTE_SCRIPT: u8 = 0xA6;
pub const CMD_CLEAR_DOWNLOAD_BUFFER: u8 = 0xA7;
pub const CMD_DOWNLOAD_DATA: u8 = 0xA8;
pub const CMD_CLEAR_UPLOAD_BUFFER: u8 = 0xA9;
pub const CMD_UPLOAD_DATA: u8 = 0xAA;
pub const CMD_UPLOAD_DATA_NOLEN: u8 = 0xAC;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown command {0:#04x}")]
pub struct UnknownCommand(pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the next `len` bytes as a script
    ExecuteScript,
    ClearDownloadBuffer,
    /// Length-prefixed payload for the download buffer
    DownloadData,
    ClearUploadBuffer,
    /// Reply `[count][count bytes]` from the upload buffer, count at most 63
    UploadData,
    /// Reply 64 bytes from the upload buffer, no length prefix
    UploadDataNoLen,
    GetVersion,
    ReadStatus,
    NoOperation,
    /// Legacy supply voltage setting, 3 parameter bytes, ignored
    SetVdd,
    /// Legacy programming voltage setting, 3 parameter bytes, ignored
    SetVpp,
}

impl TryFrom<u8> for Command {
    type Error = UnknownCommand;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            CMD_EXECUTE_SCRIPT => Command::ExecuteScript,
            CMD_CLEAR_DOWNLOAD_BUFFER => Command::ClearDownloadBuffer,
            CMD_DOWNLOAD_DATA => Command::DownloadData,
            CMD_CLEAR_UPLOAD_BUFFER => Command::ClearUploadBuffer,
            CMD_UPLOAD_DATA => Command::UploadData,
            CMD_UPLOAD_DATA_NOLEN => Command::UploadDataNoLen,
            CMD_GET_VERSION => Command::GetVersion,
            CMD_READ_STATUS => Command::ReadStatus,
            CMD_NO_OPERATION => Command::NoOperation,
            CMD_SET_VDD => Command::SetVdd,
            CMD_SET_VPP => Command::SetVpp,
            _ => return Err(UnknownCommand(tag)),
        })
    }
}

impl<P, B, W> Programmer<P, B, W> where P: IcspPort, B: Board, W: Wait {
    /// One pass of the outer loop: latch the button, then process the pending report, if any.
    pub fn process_one_cycle<T: ReportTransport>(&mut self, transport: &mut T) {
        let pressed = self.board.button_pressed();
        if pressed && !self.button_down {
            self.status.set(Status::BUTTON_PRESSED);
        }
        self.button_down = pressed;

        if !transport.report_received() {
            return;
        }
        let report = transport.take_inbound_report();
        self.process_report(transport, &report);
        transport.release_inbound_report();
    }

    fn process_report<T: ReportTransport>(&mut self, transport: &mut T, report: &Report) {
        let mut cursor = 0;
        while cursor < REPORT_SIZE {
            match self.process_command(transport, report, cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }
    }

    /// Execute the command at `cursor`.  Returns where the next command starts, or `None` when
    /// the rest of the report is to be dropped.
    fn process_command<T: ReportTransport>(&mut self, transport: &mut T, report: &Report, cursor: usize) -> Option<usize> {
        let command = match Command::try_from(report[cursor]) {
            Ok(command) => command,
            Err(e) => {
                debug!("{} at offset {}, dropping rest of report", e, cursor);
                return None;
            }
        };
        trace!("{:?}", command);

        let next = match command {
            Command::ExecuteScript => {
                let len = usize::from(*report.get(cursor + 1)?);
                let start = cursor + 2;
                let end = (start + len).min(REPORT_SIZE);
                if self.run_script(&report[start.min(end)..end]) == ScriptEnd::Halted {
                    return None;
                }
                start + len
            }
            Command::ClearDownloadBuffer => {
                self.download.clear(&mut self.status);
                cursor + 1
            }
            Command::ClearUploadBuffer => {
                self.upload.clear(&mut self.status);
                cursor + 1
            }
            Command::DownloadData => {
                let consumed = self.download.write_prefixed(&mut self.status, &report[cursor + 1..]);
                cursor + 1 + consumed
            }
            Command::UploadData => {
                self.wait_for_tx_slot(transport);
                self.outbound = [0; REPORT_SIZE];
                let count = self.upload.read_to_slice(&mut self.status, &mut self.outbound[1..], REPORT_SIZE - 1);
                self.outbound[0] = count as u8;
                transport.submit_outbound_report(&self.outbound);
                cursor + 1
            }
            Command::UploadDataNoLen => {
                self.wait_for_tx_slot(transport);
                self.outbound = [0; REPORT_SIZE];
                self.upload.read_to_slice(&mut self.status, &mut self.outbound, REPORT_SIZE);
                transport.submit_outbound_report(&self.outbound);
                cursor + 1
            }
            Command::GetVersion => {
                self.wait_for_tx_slot(transport);
                let version = self.config().version.to_bytes();
                self.outbound[..3].copy_from_slice(&version);
                transport.submit_outbound_report(&self.outbound);
                cursor + 1
            }
            Command::ReadStatus => {
                self.send_status(transport);
                cursor + 1
            }
            Command::NoOperation => cursor + 1,
            Command::SetVdd | Command::SetVpp => cursor + 4,
        };
        Some(next)
    }

    fn wait_for_tx_slot<T: ReportTransport>(&mut self, transport: &mut T) {
        while !transport.report_transmitted() {
            self.wait.wait(0);
        }
    }

    /// Report the status word and clear its one-shot bits.
    fn send_status<T: ReportTransport>(&mut self, transport: &mut T) {
        self.wait_for_tx_slot(transport);
        let vpp_on = self.board.vpp_enabled();
        let mclr_grounded = self.board.mclr_grounded();
        let bytes = self.status.snapshot(vpp_on, mclr_grounded);
        self.outbound[..2].copy_from_slice(&bytes);
        self.board.set_busy_led(false);
        transport.submit_outbound_report(&self.outbound);
    }
}
