//! EJTAG transfers on top of the 4-phase ICSP shift: 32-bit data register exchanges, fast
//! data, and handing instructions to (or collecting responses from) the target's processor
//! access port.
//!
//! Timeouts are not errors here.  A transfer that gives up raises `ICD_TIMEOUT` and returns 0;
//! the host finds out on its next status read.
use log::warn;

use crate::icsp::Icsp;
use crate::port::IcspPort;
use crate::status::{Status, StatusRegister};
use crate::timing::Wait;

/// TAP instructions understood by the PIC32 ETAP.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JtagCommand {
    EtapData = 0x09,
    EtapControl = 0x0a,
}

impl From<JtagCommand> for u8 {
    fn from(c: JtagCommand) -> u8 {
        c as u8
    }
}

/// EJTAG Control register bits
pub mod ejtag_control {
    /// Pending processor access
    pub const PRACC: u32 = 1 << 18;
    /// Value written while polling: PrAcc, ProbEn, ProbTrap and EjtagBrk kept set
    pub const POLL: u32 = 0x0004_d000;
    /// Value written to finish a processor access: ProbEn and ProbTrap
    pub const RELEASE: u32 = 0x0000_c000;
}

/// Fast data acknowledgement bit in the first half of the response
const FASTDATA_ACK: u32 = 1 << 2;

pub struct Ejtag<'a, P: IcspPort, W: Wait> {
    pub icsp: &'a mut Icsp<P>,
    status: &'a mut StatusRegister,
    wait: &'a mut W,
    timeout_ms: u32,
}

impl<'a, P: IcspPort, W: Wait> Ejtag<'a, P, W> {
    pub fn new(icsp: &'a mut Icsp<P>, status: &'a mut StatusRegister, wait: &'a mut W, timeout_ms: u32) -> Self {
        Ejtag { icsp, status, wait, timeout_ms }
    }

    pub fn send_command(&mut self, command: JtagCommand) {
        self.icsp.send_command(command.into());
    }

    /// 32-bit data register exchange, done as two 16-bit halves.
    pub fn xfer_data32(&mut self, data: u32) -> u32 {
        let lower = self.icsp.shift(1, (data & 0xffff) << 3, 0x40000);
        let upper = self.icsp.shift(0x18000, data >> 16, 0x20000);
        (lower >> 2) | (upper << 17)
    }

    /// Fast data transfer.  When the target does not acknowledge the first half the TAP is
    /// returned to Run-Test/Idle, `ICD_TIMEOUT` is raised and 0 returned.
    pub fn xfer_fast_data32(&mut self, data: u32) -> u32 {
        let lower = self.icsp.shift(1, (data & 0xffff) << 4, 0x80000);
        if lower & FASTDATA_ACK == 0 {
            self.icsp.set_mode(5, 0x1f);
            self.status.set(Status::ICD_TIMEOUT);
            warn!("fast data not acknowledged");
            return 0;
        }
        let upper = self.icsp.shift(0x18000, data >> 16, 0x20000);
        (lower >> 3) | (upper << 17)
    }

    /// Poll the control register until the target requests a processor access.  Gives up once
    /// the deadline has passed.
    fn wait_for_pracc(&mut self) -> bool {
        let start = self.wait.now_millis();
        self.send_command(JtagCommand::EtapControl);
        while self.xfer_data32(ejtag_control::POLL) & ejtag_control::PRACC == 0 {
            self.wait.wait(0);
            if self.wait.now_millis().wrapping_sub(start) >= self.timeout_ms {
                self.status.set(Status::ICD_TIMEOUT);
                warn!("PrAcc timeout after {} ms", self.timeout_ms);
                return false;
            }
        }
        true
    }

    /// Exchange `data` through the ETAP data register once PrAcc is up, then release the access.
    fn processor_access(&mut self, data: u32) -> u32 {
        if !self.wait_for_pracc() {
            return 0;
        }
        self.send_command(JtagCommand::EtapData);
        let response = self.xfer_data32(data);
        self.send_command(JtagCommand::EtapControl);
        self.xfer_data32(ejtag_control::RELEASE);
        response
    }

    /// Hand one instruction to the target core.
    pub fn xfer_instruction(&mut self, instruction: u32) -> u32 {
        self.processor_access(instruction)
    }

    /// Collect one word from the programming executive.
    pub fn get_pe_response(&mut self) -> u32 {
        self.processor_access(0)
    }
}
