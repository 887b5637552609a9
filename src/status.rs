//! The 16-bit status word reported to the host by CMD_READ_STATUS.  Every failure inside the
//! engine ends up here as a latched bit; the host polls for them.
use bitflags::bitflags;

bitflags! {
    /// Status bits.  The low byte mirrors hardware conditions, the high byte holds session
    /// events.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Status: u16 {
        const VDD_GND_ON = 1 << 0;
        const VDD_ON = 1 << 1;
        /// MCLR held low by the programmer
        const VPP_GND_ON = 1 << 2;
        /// Vpp line driven
        const VPP_ON = 1 << 3;
        const VDD_ERROR = 1 << 4;
        const VPP_ERROR = 1 << 5;
        const BUTTON_PRESSED = 1 << 6;

        const RESET = 1 << 8;
        const UART_MODE = 1 << 9;
        /// Target did not answer an EJTAG transfer in time
        const ICD_TIMEOUT = 1 << 10;
        const UPLOAD_FULL = 1 << 11;
        const DOWNLOAD_EMPTY = 1 << 12;
        const EMPTY_SCRIPT = 1 << 13;
        /// Reserved: nothing in the wired opcode set raises it
        const SCRIPT_BUF_OVRFLOW = 1 << 14;
        /// Reserved: nothing in the wired opcode set raises it
        const DOWNLOAD_OVRFLOW = 1 << 15;
    }
}

impl Status {
    /// Power-on value
    pub const RESET_MASK: Status = Status::from_bits_retain(0x0103);
    /// Error and event bits of the high byte
    pub const ERR_MASK: Status = Status::from_bits_retain(0xFE00);
    /// Bits that survive a status report
    pub const PERSISTENT_MASK: Status = Status::from_bits_retain(0x008F);
    /// Bits re-read from the pins right before a report
    pub const LIVE_MASK: Status = Status::VPP_GND_ON.union(Status::VPP_ON);
}

/// Owner of the status word for the lifetime of the firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusRegister {
    bits: Status,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegister {
    pub const fn new() -> Self {
        StatusRegister { bits: Status::RESET_MASK }
    }

    pub fn bits(&self) -> Status {
        self.bits
    }

    pub fn contains(&self, flags: Status) -> bool {
        self.bits.contains(flags)
    }

    pub fn set(&mut self, flags: Status) {
        self.bits.insert(flags);
    }

    pub fn clear(&mut self, flags: Status) {
        self.bits.remove(flags);
    }

    /// Produce the two report bytes.  VppOn and VppGndOn are taken from the live pin state
    /// first, the word is serialised little-endian, and afterwards only the persistent bits
    /// are kept.  Turning the busy LED off is the caller's job.
    pub fn snapshot(&mut self, vpp_on: bool, mclr_grounded: bool) -> [u8; 2] {
        self.bits.remove(Status::LIVE_MASK);
        self.bits.set(Status::VPP_ON, vpp_on);
        self.bits.set(Status::VPP_GND_ON, mclr_grounded);

        let out = self.bits.bits().to_le_bytes();
        self.bits &= Status::PERSISTENT_MASK;
        out
    }
}
