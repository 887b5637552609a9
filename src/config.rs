//! Firmware identity and the fixed sizes and timings of the programming engine.

/// Size of a HID report in either direction.
pub const REPORT_SIZE: usize = 64;

/// Capacity of the host-to-device data buffer.
pub const DOWNLOAD_SIZE: usize = 256;

/// Capacity of the device-to-host data buffer.
pub const UPLOAD_SIZE: usize = 128;

/// Milliseconds the target gets to raise PrAcc before a transfer is abandoned.
pub const PE_TIMEOUT_MS: u32 = 1400;

/// Delay timer units per DELAY_SHORT count (6.4us * 7 = 44.8us).
pub const DELAY_SHORT_UNITS: u32 = 7;

/// Delay timer units per DELAY_LONG count (6.4us * 853 ~= 5.46ms).
pub const DELAY_LONG_UNITS: u32 = 853;

/// Firmware version reported by CMD_GET_VERSION.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub dot: u8,
}

impl FirmwareVersion {
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.major, self.minor, self.dot]
    }
}

/// Version the PICkit2 host software expects from a PIC32-capable programmer.
pub const VERSION: FirmwareVersion = FirmwareVersion { major: 2, minor: 32, dot: 0 };

/// Run-time tunables of a `Programmer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub version: FirmwareVersion,
    /// Deadline for `xfer_instruction` / `get_pe_response`, in milliseconds
    pub pe_timeout_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config { version: VERSION, pe_timeout_ms: PE_TIMEOUT_MS }
    }
}
