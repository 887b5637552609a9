//! Bit-serial transport over the 2-wire ICSP port.
//!
//! `shift` is the 4-phase primitive every EJTAG transfer is built from.  Each bit-time is four
//! clock pulses: TDI on PGD, TMS on PGD, PGD turned around to input, and a final pulse during
//! which the target's TDO is sampled.  The target's TAP controller counts these pulses, so the
//! phase order and count must not change.
use crate::port::IcspPort;

/// SET_ICSP_PINS bit: PGC is an input
pub const PINS_PGC_INPUT: u8 = 0x01;
/// SET_ICSP_PINS bit: PGD is an input
pub const PINS_PGD_INPUT: u8 = 0x02;
/// SET_ICSP_PINS bit: PGC output level
pub const PINS_PGC_HIGH: u8 = 0x04;
/// SET_ICSP_PINS bit: PGD output level
pub const PINS_PGD_HIGH: u8 = 0x08;

pub struct Icsp<P: IcspPort> {
    pub port: P,
    pins: u8,
    baud: u8,
}

impl<P: IcspPort> Icsp<P> {
    pub fn new(port: P) -> Self {
        Icsp { port, pins: PINS_PGC_INPUT | PINS_PGD_INPUT, baud: 0 }
    }

    /// Last value written by SET_ICSP_PINS
    pub fn pins(&self) -> u8 {
        self.pins
    }

    /// Last value written by SET_ICSP_SPEED.  Stored for the host; the shift timing does not
    /// depend on it.
    pub fn baud(&self) -> u8 {
        self.baud
    }

    pub fn set_baud(&mut self, baud: u8) {
        self.baud = baud;
    }

    /// Apply a SET_ICSP_PINS override: bit 0/1 select PGC/PGD as inputs, bit 2/3 are the
    /// output levels.
    pub fn set_pins(&mut self, pins: u8) {
        self.pins = pins;
        self.port.set_clock(pins & PINS_PGC_HIGH != 0);
        self.port.set_data(pins & PINS_PGD_HIGH != 0);
        self.port.set_clock_output(pins & PINS_PGC_INPUT == 0);
        self.port.set_data_output(pins & PINS_PGD_INPUT == 0);
    }

    fn pulse(&mut self) {
        self.port.set_clock(true);
        self.port.set_clock(false);
    }

    /// Clock out a byte, least significant bit first.  Returns with PGC low and PGD an input.
    pub fn shift_byte_out(&mut self, byte: u8) {
        self.port.set_data(byte & 1 != 0);
        self.port.set_clock_output(true);
        self.port.set_data_output(true);
        for i in 0..8 {
            self.port.set_data((byte >> i) & 1 != 0);
            self.pulse();
        }
        self.port.set_data(false);
        self.port.set_data_output(false);
    }

    /// 4-phase exchange.  The highest set bit of `tdo` gives the number of bit-times N; bit `i`
    /// of `tdi` and `tms` is driven in bit-time `i`.  Returns the N sampled TDO bits, first
    /// sample in bit 0.
    pub fn shift(&mut self, tms: u32, tdi: u32, tdo: u32) -> u32 {
        let bits = u32::BITS - tdo.leading_zeros();
        let mut out = 0;

        self.port.set_clock(false);
        self.port.set_data(false);
        for i in 0..bits {
            self.port.set_clock_output(true);
            self.port.set_data_output(true);

            self.port.set_data((tdi >> i) & 1 != 0);
            self.pulse();
            self.port.set_data((tms >> i) & 1 != 0);
            self.pulse();

            self.port.set_data_output(false);
            self.pulse();

            self.port.set_clock(true);
            if self.port.data() {
                out |= 1 << i;
            }
            self.port.set_clock(false);
            self.port.set_data(false);
        }
        self.port.set_data_output(false);
        out
    }

    /// Clock `bits` TMS values out of `mode` with TDI held low.  A bit count outside 1..=32
    /// shifts nothing.
    pub fn set_mode(&mut self, bits: u8, mode: u32) {
        let mark = u32::from(bits)
            .checked_sub(1)
            .and_then(|n| 1u32.checked_shl(n))
            .unwrap_or(0);
        self.shift(mode, 0, mark);
    }

    /// Load the 5-bit TAP instruction register.
    pub fn send_command(&mut self, command: u8) {
        self.shift(0x303, u32::from(command) << 4, 0x400);
    }

    /// 8-bit data register exchange.
    pub fn xfer_data8(&mut self, data: u8) -> u8 {
        (self.shift(0xc01, u32::from(data) << 3, 0x1000) >> 2) as u8
    }
}
