//! This crate is the programming engine of a PICkit2-style USB programmer for PIC32 targets.
//! It sits between the USB HID stack and two GPIO lines, and can be used at several levels.
//!
//! At the lowest level, an `IcspPort` drives the PGC/PGD pair.  `port::gpio::GpioPort`
//! implements it on top of `embedded-hal` pins, and a software model of a target can implement
//! it just as well.  `Icsp` builds the 4-phase 2-wire JTAG shift on that port, and `Ejtag`
//! builds 32-bit data register, fast data and processor access transfers on the shift.
//!
//! The host does not call those directly.  It sends HID reports holding commands; the
//! `Programmer` decodes them, streams data through the download and upload ring buffers, and
//! runs byte-code scripts whose instructions call into the transfer layer.  Failures are never
//! returned: they are latched in the status word, which the host polls.
//!
//! Waiting is cooperative.  The engine never sleeps; every wait spins on the `Wait` trait,
//! which runs the board's poll hook on every spin.
//!
//! # Example
//! ```ignore
//! use pk2_icsp::port::gpio::GpioPort;
//! use pk2_icsp::board::HalBoard;
//! use pk2_icsp::timing::CooperativeWait;
//! use pk2_icsp::Programmer;
//!
//! let port = GpioPort::new(pgc, pgd);
//! let board = HalBoard::new(mclr, led, button);
//! let wait = CooperativeWait::new(&TICKS, timer1, |tick: u32| scan_button(tick));
//! let mut programmer = Programmer::new(port, board, wait);
//! loop {
//!     programmer.wait.wait(0);
//!     programmer.process_one_cycle(&mut hid);
//! }
//! ```

#![no_std]

pub mod board;
pub mod config;
pub mod dispatch;
pub mod ejtag;
pub mod icsp;
pub mod port;
pub mod programmer;
pub mod ringbuf;
pub mod script;
pub mod status;
pub mod timing;
pub mod transport;

pub use ejtag::Ejtag;
pub use icsp::Icsp;
pub use programmer::Programmer;
pub use status::{Status, StatusRegister};
