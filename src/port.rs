//! The two ICSP lines, PGC (clock) and PGD (bidirectional data).  Everything above this layer
//! talks to the target through the `IcspPort` trait, so it runs the same against real pins and
//! against a simulated target.
pub mod gpio;

use core::convert::Infallible;
use embedded_hal::digital::ErrorType;

pub trait IcspPort {
    /// Drive PGC high or low.  Only has an effect while PGC is an output.
    fn set_clock(&mut self, high: bool);
    /// Set the PGD output latch.  Only visible on the line while PGD is an output.
    fn set_data(&mut self, high: bool);
    /// Switch PGC between output (`true`) and input.
    fn set_clock_output(&mut self, output: bool);
    /// Switch PGD between output (`true`) and input.
    fn set_data_output(&mut self, output: bool);
    /// Sample the level on PGD.
    fn data(&mut self) -> bool;
}

/// A pin whose direction can be changed at run time.  `embedded-hal` 1.0 has no trait for
/// this, so board support code implements it next to `OutputPin` / `InputPin`.
pub trait Tristate: ErrorType {
    fn set_as_output(&mut self) -> Result<(), Self::Error>;
    fn set_as_input(&mut self) -> Result<(), Self::Error>;
}

/// Unwrap the result of a pin operation that cannot fail.
pub(crate) fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => match e {},
    }
}
