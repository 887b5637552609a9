use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

use crate::port::{infallible, IcspPort, Tristate};

/// `IcspPort` on two GPIO pins.  Both pins must switch direction at run time: PGD turns around
/// inside every shift, and SET_ICSP_PINS may float PGC.
pub struct GpioPort<Pgc, Pgd>
    where Pgc: OutputPin + Tristate + ErrorType<Error = core::convert::Infallible>,
          Pgd: OutputPin + InputPin + Tristate + ErrorType<Error = core::convert::Infallible>
{
    clock: Pgc,
    data: Pgd,
}

impl<Pgc, Pgd> GpioPort<Pgc, Pgd>
    where Pgc: OutputPin + Tristate + ErrorType<Error = core::convert::Infallible>,
          Pgd: OutputPin + InputPin + Tristate + ErrorType<Error = core::convert::Infallible>
{
    /// Take ownership of the pins.  Both lines float until a transfer or SET_ICSP_PINS drives
    /// them; the PGC latch is preset low.
    pub fn new(mut clock: Pgc, mut data: Pgd) -> Self {
        infallible(clock.set_low());
        infallible(clock.set_as_input());
        infallible(data.set_as_input());
        GpioPort { clock, data }
    }

    pub fn release(self) -> (Pgc, Pgd) {
        (self.clock, self.data)
    }
}

impl<Pgc, Pgd> IcspPort for GpioPort<Pgc, Pgd>
    where Pgc: OutputPin + Tristate + ErrorType<Error = core::convert::Infallible>,
          Pgd: OutputPin + InputPin + Tristate + ErrorType<Error = core::convert::Infallible>
{
    fn set_clock(&mut self, high: bool) {
        infallible(self.clock.set_state(PinState::from(high)));
    }

    fn set_data(&mut self, high: bool) {
        infallible(self.data.set_state(PinState::from(high)));
    }

    fn set_clock_output(&mut self, output: bool) {
        if output {
            infallible(self.clock.set_as_output());
        } else {
            infallible(self.clock.set_as_input());
        }
    }

    fn set_data_output(&mut self, output: bool) {
        if output {
            infallible(self.data.set_as_output());
        } else {
            infallible(self.data.set_as_input());
        }
    }

    fn data(&mut self) -> bool {
        infallible(self.data.is_high())
    }
}
