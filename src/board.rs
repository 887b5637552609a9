//! Board pins outside the ICSP pair: the shared Vpp/MCLR line, the busy LED and the push button.
//!
//! On this board Vpp and MCLR share one line.  Enabling Vpp makes the line an output; its
//! latch selects between MCLR driven high (released) and MCLR held low.
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

use crate::port::{infallible, Tristate};

pub trait Board {
    /// Drive (`true`) or float the Vpp/MCLR line.
    fn set_vpp(&mut self, on: bool);
    /// Hold MCLR low (`true`) or release it high.  Holding it low also drives the line.
    fn set_mclr_ground(&mut self, on: bool);
    fn vpp_enabled(&mut self) -> bool;
    fn mclr_grounded(&mut self) -> bool;
    fn set_busy_led(&mut self, on: bool);
    /// Raw button level, `true` while held down
    fn button_pressed(&mut self) -> bool;
}

/// `Board` over `embedded-hal` pins.  The button is active low with a pull-up.
pub struct HalBoard<Mclr, Led, Button>
    where Mclr: StatefulOutputPin + Tristate + ErrorType<Error = Infallible>,
          Led: OutputPin + ErrorType<Error = Infallible>,
          Button: InputPin + ErrorType<Error = Infallible>
{
    mclr: Mclr,
    led: Led,
    button: Button,
    vpp_on: bool,
}

impl<Mclr, Led, Button> HalBoard<Mclr, Led, Button>
    where Mclr: StatefulOutputPin + Tristate + ErrorType<Error = Infallible>,
          Led: OutputPin + ErrorType<Error = Infallible>,
          Button: InputPin + ErrorType<Error = Infallible>
{
    /// Power-on state: MCLR latch high, line floating (Vpp off), LED off.
    pub fn new(mut mclr: Mclr, mut led: Led, button: Button) -> Self {
        infallible(mclr.set_high());
        infallible(mclr.set_as_input());
        infallible(led.set_low());
        HalBoard { mclr, led, button, vpp_on: false }
    }
}

impl<Mclr, Led, Button> Board for HalBoard<Mclr, Led, Button>
    where Mclr: StatefulOutputPin + Tristate + ErrorType<Error = Infallible>,
          Led: OutputPin + ErrorType<Error = Infallible>,
          Button: InputPin + ErrorType<Error = Infallible>
{
    fn set_vpp(&mut self, on: bool) {
        if on {
            infallible(self.mclr.set_as_output());
        } else {
            infallible(self.mclr.set_as_input());
        }
        self.vpp_on = on;
    }

    fn set_mclr_ground(&mut self, on: bool) {
        if on {
            infallible(self.mclr.set_low());
            self.set_vpp(true);
        } else {
            infallible(self.mclr.set_high());
        }
    }

    fn vpp_enabled(&mut self) -> bool {
        self.vpp_on
    }

    fn mclr_grounded(&mut self) -> bool {
        infallible(self.mclr.is_set_low())
    }

    fn set_busy_led(&mut self, on: bool) {
        if on {
            infallible(self.led.set_high());
        } else {
            infallible(self.led.set_low());
        }
    }

    fn button_pressed(&mut self) -> bool {
        infallible(self.button.is_low())
    }
}
