//! Time keeping and the cooperative wait primitive.
//!
//! Nothing in the engine sleeps.  Every place that has to wait (PrAcc polling, script delays,
//! loop iterations, a busy transmit slot) spins on `Wait`, and every spin calls the board's
//! poll hook so button scanning and LED blinking keep running while a script is blocked.
use core::sync::atomic::{AtomicU32, Ordering};

/// Monotonic millisecond counter.
pub trait Clock {
    fn now_millis(&self) -> u32;
}

/// Work the outer loop wants done whenever the engine waits.  `tick` is the current
/// millisecond count.
///
/// The hook runs on every spin of a wait, so it is usually called many times within the same
/// millisecond.  Work meant to happen once per tick (button debouncing, LED blinking) has to
/// remember the last `tick` it handled and return early on a repeat.
pub trait Poll {
    fn poll(&mut self, tick: u32);
}

impl<F: FnMut(u32)> Poll for F {
    fn poll(&mut self, tick: u32) {
        self(tick)
    }
}

/// Free-running hardware counter used for the short script delays.  One unit is 6.4us
/// (40 MHz peripheral clock, prescaler 256).
pub trait DelayTimer {
    /// Reset the count to zero and start counting
    fn restart(&mut self);
    fn count(&self) -> u32;
    fn stop(&mut self);
}

/// The suspension points used by the transfer layer, the interpreter and the dispatcher.
pub trait Wait {
    fn now_millis(&self) -> u32;

    /// Run the poll hook once and return.
    fn yield_now(&mut self);

    /// Yield once, then keep yielding until `ticks` millisecond boundaries have passed.
    /// `wait(0)` is a single yield.
    fn wait(&mut self, ticks: u32) {
        let mut last = self.now_millis();
        self.yield_now();
        for _ in 0..ticks {
            while self.now_millis() == last {
                self.yield_now();
            }
            last = self.now_millis();
        }
    }

    /// Busy-wait `units` delay timer units, yielding on each spin.
    fn delay_units(&mut self, units: u32);
}

/// `Wait` built from the board's clock, delay timer and poll hook.
pub struct CooperativeWait<C, T, H> where C: Clock, T: DelayTimer, H: Poll {
    clock: C,
    timer: T,
    hook: H,
}

impl<C, T, H> CooperativeWait<C, T, H> where C: Clock, T: DelayTimer, H: Poll {
    pub fn new(clock: C, timer: T, hook: H) -> Self {
        CooperativeWait { clock, timer, hook }
    }
}

impl<C, T, H> Wait for CooperativeWait<C, T, H> where C: Clock, T: DelayTimer, H: Poll {
    fn now_millis(&self) -> u32 {
        self.clock.now_millis()
    }

    fn yield_now(&mut self) {
        let tick = self.clock.now_millis();
        self.hook.poll(tick);
    }

    fn delay_units(&mut self, units: u32) {
        self.timer.restart();
        while self.timer.count() < units {
            self.yield_now();
        }
        self.timer.stop();
    }
}

/// Millisecond tick shared with the timer interrupt.  Only `on_tick` (the ISR) writes it; the
/// polling side only reads.
pub struct TickCounter {
    tick: AtomicU32,
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickCounter {
    pub const fn new() -> Self {
        TickCounter { tick: AtomicU32::new(0) }
    }

    /// Advance by one millisecond.  Call from the timer interrupt only.
    pub fn on_tick(&self) {
        // single writer, so a plain load/store pair is enough
        let next = self.tick.load(Ordering::Relaxed).wrapping_add(1);
        self.tick.store(next, Ordering::Release);
    }
}

impl Clock for TickCounter {
    fn now_millis(&self) -> u32 {
        self.tick.load(Ordering::Acquire)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u32 {
        (**self).now_millis()
    }
}
