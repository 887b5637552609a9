//! The interface to the USB HID stack.  Enumeration and endpoint buffer handling live outside
//! this crate; the engine only needs to know when a report came in, when the IN slot is free,
//! and how to hand reports across.
use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::REPORT_SIZE;

pub type Report = [u8; REPORT_SIZE];

pub trait ReportTransport {
    /// An OUT report is waiting to be processed
    fn report_received(&self) -> bool;
    /// The previous IN report has been collected by the host
    fn report_transmitted(&self) -> bool;
    fn take_inbound_report(&mut self) -> Report;
    /// Re-arm the OUT endpoint for the next report
    fn release_inbound_report(&mut self);
    fn submit_outbound_report(&mut self, report: &Report);
}

/// Report-ready bookkeeping shared between the USB interrupt and the polling loop.
///
/// Every field has exactly one writer.  The interrupt counts completed transactions, the
/// polling side counts the reports it has consumed or queued, and readiness is the difference
/// between the two.  No read-modify-write crosses contexts, so no critical section is needed.
pub struct ReportFlags {
    // written by the USB interrupt
    out_completed: AtomicU8,
    in_completed: AtomicU8,
    // written by the polling loop
    out_consumed: AtomicU8,
    in_queued: AtomicU8,
}

impl Default for ReportFlags {
    fn default() -> Self {
        Self::new()
    }
}

fn bump(counter: &AtomicU8) {
    let next = counter.load(Ordering::Relaxed).wrapping_add(1);
    counter.store(next, Ordering::Release);
}

impl ReportFlags {
    pub const fn new() -> Self {
        ReportFlags {
            out_completed: AtomicU8::new(0),
            in_completed: AtomicU8::new(0),
            out_consumed: AtomicU8::new(0),
            in_queued: AtomicU8::new(0),
        }
    }

    /// USB interrupt: an OUT transaction filled the receive buffer.
    pub fn on_out_complete(&self) {
        bump(&self.out_completed);
    }

    /// USB interrupt: the host collected the IN report.
    pub fn on_in_complete(&self) {
        bump(&self.in_completed);
    }

    /// Polling loop: the received report has been processed and the buffer re-armed.
    pub fn consume_out(&self) {
        bump(&self.out_consumed);
    }

    /// Polling loop: an IN report has been queued.
    pub fn queue_in(&self) {
        bump(&self.in_queued);
    }

    pub fn received(&self) -> bool {
        self.out_completed.load(Ordering::Acquire) != self.out_consumed.load(Ordering::Acquire)
    }

    pub fn transmitted(&self) -> bool {
        self.in_completed.load(Ordering::Acquire) == self.in_queued.load(Ordering::Acquire)
    }
}
