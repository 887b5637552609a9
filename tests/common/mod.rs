//! Software stand-ins for the hardware around the engine.
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use pk2_icsp::board::Board;
use pk2_icsp::config::REPORT_SIZE;
use pk2_icsp::port::IcspPort;
use pk2_icsp::timing::Wait;
use pk2_icsp::transport::{Report, ReportTransport};
use pk2_icsp::Programmer;

/// PGD state seen by the target on a rising PGC edge.  `data` is only ever set while the
/// programmer drives the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub data_output: bool,
    pub data: bool,
}

/// A target that answers from a queue of TDO bits and records every clock edge.
pub struct SimTarget {
    pub clock: bool,
    pub data: bool,
    pub clock_output: bool,
    pub data_output: bool,
    pub edges: Vec<Edge>,
    pub tdo: VecDeque<bool>,
    /// Level presented once `tdo` runs dry
    pub idle_tdo: bool,
    pub samples: usize,
}

impl SimTarget {
    pub fn new(idle_tdo: bool) -> Self {
        SimTarget {
            clock: false,
            data: false,
            clock_output: false,
            data_output: false,
            edges: Vec::new(),
            tdo: VecDeque::new(),
            idle_tdo,
            samples: 0,
        }
    }

    pub fn queue_tdo(&mut self, bits: &[bool]) {
        self.tdo.extend(bits.iter().copied());
    }

    /// Data levels driven on rising edges while PGD was an output
    pub fn driven_bits(&self) -> Vec<bool> {
        self.edges.iter().filter(|e| e.data_output).map(|e| e.data).collect()
    }
}

impl IcspPort for SimTarget {
    fn set_clock(&mut self, high: bool) {
        if high && !self.clock && self.clock_output {
            let data = self.data_output && self.data;
            self.edges.push(Edge { data_output: self.data_output, data });
        }
        self.clock = high;
    }

    fn set_data(&mut self, high: bool) {
        self.data = high;
    }

    fn set_clock_output(&mut self, output: bool) {
        self.clock_output = output;
    }

    fn set_data_output(&mut self, output: bool) {
        self.data_output = output;
    }

    fn data(&mut self) -> bool {
        self.samples += 1;
        self.tdo.pop_front().unwrap_or(self.idle_tdo)
    }
}

#[derive(Default)]
pub struct SimBoard {
    pub vpp: bool,
    pub mclr_low: bool,
    pub led: bool,
    pub button: bool,
}

impl Board for SimBoard {
    fn set_vpp(&mut self, on: bool) {
        self.vpp = on;
    }

    fn set_mclr_ground(&mut self, on: bool) {
        self.mclr_low = on;
        if on {
            self.vpp = true;
        }
    }

    fn vpp_enabled(&mut self) -> bool {
        self.vpp
    }

    fn mclr_grounded(&mut self) -> bool {
        self.mclr_low
    }

    fn set_busy_led(&mut self, on: bool) {
        self.led = on;
    }

    fn button_pressed(&mut self) -> bool {
        self.button
    }
}

/// Manual clock: every yield advances time by one millisecond.
#[derive(Default)]
pub struct SimWait {
    pub now: u32,
    pub yields: u32,
    pub delayed_units: Vec<u32>,
}

impl Wait for SimWait {
    fn now_millis(&self) -> u32 {
        self.now
    }

    fn yield_now(&mut self) {
        self.yields += 1;
        self.now = self.now.wrapping_add(1);
    }

    fn delay_units(&mut self, units: u32) {
        self.delayed_units.push(units);
        self.yield_now();
    }
}

/// In-memory HID link.  After each submitted report the IN slot stays busy for
/// `busy_per_report` checks of `report_transmitted`.
#[derive(Default)]
pub struct SimHid {
    pub inbound: VecDeque<Report>,
    pub outbound: Vec<Report>,
    pub released: usize,
    pub busy_per_report: u32,
    /// Remaining `report_transmitted` checks that report the slot as busy
    pub busy: Cell<u32>,
    pub busy_checks: Cell<u32>,
}

impl SimHid {
    /// Queue a report, zero padded to the full report size.
    pub fn send(&mut self, bytes: &[u8]) {
        let mut report = [0; REPORT_SIZE];
        report[..bytes.len()].copy_from_slice(bytes);
        self.inbound.push_back(report);
    }

    /// A link whose IN slot is busy for `checks` checks now and after every report.
    pub fn with_busy_slot(checks: u32) -> Self {
        SimHid { busy_per_report: checks, busy: Cell::new(checks), ..Default::default() }
    }
}

impl ReportTransport for SimHid {
    fn report_received(&self) -> bool {
        !self.inbound.is_empty()
    }

    fn report_transmitted(&self) -> bool {
        let busy = self.busy.get();
        if busy == 0 {
            return true;
        }
        self.busy.set(busy - 1);
        self.busy_checks.set(self.busy_checks.get() + 1);
        false
    }

    fn take_inbound_report(&mut self) -> Report {
        self.inbound.pop_front().unwrap_or([0; REPORT_SIZE])
    }

    fn release_inbound_report(&mut self) {
        self.released += 1;
    }

    fn submit_outbound_report(&mut self, report: &Report) {
        assert_eq!(self.busy.get(), 0, "report submitted while the IN slot was busy");
        self.outbound.push(*report);
        self.busy.set(self.busy_per_report);
    }
}

pub type SimProgrammer = Programmer<SimTarget, SimBoard, SimWait>;

pub fn programmer(idle_tdo: bool) -> SimProgrammer {
    Programmer::new(SimTarget::new(idle_tdo), SimBoard::default(), SimWait::default())
}
