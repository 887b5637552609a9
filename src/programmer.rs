//! The programmer context: everything the dispatcher, the interpreter and the transfer layer
//! share, owned in one place and passed around by `&mut`.
use crate::board::Board;
use crate::config::{Config, DOWNLOAD_SIZE, REPORT_SIZE, UPLOAD_SIZE};
use crate::ejtag::Ejtag;
use crate::icsp::Icsp;
use crate::port::IcspPort;
use crate::ringbuf::RingBuffer;
use crate::script::ScriptEngine;
use crate::status::{Status, StatusRegister};
use crate::timing::Wait;
use crate::transport::Report;

pub struct Programmer<P, B, W> where P: IcspPort, B: Board, W: Wait {
    pub icsp: Icsp<P>,
    pub board: B,
    pub wait: W,
    pub status: StatusRegister,
    /// Host to device data
    pub download: RingBuffer<DOWNLOAD_SIZE>,
    /// Device to host data
    pub upload: RingBuffer<UPLOAD_SIZE>,
    pub(crate) engine: ScriptEngine,
    pub(crate) outbound: Report,
    pub(crate) button_down: bool,
    config: Config,
}

impl<P, B, W> Programmer<P, B, W> where P: IcspPort, B: Board, W: Wait {
    pub fn new(port: P, board: B, wait: W) -> Self {
        Self::with_config(port, board, wait, Config::default())
    }

    pub fn with_config(port: P, mut board: B, wait: W, config: Config) -> Self {
        board.set_busy_led(false);
        // Both buffers latch the same two status bits, matching what the host software expects.
        Programmer {
            icsp: Icsp::new(port),
            board,
            wait,
            status: StatusRegister::new(),
            download: RingBuffer::new(Status::UPLOAD_FULL, Status::DOWNLOAD_EMPTY),
            upload: RingBuffer::new(Status::UPLOAD_FULL, Status::DOWNLOAD_EMPTY),
            engine: ScriptEngine::default(),
            outbound: [0; REPORT_SIZE],
            button_down: false,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the EJTAG transfer layer.
    pub fn ejtag(&mut self) -> Ejtag<'_, P, W> {
        Ejtag::new(&mut self.icsp, &mut self.status, &mut self.wait, self.config.pe_timeout_ms)
    }
}
