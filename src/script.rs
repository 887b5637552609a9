//! The script interpreter.
//!
//! A script is a run of instructions, each an opcode byte followed by the operand bytes that
//! opcode implies.  The interpreter stops at the end of the script, or as soon as an
//! instruction cannot be decoded or asks to abort.
//!
//! `LOOP offset count` repeats the `offset` bytes in front of it so that they run `count`
//! times in total.  The first time the loop is reached it records the target and the number of
//! repeats still owed and jumps back; each later arrival at the same instruction yields once,
//! decrements the count, and jumps again until the count reaches zero, after which execution
//! continues behind the loop.  A count of 0 or 1 falls straight through.  There is a single
//! loop slot: reaching a different LOOP while one is in flight aborts the script, so loops
//! cannot be nested.
pub mod opcode;

use log::{debug, trace};

use crate::board::Board;
use crate::config::{DELAY_LONG_UNITS, DELAY_SHORT_UNITS};
use crate::port::IcspPort;
use crate::programmer::Programmer;
use crate::timing::Wait;

pub use opcode::{DecodeError, Instruction};

/// How a script run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptEnd {
    /// Ran off the end of the script
    Completed,
    /// Stopped by an undecodable or aborting instruction
    Halted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LoopState {
    /// Offset of the LOOP opcode that owns this state
    origin: usize,
    target: usize,
    remaining: u8,
}

/// Interpreter state that outlives a single instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScriptEngine {
    active_loop: Option<LoopState>,
}

impl ScriptEngine {
    /// Next program counter for the LOOP at `pc`, or `None` to abort.
    fn step_loop<W: Wait>(&mut self, wait: &mut W, pc: usize, offset: u8, count: u8) -> Option<usize> {
        let next = pc + 3;
        match self.active_loop.as_mut() {
            Some(state) if state.origin == pc => {
                wait.wait(0);
                state.remaining -= 1;
                if state.remaining == 0 {
                    self.active_loop = None;
                    Some(next)
                } else {
                    Some(state.target)
                }
            }
            Some(state) => {
                debug!("nested loop at {} while loop at {} is active", pc, state.origin);
                None
            }
            None => {
                let target = pc.checked_sub(usize::from(offset))?;
                // the straight-line pass was the first run of the body
                if count <= 1 {
                    return Some(next);
                }
                self.active_loop = Some(LoopState { origin: pc, target, remaining: count - 1 });
                Some(target)
            }
        }
    }
}

impl<P, B, W> Programmer<P, B, W> where P: IcspPort, B: Board, W: Wait {
    /// Interpret `script` from its first byte.
    pub fn run_script(&mut self, script: &[u8]) -> ScriptEnd {
        self.engine = ScriptEngine::default();
        let mut pc = 0;
        while pc < script.len() {
            let insn = match Instruction::decode(&script[pc..]) {
                Ok(insn) => insn,
                Err(e) => {
                    debug!("script halted at offset {}: {}", pc, e);
                    return ScriptEnd::Halted;
                }
            };
            trace!("{:3}: {:?}", pc, insn);
            match self.execute(insn, pc) {
                Some(next) => pc = next,
                None => return ScriptEnd::Halted,
            }
        }
        ScriptEnd::Completed
    }

    /// Run one instruction located at `pc`.  Returns the offset of the next one.
    fn execute(&mut self, insn: Instruction, pc: usize) -> Option<usize> {
        match insn {
            Instruction::WaitPeResponse => {
                self.ejtag().get_pe_response();
            }
            Instruction::GetPeResponse => {
                let response = self.ejtag().get_pe_response();
                self.upload.write_u32(&mut self.status, response);
            }
            Instruction::XferInstructionBuf => {
                let instruction = self.download.read_u32(&mut self.status);
                self.ejtag().xfer_instruction(instruction);
            }
            Instruction::FastDataBuf => {
                let data = self.download.read_u32(&mut self.status);
                self.ejtag().xfer_fast_data32(data);
            }
            Instruction::FastDataLit(data) => {
                self.ejtag().xfer_fast_data32(data);
            }
            Instruction::XferData32Lit(data) => {
                let response = self.ejtag().xfer_data32(data);
                self.upload.write_u32(&mut self.status, response);
            }
            Instruction::XferData8Lit(data) => {
                let response = self.icsp.xfer_data8(data);
                self.upload.write_byte(&mut self.status, response);
            }
            Instruction::SendCommand(command) => self.icsp.send_command(command),
            Instruction::SetMode { bits, mode } => self.icsp.set_mode(bits, u32::from(mode)),
            Instruction::DelayShort(count) => self.wait.delay_units(u32::from(count) * DELAY_SHORT_UNITS),
            Instruction::DelayLong(count) => self.wait.delay_units(u32::from(count) * DELAY_LONG_UNITS),
            Instruction::Loop { offset, count } => {
                return self.engine.step_loop(&mut self.wait, pc, offset, count);
            }
            Instruction::SetIcspSpeed(baud) => self.icsp.set_baud(baud),
            Instruction::WriteByteLiteral(byte) => self.icsp.shift_byte_out(byte),
            Instruction::SetIcspPins(pins) => self.icsp.set_pins(pins),
            Instruction::BusyLed(on) => self.board.set_busy_led(on),
            Instruction::MclrGround(on) => self.board.set_mclr_ground(on),
            Instruction::Vpp(on) => self.board.set_vpp(on),
            Instruction::Nop(_) => {}
        }
        Some(pc + insn.encoded_len())
    }
}
