//! Script opcode numbering and instruction decoding.
//!
//! Opcodes run from `BASE` (0xB3) to 0xFF.  Only the 2-wire JTAG subset and the pin, delay
//! and loop instructions are implemented; every other value decodes to `Unsupported` and
//! stops the script.
use thiserror::Error;

pub const JT2_PE_PROG_RESP: u8 = 0xB3;
pub const JT2_WAIT_PE_RESP: u8 = 0xB4;
pub const JT2_GET_PE_RESP: u8 = 0xB5;
pub const JT2_XFERINST_BUF: u8 = 0xB6;
pub const JT2_XFRFASTDAT_BUF: u8 = 0xB7;
pub const JT2_XFRFASTDAT_LIT: u8 = 0xB8;
pub const JT2_XFERDATA32_LIT: u8 = 0xB9;
pub const JT2_XFERDATA8_LIT: u8 = 0xBA;
pub const JT2_SENDCMD: u8 = 0xBB;
pub const JT2_SETMODE: u8 = 0xBC;
pub const UNIO_TX_RX: u8 = 0xBD;
pub const UNIO_TX: u8 = 0xBE;
pub const MEASURE_PULSE: u8 = 0xBF;
pub const ICDSLAVE_TX_BUF_BL: u8 = 0xC0;
pub const ICDSLAVE_TX_LIT_BL: u8 = 0xC1;
pub const ICDSLAVE_RX_BL: u8 = 0xC2;
pub const SPI_RDWR_BYTE_BUF: u8 = 0xC3;
pub const SPI_RDWR_BYTE_LIT: u8 = 0xC4;
pub const SPI_RD_BYTE_BUF: u8 = 0xC5;
pub const SPI_WR_BYTE_BUF: u8 = 0xC6;
pub const SPI_WR_BYTE_LIT: u8 = 0xC7;
pub const I2C_RD_BYTE_NACK: u8 = 0xC8;
pub const I2C_RD_BYTE_ACK: u8 = 0xC9;
pub const I2C_WR_BYTE_BUF: u8 = 0xCA;
pub const I2C_WR_BYTE_LIT: u8 = 0xCB;
pub const I2C_STOP: u8 = 0xCC;
pub const I2C_START: u8 = 0xCD;
pub const AUX_STATE_BUFFER: u8 = 0xCE;
pub const SET_AUX: u8 = 0xCF;
pub const WRITE_BITS_BUF_HLD: u8 = 0xD0;
pub const WRITE_BITS_LIT_HLD: u8 = 0xD1;
pub const CONST_WRITE_DL: u8 = 0xD2;
pub const WRITE_BUFBYTE_W: u8 = 0xD3;
pub const WRITE_BUFWORD_W: u8 = 0xD4;
pub const RD2_BITS_BUFFER: u8 = 0xD5;
pub const RD2_BYTE_BUFFER: u8 = 0xD6;
pub const VISI24: u8 = 0xD7;
pub const NOP24: u8 = 0xD8;
pub const COREINST24: u8 = 0xD9;
pub const COREINST18: u8 = 0xDA;
pub const POP_DOWNLOAD: u8 = 0xDB;
pub const ICSP_STATES_BUFFER: u8 = 0xDC;
pub const LOOPBUFFER: u8 = 0xDD;
pub const ICDSLAVE_TX_BUF: u8 = 0xDE;
pub const ICDSLAVE_TX_LIT: u8 = 0xDF;
pub const ICDSLAVE_RX: u8 = 0xE0;
pub const POKE_SFR: u8 = 0xE1;
pub const PEEK_SFR: u8 = 0xE2;
pub const EXIT_SCRIPT: u8 = 0xE3;
pub const GOTO_INDEX: u8 = 0xE4;
pub const IF_GT_GOTO: u8 = 0xE5;
pub const IF_EQ_GOTO: u8 = 0xE6;
pub const DELAY_SHORT: u8 = 0xE7;
pub const DELAY_LONG: u8 = 0xE8;
pub const LOOP: u8 = 0xE9;
pub const SET_ICSP_SPEED: u8 = 0xEA;
pub const READ_BITS: u8 = 0xEB;
pub const READ_BITS_BUFFER: u8 = 0xEC;
pub const WRITE_BITS_BUFFER: u8 = 0xED;
pub const WRITE_BITS_LITERAL: u8 = 0xEE;
pub const READ_BYTE: u8 = 0xEF;
pub const READ_BYTE_BUFFER: u8 = 0xF0;
pub const WRITE_BYTE_BUFFER: u8 = 0xF1;
pub const WRITE_BYTE_LITERAL: u8 = 0xF2;
pub const SET_ICSP_PINS: u8 = 0xF3;
pub const BUSY_LED_OFF: u8 = 0xF4;
pub const BUSY_LED_ON: u8 = 0xF5;
pub const MCLR_GND_OFF: u8 = 0xF6;
pub const MCLR_GND_ON: u8 = 0xF7;
pub const VPP_PWM_OFF: u8 = 0xF8;
pub const VPP_PWM_ON: u8 = 0xF9;
pub const VPP_OFF: u8 = 0xFA;
pub const VPP_ON: u8 = 0xFB;
pub const VDD_GND_OFF: u8 = 0xFC;
pub const VDD_GND_ON: u8 = 0xFD;
pub const VDD_OFF: u8 = 0xFE;
pub const VDD_ON: u8 = 0xFF;

/// Lowest valid opcode
pub const BASE: u8 = JT2_PE_PROG_RESP;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("byte {0:#04x} is below the opcode base")]
    BelowBase(u8),
    #[error("opcode {0:#04x} is not supported")]
    Unsupported(u8),
    #[error("opcode {0:#04x} is missing operand bytes")]
    Truncated(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Wait for a PE response and discard it
    WaitPeResponse,
    /// Wait for a PE response and append it to the upload buffer
    GetPeResponse,
    /// Send the next download buffer word as a CPU instruction
    XferInstructionBuf,
    /// Send the next download buffer word as fast data
    FastDataBuf,
    FastDataLit(u32),
    /// 32-bit data register exchange, result to the upload buffer
    XferData32Lit(u32),
    /// 8-bit data register exchange, result to the upload buffer
    XferData8Lit(u8),
    SendCommand(u8),
    SetMode { bits: u8, mode: u8 },
    DelayShort(u8),
    DelayLong(u8),
    /// Run the `offset` bytes in front of this instruction `count` times in total
    Loop { offset: u8, count: u8 },
    SetIcspSpeed(u8),
    WriteByteLiteral(u8),
    SetIcspPins(u8),
    BusyLed(bool),
    MclrGround(bool),
    Vpp(bool),
    /// Vpp PWM control and Vdd switching, which this board does not have
    Nop(u8),
}

fn operands<const N: usize>(op: u8, bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes
        .get(1..=N)
        .and_then(|b| b.try_into().ok())
        .ok_or(DecodeError::Truncated(op))
}

impl Instruction {
    /// Decode the instruction at the start of `bytes`.  Operands must lie inside `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let Some(&op) = bytes.first() else {
            return Err(DecodeError::Truncated(0));
        };
        if op < BASE {
            return Err(DecodeError::BelowBase(op));
        }

        let byte = |b: &[u8]| operands::<1>(op, b).map(|[v]| v);
        let insn = match op {
            JT2_WAIT_PE_RESP => Instruction::WaitPeResponse,
            JT2_GET_PE_RESP => Instruction::GetPeResponse,
            JT2_XFERINST_BUF => Instruction::XferInstructionBuf,
            JT2_XFRFASTDAT_BUF => Instruction::FastDataBuf,
            JT2_XFRFASTDAT_LIT => Instruction::FastDataLit(u32::from_le_bytes(operands(op, bytes)?)),
            JT2_XFERDATA32_LIT => Instruction::XferData32Lit(u32::from_le_bytes(operands(op, bytes)?)),
            JT2_XFERDATA8_LIT => Instruction::XferData8Lit(byte(bytes)?),
            JT2_SENDCMD => Instruction::SendCommand(byte(bytes)?),
            JT2_SETMODE => {
                let [bits, mode] = operands(op, bytes)?;
                Instruction::SetMode { bits, mode }
            }
            DELAY_SHORT => Instruction::DelayShort(byte(bytes)?),
            DELAY_LONG => Instruction::DelayLong(byte(bytes)?),
            LOOP => {
                let [offset, count] = operands(op, bytes)?;
                Instruction::Loop { offset, count }
            }
            SET_ICSP_SPEED => Instruction::SetIcspSpeed(byte(bytes)?),
            WRITE_BYTE_LITERAL => Instruction::WriteByteLiteral(byte(bytes)?),
            SET_ICSP_PINS => Instruction::SetIcspPins(byte(bytes)?),
            BUSY_LED_OFF => Instruction::BusyLed(false),
            BUSY_LED_ON => Instruction::BusyLed(true),
            MCLR_GND_OFF => Instruction::MclrGround(false),
            MCLR_GND_ON => Instruction::MclrGround(true),
            VPP_OFF => Instruction::Vpp(false),
            VPP_ON => Instruction::Vpp(true),
            VPP_PWM_OFF | VPP_PWM_ON | VDD_GND_ON | VDD_OFF => Instruction::Nop(op),
            _ => return Err(DecodeError::Unsupported(op)),
        };
        Ok(insn)
    }

    /// Encoded length including the opcode byte.
    pub fn encoded_len(&self) -> usize {
        match self {
            Instruction::FastDataLit(_) | Instruction::XferData32Lit(_) => 5,
            Instruction::SetMode { .. } | Instruction::Loop { .. } => 3,
            Instruction::XferData8Lit(_)
            | Instruction::SendCommand(_)
            | Instruction::DelayShort(_)
            | Instruction::DelayLong(_)
            | Instruction::SetIcspSpeed(_)
            | Instruction::WriteByteLiteral(_)
            | Instruction::SetIcspPins(_) => 2,
            _ => 1,
        }
    }
}
