//! Circular byte queues streaming data between the host and the script interpreter.
//!
//! The buffer has no occupancy counter.  Equal cursors mean empty, except right after a write
//! that caught the write cursor up with the read cursor: that write latches the `full` marker
//! and raises the configured status bit.  The marker keeps a completely filled buffer from
//! being mistaken for an empty one, so all `N` slots are usable.  Writes are refused while
//! either the marker or the status bit is set; the status bit stays latched until the host
//! reads the status or clears the buffer.
use crate::status::{Status, StatusRegister};

pub struct RingBuffer<const N: usize> {
    buffer: [u8; N],
    read_index: usize,
    write_index: usize,
    full: bool,
    full_flag: Status,
    empty_flag: Status,
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty buffer that reports overruns through `full_flag` and underruns through
    /// `empty_flag`.
    pub const fn new(full_flag: Status, empty_flag: Status) -> Self {
        RingBuffer {
            buffer: [0; N],
            read_index: 0,
            write_index: 0,
            full: false,
            full_flag,
            empty_flag,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of bytes waiting to be read
    pub fn len(&self) -> usize {
        if self.full {
            N
        } else {
            (self.write_index + N - self.read_index) % N
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.read_index == self.write_index
    }

    /// Reset both cursors and drop the latched full/empty status bits.
    pub fn clear(&mut self, status: &mut StatusRegister) {
        self.read_index = 0;
        self.write_index = 0;
        self.full = false;
        status.clear(self.full_flag | self.empty_flag);
    }

    /// Append one byte.  Silently dropped while the buffer is marked full.
    pub fn write_byte(&mut self, status: &mut StatusRegister, byte: u8) {
        if self.full || status.contains(self.full_flag) {
            return;
        }
        self.buffer[self.write_index] = byte;
        self.write_index = (self.write_index + 1) % N;
        if self.write_index == self.read_index {
            self.full = true;
            status.set(self.full_flag);
        }
    }

    /// Pop one byte.  An empty buffer yields 0 and raises the empty flag.
    pub fn read_byte(&mut self, status: &mut StatusRegister) -> u8 {
        if self.is_empty() {
            status.set(self.empty_flag);
            return 0;
        }
        let byte = self.buffer[self.read_index];
        self.read_index = (self.read_index + 1) % N;
        self.full = false;
        byte
    }

    /// Drain up to `max` bytes into `dst`, stopping early once the buffer is empty.  Returns the
    /// number of bytes copied.
    pub fn read_to_slice(&mut self, status: &mut StatusRegister, dst: &mut [u8], max: usize) -> usize {
        let max = max.min(dst.len());
        let mut count = 0;
        while !self.is_empty() && count < max {
            dst[count] = self.read_byte(status);
            count += 1;
        }
        count
    }

    /// Read a 32-bit value, least significant byte first.
    pub fn read_u32(&mut self, status: &mut StatusRegister) -> u32 {
        let mut bytes = [0; 4];
        for b in bytes.iter_mut() {
            *b = self.read_byte(status);
        }
        u32::from_le_bytes(bytes)
    }

    /// Write a 32-bit value, least significant byte first.
    pub fn write_u32(&mut self, status: &mut StatusRegister, value: u32) {
        for b in value.to_le_bytes() {
            self.write_byte(status, b);
        }
    }

    /// Forward a length-prefixed block: `src[0]` is the count, the payload follows.  The payload
    /// is cut short at the end of `src`.  Returns the number of bytes of `src` consumed.
    pub fn write_prefixed(&mut self, status: &mut StatusRegister, src: &[u8]) -> usize {
        let Some((&len, payload)) = src.split_first() else {
            return 0;
        };
        let payload = &payload[..payload.len().min(len as usize)];
        for &b in payload {
            self.write_byte(status, b);
        }
        1 + payload.len()
    }
}
