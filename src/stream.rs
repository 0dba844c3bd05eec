//! Bounded bit stream.
//!
//! Every read or write is checked against the stream length before
//! touching the underlying buffer. A refused access leaves the
//! stream untouched.
use crate::{bits, prelude::Error};

/// [BitStream] wraps a byte buffer with a read/write cursor
/// and a total length expressed in bits.
#[derive(Debug)]
pub struct BitStream<B> {
    data: B,
    len: usize,
    offset: usize,
}

impl<B: AsRef<[u8]>> BitStream<B> {
    /// Builds a [BitStream] spanning `len` bits of `data`.
    /// `len` is clamped to the buffer capacity.
    pub fn new(data: B, len: usize) -> Self {
        let len = len.min(data.as_ref().len() * 8);
        Self {
            data,
            len,
            offset: 0,
        }
    }

    /// Builds a [BitStream] spanning the whole buffer.
    pub fn from_bytes(data: B) -> Self {
        let len = data.as_ref().len() * 8;
        Self::new(data, len)
    }

    /// Total stream length, in bits
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for zero length streams
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current cursor position, in bits
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bits left past the cursor
    pub fn remaining(&self) -> usize {
        self.len - self.offset
    }

    /// Returns inner buffer
    pub fn into_inner(self) -> B {
        self.data
    }

    fn would_overflow(&self, pos: usize, len: usize) -> bool {
        match self.offset.checked_add(pos).and_then(|p| p.checked_add(len)) {
            Some(end) => end > self.len,
            None => true,
        }
    }

    fn check(&self, pos: usize, len: usize) -> Result<(), Error> {
        if len > 64 {
            Err(Error::InvalidFieldWidth(len))
        } else if self.would_overflow(pos, len) {
            Err(Error::NotEnoughBits)
        } else {
            Ok(())
        }
    }

    /// Reads an unsigned field `pos` bits past the cursor,
    /// without moving the cursor.
    pub fn peek_unsigned(&self, pos: usize, len: usize) -> Result<u64, Error> {
        self.check(pos, len)?;
        Ok(bits::get_unsigned(
            self.data.as_ref(),
            self.offset + pos,
            len,
        ))
    }

    /// Reads a two's complement field `pos` bits past the cursor,
    /// without moving the cursor.
    pub fn peek_signed(&self, pos: usize, len: usize) -> Result<i64, Error> {
        self.check(pos, len)?;
        Ok(bits::get_signed(self.data.as_ref(), self.offset + pos, len))
    }

    /// Reads `len` bits as unsigned and advances the cursor.
    pub fn read_unsigned(&mut self, len: usize) -> Result<u64, Error> {
        let value = self.peek_unsigned(0, len)?;
        self.offset += len;
        Ok(value)
    }

    /// Reads `len` bits as two's complement and advances the cursor.
    pub fn read_signed(&mut self, len: usize) -> Result<i64, Error> {
        let value = self.peek_signed(0, len)?;
        self.offset += len;
        Ok(value)
    }

    /// Reads a single bit flag and advances the cursor.
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_unsigned(1)? == 1)
    }

    /// Reads an unsigned field split in two chunks, the second one
    /// located `gap` bits after the end of the first one.
    /// Returns the concatenation (first chunk MSB) and advances the cursor
    /// past the second chunk. Both chunks must be at least one bit wide.
    pub fn read_unsigned_split(
        &mut self,
        first: usize,
        gap: usize,
        second: usize,
    ) -> Result<u64, Error> {
        let width = first.saturating_add(second);
        if first == 0 || second == 0 || width > 64 {
            return Err(Error::InvalidFieldWidth(width));
        }
        let second_pos = first.checked_add(gap).ok_or(Error::NotEnoughBits)?;
        self.check(0, first)?;
        self.check(second_pos, second)?;
        let msb = self.peek_unsigned(0, first)?;
        let lsb = self.peek_unsigned(second_pos, second)?;
        self.offset += second_pos + second;
        Ok((msb << second) | lsb)
    }

    /// Same as [Self::read_unsigned_split] with two's complement interpretation.
    pub fn read_signed_split(
        &mut self,
        first: usize,
        gap: usize,
        second: usize,
    ) -> Result<i64, Error> {
        let value = self.read_unsigned_split(first, gap, second)?;
        Ok(bits::sign_extend(value, first + second))
    }

    /// Moves the cursor `len` bits forward.
    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        if self.would_overflow(0, len) {
            return Err(Error::NotEnoughBits);
        }
        self.offset += len;
        Ok(())
    }

    /// Moves the cursor to absolute bit position `pos`.
    pub fn seek(&mut self, pos: usize) -> Result<(), Error> {
        if pos > self.len {
            return Err(Error::NotEnoughBits);
        }
        self.offset = pos;
        Ok(())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitStream<B> {
    /// Writes the `len` LSBs of `value` and advances the cursor.
    pub fn write_unsigned(&mut self, len: usize, value: u64) -> Result<(), Error> {
        self.check(0, len)?;
        bits::set_unsigned(self.data.as_mut(), self.offset, len, value);
        self.offset += len;
        Ok(())
    }

    /// Writes `value` as a `len` bit two's complement field
    /// and advances the cursor.
    pub fn write_signed(&mut self, len: usize, value: i64) -> Result<(), Error> {
        self.check(0, len)?;
        bits::set_signed(self.data.as_mut(), self.offset, len, value);
        self.offset += len;
        Ok(())
    }
}
