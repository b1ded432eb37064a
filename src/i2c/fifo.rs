// Licensed under the Apache-2.0 license

//! FIFO transfer engine.
//!
//! Payload bytes move through the 8-byte engine FIFO one 32-bit word at a
//! time. Byte `n` of a word travels in bits `8n..8n+7` (MSB-0), so words are
//! packed big-endian. A trailing partial word is zero-padded on write; the
//! command length field keeps the engine from clocking the padding out.
//! On read only the bytes the caller still needs are copied out of the
//! last word.

use crate::i2c::common::{FIFO_CAPACITY, FIFO_WORD};
use crate::i2c::engine::Engine;
use crate::i2c::error::Error;
use crate::i2c::registers::offset;
use crate::i2c::traits::I2cRegisters;
use embedded_hal::delay::DelayNs;

/// Next FIFO word from `bytes`, with the number of payload bytes in it.
fn next_word<I: Iterator<Item = u8>>(bytes: &mut I) -> Option<(u32, usize)> {
    let mut word = [0u8; FIFO_WORD];
    let mut len = 0;
    for (dst, src) in word.iter_mut().zip(bytes) {
        *dst = src;
        len += 1;
    }
    (len > 0).then(|| (u32::from_be_bytes(word), len))
}

impl<R: I2cRegisters, D: DelayNs> Engine<R, D> {
    /// Push `data` into the FIFO, waiting for room whenever the engine
    /// reports it full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a register access fails.
    pub fn fifo_write(&mut self, data: &[u8]) -> Result<usize, Error<R::Error>> {
        self.fifo_write_vectored(&[data])
    }

    /// Push the concatenation of `parts` into the FIFO. Words are packed
    /// across part boundaries, so only the very last word can be partial.
    ///
    /// Returns the number of payload bytes handed to the engine. The count
    /// falls short of the total length when a poll reports error bits, or
    /// when the FIFO stays full for more than the configured stall limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a register access fails.
    pub fn fifo_write_vectored(&mut self, parts: &[&[u8]]) -> Result<usize, Error<R::Error>> {
        let total: usize = parts.iter().map(|part| part.len()).sum();
        let mut bytes = parts.iter().flat_map(|part| part.iter().copied());
        let mut written = 0;
        let mut pending = next_word(&mut bytes);
        let mut stalls = 0u32;

        while let Some((word, len)) = pending {
            let status = self.poll_status()?;
            if status.has_error() {
                return Ok(written);
            }
            if status.fifo_count() >= FIFO_CAPACITY {
                stalls += 1;
                if stalls > self.config().fifo_stall_limit {
                    log::warn!(
                        "i2cm{}: fifo still full after {} polls, {} of {} bytes written",
                        self.id(),
                        stalls,
                        written,
                        total
                    );
                    return Ok(written);
                }
                continue;
            }
            stalls = 0;
            self.write_reg(offset::FIFO, word)?;
            written += len;
            pending = next_word(&mut bytes);
        }
        Ok(written)
    }

    /// Drain the FIFO into `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a register access fails.
    pub fn fifo_read(&mut self, buf: &mut [u8]) -> Result<usize, Error<R::Error>> {
        self.fifo_read_vectored(&mut [buf])
    }

    /// Drain the FIFO into `bufs`, filled in order, until the engine reports
    /// it empty or every buffer is full.
    ///
    /// Returns the number of bytes stored. Completion is driven by the
    /// engine's FIFO count, so callers must compare the result with the
    /// length they asked for.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a register access fails.
    pub fn fifo_read_vectored(
        &mut self,
        bufs: &mut [&mut [u8]],
    ) -> Result<usize, Error<R::Error>> {
        let total: usize = bufs.iter().map(|buf| buf.len()).sum();
        let mut slots = bufs.iter_mut().flat_map(|buf| buf.iter_mut());
        let mut read = 0;
        while read < total {
            let status = self.poll_status()?;
            if status.has_error() || status.fifo_count() == 0 {
                break;
            }
            let word = self.read_reg(offset::FIFO)?.to_be_bytes();
            // Word first, so a slot is never taken for a byte that is not there.
            for (src, dst) in word.into_iter().zip(slots.by_ref()) {
                *dst = src;
                read += 1;
            }
        }
        Ok(read)
    }
}
