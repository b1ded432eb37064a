// Licensed under the Apache-2.0 license

//! Transaction orchestrator: one complete read or write on the bus.

use crate::i2c::common::{Direction, Phase, MAX_TRANSFER_LEN};
use crate::i2c::engine::Engine;
use crate::i2c::error::Error;
use crate::i2c::registers::{offset, Command, Status};
use crate::i2c::traits::I2cRegisters;
use embedded_hal::delay::DelayNs;

/// Length and address checks done before any register is touched.
fn check_request<E>(addr: u8, len: usize) -> Result<u16, Error<E>> {
    if addr > 0x7f {
        return Err(Error::InvalidAddress(addr));
    }
    if len > MAX_TRANSFER_LEN {
        return Err(Error::LengthExceeded(len));
    }
    u16::try_from(len).map_err(|_| Error::LengthExceeded(len))
}

impl<R: I2cRegisters, D: DelayNs> Engine<R, D> {
    fn begin(
        &mut self,
        port: u8,
        command: Command,
        direction: Direction,
    ) -> Result<(), Error<R::Error>> {
        if !self.ensure_usable(port)? {
            return Err(Error::EngineFaulted(self.status()?));
        }
        self.write_reg(offset::COMMAND, command.bits())?;

        let status = self.poll_status()?;
        if status.has_error() {
            log::error!(
                "i2cm{}: failed to address device {:#04x}, status {}",
                self.id(),
                command.device_address(),
                status
            );
            return Err(Error::Bus {
                direction,
                phase: Phase::Address,
                status,
            });
        }
        Ok(())
    }

    fn data_failure(&self, direction: Direction, status: Status) -> Error<R::Error> {
        log::error!(
            "i2cm{}: failed to {} all data, status {}",
            self.id(),
            match direction {
                Direction::Read => "read",
                Direction::Write => "write",
            },
            status
        );
        Error::Bus {
            direction,
            phase: Phase::Data,
            status,
        }
    }

    /// Write `data` to the 7-bit device `addr` behind `port`.
    ///
    /// # Errors
    ///
    /// See [`Engine::write_transaction_vectored`].
    pub fn write_transaction(
        &mut self,
        port: u8,
        addr: u8,
        data: &[u8],
    ) -> Result<(), Error<R::Error>> {
        self.write_transaction_vectored(port, addr, &[data])
    }

    /// Write the concatenation of `parts` to the 7-bit device `addr` behind
    /// `port` as a single command: one start, one address phase.
    ///
    /// The write command carries no stop, so a read issued next on the same
    /// engine begins with a repeated start.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidAddress`] / [`Error::LengthExceeded`] before any
    ///   hardware access.
    /// * [`Error::EngineFaulted`] if the engine stays in error after a reset.
    /// * [`Error::Bus`] if the address or data phase reports error bits.
    /// * [`Error::LengthMismatch`] if not every byte reached the FIFO.
    /// * [`Error::Transport`] if a register access fails.
    pub fn write_transaction_vectored(
        &mut self,
        port: u8,
        addr: u8,
        parts: &[&[u8]],
    ) -> Result<(), Error<R::Error>> {
        let total: usize = parts.iter().map(|part| part.len()).sum();
        let len = check_request(addr, total)?;
        self.begin(port, Command::write(addr, len), Direction::Write)?;

        let written = self.fifo_write_vectored(parts)?;

        let status = self.poll_status()?;
        if status.has_error() {
            return Err(self.data_failure(Direction::Write, status));
        }
        if written != total {
            return Err(Error::LengthMismatch {
                expected: total,
                actual: written,
            });
        }
        Ok(())
    }

    /// Fill `buf` from the 7-bit device `addr` behind `port`.
    ///
    /// # Errors
    ///
    /// See [`Engine::read_transaction_vectored`].
    pub fn read_transaction(
        &mut self,
        port: u8,
        addr: u8,
        buf: &mut [u8],
    ) -> Result<(), Error<R::Error>> {
        self.read_transaction_vectored(port, addr, &mut [buf])
    }

    /// Fill `bufs`, in order, from the 7-bit device `addr` behind `port` as a
    /// single command.
    ///
    /// The read command carries a stop, so the whole transfer is one
    /// start/address/data/stop sequence.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidAddress`] / [`Error::LengthExceeded`] before any
    ///   hardware access.
    /// * [`Error::EngineFaulted`] if the engine stays in error after a reset.
    /// * [`Error::Bus`] if the address or data phase reports error bits, or
    ///   the engine never signals command-complete.
    /// * [`Error::LengthMismatch`] if the FIFO delivered fewer bytes than
    ///   `bufs` hold; the partial data is left in place.
    /// * [`Error::Transport`] if a register access fails.
    pub fn read_transaction_vectored(
        &mut self,
        port: u8,
        addr: u8,
        bufs: &mut [&mut [u8]],
    ) -> Result<(), Error<R::Error>> {
        let total: usize = bufs.iter().map(|buf| buf.len()).sum();
        let len = check_request(addr, total)?;
        self.begin(port, Command::read(addr, len), Direction::Read)?;

        let read = self.fifo_read_vectored(bufs)?;

        let status = self.poll_status()?;
        if status.has_error() {
            return Err(self.data_failure(Direction::Read, status));
        }
        if read != total {
            log::error!(
                "i2cm{}: read {} of {} bytes from {:#04x}",
                self.id(),
                read,
                total,
                addr
            );
            return Err(Error::LengthMismatch {
                expected: total,
                actual: read,
            });
        }
        if !status.command_complete() {
            return Err(Error::Bus {
                direction: Direction::Read,
                phase: Phase::Completion,
                status,
            });
        }
        Ok(())
    }
}
