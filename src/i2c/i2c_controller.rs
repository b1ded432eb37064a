// Licensed under the Apache-2.0 license

//! `embedded-hal` view of one port in a [`Topology`].
//!
//! Lets generic device drivers (EEPROMs, sensors) talk through an i2cm
//! engine. A transaction is split into runs of adjacent operations of the
//! same direction, and each run goes out as one engine command: one start,
//! one address phase, the buffers back to back. The write command leaves
//! the bus without a stop, so a read run following a write run starts with
//! a repeated start. The read command always ends with a stop.
//!
//! A PIB engine that is held by the OCC, or unreachable for want of host
//! access, is skipped rather than failed. The I2c trait has no way to say
//! so; the skip is logged and kept in [`I2cController::last_skip`].

use crate::i2c::common::MAX_MERGED_OPERATIONS;
use crate::i2c::error::Error;
use crate::i2c::occ_lock::{Access, SkipReason};
use crate::i2c::topology::{PortHandle, Topology};
use crate::i2c::traits::{I2cRegisters, PibAccess};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Operation, SevenBitAddress};
use heapless::Vec;

pub struct I2cController<'t, R, D, H, const ENGINES: usize, const PORTS: usize> {
    topology: &'t mut Topology<R, D, H, ENGINES, PORTS>,
    port: PortHandle,
    last_skip: Option<SkipReason>,
}

impl<'t, R, D, H, const ENGINES: usize, const PORTS: usize>
    I2cController<'t, R, D, H, ENGINES, PORTS>
where
    R: I2cRegisters,
    D: DelayNs,
    H: PibAccess<Error = R::Error>,
{
    pub fn new(topology: &'t mut Topology<R, D, H, ENGINES, PORTS>, port: PortHandle) -> Self {
        Self {
            topology,
            port,
            last_skip: None,
        }
    }

    #[must_use]
    pub fn port(&self) -> PortHandle {
        self.port
    }

    /// Why the most recent command was not issued, if it was skipped.
    #[must_use]
    pub fn last_skip(&self) -> Option<SkipReason> {
        self.last_skip
    }

    fn record(&mut self, access: Access) {
        self.last_skip = match access {
            Access::Performed(()) => None,
            Access::Skipped(reason) => {
                log::warn!("i2cm port {:?}: operation skipped: {:?}", self.port, reason);
                Some(reason)
            }
        };
    }

    /// Issue a run of `Operation::Write`s as one write command.
    fn write_run(
        &mut self,
        addr: SevenBitAddress,
        run: &[Operation<'_>],
    ) -> Result<(), Error<R::Error>> {
        let mut parts: Vec<&[u8], MAX_MERGED_OPERATIONS> = Vec::new();
        for op in run {
            if let Operation::Write(bytes) = op {
                parts
                    .push(*bytes)
                    .map_err(|_| Error::TooManyOperations(run.len()))?;
            }
        }
        let access = self
            .topology
            .write_vectored(self.port, addr, parts.as_slice())?;
        self.record(access);
        Ok(())
    }

    /// Issue a run of `Operation::Read`s as one read command.
    fn read_run(
        &mut self,
        addr: SevenBitAddress,
        run: &mut [Operation<'_>],
    ) -> Result<(), Error<R::Error>> {
        let count = run.len();
        let mut bufs: Vec<&mut [u8], MAX_MERGED_OPERATIONS> = Vec::new();
        for op in run.iter_mut() {
            if let Operation::Read(buf) = op {
                bufs.push(&mut **buf)
                    .map_err(|_| Error::TooManyOperations(count))?;
            }
        }
        let access = self
            .topology
            .read_vectored(self.port, addr, bufs.as_mut_slice())?;
        self.record(access);
        Ok(())
    }
}

impl<R, D, H, const ENGINES: usize, const PORTS: usize> embedded_hal::i2c::ErrorType
    for I2cController<'_, R, D, H, ENGINES, PORTS>
where
    R: I2cRegisters,
{
    type Error = Error<R::Error>;
}

impl<R, D, H, const ENGINES: usize, const PORTS: usize> embedded_hal::i2c::I2c
    for I2cController<'_, R, D, H, ENGINES, PORTS>
where
    R: I2cRegisters,
    D: DelayNs,
    H: PibAccess<Error = R::Error>,
{
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let access = self.topology.read(self.port, addr, buffer)?;
        self.record(access);
        Ok(())
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        let access = self.topology.write(self.port, addr, bytes)?;
        self.record(access);
        Ok(())
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transaction(
            addr,
            &mut [Operation::Write(bytes), Operation::Read(buffer)],
        )
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut rest = operations;
        while let Some(first) = rest.first() {
            let reading = matches!(first, Operation::Read(_));
            let len = rest
                .iter()
                .take_while(|op| matches!(op, Operation::Read(_)) == reading)
                .count();
            let (run, tail) = core::mem::take(&mut rest).split_at_mut(len);
            rest = tail;

            if reading {
                self.read_run(addr, run)?;
            } else {
                self.write_run(addr, run)?;
            }
            // Later runs would meet the same lock.
            if self.last_skip.is_some() {
                break;
            }
        }
        Ok(())
    }
}
