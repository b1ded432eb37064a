// Licensed under the Apache-2.0 license

//! # Register access traits
//!
//! The engine never talks to hardware directly. Everything goes through a
//! small set of traits so the same protocol code drives an FSI-attached
//! engine, a host/PIB-attached engine, or a test double.
//!
//! ```text
//! FsiAccess ─┐                         (32-bit, engine-relative)
//!            ├── transport::Transport ── I2cRegisters ── Engine
//! PibAccess ─┘                         (64-bit, +0x4, upper word)
//!     └── OCC flag register            (lock coordinator)
//! ```
//!
//! `FsiAccess` and `PibAccess` are implemented by whatever owns the target
//! (a debugfs/sysfs backend, an SBE chip-op channel, a simulator). Their
//! addresses are relative to the target they were obtained for.

use crate::i2c::common::TransportMode;
use core::fmt::Debug;

/// Raw 32-bit register access over FSI.
pub trait FsiAccess {
    type Error: Debug;

    /// # Errors
    ///
    /// Returns the backend error if the FSI access fails.
    fn fsi_read(&mut self, addr: u32) -> Result<u32, Self::Error>;

    /// # Errors
    ///
    /// Returns the backend error if the FSI access fails.
    fn fsi_write(&mut self, addr: u32, data: u32) -> Result<(), Self::Error>;
}

/// Raw 64-bit register access over the PIB (SCOM) interface.
pub trait PibAccess {
    type Error: Debug;

    /// # Errors
    ///
    /// Returns the backend error if the PIB access fails.
    fn pib_read(&mut self, addr: u64) -> Result<u64, Self::Error>;

    /// # Errors
    ///
    /// Returns the backend error if the PIB access fails.
    fn pib_write(&mut self, addr: u64, data: u64) -> Result<(), Self::Error>;
}

/// Engine-relative access to the I2C master register block.
///
/// Offsets are the logical register numbers from
/// [`registers::offset`](crate::i2c::registers::offset); implementations
/// translate them for their transport. No retries happen at this layer.
pub trait I2cRegisters {
    type Error: Debug;

    /// Transport the register block is reached through.
    fn mode(&self) -> TransportMode;

    /// # Errors
    ///
    /// Returns the transport error if the underlying access fails.
    fn read_reg(&mut self, offset: u32) -> Result<u32, Self::Error>;

    /// # Errors
    ///
    /// Returns the transport error if the underlying access fails.
    fn write_reg(&mut self, offset: u32, value: u32) -> Result<(), Self::Error>;
}

impl<T: I2cRegisters + ?Sized> I2cRegisters for &mut T {
    type Error = T::Error;

    fn mode(&self) -> TransportMode {
        (**self).mode()
    }

    fn read_reg(&mut self, offset: u32) -> Result<u32, Self::Error> {
        (**self).read_reg(offset)
    }

    fn write_reg(&mut self, offset: u32, value: u32) -> Result<(), Self::Error> {
        (**self).write_reg(offset, value)
    }
}
