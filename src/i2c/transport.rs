// Licensed under the Apache-2.0 license

//! Register access shim: maps engine-relative register numbers onto the FSI
//! or PIB transport.
//!
//! An engine is reached either directly over FSI (32-bit, no translation)
//! or through the host/PIB path, where each register sits in a 64-bit SCOM
//! word at `offset + PIB_OFFSET` with the 32-bit value in the upper half.
//!
//! [`Transport`] wraps both so a single registry can hold FSI and PIB
//! engines side by side without boxing:
//!
//! ```rust,ignore
//! let fsi = Transport::<_, MyPib>::Fsi(Fsi(fsi_target));
//! let pib = Transport::<MyFsi, _>::Pib(Pib(pib_target));
//! ```

use crate::i2c::common::TransportMode;
use crate::i2c::traits::{FsiAccess, I2cRegisters, PibAccess};

/// Offset added to every register number on the PIB path.
pub const PIB_OFFSET: u64 = 0x4;

/// Engine reached over FSI.
#[derive(Debug)]
pub struct Fsi<F>(pub F);

impl<F: FsiAccess> I2cRegisters for Fsi<F> {
    type Error = F::Error;

    fn mode(&self) -> TransportMode {
        TransportMode::Fsi
    }

    fn read_reg(&mut self, offset: u32) -> Result<u32, Self::Error> {
        self.0.fsi_read(offset)
    }

    fn write_reg(&mut self, offset: u32, value: u32) -> Result<(), Self::Error> {
        self.0.fsi_write(offset, value)
    }
}

/// Engine reached over the host/PIB path.
#[derive(Debug)]
pub struct Pib<P>(pub P);

impl<P: PibAccess> I2cRegisters for Pib<P> {
    type Error = P::Error;

    fn mode(&self) -> TransportMode {
        TransportMode::Pib
    }

    fn read_reg(&mut self, offset: u32) -> Result<u32, Self::Error> {
        let raw = self.0.pib_read(u64::from(offset) + PIB_OFFSET)?;
        // Upper word only; the low half carries nothing.
        Ok((raw >> 32) as u32)
    }

    fn write_reg(&mut self, offset: u32, value: u32) -> Result<(), Self::Error> {
        self.0
            .pib_write(u64::from(offset) + PIB_OFFSET, u64::from(value) << 32)
    }
}

/// Either transport, chosen per engine instance.
#[derive(Debug)]
pub enum Transport<F, P> {
    Fsi(Fsi<F>),
    Pib(Pib<P>),
}

impl<F, P> I2cRegisters for Transport<F, P>
where
    F: FsiAccess,
    P: PibAccess<Error = F::Error>,
{
    type Error = F::Error;

    fn mode(&self) -> TransportMode {
        match self {
            Transport::Fsi(fsi) => fsi.mode(),
            Transport::Pib(pib) => pib.mode(),
        }
    }

    fn read_reg(&mut self, offset: u32) -> Result<u32, Self::Error> {
        match self {
            Transport::Fsi(fsi) => fsi.read_reg(offset),
            Transport::Pib(pib) => pib.read_reg(offset),
        }
    }

    fn write_reg(&mut self, offset: u32, value: u32) -> Result<(), Self::Error> {
        match self {
            Transport::Fsi(fsi) => fsi.write_reg(offset, value),
            Transport::Pib(pib) => pib.write_reg(offset, value),
        }
    }
}
