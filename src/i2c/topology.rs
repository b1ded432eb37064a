// Licensed under the Apache-2.0 license

//! # Engine and port registry
//!
//! A [`Topology`] is built once at startup by whatever discovered the
//! hardware. It owns every [`Engine`], the [`Port`]s multiplexed behind
//! them and, for chips whose engines are shared with the OCC, the host
//! access handle used to reach the OCC flag register.
//!
//! Ports refer to their engine by [`EngineHandle`], so many ports share one
//! engine without shared mutable references. All storage is fixed-capacity
//! (`heapless`), so the registry works without an allocator.
//!
//! ```rust,ignore
//! let mut topology: Topology<_, _, _, 4, 16> = Topology::with_host(host);
//! let engine = topology.add_engine(Engine::new(1, Transport::Pib(Pib(scom)), delay, config))?;
//! let port = topology.add_port(engine, 0)?;
//!
//! let mut vpd = [0u8; 8];
//! match topology.read(port, 0x50, &mut vpd)? {
//!     Access::Performed(()) => hexdump(&vpd),
//!     Access::Skipped(reason) => println!("skipped: {reason:?}"),
//! }
//! ```
//!
//! Engines reached over FSI are driven directly. Engines reached over PIB
//! are only driven while holding their OCC lock bit.

use crate::i2c::common::{TransportMode, MAX_PORT};
use crate::i2c::engine::Engine;
use crate::i2c::error::Error;
use crate::i2c::occ_lock::{with_lock, Access};
use crate::i2c::traits::{I2cRegisters, PibAccess};
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::delay::DelayNs;
use heapless::Vec;

/// Index of an engine in its [`Topology`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineHandle(usize);

/// Index of a port in its [`Topology`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PortHandle(usize);

/// One I2C bus selected through an engine's mode register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Port {
    number: u8,
    engine: EngineHandle,
}

impl Port {
    #[must_use]
    pub fn number(&self) -> u8 {
        self.number
    }

    #[must_use]
    pub fn engine(&self) -> EngineHandle {
        self.engine
    }
}

/// Host access type for topologies without PIB-attached engines.
pub struct NoHost<E> {
    never: Infallible,
    _error: PhantomData<E>,
}

impl<E: core::fmt::Debug> PibAccess for NoHost<E> {
    type Error = E;

    fn pib_read(&mut self, _addr: u64) -> Result<u64, Self::Error> {
        match self.never {}
    }

    fn pib_write(&mut self, _addr: u64, _data: u64) -> Result<(), Self::Error> {
        match self.never {}
    }
}

pub struct Topology<R, D, H, const ENGINES: usize, const PORTS: usize> {
    engines: Vec<Engine<R, D>, ENGINES>,
    ports: Vec<Port, PORTS>,
    host: Option<H>,
}

impl<R, D, H, const ENGINES: usize, const PORTS: usize> Default
    for Topology<R, D, H, ENGINES, PORTS>
{
    fn default() -> Self {
        Self {
            engines: Vec::new(),
            ports: Vec::new(),
            host: None,
        }
    }
}

impl<R, D, H, const ENGINES: usize, const PORTS: usize> Topology<R, D, H, ENGINES, PORTS>
where
    R: I2cRegisters,
    D: DelayNs,
    H: PibAccess<Error = R::Error>,
{
    /// Topology without host access; PIB engines in it are never driven.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Topology whose PIB engines coordinate with the OCC through `host`.
    #[must_use]
    pub fn with_host(host: H) -> Self {
        Self {
            host: Some(host),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::TopologyFull`] if every engine slot is taken.
    pub fn add_engine(&mut self, engine: Engine<R, D>) -> Result<EngineHandle, Error<R::Error>> {
        let handle = EngineHandle(self.engines.len());
        self.engines
            .push(engine)
            .map_err(|_| Error::TopologyFull)?;
        Ok(handle)
    }

    /// # Errors
    ///
    /// * [`Error::UnknownEngine`] if `engine` is not from this topology.
    /// * [`Error::InvalidPort`] if `number` does not fit the mode register.
    /// * [`Error::TopologyFull`] if every port slot is taken.
    pub fn add_port(
        &mut self,
        engine: EngineHandle,
        number: u8,
    ) -> Result<PortHandle, Error<R::Error>> {
        if engine.0 >= self.engines.len() {
            return Err(Error::UnknownEngine);
        }
        if number > MAX_PORT {
            return Err(Error::InvalidPort(number));
        }
        let handle = PortHandle(self.ports.len());
        self.ports
            .push(Port { number, engine })
            .map_err(|_| Error::TopologyFull)?;
        Ok(handle)
    }

    #[must_use]
    pub fn port(&self, port: PortHandle) -> Option<&Port> {
        self.ports.get(port.0)
    }

    #[must_use]
    pub fn engine(&self, engine: EngineHandle) -> Option<&Engine<R, D>> {
        self.engines.get(engine.0)
    }

    pub fn engine_mut(&mut self, engine: EngineHandle) -> Option<&mut Engine<R, D>> {
        self.engines.get_mut(engine.0)
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    /// Resolve `port` to its engine, then run `op` on it, under the OCC lock
    /// when the engine sits on the PIB.
    fn dispatch<T>(
        &mut self,
        port: PortHandle,
        op: impl FnOnce(&mut Engine<R, D>, u8) -> Result<T, Error<R::Error>>,
    ) -> Result<Access<T>, Error<R::Error>> {
        let port = *self.ports.get(port.0).ok_or(Error::UnknownPort)?;
        let Self { engines, host, .. } = self;
        let engine = engines
            .get_mut(port.engine.0)
            .ok_or(Error::UnknownEngine)?;

        match engine.mode() {
            TransportMode::Fsi => op(engine, port.number).map(Access::Performed),
            TransportMode::Pib => {
                let id = engine.id();
                with_lock(host.as_mut(), id, || op(engine, port.number))
            }
        }
    }

    /// Read `buf.len()` bytes from device `addr` on `port`.
    ///
    /// # Errors
    ///
    /// Any [`Error`] from the transaction or the OCC handshake, plus
    /// [`Error::UnknownPort`] for a handle from another topology.
    pub fn read(
        &mut self,
        port: PortHandle,
        addr: u8,
        buf: &mut [u8],
    ) -> Result<Access, Error<R::Error>> {
        self.read_vectored(port, addr, &mut [buf])
    }

    /// Fill every buffer in `bufs` from device `addr` on `port` with a single
    /// engine command.
    ///
    /// # Errors
    ///
    /// As for [`Topology::read`].
    pub fn read_vectored(
        &mut self,
        port: PortHandle,
        addr: u8,
        bufs: &mut [&mut [u8]],
    ) -> Result<Access, Error<R::Error>> {
        self.dispatch(port, |engine, number| {
            engine.read_transaction_vectored(number, addr, bufs)
        })
    }

    /// Write `data` to device `addr` on `port`.
    ///
    /// # Errors
    ///
    /// Any [`Error`] from the transaction or the OCC handshake, plus
    /// [`Error::UnknownPort`] for a handle from another topology.
    pub fn write(
        &mut self,
        port: PortHandle,
        addr: u8,
        data: &[u8],
    ) -> Result<Access, Error<R::Error>> {
        self.write_vectored(port, addr, &[data])
    }

    /// Write the concatenation of `parts` to device `addr` on `port` with a
    /// single engine command.
    ///
    /// # Errors
    ///
    /// As for [`Topology::write`].
    pub fn write_vectored(
        &mut self,
        port: PortHandle,
        addr: u8,
        parts: &[&[u8]],
    ) -> Result<Access, Error<R::Error>> {
        self.dispatch(port, |engine, number| {
            engine.write_transaction_vectored(number, addr, parts)
        })
    }
}
