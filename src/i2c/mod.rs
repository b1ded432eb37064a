// Licensed under the Apache-2.0 license

//! IBM POWER I2C master (i2cm) driver.
//!
//! Drives the i2cm engines of a POWER chip through their register block,
//! reached either over FSI or over the host's PIB (SCOM) interface. Engines
//! shared with the on-chip controller are only driven while holding their
//! OCC lock bit.
//!
//! Layering, bottom up:
//!
//! * [`traits`] / [`transport`]: raw FSI and PIB access, and the
//!   engine-relative [`I2cRegisters`] view over either.
//! * [`registers`]: register offsets and bitfields.
//! * [`engine`], [`fifo`], [`transaction`]: state control, FIFO transfer and
//!   complete read/write transactions on one [`Engine`].
//! * [`occ_lock`]: the OCC ownership handshake.
//! * [`topology`]: the engine/port registry and the port-level entry points.
//! * [`i2c_controller`]: an `embedded-hal` [`I2c`](embedded_hal::i2c::I2c)
//!   view of one port.

pub mod common;
pub mod engine;
pub mod error;
pub mod fifo;
pub mod i2c_controller;
pub mod occ_lock;
pub mod registers;
pub mod topology;
pub mod traits;
pub mod transaction;
pub mod transport;

#[cfg(test)]
mod mock;

pub use common::{EngineConfig, EngineConfigBuilder, TransportMode};
pub use engine::Engine;
pub use error::Error;
pub use i2c_controller::I2cController;
pub use occ_lock::{with_lock, Access, SkipReason};
pub use topology::{EngineHandle, NoHost, Port, PortHandle, Topology};
pub use traits::{FsiAccess, I2cRegisters, PibAccess};
pub use transport::{Fsi, Pib, Transport};
