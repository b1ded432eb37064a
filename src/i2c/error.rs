// Licensed under the Apache-2.0 license

//! Error type for the I2C master driver.

use crate::i2c::common::{Direction, Phase, MAX_MERGED_OPERATIONS, MAX_TRANSFER_LEN};
use crate::i2c::registers::Status;
use core::fmt;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Driver error, generic over the register transport's error `E`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The underlying FSI/PIB access failed.
    Transport(E),
    /// Error bits were still set after resetting the engine.
    EngineFaulted(Status),
    /// Requested transfer is longer than the command length field allows.
    LengthExceeded(usize),
    /// Fewer bytes moved through the FIFO than requested.
    LengthMismatch { expected: usize, actual: usize },
    /// The engine reported an error, or never completed, during a transfer.
    Bus {
        direction: Direction,
        phase: Phase,
        status: Status,
    },
    /// Device address does not fit in seven bits.
    InvalidAddress(u8),
    /// Port number does not fit in the mode register.
    InvalidPort(u8),
    /// PIB engine whose id has no bit in the OCC flag register.
    NoLockBit(u8),
    UnknownEngine,
    UnknownPort,
    /// The topology has no room for another engine or port.
    TopologyFull,
    /// A run of adjacent same-direction operations is too long to merge
    /// into one engine command.
    TooManyOperations(usize),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "register access failed: {e:?}"),
            Error::EngineFaulted(status) => {
                write!(f, "i2c engine not usable after reset, status {status}")
            }
            Error::LengthExceeded(len) => write!(
                f,
                "transfer of {len} bytes exceeds the {MAX_TRANSFER_LEN} byte limit"
            ),
            Error::LengthMismatch { expected, actual } => {
                write!(f, "transferred {actual} of {expected} bytes")
            }
            Error::Bus {
                direction,
                phase,
                status,
            } => {
                let what = match phase {
                    Phase::Address => "failed to address device",
                    Phase::Data => match direction {
                        Direction::Read => "failed to read all data",
                        Direction::Write => "failed to write all data",
                    },
                    Phase::Completion => "command did not complete",
                };
                write!(f, "{what}, status {status}")
            }
            Error::InvalidAddress(addr) => write!(f, "invalid 7-bit device address {addr:#04x}"),
            Error::InvalidPort(port) => write!(f, "invalid port number {port}"),
            Error::NoLockBit(id) => write!(f, "engine {id} has no OCC lock bit"),
            Error::UnknownEngine => write!(f, "unknown engine"),
            Error::UnknownPort => write!(f, "unknown port"),
            Error::TopologyFull => write!(f, "no room for another engine or port"),
            Error::TooManyOperations(count) => write!(
                f,
                "{count} adjacent operations exceed the {MAX_MERGED_OPERATIONS} that can be merged"
            ),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

impl<E: fmt::Debug> embedded_hal::i2c::Error for Error<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Bus { phase, status, .. } if status.nack() => {
                ErrorKind::NoAcknowledge(match phase {
                    Phase::Address => NoAcknowledgeSource::Address,
                    Phase::Data => NoAcknowledgeSource::Data,
                    Phase::Completion => NoAcknowledgeSource::Unknown,
                })
            }
            Error::Bus { status, .. } | Error::EngineFaulted(status)
                if status.arbitration_lost() =>
            {
                ErrorKind::ArbitrationLoss
            }
            Error::Bus { .. } | Error::EngineFaulted(_) => ErrorKind::Bus,
            Error::LengthMismatch { .. } => ErrorKind::Overrun,
            _ => ErrorKind::Other,
        }
    }
}
