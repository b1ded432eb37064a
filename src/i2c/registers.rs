// Licensed under the Apache-2.0 license

//! Register map and bit-field views of the POWER I2C master engine.
//!
//! Offsets are engine-relative. Bit numbers follow the hardware manuals
//! (MSB-0), see [`crate::common`].

use crate::common::{get_field, ppc_bit32, ppc_bitmask32, set_field};
use crate::i2c::common::EngineConfig;
use core::fmt;

pub mod offset {
    pub const FIFO: u32 = 0x0;
    pub const COMMAND: u32 = 0x1;
    pub const MODE: u32 = 0x2;
    pub const WATERMARK: u32 = 0x3;
    pub const INTERRUPT_MASK: u32 = 0x4;
    pub const INTERRUPT_CONDITION: u32 = 0x5;
    pub const INTERRUPT_STATUS: u32 = 0x6;
    /// Reads return status; writes trigger an immediate reset.
    pub const STATUS: u32 = 0x7;
    pub const IMMEDIATE_RESET: u32 = 0x7;
    /// Reads return extended status; writes reset the error state.
    pub const EXTENDED_STATUS: u32 = 0x8;
    pub const IMMEDIATE_RESET_ERROR: u32 = 0x8;
    pub const RESIDUAL: u32 = 0x9;
    pub const PORT_BUSY: u32 = 0xa;
}

/// Value written to the immediate reset registers.
pub const RESET_PATTERN: u32 = 0xb;

/// Command register contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Command(u32);

impl Command {
    pub const WITH_START: u32 = ppc_bit32(0);
    pub const WITH_ADDR: u32 = ppc_bit32(1);
    pub const READ_CONT: u32 = ppc_bit32(2);
    pub const WITH_STOP: u32 = ppc_bit32(3);
    pub const DEVICE_ADDR: u32 = ppc_bitmask32(8, 14);
    pub const READ_NOT_WRITE: u32 = ppc_bit32(15);
    pub const LENGTH: u32 = ppc_bitmask32(16, 31);

    /// Start, address phase, then `len` bytes supplied through the FIFO.
    #[must_use]
    pub const fn write(addr: u8, len: u16) -> Self {
        let bits = Self::WITH_START | Self::WITH_ADDR;
        let bits = set_field(Self::DEVICE_ADDR, bits, addr as u32);
        Self(set_field(Self::LENGTH, bits, len as u32))
    }

    /// Start, address phase, `len` bytes into the FIFO, then stop.
    #[must_use]
    pub const fn read(addr: u8, len: u16) -> Self {
        let bits = Self::WITH_START | Self::WITH_ADDR | Self::WITH_STOP | Self::READ_NOT_WRITE;
        let bits = set_field(Self::DEVICE_ADDR, bits, addr as u32);
        Self(set_field(Self::LENGTH, bits, len as u32))
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn device_address(self) -> u8 {
        get_field(Self::DEVICE_ADDR, self.0) as u8
    }

    #[must_use]
    pub const fn length(self) -> u16 {
        get_field(Self::LENGTH, self.0) as u16
    }
}

/// Mode register contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mode(u32);

impl Mode {
    pub const BIT_RATE_DIV: u32 = ppc_bitmask32(0, 15);
    pub const PORT_NUM: u32 = ppc_bitmask32(16, 21);
    pub const ENHANCED: u32 = ppc_bit32(28);
    pub const DIAGNOSTIC: u32 = ppc_bit32(29);
    pub const PACING_ALLOW: u32 = ppc_bit32(30);
    pub const WRAP: u32 = ppc_bit32(31);

    #[must_use]
    pub fn new(config: &EngineConfig, port: u8) -> Self {
        let bits = if config.pacing { Self::PACING_ALLOW } else { 0 };
        let bits = set_field(Self::BIT_RATE_DIV, bits, u32::from(config.bit_rate_divisor));
        Self(set_field(Self::PORT_NUM, bits, u32::from(port)))
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn port(self) -> u8 {
        get_field(Self::PORT_NUM, self.0) as u8
    }
}

/// Watermark register contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Watermark(u32);

impl Watermark {
    pub const HIGH: u32 = ppc_bitmask32(16, 19);
    pub const LOW: u32 = ppc_bitmask32(24, 27);

    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let bits = set_field(Self::HIGH, 0, u32::from(config.watermark_high));
        Self(set_field(Self::LOW, bits, u32::from(config.watermark_low)))
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

/// Snapshot of the status register.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Status(pub u32);

impl Status {
    pub const INVALID_CMD: u32 = ppc_bit32(0);
    pub const LBUS_PARITY_ERR: u32 = ppc_bit32(1);
    pub const BACKEND_OVERRUN_ERR: u32 = ppc_bit32(2);
    pub const BACKEND_ACCESS_ERR: u32 = ppc_bit32(3);
    pub const ARBITRATION_LOST_ERR: u32 = ppc_bit32(4);
    pub const NACK_RCVD_ERR: u32 = ppc_bit32(5);
    pub const DATA_REQUEST: u32 = ppc_bit32(6);
    pub const CMD_COMPLETE: u32 = ppc_bit32(7);
    pub const STOP_ERR: u32 = ppc_bit32(8);
    pub const MAX_PORT: u32 = ppc_bitmask32(9, 15);
    pub const ANY_INTERRUPT: u32 = ppc_bit32(16);
    pub const SCL_IN: u32 = ppc_bit32(20);
    pub const SDA_IN: u32 = ppc_bit32(21);
    pub const PORT_BUSY: u32 = ppc_bit32(22);
    pub const SELF_BUSY: u32 = ppc_bit32(23);
    pub const FIFO_COUNT: u32 = ppc_bitmask32(24, 31);

    pub const ANY_ERROR: u32 = Self::INVALID_CMD
        | Self::LBUS_PARITY_ERR
        | Self::BACKEND_OVERRUN_ERR
        | Self::BACKEND_ACCESS_ERR
        | Self::ARBITRATION_LOST_ERR
        | Self::NACK_RCVD_ERR
        | Self::STOP_ERR;

    #[must_use]
    pub const fn command_complete(self) -> bool {
        self.0 & Self::CMD_COMPLETE != 0
    }

    #[must_use]
    pub const fn has_error(self) -> bool {
        self.0 & Self::ANY_ERROR != 0
    }

    /// Only the error bits of the snapshot.
    #[must_use]
    pub const fn errors(self) -> u32 {
        self.0 & Self::ANY_ERROR
    }

    #[must_use]
    pub const fn nack(self) -> bool {
        self.0 & Self::NACK_RCVD_ERR != 0
    }

    #[must_use]
    pub const fn arbitration_lost(self) -> bool {
        self.0 & Self::ARBITRATION_LOST_ERR != 0
    }

    #[must_use]
    pub const fn port_busy(self) -> bool {
        self.0 & Self::PORT_BUSY != 0
    }

    #[must_use]
    pub const fn self_busy(self) -> bool {
        self.0 & Self::SELF_BUSY != 0
    }

    #[must_use]
    pub const fn max_port(self) -> u8 {
        get_field(Self::MAX_PORT, self.0) as u8
    }

    /// Bytes currently held in the FIFO.
    #[must_use]
    pub const fn fifo_count(self) -> u8 {
        get_field(Self::FIFO_COUNT, self.0) as u8
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#010x} (cmd_comp={} errors={:#010x} port_busy={} fifo={})",
            self.0,
            u8::from(self.command_complete()),
            self.errors(),
            u8::from(self.port_busy()),
            self.fifo_count()
        )
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtendedStatus(pub u32);

impl ExtendedStatus {
    pub const FIFO_SIZE: u32 = ppc_bitmask32(0, 7);
    pub const MSM_STATE: u32 = ppc_bitmask32(11, 15);
    pub const HIGH_WATER: u32 = ppc_bit32(22);
    pub const LOW_WATER: u32 = ppc_bit32(23);

    #[must_use]
    pub const fn fifo_size(self) -> u8 {
        get_field(Self::FIFO_SIZE, self.0) as u8
    }

    #[must_use]
    pub const fn msm_state(self) -> u8 {
        get_field(Self::MSM_STATE, self.0) as u8
    }

    #[must_use]
    pub const fn high_water(self) -> bool {
        self.0 & Self::HIGH_WATER != 0
    }

    #[must_use]
    pub const fn low_water(self) -> bool {
        self.0 & Self::LOW_WATER != 0
    }
}

/// Bytes left to transfer on the front (host) and back (bus) end.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Residual(pub u32);

impl Residual {
    pub const FRONT_END: u32 = ppc_bitmask32(0, 15);
    pub const BACK_END: u32 = ppc_bitmask32(16, 31);

    #[must_use]
    pub const fn front_end(self) -> u16 {
        get_field(Self::FRONT_END, self.0) as u16
    }

    #[must_use]
    pub const fn back_end(self) -> u16 {
        get_field(Self::BACK_END, self.0) as u16
    }
}

/// Diagnostic snapshot of the engine's read-only registers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterDump {
    pub status: Status,
    pub extended: ExtendedStatus,
    pub residual: Residual,
    pub port_busy: u32,
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status:      {}", self.status)?;
        writeln!(
            f,
            "ext status:  {:#010x} (fifo_size={} msm={:#x} high_water={} low_water={})",
            self.extended.0,
            self.extended.fifo_size(),
            self.extended.msm_state(),
            u8::from(self.extended.high_water()),
            u8::from(self.extended.low_water())
        )?;
        writeln!(
            f,
            "residual:    front={} back={}",
            self.residual.front_end(),
            self.residual.back_end()
        )?;
        write!(f, "port busy:   {:#010x}", self.port_busy)
    }
}
