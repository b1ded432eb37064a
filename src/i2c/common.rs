// Licensed under the Apache-2.0 license

//! Common types and configuration for the POWER I2C master driver.

use fugit::MillisDurationU32 as MilliSeconds;

/// Largest transfer the command register length field can carry.
pub const MAX_TRANSFER_LEN: usize = 0xffff;

/// Depth of the engine data FIFO in bytes.
pub const FIFO_CAPACITY: u8 = 8;

/// Width of one FIFO register access in bytes.
pub const FIFO_WORD: usize = 4;

/// Longest run of adjacent same-direction `embedded-hal` operations that is
/// merged into one engine command.
pub const MAX_MERGED_OPERATIONS: usize = 8;

/// Highest port number the mode register can select.
pub const MAX_PORT: u8 = 0x3f;

/// How the engine register block is reached.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransportMode {
    /// Direct 32-bit access through the FSI-attached engine.
    Fsi,
    /// 64-bit host/PIB access, data in the upper word.
    Pib,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Stage of a transaction at which the engine reported a failure.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Start condition and device address.
    Address,
    /// Payload moving through the FIFO.
    Data,
    /// Final status check after the payload.
    Completion,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bit-rate divisor programmed into the mode register.
    pub bit_rate_divisor: u16,
    /// FIFO high watermark (4-bit field).
    pub watermark_high: u8,
    /// FIFO low watermark (4-bit field).
    pub watermark_low: u8,
    /// Allow the engine to pace the bus.
    pub pacing: bool,
    /// Status reads per poll before giving up on command-complete.
    pub poll_attempts: u8,
    /// Wait between status reads.
    pub poll_interval: MilliSeconds,
    /// Wait after an immediate reset before reading status again.
    pub reset_settle: MilliSeconds,
    /// Consecutive full-FIFO polls tolerated before a write gives up.
    pub fifo_stall_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfigBuilder::new().build()
    }
}

pub struct EngineConfigBuilder {
    bit_rate_divisor: u16,
    watermark_high: u8,
    watermark_low: u8,
    pacing: bool,
    poll_attempts: u8,
    poll_interval: MilliSeconds,
    reset_settle: MilliSeconds,
    fifo_stall_limit: u32,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bit_rate_divisor: 28,
            watermark_high: 4,
            watermark_low: 4,
            pacing: true,
            poll_attempts: 10,
            poll_interval: MilliSeconds::millis(10),
            reset_settle: MilliSeconds::millis(10),
            fifo_stall_limit: 100,
        }
    }
    #[must_use]
    pub fn bit_rate_divisor(mut self, divisor: u16) -> Self {
        self.bit_rate_divisor = divisor;
        self
    }
    #[must_use]
    pub fn watermarks(mut self, high: u8, low: u8) -> Self {
        self.watermark_high = high;
        self.watermark_low = low;
        self
    }
    #[must_use]
    pub fn pacing(mut self, enabled: bool) -> Self {
        self.pacing = enabled;
        self
    }
    #[must_use]
    pub fn poll_attempts(mut self, attempts: u8) -> Self {
        self.poll_attempts = attempts;
        self
    }
    #[must_use]
    pub fn poll_interval(mut self, interval: MilliSeconds) -> Self {
        self.poll_interval = interval;
        self
    }
    #[must_use]
    pub fn reset_settle(mut self, settle: MilliSeconds) -> Self {
        self.reset_settle = settle;
        self
    }
    #[must_use]
    pub fn fifo_stall_limit(mut self, limit: u32) -> Self {
        self.fifo_stall_limit = limit;
        self
    }
    /// Watermarks are truncated to their 4-bit fields and at least one
    /// status read is always made per poll.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            bit_rate_divisor: self.bit_rate_divisor,
            watermark_high: self.watermark_high & 0xf,
            watermark_low: self.watermark_low & 0xf,
            pacing: self.pacing,
            poll_attempts: self.poll_attempts.max(1),
            poll_interval: self.poll_interval,
            reset_settle: self.reset_settle,
            fifo_stall_limit: self.fifo_stall_limit,
        }
    }
}
