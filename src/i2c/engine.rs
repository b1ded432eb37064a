// Licensed under the Apache-2.0 license

//! I2C master engine and its state controller.
//!
//! An [`Engine`] is one physical I2C master: a register block reached
//! through an [`I2cRegisters`] transport, a delay provider used while
//! polling, and the configuration programmed before every transaction.
//! The FIFO and transaction layers are implemented on the same type in
//! [`fifo`](crate::i2c::fifo) and [`transaction`](crate::i2c::transaction).

use crate::i2c::common::{EngineConfig, TransportMode};
use crate::i2c::error::Error;
use crate::i2c::registers::{
    offset, ExtendedStatus, Mode, RegisterDump, Residual, Status, Watermark, RESET_PATTERN,
};
use crate::i2c::traits::I2cRegisters;
use embedded_hal::delay::DelayNs;

pub struct Engine<R, D> {
    id: u8,
    regs: R,
    delay: D,
    config: EngineConfig,
}

impl<R: I2cRegisters, D: DelayNs> Engine<R, D> {
    /// `id` is the engine number on its chip; PIB engines use it to pick
    /// their OCC lock bit.
    pub fn new(id: u8, regs: R, delay: D, config: EngineConfig) -> Self {
        Self {
            id,
            regs,
            delay,
            config,
        }
    }

    #[must_use]
    pub fn id(&self) -> u8 {
        self.id
    }

    #[must_use]
    pub fn mode(&self) -> TransportMode {
        self.regs.mode()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &R {
        &self.regs
    }

    #[must_use]
    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn into_parts(self) -> (R, D) {
        (self.regs, self.delay)
    }

    pub(crate) fn read_reg(&mut self, reg: u32) -> Result<u32, Error<R::Error>> {
        self.regs.read_reg(reg).map_err(Error::Transport)
    }

    pub(crate) fn write_reg(&mut self, reg: u32, value: u32) -> Result<(), Error<R::Error>> {
        self.regs.write_reg(reg, value).map_err(Error::Transport)
    }

    /// Read the status register once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the register access fails.
    pub fn status(&mut self) -> Result<Status, Error<R::Error>> {
        self.read_reg(offset::STATUS).map(Status)
    }

    /// Immediately reset the engine and clear its error state, then give the
    /// hardware time to settle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if either reset write fails.
    pub fn reset(&mut self) -> Result<(), Error<R::Error>> {
        log::debug!("i2cm{}: resetting engine", self.id);
        self.write_reg(offset::IMMEDIATE_RESET, RESET_PATTERN)?;
        self.write_reg(offset::IMMEDIATE_RESET_ERROR, RESET_PATTERN)?;
        self.delay.delay_ms(self.config.reset_settle.to_millis());
        Ok(())
    }

    /// Make sure the engine can accept a command for `port`.
    ///
    /// An engine that is idle without errors only gets its watermark and
    /// mode reprogrammed. Otherwise it is reset once; if error bits survive
    /// the reset the engine is reported unusable and nothing is programmed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a register access fails.
    pub fn ensure_usable(&mut self, port: u8) -> Result<bool, Error<R::Error>> {
        let mut status = self.status()?;
        if !status.command_complete() || status.has_error() {
            self.reset()?;
            status = self.status()?;
        }

        if status.has_error() {
            log::error!("i2cm{}: engine not usable, status {}", self.id, status);
            if log::log_enabled!(log::Level::Debug) {
                if let Ok(dump) = self.dump_registers() {
                    log::debug!("i2cm{} registers:\n{}", self.id, dump);
                }
            }
            return Ok(false);
        }

        let watermark = Watermark::new(&self.config);
        self.write_reg(offset::WATERMARK, watermark.bits())?;
        let mode = Mode::new(&self.config, port);
        self.write_reg(offset::MODE, mode.bits())?;
        Ok(true)
    }

    /// Poll the status register until command-complete shows up or the
    /// configured number of attempts runs out.
    ///
    /// The last snapshot is returned either way. The poll failed if it
    /// carries error bits ([`Status::has_error`]); a clean snapshot without
    /// command-complete means the engine is still busy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a register access fails.
    pub fn poll_status(&mut self) -> Result<Status, Error<R::Error>> {
        let attempts = self.config.poll_attempts;
        let mut status = Status::default();
        for attempt in 1..=attempts {
            status = self.status()?;
            if status.command_complete() {
                break;
            }
            if attempt < attempts {
                self.delay.delay_ms(self.config.poll_interval.to_millis());
            }
        }
        if status.has_error() {
            log::debug!("i2cm{}: poll failed, status {}", self.id, status);
        }
        Ok(status)
    }

    /// Snapshot the diagnostic registers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a register access fails.
    pub fn dump_registers(&mut self) -> Result<RegisterDump, Error<R::Error>> {
        Ok(RegisterDump {
            status: self.status()?,
            extended: ExtendedStatus(self.read_reg(offset::EXTENDED_STATUS)?),
            residual: Residual(self.read_reg(offset::RESIDUAL)?),
            port_busy: self.read_reg(offset::PORT_BUSY)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::common::EngineConfigBuilder;
    use crate::i2c::mock::{MockDelay, MockEngine, MockError, Op, COMPLETE};

    fn engine(statuses: &[u32]) -> Engine<MockEngine, MockDelay> {
        Engine::new(
            1,
            MockEngine::new(statuses),
            MockDelay::default(),
            EngineConfig::default(),
        )
    }

    #[test]
    fn usable_engine_is_only_reprogrammed() {
        let mut engine = engine(&[COMPLETE]);

        assert!(engine.ensure_usable(2).unwrap());

        let regs = engine.transport();
        assert!(regs.writes_to(offset::IMMEDIATE_RESET).is_empty());
        assert_eq!(regs.writes_to(offset::WATERMARK), vec![0x0000_4040]);
        assert_eq!(regs.writes_to(offset::MODE), vec![0x001c_0802]);
        assert_eq!(engine.delay().calls, 0);
    }

    #[test]
    fn errored_engine_recovers_after_one_reset() {
        let mut engine = engine(&[COMPLETE | Status::NACK_RCVD_ERR, COMPLETE]);

        assert!(engine.ensure_usable(0).unwrap());

        let regs = engine.transport();
        assert_eq!(regs.writes_to(offset::IMMEDIATE_RESET), vec![RESET_PATTERN]);
        assert_eq!(
            regs.writes_to(offset::IMMEDIATE_RESET_ERROR),
            vec![RESET_PATTERN]
        );
        assert_eq!(regs.reads_of(offset::STATUS), 2);
        assert_eq!(regs.writes_to(offset::WATERMARK).len(), 1);
        assert_eq!(regs.writes_to(offset::MODE).len(), 1);
        assert_eq!(engine.delay().total_ns, 10_000_000);
    }

    #[test]
    fn busy_engine_is_reset() {
        // Command-complete clear without errors still needs a reset.
        let mut engine = engine(&[0, COMPLETE]);
        assert!(engine.ensure_usable(0).unwrap());
        assert_eq!(
            engine.transport().writes_to(offset::IMMEDIATE_RESET).len(),
            1
        );
    }

    #[test]
    fn persistent_error_is_unusable_after_single_reset() {
        let mut engine = engine(&[Status::BACKEND_ACCESS_ERR]);

        assert!(!engine.ensure_usable(0).unwrap());

        let regs = engine.transport();
        assert_eq!(regs.writes_to(offset::IMMEDIATE_RESET).len(), 1);
        assert_eq!(regs.writes_to(offset::IMMEDIATE_RESET_ERROR).len(), 1);
        assert!(regs.writes_to(offset::WATERMARK).is_empty());
        assert!(regs.writes_to(offset::MODE).is_empty());
    }

    #[test]
    fn poll_stops_on_command_complete() {
        let mut engine = engine(&[0, 0, COMPLETE, 0]);

        let status = engine.poll_status().unwrap();

        assert!(status.command_complete());
        assert_eq!(engine.transport().reads_of(offset::STATUS), 3);
        assert_eq!(engine.delay().calls, 2);
    }

    #[test]
    fn poll_gives_up_after_ten_attempts() {
        let mut engine = engine(&[0]);

        let status = engine.poll_status().unwrap();

        assert!(!status.command_complete());
        assert!(!status.has_error());
        assert_eq!(engine.transport().reads_of(offset::STATUS), 10);
        assert_eq!(engine.delay().total_ns, 9 * 10_000_000);
    }

    #[test]
    fn poll_reports_error_bits() {
        let mut engine = engine(&[COMPLETE | Status::STOP_ERR]);
        let status = engine.poll_status().unwrap();
        assert!(status.has_error());
        assert_eq!(engine.transport().reads_of(offset::STATUS), 1);
    }

    #[test]
    fn poll_attempts_are_configurable() {
        let config = EngineConfigBuilder::new().poll_attempts(3).build();
        let mut engine = Engine::new(0, MockEngine::new(&[0]), MockDelay::default(), config);
        engine.poll_status().unwrap();
        assert_eq!(engine.transport().reads_of(offset::STATUS), 3);
    }

    #[test]
    fn transport_failure_propagates() {
        let mut regs = MockEngine::new(&[COMPLETE]);
        regs.fail = true;
        let mut engine = Engine::new(0, regs, MockDelay::default(), EngineConfig::default());
        assert_eq!(engine.ensure_usable(0), Err(Error::Transport(MockError)));
        assert_eq!(engine.poll_status(), Err(Error::Transport(MockError)));
    }

    #[test]
    fn parts_come_back_with_their_history() {
        let mut engine = engine(&[COMPLETE]);
        engine.reset().unwrap();

        let (regs, delay) = engine.into_parts();

        assert_eq!(regs.writes_to(offset::IMMEDIATE_RESET), vec![RESET_PATTERN]);
        assert_eq!(delay.calls, 1);
        assert_eq!(delay.total_ns, 10_000_000);
    }

    #[test]
    fn dump_reads_diagnostic_registers() {
        let mut engine = engine(&[COMPLETE]);
        let dump = engine.dump_registers().unwrap();
        assert!(dump.status.command_complete());
        assert_eq!(
            engine.transport().ops,
            vec![
                Op::Read(offset::STATUS),
                Op::Read(offset::EXTENDED_STATUS),
                Op::Read(offset::RESIDUAL),
                Op::Read(offset::PORT_BUSY),
            ]
        );
    }
}
