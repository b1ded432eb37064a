// Licensed under the Apache-2.0 license

//! Test doubles for the register transports and the delay provider.

use crate::common::ppc_bit64;
use crate::i2c::common::TransportMode;
use crate::i2c::occ_lock::{OCCFLG_BASE, OCCFLG_CLEAR, OCCFLG_SET};
use crate::i2c::registers::{offset, Status};
use crate::i2c::traits::{FsiAccess, I2cRegisters, PibAccess};
use embedded_hal::delay::DelayNs;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MockError;

pub const COMPLETE: u32 = Status::CMD_COMPLETE;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Read(u32),
    Write(u32, u32),
}

/// Entry in a [`Trace`] shared between mocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    OccSet(u64),
    OccClear(u64),
    Register(Op),
    /// Pushed by test code to mark its own position.
    Marker,
}

/// Ordered log of accesses across several mocks.
pub type Trace = Rc<RefCell<Vec<Event>>>;

/// Scripted engine register block.
///
/// Status reads pop `status` until one value is left, which then repeats.
/// FIFO reads pop `fifo`, returning zero when it runs dry.
#[derive(Debug)]
pub struct MockEngine {
    pub mode: TransportMode,
    pub status: VecDeque<u32>,
    pub fifo: VecDeque<u32>,
    pub ops: Vec<Op>,
    pub fail: bool,
    pub trace: Option<Trace>,
}

impl MockEngine {
    pub fn new(statuses: &[u32]) -> Self {
        Self {
            mode: TransportMode::Fsi,
            status: statuses.iter().copied().collect(),
            fifo: VecDeque::new(),
            ops: Vec::new(),
            fail: false,
            trace: None,
        }
    }

    pub fn pib(statuses: &[u32]) -> Self {
        Self {
            mode: TransportMode::Pib,
            ..Self::new(statuses)
        }
    }

    pub fn with_fifo(mut self, words: &[u32]) -> Self {
        self.fifo = words.iter().copied().collect();
        self
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = Some(trace);
        self
    }

    fn log(&mut self, op: Op) {
        self.ops.push(op);
        if let Some(trace) = &self.trace {
            trace.borrow_mut().push(Event::Register(op));
        }
    }

    pub fn writes_to(&self, reg: u32) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                Op::Write(r, v) if r == reg => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn reads_of(&self, reg: u32) -> usize {
        self.ops.iter().filter(|op| **op == Op::Read(reg)).count()
    }

    /// Position of the first write to `reg` in the operation log.
    pub fn first_write(&self, reg: u32) -> Option<usize> {
        self.ops
            .iter()
            .position(|op| matches!(*op, Op::Write(r, _) if r == reg))
    }
}

impl I2cRegisters for MockEngine {
    type Error = MockError;

    fn mode(&self) -> TransportMode {
        self.mode
    }

    fn read_reg(&mut self, reg: u32) -> Result<u32, Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        self.log(Op::Read(reg));
        Ok(match reg {
            offset::STATUS => {
                if self.status.len() > 1 {
                    self.status.pop_front().unwrap_or_default()
                } else {
                    self.status.front().copied().unwrap_or_default()
                }
            }
            offset::FIFO => self.fifo.pop_front().unwrap_or_default(),
            _ => 0,
        })
    }

    fn write_reg(&mut self, reg: u32, value: u32) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        self.log(Op::Write(reg, value));
        Ok(())
    }
}

/// Counts and totals requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: usize,
    pub total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}

#[derive(Debug, Default)]
pub struct MockFsi {
    pub regs: HashMap<u32, u32>,
    pub writes: Vec<(u32, u32)>,
}

impl FsiAccess for MockFsi {
    type Error = MockError;

    fn fsi_read(&mut self, addr: u32) -> Result<u32, Self::Error> {
        Ok(self.regs.get(&addr).copied().unwrap_or_default())
    }

    fn fsi_write(&mut self, addr: u32, data: u32) -> Result<(), Self::Error> {
        self.writes.push((addr, data));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockPib {
    pub regs: HashMap<u64, u64>,
    pub writes: Vec<(u64, u64)>,
    pub fail: bool,
}

impl PibAccess for MockPib {
    type Error = MockError;

    fn pib_read(&mut self, addr: u64) -> Result<u64, Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        Ok(self.regs.get(&addr).copied().unwrap_or_default())
    }

    fn pib_write(&mut self, addr: u64, data: u64) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        self.writes.push((addr, data));
        Ok(())
    }
}

/// OCC flag register with write-one-to-set and write-one-to-clear aliases.
///
/// While `busy_reads` is non-zero, each base read reports every engine as
/// held by the OCC and counts down.
#[derive(Debug, Default)]
pub struct MockOccFlags {
    pub flags: u64,
    pub sets: usize,
    pub clears: usize,
    pub fail_clear: bool,
    pub busy_reads: usize,
    pub trace: Trace,
}

/// Lock bits of all three shareable engines.
pub const ALL_HELD: u64 = ppc_bit64(17) | ppc_bit64(19) | ppc_bit64(21);

impl PibAccess for MockOccFlags {
    type Error = MockError;

    fn pib_read(&mut self, addr: u64) -> Result<u64, Self::Error> {
        match addr {
            OCCFLG_BASE if self.busy_reads > 0 => {
                self.busy_reads -= 1;
                Ok(self.flags | ALL_HELD)
            }
            OCCFLG_BASE => Ok(self.flags),
            _ => Err(MockError),
        }
    }

    fn pib_write(&mut self, addr: u64, data: u64) -> Result<(), Self::Error> {
        match addr {
            OCCFLG_SET => {
                self.sets += 1;
                self.flags |= data;
                self.trace.borrow_mut().push(Event::OccSet(data));
                Ok(())
            }
            OCCFLG_CLEAR if self.fail_clear => Err(MockError),
            OCCFLG_CLEAR => {
                self.clears += 1;
                self.flags &= !data;
                self.trace.borrow_mut().push(Event::OccClear(data));
                Ok(())
            }
            _ => Err(MockError),
        }
    }
}
