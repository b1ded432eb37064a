// Licensed under the Apache-2.0 license

//! OCC ownership handshake for host/PIB-attached engines.
//!
//! The on-chip controller (OCC) drives some of the same I2C engines. Each
//! shareable engine owns a pair of bits in the OCC flag register, starting
//! at bit 16 (MSB-0); the second bit of the pair marks the engine as taken.
//! The register has write-one-to-set and write-one-to-clear aliases.
//!
//! The check-then-set sequence is not atomic with respect to the OCC. The
//! OCC is a separate hardware agent, so no software lock can close that
//! window; it is inherent to the handshake.

use crate::common::ppc_bit64;
use crate::i2c::error::Error;
use crate::i2c::traits::PibAccess;

pub const OCCFLG_BASE: u64 = 0x6c08a;
pub const OCCFLG_CLEAR: u64 = 0x6c08b;
pub const OCCFLG_SET: u64 = 0x6c08c;

/// Why a transaction was not attempted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No enabled host access target to reach the OCC flag register.
    NoHostAccess,
    /// The OCC holds the engine.
    LockedByOther { engine: u8 },
}

/// Result of an operation gated by the OCC lock.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Access<T = ()> {
    Performed(T),
    Skipped(SkipReason),
}

impl<T> Access<T> {
    pub fn is_performed(&self) -> bool {
        matches!(self, Access::Performed(_))
    }
}

/// Flag register bit for engine `id`, if the engine is shareable.
#[must_use]
pub const fn lock_mask(id: u8) -> Option<u64> {
    match id {
        1..=3 => Some(ppc_bit64(15 + 2 * id as u32)),
        _ => None,
    }
}

/// Held OCC lock. The flag bit is cleared by [`OccLock::release`], or on
/// drop if the holder unwinds without releasing.
pub struct OccLock<'h, H: PibAccess> {
    host: &'h mut H,
    engine: u8,
    mask: u64,
    held: bool,
}

impl<'h, H: PibAccess> OccLock<'h, H> {
    /// Take the lock for `engine` unless the OCC already holds it.
    ///
    /// # Errors
    ///
    /// * [`Error::NoLockBit`] if `engine` has no bit in the flag register.
    /// * [`Error::Transport`] if the flag register cannot be accessed.
    pub fn acquire(host: &'h mut H, engine: u8) -> Result<Option<Self>, Error<H::Error>> {
        let mask = lock_mask(engine).ok_or(Error::NoLockBit(engine))?;
        let flags = host.pib_read(OCCFLG_BASE).map_err(Error::Transport)?;
        if flags & mask != 0 {
            return Ok(None);
        }
        host.pib_write(OCCFLG_SET, mask).map_err(Error::Transport)?;
        Ok(Some(Self {
            host,
            engine,
            mask,
            held: true,
        }))
    }

    /// Clear the flag bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the clear write fails.
    pub fn release(mut self) -> Result<(), Error<H::Error>> {
        self.held = false;
        self.host
            .pib_write(OCCFLG_CLEAR, self.mask)
            .map_err(Error::Transport)
    }
}

impl<H: PibAccess> Drop for OccLock<'_, H> {
    fn drop(&mut self) {
        if self.held && self.host.pib_write(OCCFLG_CLEAR, self.mask).is_err() {
            log::error!("i2cm{}: failed to release OCC lock", self.engine);
        }
    }
}

/// Run `body` while holding the OCC lock for `engine`.
///
/// Without a host access target, or with the engine held by the OCC, `body`
/// is not run and the skip is reported as [`Access::Skipped`]. Once taken,
/// the lock is cleared whether `body` succeeds or fails; a `body` error
/// wins over a failure to clear.
///
/// # Errors
///
/// * [`Error::NoLockBit`] if `engine` has no bit in the flag register.
/// * [`Error::Transport`] if the flag register cannot be accessed.
/// * Any error returned by `body`.
pub fn with_lock<H, T, F>(
    host: Option<&mut H>,
    engine: u8,
    body: F,
) -> Result<Access<T>, Error<H::Error>>
where
    H: PibAccess,
    F: FnOnce() -> Result<T, Error<H::Error>>,
{
    let Some(host) = host else {
        log::warn!("i2cm{engine}: no host access available, skipping");
        return Ok(Access::Skipped(SkipReason::NoHostAccess));
    };
    let Some(lock) = OccLock::acquire(host, engine)? else {
        log::warn!("i2cm{engine}: engine locked by OCC, skipping");
        return Ok(Access::Skipped(SkipReason::LockedByOther { engine }));
    };

    let result = body();
    let released = lock.release();
    match (result, released) {
        (Ok(value), Ok(())) => Ok(Access::Performed(value)),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), released) => {
            if released.is_err() {
                log::error!("i2cm{engine}: failed to release OCC lock");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::mock::{Event, MockError, MockOccFlags};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn lock_bits_per_engine() {
        assert_eq!(lock_mask(1), Some(ppc_bit64(17)));
        assert_eq!(lock_mask(2), Some(ppc_bit64(19)));
        assert_eq!(lock_mask(3), Some(ppc_bit64(21)));
        assert_eq!(lock_mask(0), None);
        assert_eq!(lock_mask(4), None);
    }

    #[test]
    fn body_runs_with_bit_set_and_bit_is_cleared() {
        let mut host = MockOccFlags::default();
        let trace = Rc::clone(&host.trace);
        let mask = ppc_bit64(19);

        let outcome = with_lock(Some(&mut host), 2, || {
            assert_eq!(*trace.borrow(), vec![Event::OccSet(mask)]);
            trace.borrow_mut().push(Event::Marker);
            Ok::<_, Error<MockError>>(7)
        })
        .unwrap();

        assert_eq!(outcome, Access::Performed(7));
        assert_eq!(
            *trace.borrow(),
            vec![Event::OccSet(mask), Event::Marker, Event::OccClear(mask)]
        );
        assert_eq!(host.flags, 0);
    }

    #[test]
    fn failing_body_still_runs_inside_the_lock() {
        let mut host = MockOccFlags::default();
        let trace = Rc::clone(&host.trace);
        let mask = ppc_bit64(17);

        let result = with_lock(Some(&mut host), 1, || {
            trace.borrow_mut().push(Event::Marker);
            Err::<(), _>(Error::<MockError>::UnknownPort)
        });

        assert_eq!(result, Err(Error::UnknownPort));
        assert_eq!(
            *trace.borrow(),
            vec![Event::OccSet(mask), Event::Marker, Event::OccClear(mask)]
        );
    }

    #[test]
    fn engine_held_by_occ_is_skipped() {
        let mut host = MockOccFlags {
            flags: ppc_bit64(17),
            ..MockOccFlags::default()
        };
        let calls = Cell::new(0);

        let outcome = with_lock(Some(&mut host), 1, || {
            calls.set(calls.get() + 1);
            Ok::<_, Error<MockError>>(())
        })
        .unwrap();

        assert_eq!(
            outcome,
            Access::Skipped(SkipReason::LockedByOther { engine: 1 })
        );
        assert_eq!(calls.get(), 0);
        assert_eq!(host.sets, 0);
        assert_eq!(host.clears, 0);
        assert_eq!(host.flags, ppc_bit64(17));
    }

    #[test]
    fn other_engines_bits_do_not_block() {
        let mut host = MockOccFlags {
            flags: ppc_bit64(17) | ppc_bit64(21),
            ..MockOccFlags::default()
        };
        let outcome = with_lock(Some(&mut host), 2, || Ok::<_, Error<MockError>>(())).unwrap();
        assert!(outcome.is_performed());
        assert_eq!(host.flags, ppc_bit64(17) | ppc_bit64(21));
    }

    #[test]
    fn lock_is_cleared_when_body_fails() {
        let mut host = MockOccFlags::default();

        let result = with_lock(Some(&mut host), 3, || {
            Err::<(), _>(Error::LengthMismatch {
                expected: 4,
                actual: 0,
            })
        });

        assert_eq!(
            result,
            Err(Error::LengthMismatch {
                expected: 4,
                actual: 0
            })
        );
        assert_eq!(host.clears, 1);
        assert_eq!(host.flags, 0);
    }

    #[test]
    fn missing_host_skips_without_running_body() {
        let calls = Cell::new(0);
        let outcome = with_lock::<MockOccFlags, _, _>(None, 1, || {
            calls.set(1);
            Ok(())
        })
        .unwrap();
        assert_eq!(outcome, Access::Skipped(SkipReason::NoHostAccess));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn unlockable_engine_is_rejected() {
        let mut host = MockOccFlags::default();
        let result = with_lock(Some(&mut host), 0, || Ok::<_, Error<MockError>>(()));
        assert_eq!(result, Err(Error::NoLockBit(0)));
        assert_eq!(host.sets, 0);
    }

    #[test]
    fn failed_clear_is_reported() {
        let mut host = MockOccFlags {
            fail_clear: true,
            ..MockOccFlags::default()
        };
        let result = with_lock(Some(&mut host), 1, || Ok::<_, Error<MockError>>(()));
        assert_eq!(result, Err(Error::Transport(MockError)));
    }

    #[test]
    fn dropped_guard_clears_the_bit() {
        let mut host = MockOccFlags::default();
        {
            let lock = OccLock::acquire(&mut host, 1).unwrap();
            assert!(lock.is_some());
        }
        assert_eq!(host.sets, 1);
        assert_eq!(host.clears, 1);
        assert_eq!(host.flags, 0);
    }
}
