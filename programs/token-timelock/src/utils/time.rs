//! Time sources and duration helpers.
//!
//! Schedules are evaluated against an explicit `now` (Unix seconds, UTC).
//! Handlers obtain it from a [`TimeSource`]; on-chain that is the `Clock`
//! sysvar, off-chain simulations advance a [`ManualClock`] by hand.

use std::cell::Cell;

use anchor_lang::prelude::*;

use crate::constants::{SECONDS_PER_DAY, SECONDS_PER_MONTH};
use crate::error::TimelockError;

pub trait TimeSource {
    /// Current time in Unix seconds. Must never go backwards.
    fn now(&self) -> Result<i64>;
}

/// Reads the runtime `Clock` sysvar.
#[derive(Clone, Copy, Debug, Default)]
pub struct SysvarClock;

impl TimeSource for SysvarClock {
    fn now(&self) -> Result<i64> {
        Ok(Clock::get()?.unix_timestamp)
    }
}

/// Hand-advanced clock for simulations and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Moves the clock to `ts`. Earlier timestamps are ignored.
    pub fn set(&self, ts: i64) {
        if ts > self.now.get() {
            self.now.set(ts);
        }
    }

    pub fn advance(&self, secs: i64) -> Result<i64> {
        require!(secs >= 0, TimelockError::InvalidConfig);
        let next = self
            .now
            .get()
            .checked_add(secs)
            .ok_or(TimelockError::MathOverflow)?;
        self.now.set(next);
        Ok(next)
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Result<i64> {
        Ok(self.now.get())
    }
}

pub const fn days(n: i64) -> i64 {
    n * SECONDS_PER_DAY
}

pub const fn months(n: i64) -> i64 {
    n * SECONDS_PER_MONTH
}

/// `setup_ts + lock_duration`, rejecting negative locks.
pub fn first_release_time(setup_ts: i64, lock_duration: i64) -> Result<i64> {
    require!(lock_duration >= 0, TimelockError::InvalidConfig);
    Ok(setup_ts
        .checked_add(lock_duration)
        .ok_or(TimelockError::MathOverflow)?)
}
