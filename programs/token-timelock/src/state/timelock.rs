use anchor_lang::prelude::*;

use crate::constants::{TIMELOCK_SEED, TIMELOCK_VAULT_SEED};
use crate::error::TimelockError;
use crate::state::TrancheTerms;
use crate::utils::ledger::AssetLedger;

/// One release schedule over a pre-funded vault.
///
/// Period `i` (1-indexed) unlocks `base_release_per_period +
/// period_accelerate * (i - 1)`; period 1 opens at `first_release_time` and
/// each later period `period_length` seconds after the previous one.
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TimelockSchedule {
    /// Registry this schedule was created by.
    pub registry: Pubkey,
    /// Owning holder allocation (lookup only).
    pub holder: Pubkey,
    /// Position within the holder's tranche list.
    pub tranche_index: u8,
    /// Wallet credited on release.
    pub beneficiary: Pubkey,
    /// Token account holding the locked pool.
    pub vault: Pubkey,
    pub total_locked: u64,
    pub first_release_time: i64,
    pub period_length: i64,
    pub total_periods: u32,
    pub base_release_per_period: u64,
    pub period_accelerate: u64,
    /// Cumulative amount transferred to the beneficiary.
    pub paid_amount: u64,
    /// Highest period index already paid.
    pub paid_periods: u64,
    pub bump: u8,
    pub vault_bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleStatus {
    Locked,
    Vesting,
    FullyReleased,
}

/// Unclamped `n * base + accelerate * n * (n - 1) / 2`; `None` on overflow.
pub fn ramp_total(n: u64, base: u64, accelerate: u64) -> Option<u128> {
    if n == 0 {
        return Some(0);
    }
    let n = n as u128;
    let pairs = n.checked_mul(n - 1)? / 2;
    let linear = n.checked_mul(base as u128)?;
    let ramp = (accelerate as u128).checked_mul(pairs)?;
    linear.checked_add(ramp)
}

impl TimelockSchedule {
    pub const SIZE: usize =
        32 + // registry
        32 + // holder
        1 +  // tranche_index
        32 + // beneficiary
        32 + // vault
        8 +  // total_locked
        8 +  // first_release_time
        8 +  // period_length
        4 +  // total_periods
        8 +  // base_release_per_period
        8 +  // period_accelerate
        8 +  // paid_amount
        8 +  // paid_periods
        1 +  // bump
        1;   // vault_bump

    pub fn new(
        registry: Pubkey,
        holder: Pubkey,
        tranche_index: u8,
        beneficiary: Pubkey,
        vault: Pubkey,
        terms: &TrancheTerms,
    ) -> Self {
        Self {
            registry,
            holder,
            tranche_index,
            beneficiary,
            vault,
            total_locked: terms.total_locked,
            first_release_time: terms.first_release_time,
            period_length: terms.period_length,
            total_periods: terms.period_count,
            base_release_per_period: terms.base_release_per_period,
            period_accelerate: terms.period_accelerate,
            paid_amount: 0,
            paid_periods: 0,
            bump: 0,
            vault_bump: 0,
        }
    }

    pub fn address(holder: &Pubkey, tranche_index: u8) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[TIMELOCK_SEED, holder.as_ref(), &[tranche_index]],
            &crate::ID,
        )
    }

    pub fn vault_address(timelock: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[TIMELOCK_VAULT_SEED, timelock.as_ref()], &crate::ID)
    }

    /// Number of periods open at `now`, counting the one that opens exactly at `now`.
    pub fn calc_passed_periods(&self, now: i64) -> u64 {
        if now < self.first_release_time || self.period_length <= 0 {
            return 0;
        }
        let elapsed = now.abs_diff(self.first_release_time);
        1u64.saturating_add(elapsed / self.period_length.unsigned_abs())
    }

    /// Total unlocked after `passed_periods`, capped at `total_locked`.
    /// The final period also unlocks any rounding dust.
    pub fn cumulative_releasable(&self, passed_periods: u64) -> u64 {
        if passed_periods >= u64::from(self.total_periods) {
            return self.total_locked;
        }
        match ramp_total(
            passed_periods,
            self.base_release_per_period,
            self.period_accelerate,
        ) {
            Some(v) if v < self.total_locked as u128 => v as u64,
            _ => self.total_locked,
        }
    }

    pub fn releasable_amount(&self, now: i64) -> u64 {
        self.cumulative_releasable(self.calc_passed_periods(now))
            .saturating_sub(self.paid_amount)
    }

    /// Pays out everything releasable at `now`. Returns the amount moved;
    /// 0 means nothing was due and nothing changed.
    ///
    /// Counters move only after the ledger transfer committed.
    pub fn release<L: AssetLedger + ?Sized>(&mut self, now: i64, ledger: &mut L) -> Result<u64> {
        let amount = self.releasable_amount(now);
        if amount == 0 {
            return Ok(0);
        }

        let remaining = self
            .total_locked
            .checked_sub(self.paid_amount)
            .ok_or(TimelockError::MathOverflow)?;
        require!(
            ledger.balance_of(&self.vault) >= remaining,
            TimelockError::PoolBalanceDiverged
        );

        ledger.transfer(&self.vault, &self.beneficiary, amount)?;

        self.paid_amount = self
            .paid_amount
            .checked_add(amount)
            .ok_or(TimelockError::MathOverflow)?;
        self.paid_periods = self.paid_periods.max(self.calc_passed_periods(now));
        Ok(amount)
    }

    pub fn next_release_time(&self) -> i64 {
        if self.paid_periods == 0 {
            return self.first_release_time;
        }
        let offset = i64::try_from(self.paid_periods)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.period_length);
        self.first_release_time.saturating_add(offset)
    }

    pub fn status(&self, now: i64) -> ScheduleStatus {
        if self.paid_amount >= self.total_locked {
            ScheduleStatus::FullyReleased
        } else if now < self.first_release_time {
            ScheduleStatus::Locked
        } else {
            ScheduleStatus::Vesting
        }
    }

    pub fn release_amount(&self) -> u64 {
        self.base_release_per_period
    }

    pub fn release_period(&self) -> i64 {
        self.period_length
    }

    pub fn period_accelerate(&self) -> u64 {
        self.period_accelerate
    }

    pub fn payed_period(&self) -> u64 {
        self.paid_periods
    }

    /// Time at which the last period opens.
    pub fn fully_vested_at(&self) -> i64 {
        let periods = i64::from(self.total_periods.saturating_sub(1));
        self.first_release_time
            .saturating_add(periods.saturating_mul(self.period_length))
    }
}
