use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};

use crate::constants::{HOLDER_SEED, SECONDS_PER_DAY, UPFRONT_VAULT_SEED};
use crate::error::TimelockError;
use crate::state::Registry;
use crate::utils::ledger::AssetLedger;

/// Derived release terms of one tranche. The byte image feeds the
/// registry's allocation digest, so the layout is fixed.
#[derive(
    AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable,
)]
#[repr(C)]
pub struct TrancheTerms {
    pub total_locked: u64,
    pub first_release_time: i64,
    pub period_length: i64,
    pub base_release_per_period: u64,
    pub period_accelerate: u64,
    pub period_count: u32,
    pub _padding: [u8; 4],
}

/// A named holder category and the schedules covering its locked remainder.
#[account]
#[derive(InitSpace, Debug)]
pub struct HolderAllocation {
    pub registry: Pubkey,
    pub index: u8,
    #[max_len(32)] // MAX_NAME_LEN
    pub name: String,
    pub beneficiary: Pubkey,
    pub pool_bps: u16,
    pub pool: u64,
    pub upfront_bps: u16,
    pub upfront_amount: u64,
    /// Token account holding the upfront amount until the registry seals.
    pub upfront_vault: Pubkey,
    pub upfront_paid: bool,
    #[max_len(4)] // MAX_TRANCHES
    pub tranches: Vec<TrancheTerms>,
    /// Timelock addresses, in tranche order, appended as they are created.
    #[max_len(4)]
    pub schedules: Vec<Pubkey>,
    pub bump: u8,
    pub upfront_vault_bump: u8,
}

impl HolderAllocation {
    pub fn address(registry: &Pubkey, index: u8) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[HOLDER_SEED, registry.as_ref(), &[index]], &crate::ID)
    }

    pub fn upfront_vault_address(holder: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[UPFRONT_VAULT_SEED, holder.as_ref()], &crate::ID)
    }

    pub fn locked_total(&self) -> u128 {
        self.tranches.iter().map(|t| t.total_locked as u128).sum()
    }

    /// `upfront + Σ tranche totals == pool`.
    pub fn closes(&self) -> bool {
        self.upfront_amount as u128 + self.locked_total() == self.pool as u128
    }

    pub fn fully_scheduled(&self) -> bool {
        self.schedules.len() == self.tranches.len()
    }

    /// Terms of tranche `tranche_index`, which must be the next one without a schedule.
    pub fn next_tranche(&self, tranche_index: u8) -> Result<TrancheTerms> {
        require!(
            tranche_index as usize == self.schedules.len(),
            TimelockError::TrancheOutOfOrder
        );
        self.tranches
            .get(tranche_index as usize)
            .copied()
            .ok_or_else(|| error!(TimelockError::TrancheOutOfOrder))
    }

    /// Moves the parked upfront amount to the beneficiary, once, after the
    /// registry sealed.
    pub fn release_upfront<L: AssetLedger + ?Sized>(
        &mut self,
        registry: &Registry,
        ledger: &mut L,
    ) -> Result<u64> {
        registry.require_sealed()?;
        require!(!self.upfront_paid, TimelockError::UpfrontAlreadyReleased);

        ledger.transfer(&self.upfront_vault, &self.beneficiary, self.upfront_amount)?;
        self.upfront_paid = true;
        Ok(self.upfront_amount)
    }

    /// e.g. "30% after 90 days" or "70% from 180 days, 12 x 30 days".
    pub fn tranche_desc(&self, terms: &TrancheTerms, setup_ts: i64) -> String {
        let pct = if self.pool == 0 {
            0
        } else {
            terms.total_locked as u128 * 100 / self.pool as u128
        };
        let lock_days = terms.first_release_time.saturating_sub(setup_ts) / SECONDS_PER_DAY;
        if terms.period_count <= 1 {
            format!("{pct}% after {lock_days} days")
        } else {
            format!(
                "{pct}% from {lock_days} days, {} x {} days",
                terms.period_count,
                terms.period_length / SECONDS_PER_DAY
            )
        }
    }

    /// One record per schedule created so far, in tranche order.
    pub fn timelock_addresses(&self, setup_ts: i64) -> Vec<TimelockAddress> {
        self.schedules
            .iter()
            .zip(&self.tranches)
            .enumerate()
            .map(|(i, (timelock, terms))| TimelockAddress {
                holder_name: self.name.clone(),
                desc: self.tranche_desc(terms, setup_ts),
                tranche_index: i as u8,
                amount: terms.total_locked,
                timelock: *timelock,
            })
            .collect()
    }

    pub fn summary(&self, holder: Pubkey) -> HolderSummary {
        HolderSummary {
            holder,
            name: self.name.clone(),
            beneficiary: self.beneficiary,
            pool: self.pool,
            upfront_amount: self.upfront_amount,
            locked_amount: self.pool - self.upfront_amount,
            schedules: self.schedules.clone(),
        }
    }
}

/// Instruction input describing one tranche of a holder's locked remainder.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TrancheInput {
    /// Seconds from registry setup until period 1 opens.
    pub lock_duration: i64,
    pub period_length: i64,
    pub period_count: u32,
    /// Share of the holder's locked remainder.
    pub share_bps: u16,
    /// Per-period release as bps of the tranche; 0 derives it from `period_count`.
    pub base_release_bps: u16,
    pub period_accelerate: u64,
}

/// Instruction input describing one holder category.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct HolderInput {
    pub name: String,
    pub beneficiary: Pubkey,
    /// Share of total supply.
    pub pool_bps: u16,
    /// Share of the pool paid to the beneficiary once the registry seals.
    pub upfront_bps: u16,
    pub tranches: Vec<TrancheInput>,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HolderSummary {
    pub holder: Pubkey,
    pub name: String,
    pub beneficiary: Pubkey,
    pub pool: u64,
    pub upfront_amount: u64,
    pub locked_amount: u64,
    pub schedules: Vec<Pubkey>,
}

#[event]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelockAddress {
    pub holder_name: String,
    pub desc: String,
    pub tranche_index: u8,
    pub amount: u64,
    pub timelock: Pubkey,
}
