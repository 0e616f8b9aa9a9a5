//! Allocation planning.
//!
//! Turns `HolderInput`s into concrete pools, upfront amounts, and tranche
//! terms, and validates them. The program's setup instructions and the
//! in-memory [`HolderRegistry`] both go through [`plan_holder`], so a preview
//! built here matches what gets deployed, digest included.

use anchor_lang::prelude::*;

use crate::constants::{BPS_DENOMINATOR, MAX_HOLDERS, MAX_NAME_LEN, MAX_TRANCHES};
use crate::error::TimelockError;
use crate::state::{
    ramp_total, HolderAllocation, HolderInput, HolderSummary, Registry, TimelockAddress,
    TimelockSchedule, TrancheInput, TrancheTerms,
};
use crate::utils::ledger::AssetLedger;
use crate::utils::time;

/// Concrete amounts for one holder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HolderPlan {
    pub pool: u64,
    pub upfront_amount: u64,
    pub tranches: Vec<TrancheTerms>,
}

impl HolderPlan {
    pub fn locked_amount(&self) -> u64 {
        self.pool - self.upfront_amount
    }
}

pub fn bps_of(amount: u64, bps: u16) -> Result<u64> {
    require!(u64::from(bps) <= BPS_DENOMINATOR, TimelockError::InvalidBps);
    let v = (amount as u128)
        .checked_mul(bps as u128)
        .ok_or(TimelockError::MathOverflow)?
        / BPS_DENOMINATOR as u128;
    Ok(u64::try_from(v).map_err(|_| TimelockError::MathOverflow)?)
}

/// Checks that `period_count` periods of `base` (plus the accelerate ramp)
/// land within one unit per period of `total_locked`.
pub fn reconcile_tranche(
    total_locked: u64,
    base: u64,
    accelerate: u64,
    period_count: u32,
) -> Result<()> {
    require!(period_count > 0, TimelockError::InvalidConfig);
    let planned = ramp_total(u64::from(period_count), base, accelerate)
        .ok_or(TimelockError::MathOverflow)?;
    require!(
        planned.abs_diff(total_locked as u128) < u128::from(period_count),
        TimelockError::TrancheDoesNotReconcile
    );
    Ok(())
}

pub fn derive_tranche(total_locked: u64, setup_ts: i64, input: &TrancheInput) -> Result<TrancheTerms> {
    require!(input.period_length > 0, TimelockError::InvalidConfig);
    require!(input.period_count > 0, TimelockError::InvalidConfig);
    let first_release_time = time::first_release_time(setup_ts, input.lock_duration)?;

    let base_release_per_period = if input.base_release_bps > 0 {
        bps_of(total_locked, input.base_release_bps)?
    } else {
        let n = u64::from(input.period_count);
        let ramp = ramp_total(n, 0, input.period_accelerate).ok_or(TimelockError::MathOverflow)?;
        let linear = (total_locked as u128)
            .checked_sub(ramp)
            .ok_or(TimelockError::TrancheDoesNotReconcile)?;
        (linear / n as u128) as u64
    };
    reconcile_tranche(
        total_locked,
        base_release_per_period,
        input.period_accelerate,
        input.period_count,
    )?;

    Ok(TrancheTerms {
        total_locked,
        first_release_time,
        period_length: input.period_length,
        base_release_per_period,
        period_accelerate: input.period_accelerate,
        period_count: input.period_count,
        _padding: [0u8; 4],
    })
}

pub fn plan_holder(total_supply: u64, setup_ts: i64, input: &HolderInput) -> Result<HolderPlan> {
    require!(
        !input.name.is_empty() && input.name.len() <= MAX_NAME_LEN,
        TimelockError::NameTooLong
    );
    require!(input.beneficiary != Pubkey::default(), TimelockError::InvalidConfig);
    require!(input.pool_bps > 0, TimelockError::InvalidConfig);
    require!(input.tranches.len() <= MAX_TRANCHES, TimelockError::TooManyTranches);

    let pool = bps_of(total_supply, input.pool_bps)?;
    let upfront_amount = bps_of(pool, input.upfront_bps)?;
    let remainder = pool - upfront_amount;

    if remainder == 0 {
        require!(input.tranches.is_empty(), TimelockError::InvalidConfig);
        return Ok(HolderPlan {
            pool,
            upfront_amount,
            tranches: Vec::new(),
        });
    }
    require!(!input.tranches.is_empty(), TimelockError::InvalidConfig);

    let shares: u64 = input.tranches.iter().map(|t| u64::from(t.share_bps)).sum();
    require!(shares == BPS_DENOMINATOR, TimelockError::TrancheSharesMismatch);

    let mut tranches = Vec::with_capacity(input.tranches.len());
    let mut assigned: u64 = 0;
    for (i, t) in input.tranches.iter().enumerate() {
        require!(t.share_bps > 0, TimelockError::InvalidConfig);
        // Last tranche absorbs the bps rounding so the holder closes exactly.
        let total_locked = if i + 1 == input.tranches.len() {
            remainder - assigned
        } else {
            bps_of(remainder, t.share_bps)?
        };
        require!(total_locked > 0, TimelockError::InvalidConfig);
        assigned = assigned
            .checked_add(total_locked)
            .ok_or(TimelockError::MathOverflow)?;
        tranches.push(derive_tranche(total_locked, setup_ts, t)?);
    }

    Ok(HolderPlan {
        pool,
        upfront_amount,
        tranches,
    })
}

/// Chains one holder's terms onto the running allocation digest.
pub fn fold_digest(prev: &[u8; 32], input: &HolderInput, plan: &HolderPlan) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(prev);
    hasher.update(input.name.as_bytes());
    hasher.update(input.beneficiary.as_ref());
    hasher.update(&plan.pool.to_le_bytes());
    hasher.update(&plan.upfront_amount.to_le_bytes());
    for t in &plan.tranches {
        hasher.update(bytemuck::bytes_of(t));
    }
    *hasher.finalize().as_bytes()
}

/// The whole registry held in memory: holders, their schedules, and the
/// setup bookkeeping the program keeps in the `Registry` account.
#[derive(Clone, Debug)]
pub struct HolderRegistry {
    key: Pubkey,
    registry: Registry,
    holders: Vec<(Pubkey, HolderAllocation)>,
    schedules: Vec<(Pubkey, TimelockSchedule)>,
}

impl HolderRegistry {
    /// Plans and admits every holder, then parks the upfront amounts and
    /// funds every schedule from `supply_source`. Upfront amounts reach the
    /// beneficiaries only once the registry sealed, and nothing moves at all
    /// unless the whole allocation validates.
    pub fn initialize<L: AssetLedger + ?Sized>(
        mint: Pubkey,
        authority: Pubkey,
        supply_source: Pubkey,
        setup_ts: i64,
        inputs: &[HolderInput],
        ledger: &mut L,
    ) -> Result<Self> {
        let total_supply = ledger.total_supply();
        require!(total_supply > 0, TimelockError::InvalidConfig);
        require!(inputs.len() <= MAX_HOLDERS, TimelockError::TooManyHolders);

        let (key, bump) = Registry::address(&mint);
        let mut registry = Registry::new(mint, authority, supply_source, total_supply, setup_ts, bump);
        let mut holders = Vec::with_capacity(inputs.len());

        for input in inputs {
            let plan = plan_holder(total_supply, setup_ts, input)?;
            let index = registry.holder_count;
            let (holder_key, holder_bump) = HolderAllocation::address(&key, index);
            registry.admit(holder_key, &input.name, plan.pool, plan.tranches.len())?;
            registry.allocation_digest = fold_digest(&registry.allocation_digest, input, &plan);

            let (upfront_vault, upfront_vault_bump) =
                HolderAllocation::upfront_vault_address(&holder_key);
            holders.push((
                holder_key,
                HolderAllocation {
                    registry: key,
                    index,
                    name: input.name.clone(),
                    beneficiary: input.beneficiary,
                    pool_bps: input.pool_bps,
                    pool: plan.pool,
                    upfront_bps: input.upfront_bps,
                    upfront_amount: plan.upfront_amount,
                    upfront_vault,
                    upfront_paid: false,
                    schedules: Vec::with_capacity(plan.tranches.len()),
                    tranches: plan.tranches,
                    bump: holder_bump,
                    upfront_vault_bump,
                },
            ));
        }
        require!(
            registry.allocated_supply == total_supply,
            TimelockError::AllocationSumMismatch
        );
        require!(
            ledger.balance_of(&supply_source) >= total_supply,
            TimelockError::LedgerTransferFailed
        );

        let mut schedules = Vec::with_capacity(registry.planned_schedules as usize);
        for (holder_key, holder) in holders.iter_mut() {
            ledger.transfer(&supply_source, &holder.upfront_vault, holder.upfront_amount)?;
            registry.reserve_upfront(holder.upfront_amount)?;

            for tranche_index in 0..holder.tranches.len() as u8 {
                let terms = holder.next_tranche(tranche_index)?;
                let (timelock_key, timelock_bump) =
                    TimelockSchedule::address(holder_key, tranche_index);
                let (vault, vault_bump) = TimelockSchedule::vault_address(&timelock_key);

                ledger.transfer(&supply_source, &vault, terms.total_locked)?;
                registry.record_funding(terms.total_locked)?;

                let mut schedule = TimelockSchedule::new(
                    key,
                    *holder_key,
                    tranche_index,
                    holder.beneficiary,
                    vault,
                    &terms,
                );
                schedule.bump = timelock_bump;
                schedule.vault_bump = vault_bump;

                holder.schedules.push(timelock_key);
                schedules.push((timelock_key, schedule));
            }

            require!(
                holder.closes() && holder.fully_scheduled(),
                TimelockError::AllocationSumMismatch
            );
        }

        registry.seal()?;
        for (_, holder) in holders.iter_mut() {
            holder.release_upfront(&registry, &mut *ledger)?;
        }

        Ok(Self {
            key,
            registry,
            holders,
            schedules,
        })
    }

    pub fn key(&self) -> Pubkey {
        self.key
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn holders(&self) -> Vec<HolderSummary> {
        self.holders
            .iter()
            .map(|(key, holder)| holder.summary(*key))
            .collect()
    }

    pub fn time_locked_contract_addresses(&self) -> Vec<TimelockAddress> {
        self.holders
            .iter()
            .flat_map(|(_, holder)| holder.timelock_addresses(self.registry.setup_ts))
            .collect()
    }

    pub fn holder(&self, name: &str) -> Option<&HolderAllocation> {
        self.holders
            .iter()
            .map(|(_, h)| h)
            .find(|h| h.name == name)
    }

    pub fn schedule(&self, key: &Pubkey) -> Option<&TimelockSchedule> {
        self.schedules.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn schedule_mut(&mut self, key: &Pubkey) -> Option<&mut TimelockSchedule> {
        self.schedules
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, s)| s)
    }

    /// Schedules of the holder named `name`, in tranche order.
    pub fn schedules_of(&self, name: &str) -> Vec<&TimelockSchedule> {
        self.holder(name)
            .map(|h| h.schedules.iter().filter_map(|k| self.schedule(k)).collect())
            .unwrap_or_default()
    }

    pub fn release<L: AssetLedger + ?Sized>(
        &mut self,
        timelock: &Pubkey,
        now: i64,
        ledger: &mut L,
    ) -> Result<u64> {
        self.registry.require_sealed()?;
        self.schedule_mut(timelock)
            .ok_or(TimelockError::TimelockNotFound)?
            .release(now, ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::assert_error;
    use crate::utils::ledger::MemoryLedger;
    use crate::utils::time::{days, months};

    fn monthly(lock_days: i64, count: u32, share_bps: u16) -> TrancheInput {
        TrancheInput {
            lock_duration: days(lock_days),
            period_length: months(1),
            period_count: count,
            share_bps,
            base_release_bps: 0,
            period_accelerate: 0,
        }
    }

    fn holder(name: &str, pool_bps: u16, upfront_bps: u16, tranches: Vec<TrancheInput>) -> HolderInput {
        HolderInput {
            name: name.to_string(),
            beneficiary: Pubkey::new_unique(),
            pool_bps,
            upfront_bps,
            tranches,
        }
    }

    #[test]
    fn plan_splits_upfront_and_tranches() {
        let input = holder(
            "Pre sale",
            200,
            0,
            vec![monthly(90, 1, 3_000), monthly(180, 12, 7_000)],
        );
        let plan = plan_holder(1_000_000_000, 0, &input).unwrap();

        assert_eq!(plan.pool, 20_000_000);
        assert_eq!(plan.upfront_amount, 0);
        assert_eq!(plan.tranches[0].total_locked, 6_000_000);
        assert_eq!(plan.tranches[0].base_release_per_period, 6_000_000);
        assert_eq!(plan.tranches[0].first_release_time, days(90));
        assert_eq!(plan.tranches[1].total_locked, 14_000_000);
        assert_eq!(plan.tranches[1].first_release_time, days(180));
        assert!((14_000_000 / 12 - plan.tranches[1].base_release_per_period as i64).abs() < 1);
    }

    #[test]
    fn last_tranche_absorbs_rounding() {
        let input = holder("Odd", 10_000, 0, vec![monthly(0, 1, 3_333), monthly(0, 1, 6_667)]);
        let plan = plan_holder(10, 0, &input).unwrap();
        let locked: u64 = plan.tranches.iter().map(|t| t.total_locked).sum();
        assert_eq!(locked, 10);
        assert_eq!(plan.tranches[0].total_locked, 3);
        assert_eq!(plan.tranches[1].total_locked, 7);
    }

    #[test]
    fn accelerating_base_is_derived() {
        let mut t = monthly(0, 48, 10_000);
        t.period_accelerate = 90_000;
        let input = holder("Reward & Staking", 1_500, 0, vec![t]);
        let plan = plan_holder(1_000_000_000, 0, &input).unwrap();
        assert_eq!(plan.tranches[0].total_locked, 150_000_000);
        assert_eq!(plan.tranches[0].base_release_per_period, 1_010_000);
    }

    #[test]
    fn explicit_base_must_reconcile() {
        let mut t = monthly(120, 10, 10_000);
        t.base_release_bps = 1_000;
        assert!(plan_holder(1_000, 0, &holder("Liquidity", 10_000, 0, vec![t.clone()])).is_ok());

        t.base_release_bps = 900;
        assert_error(
            plan_holder(1_000, 0, &holder("Liquidity", 10_000, 0, vec![t])),
            TimelockError::TrancheDoesNotReconcile,
        );
    }

    #[test]
    fn reconcile_tolerates_one_unit_per_period() {
        assert!(reconcile_tranche(100, 33, 0, 3).is_ok());
        assert!(reconcile_tranche(100, 34, 0, 3).is_ok());
        assert_error(reconcile_tranche(100, 32, 0, 3), TimelockError::TrancheDoesNotReconcile);
        assert_error(reconcile_tranche(100, 0, 0, 0), TimelockError::InvalidConfig);
    }

    #[test]
    fn oversized_accelerate_is_rejected() {
        let mut t = monthly(0, 48, 10_000);
        t.period_accelerate = 1_000_000;
        assert_error(
            plan_holder(1_000_000, 0, &holder("Ramp", 10_000, 0, vec![t])),
            TimelockError::TrancheDoesNotReconcile,
        );
    }

    #[test]
    fn invalid_holder_inputs() {
        assert_error(
            plan_holder(1_000, 0, &holder("", 100, 0, vec![monthly(0, 1, 10_000)])),
            TimelockError::NameTooLong,
        );
        assert_error(
            plan_holder(1_000, 0, &holder("A", 10_001, 0, vec![monthly(0, 1, 10_000)])),
            TimelockError::InvalidBps,
        );
        assert_error(
            plan_holder(1_000, 0, &holder("A", 100, 0, vec![monthly(0, 1, 5_000)])),
            TimelockError::TrancheSharesMismatch,
        );
        assert_error(
            plan_holder(1_000, 0, &holder("A", 100, 0, vec![])),
            TimelockError::InvalidConfig,
        );
        assert_error(
            plan_holder(1_000, 0, &holder("A", 100, 10_000, vec![monthly(0, 1, 10_000)])),
            TimelockError::InvalidConfig,
        );
        assert_error(
            plan_holder(1_000, 0, &holder("A", 100, 0, vec![monthly(0, 1, 2_000); 5])),
            TimelockError::TooManyTranches,
        );
        let mut zero_len = monthly(0, 1, 10_000);
        zero_len.period_length = 0;
        assert_error(
            plan_holder(1_000, 0, &holder("A", 100, 0, vec![zero_len])),
            TimelockError::InvalidConfig,
        );
    }

    #[test]
    fn fully_upfront_holder_has_no_schedules() {
        let plan = plan_holder(1_000, 0, &holder("Airdrop", 1_000, 10_000, vec![])).unwrap();
        assert_eq!(plan.upfront_amount, 100);
        assert!(plan.tranches.is_empty());
    }

    #[test]
    fn registry_rejects_unbalanced_pools_without_moving_funds() {
        let treasury = Pubkey::new_unique();
        let mut ledger = MemoryLedger::with_supply(treasury, 1_000);
        let inputs = vec![
            holder("A", 6_000, 1_000, vec![monthly(0, 2, 10_000)]),
            holder("B", 3_000, 0, vec![monthly(0, 2, 10_000)]),
        ];

        assert_error(
            HolderRegistry::initialize(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                treasury,
                0,
                &inputs,
                &mut ledger,
            ),
            TimelockError::AllocationSumMismatch,
        );
        assert_eq!(ledger.balance_of(&treasury), 1_000);
        assert_eq!(ledger.balance_of(&inputs[0].beneficiary), 0);
    }

    #[test]
    fn registry_closes_and_releases() {
        let treasury = Pubkey::new_unique();
        let mut ledger = MemoryLedger::with_supply(treasury, 1_000_000);
        let inputs = vec![
            holder("Team", 6_000, 1_000, vec![monthly(365, 36, 10_000)]),
            holder("Sale", 4_000, 0, vec![monthly(0, 1, 2_500), monthly(90, 3, 7_500)]),
        ];
        let mut registry = HolderRegistry::initialize(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            treasury,
            0,
            &inputs,
            &mut ledger,
        )
        .unwrap();

        assert!(registry.registry().sealed);
        assert_eq!(ledger.balance_of(&treasury), 0);
        assert_eq!(ledger.balance_of(&inputs[0].beneficiary), 60_000);

        for summary in registry.holders() {
            let locked: u64 = registry
                .time_locked_contract_addresses()
                .iter()
                .filter(|t| t.holder_name == summary.name)
                .map(|t| ledger.balance_of(&registry.schedule(&t.timelock).unwrap().vault))
                .sum();
            assert_eq!(
                ledger.balance_of(&summary.beneficiary) + locked,
                summary.pool
            );
        }

        let sale = registry.holder("Sale").unwrap().schedules.clone();
        assert_eq!(registry.release(&sale[0], 0, &mut ledger).unwrap(), 100_000);
        assert_eq!(registry.release(&sale[0], 0, &mut ledger).unwrap(), 0);
        assert_eq!(registry.release(&sale[1], days(89), &mut ledger).unwrap(), 0);
        assert_eq!(registry.release(&sale[1], days(90), &mut ledger).unwrap(), 100_000);
        assert_eq!(ledger.balance_of(&inputs[1].beneficiary), 200_000);

        assert_error(
            registry.release(&Pubkey::new_unique(), 0, &mut ledger),
            TimelockError::TimelockNotFound,
        );
    }

    #[test]
    fn digest_depends_on_terms() {
        let input = holder("A", 10_000, 0, vec![monthly(0, 2, 10_000)]);
        let plan = plan_holder(1_000, 0, &input).unwrap();
        let a = fold_digest(&[0u8; 32], &input, &plan);
        assert_eq!(a, fold_digest(&[0u8; 32], &input, &plan));

        let later = plan_holder(1_000, 1, &input).unwrap();
        assert_ne!(a, fold_digest(&[0u8; 32], &input, &later));
    }

    #[test]
    fn duplicate_holder_names_are_rejected_before_any_transfer() {
        let treasury = Pubkey::new_unique();
        let mut ledger = MemoryLedger::with_supply(treasury, 1_000);
        let inputs = vec![
            holder("Team", 5_000, 1_000, vec![monthly(0, 2, 10_000)]),
            holder("Team", 5_000, 0, vec![monthly(0, 2, 10_000)]),
        ];

        assert_error(
            HolderRegistry::initialize(
                Pubkey::new_unique(),
                Pubkey::new_unique(),
                treasury,
                0,
                &inputs,
                &mut ledger,
            ),
            TimelockError::DuplicateHolderName,
        );
        assert_eq!(ledger.balance_of(&treasury), 1_000);
    }

    #[test]
    fn registry_key_is_the_program_address() {
        let mint = Pubkey::new_unique();
        let treasury = Pubkey::new_unique();
        let mut ledger = MemoryLedger::with_supply(treasury, 1_000);
        let inputs = vec![holder("All", 10_000, 2_000, vec![monthly(30, 4, 10_000)])];
        let registry = HolderRegistry::initialize(
            mint,
            Pubkey::new_unique(),
            treasury,
            0,
            &inputs,
            &mut ledger,
        )
        .unwrap();

        assert_eq!(registry.key(), Registry::address(&mint).0);
        let holder = registry.holder("All").unwrap();
        assert_eq!(holder.registry, registry.key());
        assert!(holder.upfront_paid);
        assert_eq!(ledger.balance_of(&holder.upfront_vault), 0);
        assert_eq!(ledger.balance_of(&inputs[0].beneficiary), 200);
        for s in registry.schedules_of("All") {
            assert_eq!(s.registry, registry.key());
        }
    }
}
