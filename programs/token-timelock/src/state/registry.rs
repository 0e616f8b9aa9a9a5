use anchor_lang::prelude::*;

use crate::constants::{MAX_HOLDERS, REGISTRY_SEED};
use crate::error::TimelockError;

/// Allocation registry for one mint. Built once, then sealed.
#[account]
#[derive(InitSpace, Debug)]
pub struct Registry {
    /// Token mint being allocated.
    pub mint: Pubkey,
    /// Setup authority.
    pub authority: Pubkey,
    /// Token account the supply is distributed from.
    pub supply_source: Pubkey,
    pub total_supply: u64,
    /// Reference time for every tranche lock.
    pub setup_ts: i64,
    /// Σ holder pools.
    pub allocated_supply: u64,
    /// Σ upfront amounts parked in holder vaults.
    pub upfront_reserved: u64,
    /// Σ funded timelock totals.
    pub locked_supply: u64,
    pub holder_count: u8,
    pub planned_schedules: u16,
    pub funded_schedules: u16,
    /// Set once every pool and schedule reconciles; releases require it.
    pub sealed: bool,
    /// blake3 chain over every holder's terms, in insertion order.
    pub allocation_digest: [u8; 32],
    #[max_len(16)] // MAX_HOLDERS
    pub holders: Vec<Pubkey>,
    /// blake3 of each holder name, parallel to `holders`.
    #[max_len(16)]
    pub holder_names: Vec<[u8; 32]>,
    pub bump: u8,
}

impl Registry {
    pub fn new(
        mint: Pubkey,
        authority: Pubkey,
        supply_source: Pubkey,
        total_supply: u64,
        setup_ts: i64,
        bump: u8,
    ) -> Self {
        Self {
            mint,
            authority,
            supply_source,
            total_supply,
            setup_ts,
            allocated_supply: 0,
            upfront_reserved: 0,
            locked_supply: 0,
            holder_count: 0,
            planned_schedules: 0,
            funded_schedules: 0,
            sealed: false,
            allocation_digest: [0u8; 32],
            holders: Vec::with_capacity(MAX_HOLDERS),
            holder_names: Vec::with_capacity(MAX_HOLDERS),
            bump,
        }
    }

    pub fn address(mint: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[REGISTRY_SEED, mint.as_ref()], &crate::ID)
    }

    pub fn name_key(name: &str) -> [u8; 32] {
        *blake3::hash(name.as_bytes()).as_bytes()
    }

    /// Setup instructions need the authority and an unsealed registry.
    pub fn check_setup(&self, authority: &Pubkey) -> Result<()> {
        require_keys_eq!(*authority, self.authority, TimelockError::UnauthorizedAuthority);
        require!(!self.sealed, TimelockError::RegistrySealed);
        Ok(())
    }

    /// Claims the next holder slot for a pool of `pool` units split into
    /// `tranche_count` schedules. Returns the slot index.
    pub fn admit(
        &mut self,
        holder: Pubkey,
        name: &str,
        pool: u64,
        tranche_count: usize,
    ) -> Result<u8> {
        require!(!self.sealed, TimelockError::RegistrySealed);
        require!(
            (self.holder_count as usize) < MAX_HOLDERS,
            TimelockError::TooManyHolders
        );
        let name_key = Self::name_key(name);
        require!(
            !self.holder_names.contains(&name_key),
            TimelockError::DuplicateHolderName
        );

        let allocated = self
            .allocated_supply
            .checked_add(pool)
            .ok_or(TimelockError::MathOverflow)?;
        require!(
            allocated <= self.total_supply,
            TimelockError::AllocationExceedsSupply
        );
        // The last slot must close the supply, otherwise the registry could never seal.
        if self.holder_count as usize + 1 == MAX_HOLDERS {
            require!(
                allocated == self.total_supply,
                TimelockError::AllocationSumMismatch
            );
        }
        let tranche_count =
            u16::try_from(tranche_count).map_err(|_| TimelockError::TooManyTranches)?;
        let planned = self
            .planned_schedules
            .checked_add(tranche_count)
            .ok_or(TimelockError::MathOverflow)?;

        let index = self.holder_count;
        self.allocated_supply = allocated;
        self.planned_schedules = planned;
        self.holder_count += 1;
        self.holders.push(holder);
        self.holder_names.push(name_key);
        Ok(index)
    }

    pub fn reserve_upfront(&mut self, amount: u64) -> Result<()> {
        self.upfront_reserved = self
            .upfront_reserved
            .checked_add(amount)
            .ok_or(TimelockError::MathOverflow)?;
        Ok(())
    }

    pub fn record_funding(&mut self, amount: u64) -> Result<()> {
        require!(
            self.funded_schedules < self.planned_schedules,
            TimelockError::TrancheOutOfOrder
        );
        self.locked_supply = self
            .locked_supply
            .checked_add(amount)
            .ok_or(TimelockError::MathOverflow)?;
        self.funded_schedules += 1;
        Ok(())
    }

    /// Every unit of supply is assigned and every planned schedule funded.
    pub fn reconciles(&self) -> bool {
        self.allocated_supply == self.total_supply
            && self.funded_schedules == self.planned_schedules
            && self.upfront_reserved as u128 + self.locked_supply as u128
                == self.total_supply as u128
    }

    pub fn check_sealable(&self) -> Result<()> {
        require!(!self.sealed, TimelockError::RegistrySealed);
        require!(
            self.allocated_supply == self.total_supply,
            TimelockError::AllocationSumMismatch
        );
        require!(
            self.funded_schedules == self.planned_schedules,
            TimelockError::TimelocksNotFunded
        );
        require!(self.reconciles(), TimelockError::AllocationSumMismatch);
        Ok(())
    }

    pub fn seal(&mut self) -> Result<()> {
        self.check_sealable()?;
        self.sealed = true;
        Ok(())
    }

    pub fn require_sealed(&self) -> Result<()> {
        require!(self.sealed, TimelockError::RegistryNotSealed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::assert_error;

    fn registry(total_supply: u64) -> Registry {
        Registry::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            total_supply,
            0,
            255,
        )
    }

    #[test]
    fn admit_tracks_running_sums() {
        let mut r = registry(1_000);
        assert_eq!(r.admit(Pubkey::new_unique(), "Team", 600, 1).unwrap(), 0);
        assert_eq!(r.admit(Pubkey::new_unique(), "Sale", 400, 2).unwrap(), 1);

        assert_eq!(r.allocated_supply, 1_000);
        assert_eq!(r.planned_schedules, 3);
        assert_eq!(r.holder_count, 2);
        assert_eq!(r.holders.len(), 2);
    }

    #[test]
    fn admit_rejects_over_allocation() {
        let mut r = registry(1_000);
        r.admit(Pubkey::new_unique(), "Team", 600, 1).unwrap();
        assert_error(
            r.admit(Pubkey::new_unique(), "Sale", 401, 1),
            TimelockError::AllocationExceedsSupply,
        );
        assert_eq!(r.allocated_supply, 600);
        assert_eq!(r.holder_count, 1);
    }

    #[test]
    fn admit_rejects_duplicate_name() {
        let mut r = registry(1_000);
        r.admit(Pubkey::new_unique(), "Team", 500, 1).unwrap();
        assert_error(
            r.admit(Pubkey::new_unique(), "Team", 500, 1),
            TimelockError::DuplicateHolderName,
        );
        assert!(r.admit(Pubkey::new_unique(), "team", 500, 1).is_ok());
    }

    #[test]
    fn last_slot_must_close_supply() {
        let mut r = registry(100);
        for i in 0..MAX_HOLDERS - 1 {
            r.admit(Pubkey::new_unique(), &format!("H{i}"), 1, 1).unwrap();
        }
        assert_error(
            r.admit(Pubkey::new_unique(), "Last", 1, 1),
            TimelockError::AllocationSumMismatch,
        );
        r.admit(Pubkey::new_unique(), "Last", 85, 1).unwrap();
        assert_error(
            r.admit(Pubkey::new_unique(), "Extra", 0, 0),
            TimelockError::TooManyHolders,
        );
    }

    #[test]
    fn seal_requires_every_timelock_funded() {
        let mut r = registry(1_000);
        r.admit(Pubkey::new_unique(), "Team", 1_000, 2).unwrap();
        r.reserve_upfront(100).unwrap();
        r.record_funding(300).unwrap();
        assert_error(r.check_sealable(), TimelockError::TimelocksNotFunded);
        assert_error(r.require_sealed(), TimelockError::RegistryNotSealed);

        r.record_funding(600).unwrap();
        assert_error(r.record_funding(1), TimelockError::TrancheOutOfOrder);
        assert!(r.reconciles());
        r.seal().unwrap();
        assert!(r.require_sealed().is_ok());

        assert_error(r.seal(), TimelockError::RegistrySealed);
        assert_error(
            r.admit(Pubkey::new_unique(), "Late", 0, 0),
            TimelockError::RegistrySealed,
        );
    }

    #[test]
    fn seal_rejects_open_supply_and_diverged_sums() {
        let mut r = registry(1_000);
        r.admit(Pubkey::new_unique(), "Team", 900, 0).unwrap();
        assert_error(r.check_sealable(), TimelockError::AllocationSumMismatch);

        r.admit(Pubkey::new_unique(), "Sale", 100, 0).unwrap();
        r.reserve_upfront(999).unwrap();
        assert!(!r.reconciles());
        assert_error(r.seal(), TimelockError::AllocationSumMismatch);
        assert!(!r.sealed);
    }

    #[test]
    fn setup_needs_authority_and_open_registry() {
        let mut r = registry(1_000);
        let authority = r.authority;
        assert!(r.check_setup(&authority).is_ok());
        assert_error(
            r.check_setup(&Pubkey::new_unique()),
            TimelockError::UnauthorizedAuthority,
        );

        r.admit(Pubkey::new_unique(), "All", 1_000, 0).unwrap();
        r.reserve_upfront(1_000).unwrap();
        r.seal().unwrap();
        assert_error(r.check_setup(&authority), TimelockError::RegistrySealed);
    }
}
