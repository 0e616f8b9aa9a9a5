//! Asset ledger seam.
//!
//! The release engine and the allocation registry move tokens only through
//! [`AssetLedger`]. Accounts are addressed by ledger identity: a pool is
//! identified by its token-account address, a beneficiary by its wallet.

use std::collections::HashMap;

use anchor_lang::prelude::*;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::error::TimelockError;

pub trait AssetLedger {
    fn total_supply(&self) -> u64;

    fn balance_of(&self, account: &Pubkey) -> u64;

    /// Moves `amount` from `from` to `to`. All-or-nothing: on error no
    /// balance has changed.
    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
}

/// In-memory ledger with a fixed supply.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    supply: u64,
    balances: HashMap<Pubkey, u64>,
}

impl MemoryLedger {
    /// Ledger whose entire `supply` sits in `treasury`.
    pub fn with_supply(treasury: Pubkey, supply: u64) -> Self {
        let mut balances = HashMap::new();
        balances.insert(treasury, supply);
        Self { supply, balances }
    }
}

impl AssetLedger for MemoryLedger {
    fn total_supply(&self) -> u64 {
        self.supply
    }

    fn balance_of(&self, account: &Pubkey) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let available = self.balance_of(from);
        require!(available >= amount, TimelockError::LedgerTransferFailed);
        if amount == 0 || from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TimelockError::MathOverflow)?;

        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

struct BoundAccount<'info> {
    id: Pubkey,
    info: AccountInfo<'info>,
    balance: u64,
}

/// SPL Token adapter. Every transfer is a `token::transfer` CPI out of a
/// bound account, signed by `authority` (with `signer_seeds` when the
/// authority is a PDA).
pub struct SplLedger<'a, 'info> {
    token_program: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    signer_seeds: &'a [&'a [&'a [u8]]],
    supply: u64,
    accounts: Vec<BoundAccount<'info>>,
}

impl<'a, 'info> SplLedger<'a, 'info> {
    pub fn new(
        token_program: AccountInfo<'info>,
        authority: AccountInfo<'info>,
        signer_seeds: &'a [&'a [&'a [u8]]],
        supply: u64,
    ) -> Self {
        Self {
            token_program,
            authority,
            signer_seeds,
            supply,
            accounts: Vec::with_capacity(2),
        }
    }

    /// Binds a token account under the ledger identity `id`.
    pub fn bind(mut self, id: Pubkey, account: &Account<'info, TokenAccount>) -> Self {
        self.accounts.push(BoundAccount {
            id,
            info: account.to_account_info(),
            balance: account.amount,
        });
        self
    }

    fn position(&self, id: &Pubkey) -> Result<usize> {
        self.accounts
            .iter()
            .position(|a| a.id == *id)
            .ok_or_else(|| error!(TimelockError::InvalidTokenAccount))
    }
}

impl AssetLedger for SplLedger<'_, '_> {
    fn total_supply(&self) -> u64 {
        self.supply
    }

    fn balance_of(&self, account: &Pubkey) -> u64 {
        self.accounts
            .iter()
            .find(|a| a.id == *account)
            .map(|a| a.balance)
            .unwrap_or(0)
    }

    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        let src = self.position(from)?;
        let dst = self.position(to)?;
        require!(
            self.accounts[src].balance >= amount,
            TimelockError::LedgerTransferFailed
        );
        if amount == 0 || src == dst {
            return Ok(());
        }

        token::transfer(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                Transfer {
                    from: self.accounts[src].info.clone(),
                    to: self.accounts[dst].info.clone(),
                    authority: self.authority.clone(),
                },
                self.signer_seeds,
            ),
            amount,
        )?;

        self.accounts[src].balance -= amount;
        self.accounts[dst].balance = self.accounts[dst]
            .balance
            .checked_add(amount)
            .ok_or(TimelockError::MathOverflow)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_balance() {
        let treasury = Pubkey::new_unique();
        let alice = Pubkey::new_unique();
        let mut ledger = MemoryLedger::with_supply(treasury, 1_000);

        ledger.transfer(&treasury, &alice, 400).unwrap();
        assert_eq!(ledger.balance_of(&treasury), 600);
        assert_eq!(ledger.balance_of(&alice), 400);
        assert_eq!(ledger.total_supply(), 1_000);
    }

    #[test]
    fn insufficient_balance_changes_nothing() {
        let treasury = Pubkey::new_unique();
        let alice = Pubkey::new_unique();
        let mut ledger = MemoryLedger::with_supply(treasury, 100);

        assert!(ledger.transfer(&treasury, &alice, 101).is_err());
        assert_eq!(ledger.balance_of(&treasury), 100);
        assert_eq!(ledger.balance_of(&alice), 0);
    }

    #[test]
    fn zero_and_self_transfers_are_noops() {
        let treasury = Pubkey::new_unique();
        let mut ledger = MemoryLedger::with_supply(treasury, 10);

        ledger.transfer(&treasury, &treasury, 10).unwrap();
        ledger.transfer(&Pubkey::new_unique(), &treasury, 0).unwrap();
        assert_eq!(ledger.balance_of(&treasury), 10);
    }
}
