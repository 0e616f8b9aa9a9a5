use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{REGISTRY_SEED, TIMELOCK_SEED};
use crate::error::TimelockError;
use crate::state::{Registry, TimelockSchedule};
use crate::utils::ledger::SplLedger;
use crate::utils::time::{SysvarClock, TimeSource};

/// Permissionless: anyone may push a schedule's due amount to its beneficiary.
pub(crate) fn release(ctx: Context<Release>) -> Result<()> {
    ctx.accounts.registry.require_sealed()?;
    let now = SysvarClock.now()?;

    let timelock_ai = ctx.accounts.timelock.to_account_info();
    let holder = ctx.accounts.timelock.holder;
    let tranche_index = [ctx.accounts.timelock.tranche_index];
    let bump = [ctx.accounts.timelock.bump];
    let seeds: &[&[u8]] = &[TIMELOCK_SEED, holder.as_ref(), &tranche_index, &bump];
    let signer_seeds = &[seeds];

    let beneficiary = ctx.accounts.timelock.beneficiary;
    let vault_key = ctx.accounts.vault.key();
    let mut ledger = SplLedger::new(
        ctx.accounts.token_program.to_account_info(),
        timelock_ai,
        signer_seeds,
        ctx.accounts.mint.supply,
    )
    .bind(vault_key, &ctx.accounts.vault)
    .bind(beneficiary, &ctx.accounts.beneficiary_token_account);

    let timelock = &mut ctx.accounts.timelock;
    let amount = timelock.release(now, &mut ledger)?;
    if amount == 0 {
        msg!("Nothing releasable; next release at {}", timelock.next_release_time());
        return Ok(());
    }

    emit!(TokensReleased {
        timelock: timelock.key(),
        beneficiary,
        amount,
        paid_amount: timelock.paid_amount,
        paid_periods: timelock.paid_periods,
        total_locked: timelock.total_locked,
        released_at: now,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct Release<'info> {
    #[account(
        seeds = [REGISTRY_SEED, registry.mint.as_ref()],
        bump = registry.bump
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        mut,
        seeds = [TIMELOCK_SEED, timelock.holder.as_ref(), &[timelock.tranche_index]],
        bump = timelock.bump,
        constraint = timelock.registry == registry.key() @ TimelockError::TimelockNotFound,
    )]
    pub timelock: Box<Account<'info, TimelockSchedule>>,

    #[account(
        mut,
        address = timelock.vault @ TimelockError::InvalidTokenAccount,
    )]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = beneficiary_token_account.owner == timelock.beneficiary @ TimelockError::InvalidTokenAccount,
        constraint = beneficiary_token_account.mint == registry.mint @ TimelockError::InvalidTokenMint,
    )]
    pub beneficiary_token_account: Account<'info, TokenAccount>,

    #[account(address = registry.mint @ TimelockError::InvalidTokenMint)]
    pub mint: Account<'info, Mint>,

    pub caller: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[event]
pub struct TokensReleased {
    pub timelock: Pubkey,
    pub beneficiary: Pubkey,
    pub amount: u64,
    pub paid_amount: u64,
    pub paid_periods: u64,
    pub total_locked: u64,
    pub released_at: i64,
}
