use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{HOLDER_SEED, REGISTRY_SEED, TIMELOCK_SEED, TIMELOCK_VAULT_SEED};
use crate::error::TimelockError;
use crate::state::{HolderAllocation, Registry, TimelockSchedule};
use crate::utils::ledger::{AssetLedger, SplLedger};

pub(crate) fn create_timelock(ctx: Context<CreateTimelock>, tranche_index: u8) -> Result<()> {
    ctx.accounts
        .registry
        .check_setup(&ctx.accounts.authority.key())?;
    let terms = ctx.accounts.holder.next_tranche(tranche_index)?;

    let supply_source = ctx.accounts.registry.supply_source;
    let vault_key = ctx.accounts.vault.key();
    let mut ledger = SplLedger::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.authority.to_account_info(),
        &[],
        ctx.accounts.mint.supply,
    )
    .bind(supply_source, &ctx.accounts.supply_source)
    .bind(vault_key, &ctx.accounts.vault);
    ledger.transfer(&supply_source, &vault_key, terms.total_locked)?;

    let registry_key = ctx.accounts.registry.key();
    let holder_key = ctx.accounts.holder.key();
    let timelock_key = ctx.accounts.timelock.key();
    let beneficiary = ctx.accounts.holder.beneficiary;

    let mut schedule = TimelockSchedule::new(
        registry_key,
        holder_key,
        tranche_index,
        beneficiary,
        vault_key,
        &terms,
    );
    schedule.bump = ctx.bumps.timelock;
    schedule.vault_bump = ctx.bumps.vault;
    ctx.accounts.timelock.set_inner(schedule);

    ctx.accounts.holder.schedules.push(timelock_key);

    ctx.accounts.registry.record_funding(terms.total_locked)?;

    emit!(TimelockCreated {
        holder: holder_key,
        timelock: timelock_key,
        vault: vault_key,
        tranche_index,
        beneficiary,
        total_locked: terms.total_locked,
        first_release_time: terms.first_release_time,
        period_length: terms.period_length,
        period_count: terms.period_count,
        base_release_per_period: terms.base_release_per_period,
        period_accelerate: terms.period_accelerate,
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(tranche_index: u8)]
pub struct CreateTimelock<'info> {
    #[account(
        mut,
        seeds = [REGISTRY_SEED, registry.mint.as_ref()],
        bump = registry.bump
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        mut,
        seeds = [HOLDER_SEED, registry.key().as_ref(), &[holder.index]],
        bump = holder.bump,
        constraint = holder.registry == registry.key() @ TimelockError::HolderNotFound,
    )]
    pub holder: Box<Account<'info, HolderAllocation>>,

    #[account(
        init,
        payer = authority,
        space = 8 + TimelockSchedule::SIZE,
        seeds = [TIMELOCK_SEED, holder.key().as_ref(), &[tranche_index]],
        bump
    )]
    pub timelock: Box<Account<'info, TimelockSchedule>>,

    #[account(
        init,
        payer = authority,
        token::mint = mint,
        token::authority = timelock,
        seeds = [TIMELOCK_VAULT_SEED, timelock.key().as_ref()],
        bump
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    #[account(address = registry.mint @ TimelockError::InvalidTokenMint)]
    pub mint: Account<'info, Mint>,

    #[account(
        mut,
        address = registry.supply_source @ TimelockError::InvalidTokenAccount,
    )]
    pub supply_source: Account<'info, TokenAccount>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[event]
pub struct TimelockCreated {
    pub holder: Pubkey,
    pub timelock: Pubkey,
    pub vault: Pubkey,
    pub tranche_index: u8,
    pub beneficiary: Pubkey,
    pub total_locked: u64,
    pub first_release_time: i64,
    pub period_length: i64,
    pub period_count: u32,
    pub base_release_per_period: u64,
    pub period_accelerate: u64,
}
