use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, TokenAccount};

use crate::constants::REGISTRY_SEED;
use crate::error::TimelockError;
use crate::state::Registry;
use crate::utils::time::{SysvarClock, TimeSource};

pub(crate) fn initialize_registry(ctx: Context<InitializeRegistry>, total_supply: u64) -> Result<()> {
    require!(total_supply > 0, TimelockError::InvalidConfig);
    require!(
        ctx.accounts.mint.supply == total_supply,
        TimelockError::SupplyMismatch
    );
    require_keys_eq!(
        ctx.accounts.supply_source.owner,
        ctx.accounts.authority.key(),
        TimelockError::InvalidTokenAccount
    );

    // Every tranche lock is measured from this instant.
    let setup_ts = SysvarClock.now()?;

    let registry = &mut ctx.accounts.registry;
    registry.set_inner(Registry::new(
        ctx.accounts.mint.key(),
        ctx.accounts.authority.key(),
        ctx.accounts.supply_source.key(),
        total_supply,
        setup_ts,
        ctx.bumps.registry,
    ));

    msg!("Registry for {} allocating {} units", registry.mint, total_supply);
    emit!(RegistryInitialized {
        registry: registry.key(),
        mint: registry.mint,
        authority: registry.authority,
        supply_source: registry.supply_source,
        total_supply,
        setup_ts,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct InitializeRegistry<'info> {
    #[account(
        init,
        payer = authority,
        space = 8 + Registry::INIT_SPACE,
        seeds = [REGISTRY_SEED, mint.key().as_ref()],
        bump
    )]
    pub registry: Account<'info, Registry>,

    pub mint: Account<'info, Mint>,

    #[account(
        constraint = supply_source.mint == mint.key() @ TimelockError::InvalidTokenMint,
    )]
    pub supply_source: Account<'info, TokenAccount>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

#[event]
pub struct RegistryInitialized {
    pub registry: Pubkey,
    pub mint: Pubkey,
    pub authority: Pubkey,
    pub supply_source: Pubkey,
    pub total_supply: u64,
    pub setup_ts: i64,
}
