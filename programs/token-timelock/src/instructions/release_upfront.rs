use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{HOLDER_SEED, REGISTRY_SEED};
use crate::error::TimelockError;
use crate::state::{HolderAllocation, Registry};
use crate::utils::ledger::SplLedger;

/// Permissionless: pays a holder's parked upfront amount once the registry sealed.
pub(crate) fn release_upfront(ctx: Context<ReleaseUpfront>) -> Result<()> {
    let registry_key = ctx.accounts.registry.key();
    let index = [ctx.accounts.holder.index];
    let bump = [ctx.accounts.holder.bump];
    let seeds: &[&[u8]] = &[HOLDER_SEED, registry_key.as_ref(), &index, &bump];
    let signer_seeds = &[seeds];

    let beneficiary = ctx.accounts.holder.beneficiary;
    let vault_key = ctx.accounts.upfront_vault.key();
    let mut ledger = SplLedger::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.holder.to_account_info(),
        signer_seeds,
        ctx.accounts.mint.supply,
    )
    .bind(vault_key, &ctx.accounts.upfront_vault)
    .bind(beneficiary, &ctx.accounts.beneficiary_token_account);

    let holder = &mut ctx.accounts.holder;
    let amount = holder.release_upfront(&ctx.accounts.registry, &mut ledger)?;

    msg!("Upfront {} released to {}", amount, beneficiary);
    emit!(UpfrontReleased {
        holder: holder.key(),
        beneficiary,
        amount,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct ReleaseUpfront<'info> {
    #[account(
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
        mut,
        address = holder.upfront_vault @ TimelockError::InvalidTokenAccount,
    )]
    pub upfront_vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = beneficiary_token_account.owner == holder.beneficiary @ TimelockError::InvalidTokenAccount,
        constraint = beneficiary_token_account.mint == registry.mint @ TimelockError::InvalidTokenMint,
    )]
    pub beneficiary_token_account: Account<'info, TokenAccount>,

    #[account(address = registry.mint @ TimelockError::InvalidTokenMint)]
    pub mint: Account<'info, Mint>,

    pub caller: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

#[event]
pub struct UpfrontReleased {
    pub holder: Pubkey,
    pub beneficiary: Pubkey,
    pub amount: u64,
}
