use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::allocation::{fold_digest, plan_holder};
use crate::constants::{HOLDER_SEED, REGISTRY_SEED, UPFRONT_VAULT_SEED};
use crate::error::TimelockError;
use crate::state::{HolderAllocation, HolderInput, Registry};
use crate::utils::ledger::{AssetLedger, SplLedger};

pub(crate) fn add_holder(ctx: Context<AddHolder>, input: HolderInput) -> Result<()> {
    ctx.accounts
        .registry
        .check_setup(&ctx.accounts.authority.key())?;
    let plan = plan_holder(
        ctx.accounts.registry.total_supply,
        ctx.accounts.registry.setup_ts,
        &input,
    )?;

    let holder_key = ctx.accounts.holder.key();
    let registry_key = ctx.accounts.registry.key();
    let upfront_vault = ctx.accounts.upfront_vault.key();

    let registry = &mut ctx.accounts.registry;
    let index = registry.admit(holder_key, &input.name, plan.pool, plan.tranches.len())?;
    registry.reserve_upfront(plan.upfront_amount)?;
    registry.allocation_digest = fold_digest(&registry.allocation_digest, &input, &plan);
    let supply_source = registry.supply_source;

    // Parked in the holder's vault; `release_upfront` pays it out after sealing.
    let mut ledger = SplLedger::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.authority.to_account_info(),
        &[],
        ctx.accounts.mint.supply,
    )
    .bind(supply_source, &ctx.accounts.supply_source)
    .bind(upfront_vault, &ctx.accounts.upfront_vault);
    ledger.transfer(&supply_source, &upfront_vault, plan.upfront_amount)?;

    let tranche_count = plan.tranches.len() as u8;
    ctx.accounts.holder.set_inner(HolderAllocation {
        registry: registry_key,
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
        bump: ctx.bumps.holder,
        upfront_vault_bump: ctx.bumps.upfront_vault,
    });

    msg!(
        "Holder {} pool {} upfront {} locked {}",
        input.name,
        plan.pool,
        plan.upfront_amount,
        plan.pool - plan.upfront_amount
    );
    emit!(HolderAdded {
        holder: holder_key,
        index,
        name: input.name,
        beneficiary: input.beneficiary,
        pool: plan.pool,
        upfront_amount: plan.upfront_amount,
        tranche_count,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct AddHolder<'info> {
    #[account(
        mut,
        seeds = [REGISTRY_SEED, registry.mint.as_ref()],
        bump = registry.bump
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        init,
        payer = authority,
        space = 8 + HolderAllocation::INIT_SPACE,
        seeds = [HOLDER_SEED, registry.key().as_ref(), &[registry.holder_count]],
        bump
    )]
    pub holder: Box<Account<'info, HolderAllocation>>,

    #[account(
        init,
        payer = authority,
        token::mint = mint,
        token::authority = holder,
        seeds = [UPFRONT_VAULT_SEED, holder.key().as_ref()],
        bump
    )]
    pub upfront_vault: Box<Account<'info, TokenAccount>>,

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
pub struct HolderAdded {
    pub holder: Pubkey,
    pub index: u8,
    pub name: String,
    pub beneficiary: Pubkey,
    pub pool: u64,
    pub upfront_amount: u64,
    pub tranche_count: u8,
}
