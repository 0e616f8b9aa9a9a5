use anchor_lang::prelude::*;

use crate::constants::{HOLDER_SEED, REGISTRY_SEED};
use crate::error::TimelockError;
use crate::state::{HolderAllocation, Registry};

/// Publishes the holder's `HolderSummary` followed by one `TimelockAddress`
/// per schedule created so far.
pub(crate) fn emit_holder(ctx: Context<EmitHolder>) -> Result<()> {
    let holder = &ctx.accounts.holder;

    emit!(holder.summary(holder.key()));
    for record in holder.timelock_addresses(ctx.accounts.registry.setup_ts) {
        emit!(record);
    }

    Ok(())
}

#[derive(Accounts)]
pub struct EmitHolder<'info> {
    #[account(
        seeds = [REGISTRY_SEED, registry.mint.as_ref()],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        seeds = [HOLDER_SEED, registry.key().as_ref(), &[holder.index]],
        bump = holder.bump,
        constraint = holder.registry == registry.key() @ TimelockError::HolderNotFound,
    )]
    pub holder: Account<'info, HolderAllocation>,
}
