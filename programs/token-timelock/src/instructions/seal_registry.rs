use anchor_lang::prelude::*;

use crate::constants::REGISTRY_SEED;
use crate::state::Registry;

pub(crate) fn seal_registry(ctx: Context<SealRegistry>) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.check_setup(&ctx.accounts.authority.key())?;
    registry.seal()?;

    msg!(
        "Registry sealed: {} holders, {} timelocks",
        registry.holder_count,
        registry.funded_schedules
    );
    emit!(RegistrySealed {
        registry: registry.key(),
        holder_count: registry.holder_count,
        timelock_count: registry.funded_schedules,
        upfront_reserved: registry.upfront_reserved,
        locked_supply: registry.locked_supply,
        allocation_digest: registry.allocation_digest,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct SealRegistry<'info> {
    #[account(
        mut,
        seeds = [REGISTRY_SEED, registry.mint.as_ref()],
        bump = registry.bump
    )]
    pub registry: Account<'info, Registry>,

    pub authority: Signer<'info>,
}

#[event]
pub struct RegistrySealed {
    pub registry: Pubkey,
    pub holder_count: u8,
    pub timelock_count: u16,
    pub upfront_reserved: u64,
    pub locked_supply: u64,
    pub allocation_digest: [u8; 32],
}
