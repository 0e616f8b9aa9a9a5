use anchor_lang::prelude::*;

declare_id!("7NBE4LnWo9mjV7U6H4suYRGHKtNZVC5PUWtwrza6DX3n");

pub mod allocation;
pub mod config;
pub mod constants;
pub mod error;
pub mod instructions;
pub mod state;
pub mod utils;

pub use instructions::*;
use state::HolderInput;

#[program]
pub mod token_timelock {
    use super::*;

    pub fn initialize_registry(ctx: Context<InitializeRegistry>, total_supply: u64) -> Result<()> {
        instructions::initialize_registry::initialize_registry(ctx, total_supply)
    }

    pub fn add_holder(ctx: Context<AddHolder>, input: HolderInput) -> Result<()> {
        instructions::add_holder::add_holder(ctx, input)
    }

    pub fn create_timelock(ctx: Context<CreateTimelock>, tranche_index: u8) -> Result<()> {
        instructions::create_timelock::create_timelock(ctx, tranche_index)
    }

    pub fn seal_registry(ctx: Context<SealRegistry>) -> Result<()> {
        instructions::seal_registry::seal_registry(ctx)
    }

    pub fn release_upfront(ctx: Context<ReleaseUpfront>) -> Result<()> {
        instructions::release_upfront::release_upfront(ctx)
    }

    pub fn release(ctx: Context<Release>) -> Result<()> {
        instructions::release::release(ctx)
    }

    pub fn emit_timelock_quote(ctx: Context<EmitTimelockQuote>) -> Result<()> {
        instructions::emit_timelock_quote::emit_timelock_quote(ctx)
    }

    pub fn emit_holder(ctx: Context<EmitHolder>) -> Result<()> {
        instructions::emit_holder::emit_holder(ctx)
    }
}
