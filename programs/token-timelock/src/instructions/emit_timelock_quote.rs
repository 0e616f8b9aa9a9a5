use anchor_lang::prelude::*;

use crate::constants::TIMELOCK_SEED;
use crate::state::{ScheduleStatus, TimelockSchedule};
use crate::utils::time::{SysvarClock, TimeSource};

pub(crate) fn emit_timelock_quote(ctx: Context<EmitTimelockQuote>) -> Result<()> {
    let timelock = &ctx.accounts.timelock;
    let now = SysvarClock.now()?;

    emit!(TimelockQuote {
        timelock: timelock.key(),
        beneficiary: timelock.beneficiary,
        now,
        status: timelock.status(now),
        next_release_time: timelock.next_release_time(),
        release_amount: timelock.release_amount(),
        release_period: timelock.release_period(),
        period_accelerate: timelock.period_accelerate(),
        passed_periods: timelock.calc_passed_periods(now),
        payed_period: timelock.payed_period(),
        releasable_amount: timelock.releasable_amount(now),
        paid_amount: timelock.paid_amount,
        total_locked: timelock.total_locked,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct EmitTimelockQuote<'info> {
    #[account(
        seeds = [TIMELOCK_SEED, timelock.holder.as_ref(), &[timelock.tranche_index]],
        bump = timelock.bump
    )]
    pub timelock: Account<'info, TimelockSchedule>,
}

#[event]
pub struct TimelockQuote {
    pub timelock: Pubkey,
    pub beneficiary: Pubkey,
    pub now: i64,
    pub status: ScheduleStatus,
    pub next_release_time: i64,
    pub release_amount: u64,
    pub release_period: i64,
    pub period_accelerate: u64,
    pub passed_periods: u64,
    pub payed_period: u64,
    pub releasable_amount: u64,
    pub paid_amount: u64,
    pub total_locked: u64,
}
