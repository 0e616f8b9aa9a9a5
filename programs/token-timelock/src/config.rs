//! Launch allocation preset.
//!
//! The token launch allocation: ten holder categories splitting the whole
//! supply, with 30-day months as the release period.

use anchor_lang::prelude::*;

use crate::constants::DAYS_PER_MONTH;
use crate::state::{HolderInput, TrancheInput};
use crate::utils::time::days;

/// Beneficiary wallets, one per category of [`launch_allocation`].
#[derive(Clone, Copy, Debug)]
pub struct LaunchWallets {
    pub private_sale: Pubkey,
    pub pre_sale: Pubkey,
    pub ido: Pubkey,
    pub marketing: Pubkey,
    pub team: Pubkey,
    pub advisor: Pubkey,
    pub reserve_fund: Pubkey,
    pub liquidity: Pubkey,
    pub reward_staking: Pubkey,
    pub ecosystem: Pubkey,
}

/// Reward & Staking per-period increment, in whole tokens.
pub const REWARD_ACCELERATE_TOKENS: u64 = 90_000;

fn tranche(lock_days: i64, period_days: i64, period_count: u32, share_bps: u16) -> TrancheInput {
    TrancheInput {
        lock_duration: days(lock_days),
        period_length: days(period_days),
        period_count,
        share_bps,
        base_release_bps: 0,
        period_accelerate: 0,
    }
}

fn monthly(lock_days: i64, months: u32) -> TrancheInput {
    tranche(lock_days, DAYS_PER_MONTH, months, 10_000)
}

fn category(
    name: &str,
    beneficiary: Pubkey,
    pool_bps: u16,
    upfront_bps: u16,
    tranches: Vec<TrancheInput>,
) -> HolderInput {
    HolderInput {
        name: name.to_string(),
        beneficiary,
        pool_bps,
        upfront_bps,
        tranches,
    }
}

/// `token_unit` is `10^decimals` of the mint; it scales the reward ramp.
pub fn launch_allocation(wallets: &LaunchWallets, token_unit: u64) -> Vec<HolderInput> {
    let liquidity = TrancheInput {
        base_release_bps: 1_000,
        ..tranche(120, 60, 10, 10_000)
    };
    let reward = TrancheInput {
        period_accelerate: REWARD_ACCELERATE_TOKENS.saturating_mul(token_unit),
        ..monthly(0, 48)
    };

    vec![
        category("Private sale", wallets.private_sale, 500, 1_500, vec![monthly(180, 24)]),
        category(
            "Pre sale",
            wallets.pre_sale,
            200,
            0,
            vec![
                tranche(90, DAYS_PER_MONTH, 1, 3_000),
                tranche(180, DAYS_PER_MONTH, 12, 7_000),
            ],
        ),
        category("IDO", wallets.ido, 100, 0, vec![tranche(120, DAYS_PER_MONTH, 1, 10_000)]),
        category("Marketing", wallets.marketing, 2_000, 0, vec![monthly(0, 48)]),
        category("Team", wallets.team, 1_500, 0, vec![monthly(365, 36)]),
        category("Advisor", wallets.advisor, 500, 0, vec![monthly(365, 36)]),
        category("Reserve fund", wallets.reserve_fund, 1_500, 0, vec![monthly(0, 48)]),
        category("Liquidity", wallets.liquidity, 700, 0, vec![liquidity]),
        category("Reward & Staking", wallets.reward_staking, 1_500, 0, vec![reward]),
        category("Ecosystem", wallets.ecosystem, 1_500, 0, vec![monthly(0, 48)]),
    ]
}
