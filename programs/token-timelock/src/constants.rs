//! Program-wide constants.

pub const REGISTRY_SEED: &[u8] = b"registry";
pub const HOLDER_SEED: &[u8] = b"holder";
pub const TIMELOCK_SEED: &[u8] = b"timelock";
pub const TIMELOCK_VAULT_SEED: &[u8] = b"timelock_vault";
pub const UPFRONT_VAULT_SEED: &[u8] = b"upfront_vault";

/// Percentages are expressed in basis points of this denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Max holder categories a registry can carry.
pub const MAX_HOLDERS: usize = 16;

/// Max timelock tranches per holder.
pub const MAX_TRANCHES: usize = 4;

/// Max holder name length in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Seconds per day (UTC).
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Release schedules count months as fixed 30-day periods.
pub const DAYS_PER_MONTH: i64 = 30;

pub const SECONDS_PER_MONTH: i64 = DAYS_PER_MONTH * SECONDS_PER_DAY;
