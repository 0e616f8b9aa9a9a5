pub mod ledger;
pub mod time;
