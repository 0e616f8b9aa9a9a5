pub mod initialize_registry;
pub mod add_holder;
pub mod create_timelock;
pub mod seal_registry;
pub mod release;
pub mod release_upfront;
pub mod emit_timelock_quote;
pub mod emit_holder;

pub use initialize_registry::*;
pub use add_holder::*;
pub use create_timelock::*;
pub use seal_registry::*;
pub use release::*;
pub use release_upfront::*;
pub use emit_timelock_quote::*;
pub use emit_holder::*;
