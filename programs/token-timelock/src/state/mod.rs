pub mod holder;
pub mod registry;
pub mod timelock;

pub use holder::*;
pub use registry::*;
pub use timelock::*;
