pub mod counter_store;
pub mod governor;
pub mod identity;

pub use counter_store::*;
pub use governor::*;
pub use identity::*;
