pub mod context;
pub mod coordinator;
pub mod export;
pub mod import;

pub use context::*;
pub use coordinator::*;
pub use export::*;
pub use import::*;
