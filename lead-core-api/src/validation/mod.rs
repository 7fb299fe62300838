pub mod input;
pub mod schema;

pub use input::*;
pub use schema::*;
