pub mod create_batch;
pub mod error;
pub mod find_by_filter;
pub mod load_audits;
pub mod load_batch;
pub mod lock_by_id;
pub mod pagination;
pub mod unit_of_work;
pub mod update_batch;

// Re-exports
pub use create_batch::*;
pub use error::*;
pub use find_by_filter::*;
pub use load_audits::*;
pub use load_batch::*;
pub use lock_by_id::*;
pub use pagination::{Page, PageRequest};
pub use unit_of_work::*;
pub use update_batch::*;
