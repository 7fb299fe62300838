pub mod audit_diff;
pub mod config;
pub mod envelope;
pub mod error;
pub mod rate_limit;
pub mod service;
pub mod validation;

#[cfg(test)]
pub mod test_utils;

pub use config::*;
pub use envelope::*;
pub use error::*;
pub use rate_limit::*;
pub use service::*;
pub use validation::*;
