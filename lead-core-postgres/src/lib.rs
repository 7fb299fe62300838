pub mod executor;
pub mod postgres_repositories;
pub mod repository;
pub mod utils;

pub use executor::Executor;
pub use postgres_repositories::{PostgresConfig, PostgresSession, PostgresUnitOfWork};
pub use repository::audit_entry_repository::AuditEntryRepositoryImpl;
pub use repository::buyer_repository::BuyerRepositoryImpl;

#[cfg(test)]
pub mod test_helper;
