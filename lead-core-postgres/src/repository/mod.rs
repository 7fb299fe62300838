pub mod audit_entry_repository;
pub mod buyer_repository;
pub mod db_init;
