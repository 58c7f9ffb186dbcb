pub mod entity_repo;
pub mod memory_store;
pub mod pg_store;
pub mod row_store;
pub mod token;
pub mod user;
