//! Database repository layer

pub mod device_repo;
pub mod history_repo;
pub mod memory_store;
pub mod pg_store;
pub mod store;

pub use memory_store::MemoryInventoryStore;
pub use pg_store::PgInventoryStore;
pub use store::{InventoryStore, StoreTransaction};
