//! # storage-adapters
//!
//! Implementations of the persistence ports in `domains::ports`.
//!
//! - [`MemoryStore`]: always compiled; DashMap collections with a store-wide
//!   write lock for multi-collection writes. Default backend and test double.
//! - `PgStore` (feature `db-postgres`): Postgres through sqlx, with volumes
//!   embedded as JSONB and every multi-row write in one transaction.

pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

mod sorting;

pub use memory::MemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
