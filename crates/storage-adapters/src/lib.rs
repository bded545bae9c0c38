//! # storage-adapters
//!
//! Implementations of the domain ports.
//!
//! * [`MemoryStore`] keeps everything in process memory behind one lock.
//!   Used by tests and by `database.backend = "memory"`.
//! * `PgStore` (feature `db-postgres`) persists to PostgreSQL through sqlx.

pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
