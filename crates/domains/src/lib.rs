//! forum/crates/domains/src/lib.rs
//!
//! The central domain logic and interface definitions for the forum backend.
//! Nothing in this crate performs I/O: persistence is reached through the
//! port traits in [`ports`].

pub mod errors;
pub mod insertion;
pub mod models;
pub mod path;
pub mod ports;
pub mod traversal;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use path::PostPath;
pub use ports::*;
pub use traversal::{PostListQuery, SortMode};
