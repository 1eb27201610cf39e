//! inkwell/crates/domains/src/lib.rs
//!
//! The central domain logic and interface definitions for Inkwell.

pub mod catalog;
pub mod comment_tree;
pub mod errors;
pub mod models;
pub mod ordering;
pub mod ports;
pub mod rating;
pub mod slug;

// Re-exporting for easier access in other crates
pub use catalog::*;
pub use errors::*;
pub use models::*;
pub use ports::*;
pub use rating::RatingAggregate;
