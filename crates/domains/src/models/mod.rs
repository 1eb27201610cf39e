//! # Domain Models
//!
//! These structs represent the core entities of Inkwell.
//! Volume, chapter, comment and user ids are UUID v7 (time-ordered);
//! stories are addressed by their slug.

mod account;
mod comment;
mod story;

pub use account::*;
pub use comment::*;
pub use story::*;
