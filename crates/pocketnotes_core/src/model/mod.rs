//! Domain records shared by repositories, screens and the FFI surface.
//!
//! # Invariants
//! - A note belongs to exactly one owner, keyed by the identity `UserId`.
//! - Passwords never appear in any record defined here.

pub mod note;
pub mod user;
