//! Repository facades over the document store.
//!
//! # Responsibility
//! - Map application intents (list, add, update, delete) onto store calls.
//! - Keep document encoding details out of screens and the app controller.
//!
//! # Invariants
//! - Repository writes validate drafts before touching the store.
//! - Owner scoping is applied by every read path.

pub mod note_repo;
