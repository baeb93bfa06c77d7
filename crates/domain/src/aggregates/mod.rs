//! Aggregate roots - domain objects that own their related data
//!
//! An aggregate owns all of its constituent parts (enforced by Rust
//! ownership) and exposes behavior through methods, not public fields.
//! Pockets are only ever reached through the [`ItemContents`] that owns them.

pub mod item_contents;

pub use item_contents::ItemContents;
