extern crate self as stowage_domain;

pub mod aggregates;
pub mod definitions;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

#[cfg(test)]
mod testing;

pub use aggregates::ItemContents;
pub use definitions::ContentsCatalog;

pub use entities::{
    ContainRejection, ContainedItem, ContentsActor, ItemLocation, Phase, Pocket, PocketKind,
    ProcessContext, SpillTarget, HOOK_FLAG,
};

pub use error::DomainError;

// Re-export ID types
pub use ids::ItemId;

pub use value_objects::{ItemTypeId, Mass, TemperatureZone, Tripoint, Volume};
