//! Domain entities - Core business objects with identity

mod actor;
mod item;
mod pocket;

pub use actor::{ContentsActor, SpillTarget};
pub use item::{ContainedItem, ItemLocation, Phase, ProcessContext, HOOK_FLAG};
pub use pocket::{ContainRejection, Pocket, PocketKind};

#[cfg(test)]
pub(crate) use actor::MockContentsActor;
