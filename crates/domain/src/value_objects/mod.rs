//! Value objects - Immutable objects defined by their attributes

mod names;
mod position;
mod quantity;
mod units;

pub use names::ItemTypeId;
pub use position::{TemperatureZone, Tripoint};
pub(crate) use quantity::StackDraw;
pub use units::{Mass, Volume};
