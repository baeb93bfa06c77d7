//! Collaborators that receive items leaving a pocket

use stowage_domain::Tripoint;

/// A character (or anything character-like) that items can be handed to.
///
/// Unloading and ammo/mod removal push items out of pockets into the actor;
/// the actor decides whether to carry them or drop them at its feet.
#[cfg_attr(test, mockall::automock)]
pub trait ContentsActor<I: 'static> {
    /// Give the actor an item. Returns the item back if the actor refused
    /// it, possibly with a reduced count if part of the stack was taken.
    fn add_or_drop(&mut self, item: I) -> Result<(), I>;

    /// Charge (negative) or refund (positive) the actor's moves.
    fn mod_moves(&mut self, moves: i32);
}

/// Somewhere spilled items end up, usually the map.
pub trait SpillTarget<I> {
    fn place_item(&mut self, position: Tripoint, item: I);
}

/// Collects spilled items alongside the position they landed at.
impl<I> SpillTarget<I> for Vec<(Tripoint, I)> {
    fn place_item(&mut self, position: Tripoint, item: I) {
        self.push((position, item));
    }
}
