//! The item collaborator - what pockets need to know about the things they hold
//!
//! The wider item model (materials, flags, decay, explosives) lives outside
//! this crate. Pockets only query it through [`ContainedItem`], so any item
//! representation can be stowed as long as it answers these questions.
//!
//! Items are deep values: a pocket owns the items it holds, and removing one
//! hands ownership back to the caller. Identity is the item's [`ItemId`],
//! never value equality - two identical rounds of ammunition are still two
//! different items.

use serde::{Deserialize, Serialize};

use super::actor::ContentsActor;
use stowage_domain::{ItemId, ItemTypeId, Mass, TemperatureZone, Tripoint, Volume};

/// Items carrying this flag can hang from a hook pocket
pub const HOOK_FLAG: &str = "BELT_CLIP";

/// Physical phase of an item's material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Solid,
    Liquid,
    Gas,
}

/// Everything a pocket asks of the items it holds.
///
/// The required methods are plain queries. The defaulted methods are hooks
/// for behaviour the item model owns (exploding, rotting, being processed
/// each tick); the defaults describe an inert item.
pub trait ContainedItem: Sized + Send + Sync + 'static {
    /// Identity of this item instance.
    fn id(&self) -> ItemId;

    /// The item's type, shared by every instance of it.
    fn item_type(&self) -> &ItemTypeId;

    fn volume(&self) -> Volume;

    fn weight(&self) -> Mass;

    fn phase(&self) -> Phase;

    fn has_flag(&self, flag: &str) -> bool;

    /// Whether two items could share a stack.
    ///
    /// Must be symmetric; pocket and contents stacking rely on it.
    fn stacks_with(&self, other: &Self) -> bool;

    /// Split `units` off this stack into a new item, leaving the rest.
    ///
    /// Only called with `0 < units < self.count()`.
    fn split(&mut self, units: u32) -> Self;

    /// Units in this stack (charges, rounds, portions).
    fn count(&self) -> u32 {
        1
    }

    fn made_of(&self, phase: Phase) -> bool {
        self.phase() == phase
    }

    fn is_ammo(&self) -> bool {
        false
    }

    /// Tool or gun modification.
    fn is_mod(&self) -> bool {
        false
    }

    /// Spent casing left behind by fired ammunition.
    fn is_casing(&self) -> bool {
        false
    }

    fn is_magazine(&self) -> bool {
        false
    }

    /// Integral parts that ammo/mod removal must leave in place.
    fn is_irremovable(&self) -> bool {
        false
    }

    fn will_explode_in_a_fire(&self) -> bool {
        false
    }

    /// Set the item off at `position`, pushing any surviving fragments into
    /// `drops`. Returns true if it detonated, which destroys it.
    fn detonate(&mut self, _position: Tripoint, _drops: &mut Vec<Self>) -> bool {
        false
    }

    /// Advance the item by one tick. Returns true if the item is destroyed.
    fn process<A>(&mut self, _carrier: Option<&mut A>, _ctx: &ProcessContext<'_>) -> bool
    where
        A: ContentsActor<Self> + ?Sized,
    {
        false
    }

    /// Returns true if the item has decayed to nothing at `position`.
    fn has_rotten_away(&mut self, _position: Tripoint) -> bool {
        false
    }
}

/// Environment passed down through pockets while processing items
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext<'a> {
    /// Type of the item that owns the contents being processed
    pub parent_type: &'a ItemTypeId,
    pub position: Tripoint,
    pub activate: bool,
    pub insulation: f32,
    pub zone: TemperatureZone,
    /// Decay rate scale; each pocket multiplies in its own spoil multiplier
    pub spoil_multiplier: f32,
}

impl<'a> ProcessContext<'a> {
    pub fn new(parent_type: &'a ItemTypeId, position: Tripoint) -> Self {
        Self {
            parent_type,
            position,
            activate: false,
            insulation: 1.0,
            zone: TemperatureZone::Normal,
            spoil_multiplier: 1.0,
        }
    }

    pub fn with_activate(mut self, activate: bool) -> Self {
        self.activate = activate;
        self
    }

    pub fn with_insulation(mut self, insulation: f32) -> Self {
        self.insulation = insulation;
        self
    }

    pub fn with_zone(mut self, zone: TemperatureZone) -> Self {
        self.zone = zone;
        self
    }

    /// The same context as seen from inside a pocket with `multiplier`.
    pub fn scaled_spoilage(self, multiplier: f32) -> Self {
        Self {
            spoil_multiplier: self.spoil_multiplier * multiplier,
            ..self
        }
    }
}

/// A handle to an item somewhere in the world.
///
/// The handle may be empty, or point at an item that has since moved or
/// been destroyed. Consumers resolve it before use and treat both cases as
/// "nothing there".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ItemLocation {
    target: Option<ItemId>,
}

impl ItemLocation {
    pub fn new(target: ItemId) -> Self {
        Self {
            target: Some(target),
        }
    }

    pub fn empty() -> Self {
        Self { target: None }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
    }

    /// The item this handle points at, if any.
    #[inline]
    pub fn resolve(&self) -> Option<ItemId> {
        self.target
    }
}

impl From<ItemId> for ItemLocation {
    fn from(id: ItemId) -> Self {
        Self::new(id)
    }
}
