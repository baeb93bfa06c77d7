//! Pocket entity - one typed compartment of an item
//!
//! A pocket owns an ordered list of contained items and enforces its own
//! admission rules: volume window, liquid/gas tightness, hook attachment.
//! It knows nothing about sibling pockets or the item it belongs to; the
//! [`ItemContents`](crate::aggregates::ItemContents) aggregate fans whole-item
//! operations out across pockets.
//!
//! # Admission
//!
//! | Rule | Applies when |
//! |------|--------------|
//! | Accept everything | `LegacyContainer` |
//! | Reject liquids | not `watertight` |
//! | Reject gases | not `gastight` |
//! | `BELT_CLIP` flag and volume >= min | `hook` |
//! | min <= volume <= remaining volume | otherwise |
//!
//! Weight is tracked but not checked on admission. An insertion that pushes a
//! pocket over its weight cap succeeds and logs a warning.
//!
//! # Document format
//!
//! ```json
//! {
//!   "pocket_type": "CONTAINER",
//!   "max_contains_volume": "1 L",
//!   "max_contains_weight": "2 kg",
//!   "watertight": true
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::str::FromStr;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::actor::{ContentsActor, SpillTarget};
use super::item::{ContainedItem, ItemLocation, Phase, ProcessContext, HOOK_FLAG};
use crate::value_objects::StackDraw;
use stowage_domain::{DomainError, ItemId, ItemTypeId, Mass, Tripoint, Volume};

const DEFAULT_MOVES: i32 = 100;

// ============================================================================
// PocketKind
// ============================================================================

/// What kind of compartment a pocket is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PocketKind {
    /// Stand-in for the single contents list items had before pockets.
    /// Accepts anything, but only through the explicit legacy path.
    LegacyContainer,
    #[default]
    Container,
    /// Holds ammunition.
    Magazine,
    /// End-of-enumeration marker. Only the inert sentinel pocket carries it.
    #[serde(skip)]
    Last,
}

impl PocketKind {
    /// Every kind a live pocket can have
    pub const ALL: [PocketKind; 3] = [Self::LegacyContainer, Self::Container, Self::Magazine];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LegacyContainer => "LEGACY_CONTAINER",
            Self::Container => "CONTAINER",
            Self::Magazine => "MAGAZINE",
            Self::Last => "LAST",
        }
    }
}

impl fmt::Display for PocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PocketKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::parse(format!("Unknown pocket type: {}", s)))
    }
}

// ============================================================================
// ContainRejection
// ============================================================================

/// Why a pocket turned an item away.
///
/// This is an ordinary outcome, not an error: callers try the next pocket
/// or report the reason to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainRejection {
    NotWatertight,
    NotGastight,
    /// Hook pockets only take items that can be clipped on
    NotHookable,
    TooSmall { volume: Volume, min: Volume },
    TooLarge { volume: Volume, remaining: Volume },
}

impl fmt::Display for ContainRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotWatertight => write!(f, "pocket is not watertight"),
            Self::NotGastight => write!(f, "pocket is not gastight"),
            Self::NotHookable => write!(f, "item cannot hang from a hook"),
            Self::TooSmall { volume, min } => {
                write!(f, "item volume {} is below the minimum {}", volume, min)
            }
            Self::TooLarge { volume, remaining } => {
                write!(f, "item volume {} exceeds remaining {}", volume, remaining)
            }
        }
    }
}

// ============================================================================
// Pocket
// ============================================================================

/// A compartment with its own capacity and permeability rules.
///
/// # Invariants
///
/// - After any successful [`insert_item`](Self::insert_item), contained volume
///   is at most `max_contains_volume`
/// - `contents` keeps insertion order (front = first in, back = last in)
/// - `LegacyContainer` pockets are exempt from capacity rules and are only
///   filled through [`add`](Self::add)
#[derive(Debug, Clone, PartialEq)]
pub struct Pocket<I> {
    kind: PocketKind,
    max_contains_volume: Volume,
    /// Smaller items would spill out
    min_item_volume: Volume,
    max_contains_weight: Mass,
    spoil_multiplier: f32,
    /// Scales the weight contained items add to the parent
    weight_multiplier: f32,
    /// Base time it takes to pull an item out
    moves: i32,
    watertight: bool,
    gastight: bool,
    /// Spills its contents when the parent goes into another container
    open_container: bool,
    hook: bool,
    /// Parent's size does not change with contents
    rigid: bool,
    contents: Vec<I>,
}

impl<I> Pocket<I> {
    // =========================================================================
    // Constructor and builder
    // =========================================================================

    /// Create an empty pocket of `kind` with zero capacity and default rules.
    pub fn new(kind: PocketKind) -> Self {
        Self {
            kind,
            max_contains_volume: Volume::ZERO,
            min_item_volume: Volume::ZERO,
            max_contains_weight: Mass::ZERO,
            spoil_multiplier: 1.0,
            weight_multiplier: 1.0,
            moves: DEFAULT_MOVES,
            watertight: false,
            gastight: false,
            open_container: false,
            hook: false,
            rigid: false,
            contents: Vec::new(),
        }
    }

    pub fn with_max_volume(mut self, volume: Volume) -> Self {
        self.max_contains_volume = volume;
        self
    }

    pub fn with_min_item_volume(mut self, volume: Volume) -> Self {
        self.min_item_volume = volume;
        self
    }

    pub fn with_max_weight(mut self, weight: Mass) -> Self {
        self.max_contains_weight = weight;
        self
    }

    pub fn with_spoil_multiplier(mut self, multiplier: f32) -> Self {
        self.spoil_multiplier = multiplier;
        self
    }

    pub fn with_weight_multiplier(mut self, multiplier: f32) -> Self {
        self.weight_multiplier = multiplier;
        self
    }

    pub fn with_moves(mut self, moves: i32) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_watertight(mut self, watertight: bool) -> Self {
        self.watertight = watertight;
        self
    }

    pub fn with_gastight(mut self, gastight: bool) -> Self {
        self.gastight = gastight;
        self
    }

    pub fn with_open_container(mut self, open: bool) -> Self {
        self.open_container = open;
        self
    }

    pub fn with_hook(mut self, hook: bool) -> Self {
        self.hook = hook;
        self
    }

    pub fn with_rigid(mut self, rigid: bool) -> Self {
        self.rigid = rigid;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn kind(&self) -> PocketKind {
        self.kind
    }

    #[inline]
    pub fn is_type(&self, kind: PocketKind) -> bool {
        self.kind == kind
    }

    #[inline]
    pub fn max_contains_volume(&self) -> Volume {
        self.max_contains_volume
    }

    #[inline]
    pub fn min_item_volume(&self) -> Volume {
        self.min_item_volume
    }

    #[inline]
    pub fn max_contains_weight(&self) -> Mass {
        self.max_contains_weight
    }

    /// Decay-rate scale for contained items, consulted while processing.
    #[inline]
    pub fn spoil_multiplier(&self) -> f32 {
        self.spoil_multiplier
    }

    #[inline]
    pub fn weight_multiplier(&self) -> f32 {
        self.weight_multiplier
    }

    /// Base cost in moves of pulling an item out of this pocket.
    #[inline]
    pub fn moves(&self) -> i32 {
        self.moves
    }

    #[inline]
    pub fn is_watertight(&self) -> bool {
        self.watertight
    }

    #[inline]
    pub fn is_gastight(&self) -> bool {
        self.gastight
    }

    #[inline]
    pub fn is_open_container(&self) -> bool {
        self.open_container
    }

    #[inline]
    pub fn is_hook(&self) -> bool {
        self.hook
    }

    #[inline]
    pub fn is_rigid(&self) -> bool {
        self.rigid
    }

    // =========================================================================
    // List access
    // =========================================================================

    /// Contained items, in insertion order.
    #[inline]
    pub fn contents(&self) -> &[I] {
        &self.contents
    }

    /// Direct access to the contents list, bypassing every admission rule.
    #[inline]
    pub fn contents_mut(&mut self) -> &mut Vec<I> {
        &mut self.contents
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn front(&self) -> Option<&I> {
        self.contents.first()
    }

    pub fn back(&self) -> Option<&I> {
        self.contents.last()
    }

    pub fn pop_back(&mut self) -> Option<I> {
        self.contents.pop()
    }

    /// Append without any checks. Reserved for the legacy bridge and for
    /// callers that already validated placement.
    pub fn add(&mut self, item: I) {
        self.contents.push(item);
    }

    pub fn clear_items(&mut self) {
        self.contents.clear();
    }
}

// ============================================================================
// Sentinel
// ============================================================================

/// One leaked inert pocket per item type, alive for the rest of the program.
static NONE_POCKETS: Lazy<DashMap<TypeId, &'static (dyn Any + Send + Sync)>> =
    Lazy::new(DashMap::new);

impl<I: ContainedItem> Pocket<I> {
    /// The shared inert pocket returned when a legacy accessor is called on
    /// contents that never got a legacy pocket.
    ///
    /// It is empty, has kind [`PocketKind::Last`], and is shared by every
    /// caller that hits the same bug, so it must only ever be read.
    pub fn none() -> &'static Self {
        let entry = *NONE_POCKETS.entry(TypeId::of::<I>()).or_insert_with(|| {
            let leaked: &'static (dyn Any + Send + Sync) = Self::leak_sentinel();
            leaked
        });
        if let Some(sentinel) = entry.downcast_ref::<Self>() {
            return sentinel;
        }

        // Keyed by TypeId::of::<I>(), so the entry is always a Pocket<I>.
        // Should that ever break, replace it once so callers share one again.
        tracing::error!(
            item_type = std::any::type_name::<I>(),
            "Sentinel pocket registry held a mismatched entry"
        );
        let sentinel = Self::leak_sentinel();
        let shared: &'static (dyn Any + Send + Sync) = sentinel;
        NONE_POCKETS.insert(TypeId::of::<I>(), shared);
        sentinel
    }

    fn leak_sentinel() -> &'static Self {
        Box::leak(Box::new(Self::new(PocketKind::Last)))
    }
}

// ============================================================================
// Capacity and aggregates
// ============================================================================

impl<I: ContainedItem> Pocket<I> {
    /// Combined volume of contained items
    pub fn contains_volume(&self) -> Volume {
        self.contents.iter().map(I::volume).sum()
    }

    /// Combined weight of contained items, before the weight multiplier
    pub fn contains_weight(&self) -> Mass {
        self.contents.iter().map(I::weight).sum()
    }

    pub fn remaining_volume(&self) -> Volume {
        self.max_contains_volume - self.contains_volume()
    }

    pub fn remaining_weight(&self) -> Mass {
        self.max_contains_weight - self.contains_weight()
    }

    /// Whether contents outweigh the cap. Admission never checks weight, so
    /// this can happen; the surrounding simulation decides what to do.
    pub fn is_overweight(&self) -> bool {
        !self.is_type(PocketKind::LegacyContainer)
            && self.contains_weight() > self.max_contains_weight
    }

    /// How much the parent item grows because of this pocket's contents.
    pub fn item_size_modifier(&self) -> Volume {
        if self.rigid {
            return Volume::ZERO;
        }
        self.contains_volume()
    }

    /// How much weight this pocket's contents add to the parent item.
    pub fn item_weight_modifier(&self) -> Mass {
        self.contents
            .iter()
            .map(|item| item.weight() * self.weight_multiplier)
            .sum()
    }

    // =========================================================================
    // Admission
    // =========================================================================

    /// Check whether `item` fits, explaining why not if it doesn't.
    pub fn check_contain(&self, item: &I) -> Result<(), ContainRejection> {
        if self.is_type(PocketKind::LegacyContainer) {
            return Ok(());
        }
        if item.made_of(Phase::Liquid) && !self.watertight {
            return Err(ContainRejection::NotWatertight);
        }
        if item.made_of(Phase::Gas) && !self.gastight {
            return Err(ContainRejection::NotGastight);
        }

        let volume = item.volume();
        if self.hook && !item.has_flag(HOOK_FLAG) {
            return Err(ContainRejection::NotHookable);
        }
        if volume < self.min_item_volume {
            return Err(ContainRejection::TooSmall {
                volume,
                min: self.min_item_volume,
            });
        }
        // Hooks hold things by attachment, not stowage volume
        if self.hook {
            return Ok(());
        }

        let remaining = self.remaining_volume();
        if volume > remaining {
            return Err(ContainRejection::TooLarge { volume, remaining });
        }
        Ok(())
    }

    pub fn can_contain(&self, item: &I) -> bool {
        self.check_contain(item).is_ok()
    }

    /// Put `item` in the pocket if it fits.
    ///
    /// Legacy pockets always refuse here; they are filled through
    /// [`add`](Self::add). A refused item is handed back untouched.
    pub fn insert_item(&mut self, item: I) -> Result<(), I> {
        if self.is_type(PocketKind::LegacyContainer) || !self.can_contain(&item) {
            return Err(item);
        }
        self.contents.push(item);

        if self.is_overweight() {
            tracing::warn!(
                pocket_type = %self.kind,
                contained = %self.contains_weight(),
                max = %self.max_contains_weight,
                "Pocket holds more than its weight capacity"
            );
        }
        Ok(())
    }

    // =========================================================================
    // Lookup and removal
    // =========================================================================

    /// Remove and return the item with identity `id`.
    pub fn remove_item(&mut self, id: ItemId) -> Option<I> {
        let index = self.contents.iter().position(|item| item.id() == id)?;
        Some(self.contents.remove(index))
    }

    /// Remove the item a location points at. Empty and dangling locations
    /// remove nothing.
    pub fn remove_item_at(&mut self, location: &ItemLocation) -> Option<I> {
        self.remove_item(location.resolve()?)
    }

    pub fn has_item(&self, id: ItemId) -> bool {
        self.contents.iter().any(|item| item.id() == id)
    }

    pub fn get_item_with<F>(&self, filter: F) -> Option<&I>
    where
        F: Fn(&I) -> bool,
    {
        self.contents.iter().find(|item| filter(item))
    }

    pub fn get_item_with_mut<F>(&mut self, filter: F) -> Option<&mut I>
    where
        F: Fn(&I) -> bool,
    {
        self.contents.iter_mut().find(|item| filter(item))
    }

    pub fn remove_items_if<F>(&mut self, mut filter: F)
    where
        F: FnMut(&mut I) -> bool,
    {
        self.contents.retain_mut(|item| !filter(item));
    }

    /// Offer each spent casing to `func`; casings it returns true for are
    /// removed.
    pub fn casings_handle<F>(&mut self, mut func: F)
    where
        F: FnMut(&mut I) -> bool,
    {
        self.contents
            .retain_mut(|item| !(item.is_casing() && func(item)));
    }

    pub fn magazine_current(&self) -> Option<&I> {
        self.contents.iter().find(|item| item.is_magazine())
    }

    pub fn magazine_current_mut(&mut self) -> Option<&mut I> {
        self.contents.iter_mut().find(|item| item.is_magazine())
    }

    /// Draw up to `quantity` units of `item_type`, front to back.
    ///
    /// Whole stacks are moved into `used` while they fit in the remaining
    /// quantity; the last stack is split. `quantity` is decremented by what
    /// was drawn. Returns true if anything was drawn.
    pub fn use_amount(
        &mut self,
        item_type: &ItemTypeId,
        quantity: &mut u32,
        used: &mut Vec<I>,
    ) -> bool {
        let mut used_any = false;
        let mut index = 0;
        while index < self.contents.len() && *quantity > 0 {
            let item = &mut self.contents[index];
            if item.item_type() != item_type {
                index += 1;
                continue;
            }

            let stack = item.count();
            let draw = StackDraw::plan(stack, *quantity);
            let taken = draw.taken(stack);
            *quantity -= taken;
            used_any = true;

            if draw.takes_whole_stack() {
                used.push(self.contents.remove(index));
            } else {
                used.push(item.split(taken));
                index += 1;
            }
        }
        used_any
    }

    // =========================================================================
    // Whole-pocket behaviour
    // =========================================================================

    pub fn will_explode_in_a_fire(&self) -> bool {
        self.contents.iter().any(I::will_explode_in_a_fire)
    }

    /// Detonate contained items at `position`. Items that go off are
    /// destroyed; their fragments land in `drops`.
    pub fn detonate(&mut self, position: Tripoint, drops: &mut Vec<I>) -> bool {
        let before = self.contents.len();
        self.contents
            .retain_mut(|item| !item.detonate(position, drops));
        self.contents.len() != before
    }

    /// Process each contained item for one tick, dropping destroyed ones.
    pub fn process<A>(&mut self, mut carrier: Option<&mut A>, ctx: &ProcessContext<'_>)
    where
        A: ContentsActor<I> + ?Sized,
    {
        let ctx = ctx.scaled_spoilage(self.spoil_multiplier);
        self.contents
            .retain_mut(|item| !item.process(carrier.as_deref_mut(), &ctx));
    }

    pub fn has_rotten_away(&mut self, position: Tripoint) {
        self.contents
            .retain_mut(|item| !item.has_rotten_away(position));
    }

    /// Hand every item to `actor`. Each accepted item costs the actor this
    /// pocket's moves. `changed` is set if anything left the pocket or a
    /// refused stack came back smaller.
    pub fn legacy_unload<A>(&mut self, actor: &mut A, changed: &mut bool)
    where
        A: ContentsActor<I> + ?Sized,
    {
        for item in std::mem::take(&mut self.contents) {
            let count_before = item.count();
            match actor.add_or_drop(item) {
                Ok(()) => {
                    *changed = true;
                    actor.mod_moves(-self.moves);
                }
                Err(refused) => {
                    if refused.count() != count_before {
                        *changed = true;
                    }
                    self.contents.push(refused);
                }
            }
        }
    }

    pub fn remove_all_ammo<A>(&mut self, actor: &mut A)
    where
        A: ContentsActor<I> + ?Sized,
    {
        self.hand_over(actor, I::is_ammo);
    }

    pub fn remove_all_mods<A>(&mut self, actor: &mut A)
    where
        A: ContentsActor<I> + ?Sized,
    {
        self.hand_over(actor, I::is_mod);
    }

    /// Offer removable items matching `selects` to `actor`; refused items
    /// go back where they were.
    fn hand_over<A>(&mut self, actor: &mut A, selects: fn(&I) -> bool)
    where
        A: ContentsActor<I> + ?Sized,
    {
        for item in std::mem::take(&mut self.contents) {
            if item.is_irremovable() || !selects(&item) {
                self.contents.push(item);
                continue;
            }
            if let Err(refused) = actor.add_or_drop(item) {
                self.contents.push(refused);
            }
        }
    }

    /// Eject every item at `position`.
    pub fn spill_contents<T>(&mut self, position: Tripoint, target: &mut T)
    where
        T: SpillTarget<I> + ?Sized,
    {
        for item in self.contents.drain(..) {
            target.place_item(position, item);
        }
    }

    /// Two pockets stack when their contents pair up positionally, item by
    /// item, with equal counts.
    pub fn stacks_with(&self, other: &Self) -> bool {
        self.contents.len() == other.contents.len()
            && self
                .contents
                .iter()
                .zip(&other.contents)
                .all(|(a, b)| a.count() == b.count() && a.stacks_with(b))
    }
}

// ============================================================================
// Serde Implementation
// ============================================================================

fn default_multiplier() -> f32 {
    1.0
}

fn default_moves() -> i32 {
    DEFAULT_MOVES
}

/// Wire format for writing; borrows the contents instead of cloning them
#[derive(Serialize)]
struct PocketWireRef<'a, I> {
    pocket_type: PocketKind,
    min_item_volume: Volume,
    max_contains_volume: Volume,
    max_contains_weight: Mass,
    spoil_multiplier: f32,
    weight_multiplier: f32,
    moves: i32,
    watertight: bool,
    gastight: bool,
    open_container: bool,
    hook: bool,
    rigid: bool,
    contents: &'a [I],
}

/// Wire format for reading. Capacity fields are required; `contents` only
/// appears in saved state, not in type definitions.
#[derive(Deserialize)]
struct PocketWireFormat<I> {
    #[serde(default)]
    pocket_type: PocketKind,
    #[serde(default)]
    min_item_volume: Volume,
    max_contains_volume: Volume,
    max_contains_weight: Mass,
    #[serde(default = "default_multiplier")]
    spoil_multiplier: f32,
    #[serde(default = "default_multiplier")]
    weight_multiplier: f32,
    #[serde(default = "default_moves")]
    moves: i32,
    #[serde(default)]
    watertight: bool,
    #[serde(default)]
    gastight: bool,
    #[serde(default)]
    open_container: bool,
    #[serde(default)]
    hook: bool,
    #[serde(default)]
    rigid: bool,
    #[serde(default = "Vec::new")]
    contents: Vec<I>,
}

impl<I: Serialize> Serialize for Pocket<I> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = PocketWireRef {
            pocket_type: self.kind,
            min_item_volume: self.min_item_volume,
            max_contains_volume: self.max_contains_volume,
            max_contains_weight: self.max_contains_weight,
            spoil_multiplier: self.spoil_multiplier,
            weight_multiplier: self.weight_multiplier,
            moves: self.moves,
            watertight: self.watertight,
            gastight: self.gastight,
            open_container: self.open_container,
            hook: self.hook,
            rigid: self.rigid,
            contents: &self.contents,
        };
        wire.serialize(serializer)
    }
}

impl<'de, I> Deserialize<'de> for Pocket<I>
where
    I: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = PocketWireFormat::<I>::deserialize(deserializer)?;

        if wire.max_contains_volume < Volume::ZERO || wire.min_item_volume < Volume::ZERO {
            return Err(de::Error::custom("pocket volumes cannot be negative"));
        }
        if wire.max_contains_weight < Mass::ZERO {
            return Err(de::Error::custom("pocket weight capacity cannot be negative"));
        }

        Ok(Pocket {
            kind: wire.pocket_type,
            max_contains_volume: wire.max_contains_volume,
            min_item_volume: wire.min_item_volume,
            max_contains_weight: wire.max_contains_weight,
            spoil_multiplier: wire.spoil_multiplier,
            weight_multiplier: wire.weight_multiplier,
            moves: wire.moves,
            watertight: wire.watertight,
            gastight: wire.gastight,
            open_container: wire.open_container,
            hook: wire.hook,
            rigid: wire.rigid,
            contents: wire.contents,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
