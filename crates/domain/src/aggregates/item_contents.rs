//! ItemContents aggregate - every pocket of one item
//!
//! The owning item calls in here for anything that concerns its contents.
//! Each operation fans out over the pockets in their stored order:
//!
//! - **Searches** (`can_contain`, `insert_item`, `remove_item`, `has_item`,
//!   `get_item_with`, `magazine_current`) stop at the first pocket that
//!   answers, so pocket order is also tie-break priority.
//! - **Sweeps** (modifiers, `detonate`, `process`, unloading, spilling, rot)
//!   visit every pocket unconditionally.
//!
//! # Legacy bridge
//!
//! Items that predate pockets kept one flat contents list. That list lives on
//! as a single `LegacyContainer` pocket, synthesized on the first
//! [`insert_legacy`](ItemContents::insert_legacy) and kept at the front of
//! the pocket list. The `legacy_*` accessors are a thin view onto it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entities::{
    ContainedItem, ContentsActor, ItemLocation, Pocket, PocketKind, ProcessContext, SpillTarget,
};
use stowage_domain::{ItemId, ItemTypeId, Mass, TemperatureZone, Tripoint, Volume};

/// The ordered pockets of a single item.
///
/// # Invariants
///
/// - Pockets are never removed; the count only grows, and only when the
///   legacy pocket is synthesized
/// - At most one `LegacyContainer` pocket exists, and it sits first
#[derive(Debug, Clone, PartialEq)]
pub struct ItemContents<I> {
    /// Whether the owning item may itself go inside another container
    nestable: bool,
    pockets: Vec<Pocket<I>>,
}

impl<I> Default for ItemContents<I> {
    fn default() -> Self {
        Self {
            nestable: true,
            pockets: Vec::new(),
        }
    }
}

impl<I> ItemContents<I> {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Contents made of `pockets`, in priority order.
    pub fn new(pockets: Vec<Pocket<I>>) -> Self {
        Self {
            nestable: true,
            pockets,
        }
    }

    pub fn with_nestable(mut self, nestable: bool) -> Self {
        self.nestable = nestable;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn is_nestable(&self) -> bool {
        self.nestable
    }

    #[inline]
    pub fn pockets(&self) -> &[Pocket<I>] {
        &self.pockets
    }

    /// Mutable access to individual pockets. A slice, so the pocket list
    /// itself cannot grow or shrink through it.
    #[inline]
    pub fn pockets_mut(&mut self) -> &mut [Pocket<I>] {
        &mut self.pockets
    }

    #[inline]
    pub fn pocket_count(&self) -> usize {
        self.pockets.len()
    }
}

impl<I: ContainedItem> ItemContents<I> {
    // =========================================================================
    // Admission and insertion
    // =========================================================================

    /// Whether any pocket could take `item`.
    pub fn can_contain(&self, item: &I) -> bool {
        self.pockets.iter().any(|pocket| pocket.can_contain(item))
    }

    /// Put `item` into the first pocket that accepts it.
    ///
    /// Returns the item if no pocket took it; nothing is mutated then.
    pub fn insert_item(&mut self, item: I) -> Result<(), I> {
        let mut item = item;
        for pocket in &mut self.pockets {
            match pocket.insert_item(item) {
                Ok(()) => return Ok(()),
                Err(rejected) => item = rejected,
            }
        }
        Err(item)
    }

    /// Add `item` to the legacy pocket, creating that pocket first if this
    /// item has none. Always succeeds; there are no capacity checks.
    pub fn insert_legacy(&mut self, item: I) {
        if let Some(pocket) = self
            .pockets
            .iter_mut()
            .find(|pocket| pocket.is_type(PocketKind::LegacyContainer))
        {
            pocket.add(item);
            return;
        }

        tracing::debug!(
            pocket_count = self.pockets.len(),
            "Synthesizing legacy pocket"
        );
        let mut pocket = Pocket::new(PocketKind::LegacyContainer);
        pocket.add(item);
        self.pockets.insert(0, pocket);
    }

    // =========================================================================
    // Lookup and removal
    // =========================================================================

    /// Remove the item with identity `id` from whichever pocket holds it.
    pub fn remove_item(&mut self, id: ItemId) -> Option<I> {
        self.pockets
            .iter_mut()
            .find_map(|pocket| pocket.remove_item(id))
    }

    /// Remove the item `location` points at. Empty or dangling locations
    /// remove nothing.
    pub fn remove_item_at(&mut self, location: &ItemLocation) -> Option<I> {
        self.remove_item(location.resolve()?)
    }

    pub fn has_item(&self, id: ItemId) -> bool {
        self.pockets.iter().any(|pocket| pocket.has_item(id))
    }

    /// First item, in pocket then insertion order, matching `filter`.
    pub fn get_item_with<F>(&self, filter: F) -> Option<&I>
    where
        F: Fn(&I) -> bool,
    {
        self.pockets
            .iter()
            .find_map(|pocket| pocket.get_item_with(&filter))
    }

    pub fn get_item_with_mut<F>(&mut self, filter: F) -> Option<&mut I>
    where
        F: Fn(&I) -> bool,
    {
        self.pockets
            .iter_mut()
            .find_map(|pocket| pocket.get_item_with_mut(&filter))
    }

    pub fn remove_items_if<F>(&mut self, mut filter: F)
    where
        F: FnMut(&mut I) -> bool,
    {
        for pocket in &mut self.pockets {
            pocket.remove_items_if(&mut filter);
        }
    }

    /// Offer every spent casing, in every pocket, to `func`. Casings it
    /// returns true for are removed.
    pub fn casings_handle<F>(&mut self, mut func: F)
    where
        F: FnMut(&mut I) -> bool,
    {
        for pocket in &mut self.pockets {
            pocket.casings_handle(&mut func);
        }
    }

    pub fn magazine_current(&self) -> Option<&I> {
        self.pockets.iter().find_map(Pocket::magazine_current)
    }

    pub fn magazine_current_mut(&mut self) -> Option<&mut I> {
        self.pockets.iter_mut().find_map(Pocket::magazine_current_mut)
    }

    /// Draw up to `quantity` units of `item_type` across pockets in order.
    ///
    /// `quantity` is a running remainder: earlier pockets are drained first
    /// and later pockets only see what is still wanted.
    pub fn use_amount(
        &mut self,
        item_type: &ItemTypeId,
        quantity: &mut u32,
        used: &mut Vec<I>,
    ) -> bool {
        let mut used_any = false;
        for pocket in &mut self.pockets {
            used_any = pocket.use_amount(item_type, quantity, used) || used_any;
        }
        used_any
    }

    /// Cost in moves of taking the item `id` out, if it is in here.
    pub fn obtain_cost(&self, id: ItemId) -> Option<i32> {
        self.pockets
            .iter()
            .find(|pocket| pocket.has_item(id))
            .map(Pocket::moves)
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Total size change of the owning item across all pockets.
    pub fn item_size_modifier(&self) -> Volume {
        self.pockets.iter().map(Pocket::item_size_modifier).sum()
    }

    /// Total weight the contents add to the owning item.
    pub fn item_weight_modifier(&self) -> Mass {
        self.pockets.iter().map(Pocket::item_weight_modifier).sum()
    }

    /// Every contained item, pocket by pocket in insertion order.
    pub fn all_items(&self) -> Vec<&I> {
        self.pockets
            .iter()
            .flat_map(|pocket| pocket.contents())
            .collect()
    }

    pub fn all_items_mut(&mut self) -> Vec<&mut I> {
        self.pockets
            .iter_mut()
            .flat_map(|pocket| pocket.contents_mut().iter_mut())
            .collect()
    }

    /// Number of item stacks across all pockets.
    pub fn num_item_stacks(&self) -> usize {
        self.pockets.iter().map(Pocket::len).sum()
    }

    /// True when there are no pockets, or when *any* pocket is empty.
    ///
    /// Note this is not "nothing is stored": contents with one full and one
    /// empty pocket report empty. Callers depend on this exact behaviour.
    pub fn is_empty(&self) -> bool {
        self.pockets.is_empty() || self.pockets.iter().any(Pocket::is_empty)
    }

    /// Two contents stack when they have the same number of pockets and each
    /// pocket stacks with the one at the same position.
    pub fn stacks_with(&self, other: &Self) -> bool {
        self.pockets.len() == other.pockets.len()
            && self
                .pockets
                .iter()
                .zip(&other.pockets)
                .all(|(a, b)| a.stacks_with(b))
    }

    /// Whether putting the owning item into another container would spill
    /// something out of an open pocket.
    pub fn spills_when_nested(&self) -> bool {
        self.pockets
            .iter()
            .any(|pocket| pocket.is_open_container() && !pocket.is_empty())
    }

    // =========================================================================
    // Whole-contents behaviour
    // =========================================================================

    pub fn will_explode_in_a_fire(&self) -> bool {
        self.pockets.iter().any(Pocket::will_explode_in_a_fire)
    }

    /// Detonate contents in every pocket. Returns true if anything went off.
    pub fn detonate(&mut self, position: Tripoint, drops: &mut Vec<I>) -> bool {
        let mut detonated = false;
        for pocket in &mut self.pockets {
            detonated = pocket.detonate(position, drops) || detonated;
        }
        detonated
    }

    /// Process every contained item for one tick.
    ///
    /// Each pocket scales spoilage by its own multiplier. The return value is
    /// always true and carries no meaning.
    pub fn process<A>(
        &mut self,
        parent_type: &ItemTypeId,
        mut carrier: Option<&mut A>,
        position: Tripoint,
        activate: bool,
        insulation: f32,
        zone: TemperatureZone,
    ) -> bool
    where
        A: ContentsActor<I> + ?Sized,
    {
        let ctx = ProcessContext::new(parent_type, position)
            .with_activate(activate)
            .with_insulation(insulation)
            .with_zone(zone);
        for pocket in &mut self.pockets {
            pocket.process(carrier.as_deref_mut(), &ctx);
        }
        true
    }

    /// Hand everything to `actor`. Always returns true; `changed` reports
    /// whether anything moved.
    pub fn legacy_unload<A>(&mut self, actor: &mut A, changed: &mut bool) -> bool
    where
        A: ContentsActor<I> + ?Sized,
    {
        for pocket in &mut self.pockets {
            pocket.legacy_unload(actor, changed);
        }
        true
    }

    pub fn remove_all_ammo<A>(&mut self, actor: &mut A)
    where
        A: ContentsActor<I> + ?Sized,
    {
        for pocket in &mut self.pockets {
            pocket.remove_all_ammo(actor);
        }
    }

    pub fn remove_all_mods<A>(&mut self, actor: &mut A)
    where
        A: ContentsActor<I> + ?Sized,
    {
        for pocket in &mut self.pockets {
            pocket.remove_all_mods(actor);
        }
    }

    /// Eject every pocket's contents at `position`. Always returns true.
    pub fn spill_contents<T>(&mut self, position: Tripoint, target: &mut T) -> bool
    where
        T: SpillTarget<I> + ?Sized,
    {
        tracing::debug!(
            %position,
            items = self.num_item_stacks(),
            "Spilling contents"
        );
        for pocket in &mut self.pockets {
            pocket.spill_contents(position, target);
        }
        true
    }

    pub fn clear_items(&mut self) {
        for pocket in &mut self.pockets {
            pocket.clear_items();
        }
    }

    /// Drop items that have rotted away at `position`.
    pub fn has_rotten_away(&mut self, position: Tripoint) {
        for pocket in &mut self.pockets {
            pocket.has_rotten_away(position);
        }
    }

    // =========================================================================
    // Legacy list view
    // =========================================================================

    /// The legacy pocket.
    ///
    /// Calling this on contents without one is a bug at the call site. It is
    /// logged, and the shared inert [`Pocket::none`] sentinel is returned so
    /// the simulation step carries on.
    pub fn legacy_pocket(&self) -> &Pocket<I> {
        match self.find_legacy_pocket() {
            Some(pocket) => pocket,
            None => {
                self.report_missing_legacy_pocket();
                Pocket::none()
            }
        }
    }

    /// Mutable legacy pocket. The sentinel cannot be lent out mutably, so a
    /// missing legacy pocket is logged and yields `None`.
    pub fn legacy_pocket_mut(&mut self) -> Option<&mut Pocket<I>> {
        if self.find_legacy_pocket().is_none() {
            self.report_missing_legacy_pocket();
            return None;
        }
        self.pockets
            .iter_mut()
            .find(|pocket| pocket.is_type(PocketKind::LegacyContainer))
    }

    pub fn legacy_back(&self) -> Option<&I> {
        self.legacy_pocket().back()
    }

    pub fn legacy_front(&self) -> Option<&I> {
        self.legacy_pocket().front()
    }

    pub fn legacy_size(&self) -> usize {
        self.legacy_pocket().len()
    }

    pub fn legacy_pop_back(&mut self) -> Option<I> {
        self.legacy_pocket_mut()?.pop_back()
    }

    pub fn legacy_items(&self) -> &[I] {
        self.legacy_pocket().contents()
    }

    pub fn legacy_items_mut(&mut self) -> Option<&mut Vec<I>> {
        self.legacy_pocket_mut().map(Pocket::contents_mut)
    }

    fn find_legacy_pocket(&self) -> Option<&Pocket<I>> {
        self.pockets
            .iter()
            .find(|pocket| pocket.is_type(PocketKind::LegacyContainer))
    }

    fn report_missing_legacy_pocket(&self) {
        tracing::error!(
            pocket_count = self.pockets.len(),
            "Tried to access non-existing legacy pocket"
        );
    }
}

// ============================================================================
// Serde Implementation
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
struct ItemContentsWireRef<'a, I> {
    nestable: bool,
    contents: &'a [Pocket<I>],
}

/// `contents` (the pocket list) is required; an item definition without
/// pockets must say so with an empty list.
#[derive(Deserialize)]
struct ItemContentsWireFormat<I> {
    #[serde(default = "default_true")]
    nestable: bool,
    contents: Vec<Pocket<I>>,
}

impl<I: Serialize> Serialize for ItemContents<I> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ItemContentsWireRef {
            nestable: self.nestable,
            contents: &self.pockets,
        }
        .serialize(serializer)
    }
}

impl<'de, I> Deserialize<'de> for ItemContents<I>
where
    I: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = ItemContentsWireFormat::<I>::deserialize(deserializer)?;
        Ok(ItemContents {
            nestable: wire.nestable,
            pockets: wire.contents,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
