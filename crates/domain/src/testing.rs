//! Shared test fixtures: a configurable item and log capture.

use std::io;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::entities::{ContainedItem, ContentsActor, Phase, Pocket, PocketKind, ProcessContext};
use crate::{ItemId, ItemTypeId, Mass, Tripoint, Volume};

pub(crate) fn ml(milliliters: i64) -> Volume {
    Volume::from_milliliters(milliliters)
}

/// A 1 L / 2 kg general-purpose pocket, not watertight.
pub(crate) fn liter_pocket() -> Pocket<TestItem> {
    Pocket::new(PocketKind::Container)
        .with_max_volume(Volume::from_liters(1))
        .with_max_weight(Mass::from_kilograms(2))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TestItem {
    id: ItemId,
    item_type: ItemTypeId,
    volume: Volume,
    weight: Mass,
    phase: Phase,
    flags: Vec<String>,
    count: u32,
    explosive: bool,
    ammo: bool,
    is_mod: bool,
    casing: bool,
    magazine: bool,
    irremovable: bool,
    age: f32,
    shelf_life: Option<f32>,
}

impl TestItem {
    fn new(item_type: &str, volume: Volume, phase: Phase) -> Self {
        Self {
            id: ItemId::new(),
            item_type: ItemTypeId::new(item_type).unwrap(),
            volume,
            weight: Mass::from_grams(10),
            phase,
            flags: Vec::new(),
            count: 1,
            explosive: false,
            ammo: false,
            is_mod: false,
            casing: false,
            magazine: false,
            irremovable: false,
            age: 0.0,
            shelf_life: None,
        }
    }

    pub(crate) fn solid(item_type: &str, volume: Volume) -> Self {
        Self::new(item_type, volume, Phase::Solid)
    }

    pub(crate) fn liquid(item_type: &str, volume: Volume) -> Self {
        Self::new(item_type, volume, Phase::Liquid)
    }

    pub(crate) fn gas(item_type: &str, volume: Volume) -> Self {
        Self::new(item_type, volume, Phase::Gas)
    }

    pub(crate) fn with_new_id(mut self) -> Self {
        self.id = ItemId::new();
        self
    }

    pub(crate) fn with_weight(mut self, weight: Mass) -> Self {
        self.weight = weight;
        self
    }

    pub(crate) fn with_flag(mut self, flag: &str) -> Self {
        self.flags.push(flag.to_string());
        self
    }

    pub(crate) fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub(crate) fn with_shelf_life(mut self, shelf_life: f32) -> Self {
        self.shelf_life = Some(shelf_life);
        self
    }

    pub(crate) fn explosive(mut self) -> Self {
        self.explosive = true;
        self
    }

    pub(crate) fn ammo(mut self) -> Self {
        self.ammo = true;
        self
    }

    pub(crate) fn weapon_mod(mut self) -> Self {
        self.is_mod = true;
        self
    }

    pub(crate) fn casing(mut self) -> Self {
        self.casing = true;
        self
    }

    pub(crate) fn magazine(mut self) -> Self {
        self.magazine = true;
        self
    }

    pub(crate) fn irremovable(mut self) -> Self {
        self.irremovable = true;
        self
    }

    /// Accumulated spoilage from processing ticks.
    pub(crate) fn age(&self) -> f32 {
        self.age
    }
}

impl ContainedItem for TestItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn item_type(&self) -> &ItemTypeId {
        &self.item_type
    }

    fn volume(&self) -> Volume {
        self.volume
    }

    fn weight(&self) -> Mass {
        self.weight
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    fn stacks_with(&self, other: &Self) -> bool {
        self.item_type == other.item_type && self.phase == other.phase && self.flags == other.flags
    }

    fn split(&mut self, units: u32) -> Self {
        self.count -= units;
        Self {
            id: ItemId::new(),
            count: units,
            ..self.clone()
        }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn is_ammo(&self) -> bool {
        self.ammo
    }

    fn is_mod(&self) -> bool {
        self.is_mod
    }

    fn is_casing(&self) -> bool {
        self.casing
    }

    fn is_magazine(&self) -> bool {
        self.magazine
    }

    fn is_irremovable(&self) -> bool {
        self.irremovable
    }

    fn will_explode_in_a_fire(&self) -> bool {
        self.explosive
    }

    fn detonate(&mut self, _position: Tripoint, drops: &mut Vec<Self>) -> bool {
        if !self.explosive {
            return false;
        }
        drops.push(TestItem::solid("shrapnel", ml(5)));
        true
    }

    fn process<A>(&mut self, _carrier: Option<&mut A>, ctx: &ProcessContext<'_>) -> bool
    where
        A: ContentsActor<Self> + ?Sized,
    {
        self.age += ctx.spoil_multiplier;
        false
    }

    fn has_rotten_away(&mut self, _position: Tripoint) -> bool {
        self.shelf_life.is_some_and(|life| self.age >= life)
    }
}

// ============================================================================
// Log capture
// ============================================================================

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a scoped fmt subscriber and return what it logged.
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}
