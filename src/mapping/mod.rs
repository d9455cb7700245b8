// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The chip mapping engine: immutable HW <-> SW lookup tables.
//!
//! A [`ChipMapping`] is built once from a [`Topology`] and then only read. It
//! holds no interior mutability, so one instance can be shared by reference
//! (or through an `Arc`) between any number of decoder threads.
//!
//! # Query discipline
//!
//! - HW addresses come from the raw data stream and may be unwired or
//!   corrupted: HW lookups return `Option` and never panic.
//! - SW ids come from the caller's own bookkeeping: an out-of-range SW id is
//!   a bug and panics. `try_` variants exist for callers that want to check.
//!
//! # Example
//!
//! ```
//! use chip_mapping::{ChipMapping, Tier};
//!
//! let mapping = ChipMapping::its().unwrap();
//! assert_eq!(mapping.n_chips(), 24120);
//! assert_eq!(mapping.cable_sw_from_hw(Tier::Outer, 1), Some(1));
//! assert_eq!(mapping.cable_sw_from_hw(Tier::Outer, 7), None);
//! assert_eq!(mapping.ru_sw_from_hw(191), Some(191));
//! ```

mod decode;
mod report;

pub use decode::ChipLocation;

use std::ops::Range;

use crate::error::Result;
use crate::memo::{ChipRecord, ChipsMemo, StaveRecord, StavesMemo};
use crate::topology::{Tier, Topology};

/// Bidirectional HW/SW address tables for a whole detector.
#[derive(Debug, Clone)]
pub struct ChipMapping {
    /// Per-tier chip templates and cable tables, indexed by [`Tier::as_usize`].
    tiers: Vec<ChipsMemo>,
    staves: StavesMemo,
}

impl ChipMapping {
    /// Build all lookup tables for the given topology.
    ///
    /// Any inconsistency in the topology aborts construction; no partially
    /// built mapping is ever returned.
    pub fn new(topology: &Topology) -> Result<Self> {
        tracing::info!(
            layers = topology.layers.len(),
            declared_staves = topology.declared_staves(),
            "building chip mapping"
        );
        topology.validate()?;

        let tiers = topology
            .tiers
            .iter()
            .map(ChipsMemo::initialize)
            .collect::<Result<Vec<_>>>()?;
        let staves = StavesMemo::initialize(topology)?;

        tracing::info!(
            chips = staves.n_chips(),
            staves = staves.staves().len(),
            "chip mapping ready"
        );
        Ok(Self { tiers, staves })
    }

    /// Mapping of the built-in ITS geometry.
    pub fn its() -> Result<Self> {
        Self::new(&Topology::its())
    }

    // Sizes

    /// Total number of chips in the detector.
    #[inline]
    pub fn n_chips(&self) -> usize {
        self.staves.n_chips()
    }

    /// Total number of staves (readout units).
    #[inline]
    pub fn n_staves(&self) -> usize {
        self.staves.staves().len()
    }

    #[inline]
    pub fn n_layers(&self) -> usize {
        self.staves.n_layers()
    }

    /// Chip templates and cable tables of one tier.
    #[inline]
    pub fn tier(&self, tier: Tier) -> &ChipsMemo {
        &self.tiers[tier.as_usize()]
    }

    #[inline]
    pub fn chips_per_stave(&self, tier: Tier) -> usize {
        self.tier(tier).chips_per_stave()
    }

    #[inline]
    pub fn chips_per_cable(&self, tier: Tier) -> usize {
        self.tier(tier).chips_per_cable()
    }

    #[inline]
    pub fn n_cables(&self, tier: Tier) -> u8 {
        self.tier(tier).n_cables()
    }

    /// Number of chips of the given tier in the whole detector.
    #[inline]
    pub fn n_chips_on_tier(&self, tier: Tier) -> usize {
        self.staves.n_chips_on_tier(tier)
    }

    #[inline]
    pub fn n_staves_on_tier(&self, tier: Tier) -> usize {
        self.staves.n_staves_on_tier(tier)
    }

    /// Bitmask of the HW cable addresses wired on a stave of the given tier.
    #[inline]
    pub fn cables_on_stave(&self, tier: Tier) -> u32 {
        self.tier(tier).cables_on_stave()
    }

    // Chip queries

    /// Coordinates of a chip, by global SW chip id.
    ///
    /// # Panics
    ///
    /// Panics if `chip_sw >= n_chips()`.
    pub fn chip_info(&self, chip_sw: u32) -> &ChipRecord {
        match self.try_chip_info(chip_sw) {
            Some(record) => record,
            None => panic!(
                "SW chip id out of range: {} (detector has {} chips)",
                chip_sw,
                self.n_chips()
            ),
        }
    }

    /// Coordinates of a chip, or None if the SW chip id is out of range.
    pub fn try_chip_info(&self, chip_sw: u32) -> Option<&ChipRecord> {
        let stave = self.staves.stave_of_chip(chip_sw)?;
        self.tier(stave.tier)
            .record((chip_sw - stave.first_chip_id_sw) as usize)
    }

    // HW -> SW lookups

    /// SW cable number of a HW cable address on a stave of the given tier.
    ///
    /// None means no cable is wired at that address; it is never cable 0.
    #[inline]
    pub fn cable_sw_from_hw(&self, tier: Tier, cable_hw: u8) -> Option<u8> {
        self.tier(tier).cable_sw_from_hw(cable_hw)
    }

    /// HW chip id of the first chip on a cable.
    ///
    /// Only the cables of the first module of each half-stave carry an entry.
    /// The entry is the cable master (chip-on-cable 0), so outer cables 0 and 8
    /// give HW chips 0 and 8. This is not the last chip written for the cable
    /// (6 and 14), which a table overwritten by every chip of the module half
    /// would hold.
    #[inline]
    pub fn first_chip_on_cable_hw(&self, tier: Tier, cable_hw: u8) -> Option<u8> {
        self.tier(tier).first_chip_on_cable_hw(cable_hw)
    }

    /// SW readout unit id of a HW readout unit id.
    #[inline]
    pub fn ru_sw_from_hw(&self, ru_hw: u16) -> Option<u16> {
        self.staves.ru_sw_from_hw(ru_hw)
    }

    /// SW chip-on-module position of a HW chip id.
    #[inline]
    pub fn chip_on_module_sw_from_hw(&self, tier: Tier, chip_on_module_hw: u8) -> Option<u8> {
        self.tier(tier).chip_on_module_sw_from_hw(chip_on_module_hw)
    }

    // Stave queries

    /// All staves, in SW order.
    #[inline]
    pub fn staves(&self) -> &[StaveRecord] {
        self.staves.staves()
    }

    /// Stave record by SW RU id.
    ///
    /// # Panics
    ///
    /// Panics if `ru_sw >= n_staves()`.
    pub fn stave_info(&self, ru_sw: u16) -> &StaveRecord {
        match self.staves.get(ru_sw) {
            Some(stave) => stave,
            None => panic!(
                "SW stave id out of range: {} (detector has {} staves)",
                ru_sw,
                self.n_staves()
            ),
        }
    }

    #[inline]
    pub fn try_stave_info(&self, ru_sw: u16) -> Option<&StaveRecord> {
        self.staves.get(ru_sw)
    }

    /// Stave owning a chip, by global SW chip id.
    ///
    /// # Panics
    ///
    /// Panics if `chip_sw >= n_chips()`.
    pub fn stave_of_chip(&self, chip_sw: u32) -> &StaveRecord {
        match self.staves.stave_of_chip(chip_sw) {
            Some(stave) => stave,
            None => panic!(
                "SW chip id out of range: {} (detector has {} chips)",
                chip_sw,
                self.n_chips()
            ),
        }
    }

    /// SW RU ids of the staves of a layer.
    ///
    /// # Panics
    ///
    /// Panics if `layer >= n_layers()`.
    pub fn staves_in_layer(&self, layer: usize) -> Range<u16> {
        match self.staves.staves_in_layer(layer) {
            Some(range) => range,
            None => panic!(
                "layer out of range: {} (detector has {} layers)",
                layer,
                self.n_layers()
            ),
        }
    }
}
