// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Lookups used while decoding raw readout data.
//!
//! A raw frame identifies a hit chip by the readout unit it arrived on, the
//! GBT lane header (which carries the HW cable id) and the chip id field
//! (HW chip-on-module). These helpers turn that triple into the global SW chip
//! id and back.

use super::ChipMapping;
use crate::memo::{ChipRecord, StaveRecord};
use crate::topology::Tier;

/// A chip resolved to its stave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipLocation<'a> {
    pub stave: &'a StaveRecord,
    pub chip: &'a ChipRecord,
}

impl ChipLocation<'_> {
    /// Global SW chip id.
    #[inline]
    pub fn chip_sw(&self) -> u32 {
        self.stave.first_chip_id_sw + self.chip.id as u32
    }

    /// HW coordinates as they appear in the raw stream: `(ru_hw, cable_hw, chip_on_module_hw)`.
    #[inline]
    pub fn hw_address(&self) -> (u16, u8, u8) {
        (self.stave.id_hw, self.chip.cable_hw, self.chip.chip_on_module_hw)
    }
}

impl ChipMapping {
    /// Resolve a global SW chip id to its stave and chip records.
    ///
    /// # Panics
    ///
    /// Panics if `chip_sw >= n_chips()`.
    pub fn locate_chip(&self, chip_sw: u32) -> ChipLocation<'_> {
        ChipLocation {
            stave: self.stave_of_chip(chip_sw),
            chip: self.chip_info(chip_sw),
        }
    }

    /// Global SW chip id of the chip with the given HW coordinates.
    ///
    /// `ru_sw` is the SW readout unit (see [`ChipMapping::ru_sw_from_hw`]).
    /// Returns None when any part of the address is unwired, or when the chip
    /// is not read out over `cable_hw`.
    pub fn global_chip_id(&self, ru_sw: u16, cable_hw: u8, chip_on_module_hw: u8) -> Option<u32> {
        let stave = self.try_stave_info(ru_sw)?;
        let chip_on_stave = self
            .tier(stave.tier)
            .chip_on_stave(cable_hw, chip_on_module_hw)?;
        Some(stave.first_chip_id_sw + chip_on_stave as u32)
    }

    /// Like [`ChipMapping::global_chip_id`], starting from a HW readout unit id.
    pub fn global_chip_id_from_hw(
        &self,
        ru_hw: u16,
        cable_hw: u8,
        chip_on_module_hw: u8,
    ) -> Option<u32> {
        let ru_sw = self.ru_sw_from_hw(ru_hw)?;
        self.global_chip_id(ru_sw, cable_hw, chip_on_module_hw)
    }

    /// GBT lane header byte announcing data from a HW cable.
    #[inline]
    pub fn gbt_header(&self, tier: Tier, cable_hw: u8) -> u8 {
        self.tier(tier).gbt_header_flag() | cable_hw
    }

    /// HW cable announced by a GBT lane header byte.
    ///
    /// None if the header flag of the tier is missing or the cable is unwired.
    pub fn cable_hw_from_gbt_header(&self, tier: Tier, header: u8) -> Option<u8> {
        let flag = self.tier(tier).gbt_header_flag();
        if header & flag == 0 {
            return None;
        }
        let cable_hw = header & !flag;
        self.cable_sw_from_hw(tier, cable_hw).map(|_| cable_hw)
    }
}
