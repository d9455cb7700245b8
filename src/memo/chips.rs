// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Pass 1: per-tier chip records and cable lookup tables.
//!
//! Every stave of a tier is wired identically, so one template of
//! `chips_per_stave` records per tier describes the whole detector. Alongside
//! the records this pass fills the HW-indexed tables used on the decode path:
//!
//! - `cable_hw2sw[cable_hw]`: dense SW cable number
//! - `first_chip_on_cable_hw[cable_hw]`: HW chip id of the first chip on the cable
//! - `module_sw_by_cable_hw[cable_hw]`: SW module served by the cable
//!
//! All three are sized to the whole 8-bit HW cable space and hold
//! [`UNASSIGNED`] wherever no cable is wired.
//!
//! # Shared cable addressing
//!
//! Middle and outer staves are two half-staves of `mps/2` modules. A module's
//! chips are split in two halves, each half read out over its own cable. The
//! 2-bit connector selects half-stave and module half:
//!
//! ```text
//! connector = (half_stave << 1) | module_half
//! cable_hw  = (connector << 3) | (module_hw - 1)
//! cable_sw  = (module_hw - 1) + connector * (mps / 2)
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::error::{MappingError, Result};
use crate::topology::constants::{CABLE_HW_SPACE, CABLE_MODULE_BITS};
use crate::topology::{CableLayout, Tier, TierTopology, UNASSIGNED};

/// Coordinates of one chip position on a stave, in both numbering schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChipRecord {
    /// Position of the chip on its stave (SW).
    pub id: u8,
    /// Module index within the stave, sequential from 0.
    pub module_sw: u8,
    /// Module index within the half-stave, from 1 (0 on dedicated staves).
    pub module_hw: u8,
    pub chip_on_module_sw: u8,
    pub chip_on_module_hw: u8,
    pub cable_sw: u8,
    pub cable_hw: u8,
    /// Position along the serving cable; 0 is the master chip.
    pub chip_on_cable: u8,
}

impl fmt::Display for ChipRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chip {:3} | module SW {:2} HW {:2} | chip-on-module SW {:2} HW {:2} | cable SW {:2} HW {:2} | chip-on-cable {}",
            self.id,
            self.module_sw,
            self.module_hw,
            self.chip_on_module_sw,
            self.chip_on_module_hw,
            self.cable_sw,
            self.cable_hw,
            self.chip_on_cable
        )
    }
}

/// Pack a connector and a 1-based HW module number into a HW cable address.
#[inline]
pub fn pack_cable_hw(connector: u8, module_hw: u8) -> u8 {
    (connector << CABLE_MODULE_BITS) + (module_hw - 1)
}

/// Split a shared-layout HW cable address into `(connector, module_hw)`.
#[inline]
pub fn unpack_cable_hw(cable_hw: u8) -> (u8, u8) {
    let module_mask = (1u8 << CABLE_MODULE_BITS) - 1;
    (cable_hw >> CABLE_MODULE_BITS, (cable_hw & module_mask) + 1)
}

/// Dense SW number of a shared-layout cable: connector-major, module-minor.
#[inline]
pub fn shared_cable_sw(connector: u8, module_hw: u8, modules_per_half_stave: u8) -> u8 {
    (module_hw - 1) + connector * modules_per_half_stave
}

/// Chip records and cable tables of one tier (Tier 1 MEMO data).
#[derive(Debug, Clone)]
pub struct ChipsMemo {
    pub tier: Tier,
    pub layout: CableLayout,
    chips_per_module: u8,
    modules_per_half_stave: u8,
    n_cables: u8,
    gbt_header_flag: u8,

    /// One record per chip position on a stave, indexed by chip-on-stave.
    records: Vec<ChipRecord>,

    cable_hw2sw: Vec<u8>,
    first_chip_on_cable_hw: Vec<u8>,
    module_sw_by_cable_hw: Vec<u8>,

    /// Chip-on-module HW id to SW position, as supplied by the topology.
    chip_hw_to_sw: Vec<u8>,
}

impl ChipsMemo {
    /// Compute every chip record of a stave of this tier.
    ///
    /// The tier constants are assumed to have passed
    /// [`TierTopology::validate`]. The wiring produced here is cross-checked:
    /// it must use exactly `cables_per_stave` distinct cables numbered
    /// `0..cables_per_stave` in SW, and no two chips may share a
    /// `(cable_hw, chip_on_module_hw)` address.
    #[tracing::instrument(skip_all, fields(tier = %topology.tier))]
    pub fn initialize(topology: &TierTopology) -> Result<Self> {
        let mut memo = Self {
            tier: topology.tier,
            layout: topology.layout,
            chips_per_module: topology.chips_per_module,
            modules_per_half_stave: topology.modules_per_half_stave(),
            n_cables: topology.cables_per_stave,
            gbt_header_flag: topology.gbt_header_flag,
            records: Vec::with_capacity(topology.chips_per_stave()),
            cable_hw2sw: vec![UNASSIGNED; CABLE_HW_SPACE],
            first_chip_on_cable_hw: vec![UNASSIGNED; CABLE_HW_SPACE],
            module_sw_by_cable_hw: vec![UNASSIGNED; CABLE_HW_SPACE],
            chip_hw_to_sw: topology.chip_hw_to_sw.clone(),
        };

        match topology.layout {
            CableLayout::Dedicated => memo.wire_dedicated(topology),
            CableLayout::Shared => memo.wire_shared(topology),
        }
        memo.check_wiring()?;

        tracing::debug!(
            chips = memo.records.len(),
            cables = memo.n_cables,
            "wired {} stave",
            memo.tier
        );
        Ok(memo)
    }

    /// One module, one cable per chip, every chip is its own master.
    fn wire_dedicated(&mut self, topology: &TierTopology) {
        for i in 0..topology.chips_per_stave() as u8 {
            let record = ChipRecord {
                id: i,
                module_sw: 0,
                module_hw: 0,
                chip_on_module_sw: i,
                chip_on_module_hw: i,
                cable_sw: i,
                cable_hw: i,
                chip_on_cable: 0,
            };
            self.cable_hw2sw[i as usize] = i;
            self.first_chip_on_cable_hw[i as usize] = 0;
            self.module_sw_by_cable_hw[i as usize] = 0;
            self.records.push(record);
        }
    }

    fn wire_shared(&mut self, topology: &TierTopology) {
        let cpm = topology.chips_per_module;
        let half_module = cpm / 2;
        let modules_per_half_stave = topology.modules_per_half_stave();
        let chips_per_half_stave = topology.chips_per_stave() / 2;

        for i in 0..topology.chips_per_stave() {
            let id = i as u8;
            let module_sw = id / cpm;
            let module_hw = 1 + module_sw % modules_per_half_stave;
            let chip_on_module_sw = id % cpm;
            let chip_on_module_hw = topology.chip_sw_to_hw[chip_on_module_sw as usize];

            let half_stave = (i / chips_per_half_stave) as u8;
            let module_half = u8::from(chip_on_module_sw >= half_module);
            let connector = (half_stave << 1) + module_half;

            let cable_hw = pack_cable_hw(connector, module_hw);
            let cable_sw = shared_cable_sw(connector, module_hw, modules_per_half_stave);

            self.records.push(ChipRecord {
                id,
                module_sw,
                module_hw,
                chip_on_module_sw,
                chip_on_module_hw,
                cable_sw,
                cable_hw,
                chip_on_cable: chip_on_module_sw % half_module,
            });
            self.cable_hw2sw[cable_hw as usize] = cable_sw;
            self.module_sw_by_cable_hw[cable_hw as usize] = module_sw;
            // HW module numbering restarts from 1 on each half-stave
            if module_hw == 1 && is_cable_master(chip_on_module_sw, half_module) {
                self.first_chip_on_cable_hw[cable_hw as usize] = chip_on_module_hw;
            }
        }
    }

    fn check_wiring(&self) -> Result<()> {
        let mismatch = |built: usize| MappingError::CableCountMismatch {
            tier: self.tier,
            built,
            declared: self.n_cables as usize,
        };

        let wired: Vec<u8> = self
            .cable_hw2sw
            .iter()
            .copied()
            .filter(|&sw| sw != UNASSIGNED)
            .collect();
        if wired.len() != self.n_cables as usize {
            return Err(mismatch(wired.len()));
        }
        let distinct: HashSet<u8> = wired.iter().copied().collect();
        if distinct.len() != wired.len() || wired.iter().any(|&sw| sw >= self.n_cables) {
            return Err(mismatch(distinct.len()));
        }

        let mut addresses = HashSet::with_capacity(self.records.len());
        for record in &self.records {
            if !addresses.insert((record.cable_hw, record.chip_on_module_hw)) {
                return Err(MappingError::DuplicateChipAddress {
                    tier: self.tier,
                    cable_hw: record.cable_hw,
                    chip_on_module_hw: record.chip_on_module_hw,
                });
            }
        }
        Ok(())
    }

    /// All chip records of a stave, in SW order.
    #[inline]
    pub fn records(&self) -> &[ChipRecord] {
        &self.records
    }

    /// Record of the chip at the given position on the stave.
    #[inline]
    pub fn record(&self, chip_on_stave: usize) -> Option<&ChipRecord> {
        self.records.get(chip_on_stave)
    }

    #[inline]
    pub fn chips_per_stave(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn chips_per_module(&self) -> u8 {
        self.chips_per_module
    }

    #[inline]
    pub fn n_cables(&self) -> u8 {
        self.n_cables
    }

    #[inline]
    pub fn chips_per_cable(&self) -> usize {
        self.records.len() / self.n_cables as usize
    }

    #[inline]
    pub fn gbt_header_flag(&self) -> u8 {
        self.gbt_header_flag
    }

    #[inline]
    pub fn modules_per_half_stave(&self) -> u8 {
        self.modules_per_half_stave
    }

    /// SW cable number of a HW cable address, or None if nothing is wired there.
    #[inline]
    pub fn cable_sw_from_hw(&self, cable_hw: u8) -> Option<u8> {
        assigned(self.cable_hw2sw[cable_hw as usize])
    }

    /// HW chip id of the first chip read out over a cable.
    #[inline]
    pub fn first_chip_on_cable_hw(&self, cable_hw: u8) -> Option<u8> {
        assigned(self.first_chip_on_cable_hw[cable_hw as usize])
    }

    /// SW module served by a HW cable.
    #[inline]
    pub fn module_sw_from_cable_hw(&self, cable_hw: u8) -> Option<u8> {
        assigned(self.module_sw_by_cable_hw[cable_hw as usize])
    }

    /// SW chip-on-module position of a HW chip id.
    #[inline]
    pub fn chip_on_module_sw_from_hw(&self, chip_on_module_hw: u8) -> Option<u8> {
        self.chip_hw_to_sw
            .get(chip_on_module_hw as usize)
            .copied()
            .and_then(assigned)
    }

    /// Chip-on-stave position of the chip with the given HW coordinates.
    ///
    /// Returns None unless the chip id exists and is actually read out over
    /// `cable_hw`.
    pub fn chip_on_stave(&self, cable_hw: u8, chip_on_module_hw: u8) -> Option<u8> {
        let module_sw = self.module_sw_from_cable_hw(cable_hw)?;
        let chip_on_module_sw = self.chip_on_module_sw_from_hw(chip_on_module_hw)?;
        let position = module_sw as usize * self.chips_per_module as usize + chip_on_module_sw as usize;
        let record = self.records.get(position)?;
        (record.cable_hw == cable_hw).then_some(record.id)
    }

    /// Bitmask with bit `n` set for every wired HW cable address `n`.
    pub fn cables_on_stave(&self) -> u32 {
        self.cable_hw2sw
            .iter()
            .enumerate()
            .filter(|&(_, &sw)| sw != UNASSIGNED)
            .fold(0u32, |mask, (hw, _)| mask | (1u32 << hw))
    }

    /// HW cable addresses in use, ascending.
    pub fn wired_cables_hw(&self) -> impl Iterator<Item = u8> + '_ {
        self.cable_hw2sw
            .iter()
            .enumerate()
            .filter(|&(_, &sw)| sw != UNASSIGNED)
            .map(|(hw, _)| hw as u8)
    }
}

#[inline]
fn is_cable_master(chip_on_module_sw: u8, half_module: u8) -> bool {
    chip_on_module_sw % half_module == 0
}

#[inline]
fn assigned(value: u8) -> Option<u8> {
    (value != UNASSIGNED).then_some(value)
}
