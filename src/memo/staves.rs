// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Pass 2: stave (readout unit) records and the global RU lookup table.
//!
//! Staves are numbered in SW by walking layers innermost first and the staves
//! of each layer in order, with one counter for the whole detector. Each stave
//! owns a contiguous range of global SW chip ids starting at
//! `first_chip_id_sw`.
//!
//! The HW readout unit id currently equals the SW id unless the topology
//! lists explicit HW ids. Either way the RU table is sized to the largest HW
//! id and every hole holds [`UNASSIGNED_RU`].

use std::fmt;
use std::ops::Range;

use crate::error::{MappingError, Result};
use crate::topology::constants::NTIERS;
use crate::topology::{Tier, Topology, UNASSIGNED_RU};

/// One stave / readout unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaveRecord {
    pub id_sw: u16,
    pub id_hw: u16,
    pub layer: u8,
    pub tier: Tier,
    pub n_cables: u8,
    /// Number of chips on the stave.
    pub n_chips: u16,
    /// Global SW id of the first chip on the stave.
    pub first_chip_id_sw: u32,
}

impl StaveRecord {
    /// Global SW chip ids of this stave.
    #[inline]
    pub fn chip_range(&self) -> Range<u32> {
        self.first_chip_id_sw..self.first_chip_id_sw + self.n_chips as u32
    }
}

impl fmt::Display for StaveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RU SW {:3} HW {:3} | layer {} | {:6} | {:2} cables | chips {:5}..{:5}",
            self.id_sw,
            self.id_hw,
            self.layer,
            self.tier,
            self.n_cables,
            self.first_chip_id_sw,
            self.first_chip_id_sw + self.n_chips as u32
        )
    }
}

/// Stave records and detector-wide lookup tables.
#[derive(Debug, Clone)]
pub struct StavesMemo {
    /// Indexed by SW stave id.
    staves: Vec<StaveRecord>,
    /// HW RU id to SW RU id.
    ru_hw2sw: Vec<u16>,
    /// Global SW chip id to SW stave id.
    chip_to_stave: Vec<u16>,
    /// First SW stave id of each layer, plus one past the last stave.
    layer_first_stave: Vec<u16>,
    tier_staves: [usize; NTIERS],
    tier_chips: [usize; NTIERS],
}

impl StavesMemo {
    /// Number every stave and build the RU table.
    ///
    /// Fails if the layer table disagrees with the declared per-tier stave
    /// counts, or if the HW ids are not injective or do not fit the table.
    #[tracing::instrument(skip_all, fields(layers = topology.layers.len()))]
    pub fn initialize(topology: &Topology) -> Result<Self> {
        let built: usize = topology.layers.iter().map(|l| l.staves as usize).sum();
        if built >= UNASSIGNED_RU as usize {
            return Err(MappingError::TooManyStaves { count: built });
        }
        if let Some(ids) = &topology.ru_hw_ids {
            if ids.len() != built {
                return Err(MappingError::RuHwCount {
                    given: ids.len(),
                    staves: built,
                });
            }
        }

        let mut staves = Vec::with_capacity(built);
        let mut chip_to_stave = Vec::new();
        let mut layer_first_stave = Vec::with_capacity(topology.layers.len() + 1);
        let mut tier_staves = [0usize; NTIERS];
        let mut tier_chips = [0usize; NTIERS];
        let mut max_hw = 0u32;
        let mut chip_count = 0u32;

        for (layer, layer_topology) in topology.layers.iter().enumerate() {
            let tier = topology.tier(layer_topology.tier);
            let n_chips = tier.chips_per_stave();
            layer_first_stave.push(staves.len() as u16);

            for _ in 0..layer_topology.staves {
                let id_sw = staves.len() as u16;
                let id_hw = match &topology.ru_hw_ids {
                    Some(ids) => ids[id_sw as usize],
                    None => id_sw,
                };
                max_hw = max_hw.max(id_hw as u32);

                staves.push(StaveRecord {
                    id_sw,
                    id_hw,
                    layer: layer as u8,
                    tier: tier.tier,
                    n_cables: tier.cables_per_stave,
                    n_chips: n_chips as u16,
                    first_chip_id_sw: chip_count,
                });
                chip_to_stave.extend(std::iter::repeat(id_sw).take(n_chips));
                chip_count += n_chips as u32;
                tier_staves[tier.tier.as_usize()] += 1;
                tier_chips[tier.tier.as_usize()] += n_chips;
            }
            tracing::debug!(
                layer,
                tier = %tier.tier,
                staves = layer_topology.staves,
                "numbered layer"
            );
        }
        layer_first_stave.push(staves.len() as u16);

        let declared = topology.declared_staves();
        if staves.len() != declared {
            return Err(MappingError::StaveCountMismatch {
                built: staves.len(),
                declared,
            });
        }
        for tier in Tier::ALL {
            let declared = topology.tier(tier).staves as usize;
            if tier_staves[tier.as_usize()] != declared {
                return Err(MappingError::TierStaveCountMismatch {
                    tier,
                    built: tier_staves[tier.as_usize()],
                    declared,
                });
            }
        }

        if max_hw >= UNASSIGNED_RU as u32 {
            return Err(MappingError::RuHwOverflow {
                max_hw,
                limit: UNASSIGNED_RU as u32,
            });
        }
        let mut ru_hw2sw = vec![UNASSIGNED_RU; max_hw as usize + 1];
        for stave in &staves {
            let slot = &mut ru_hw2sw[stave.id_hw as usize];
            if *slot != UNASSIGNED_RU {
                return Err(MappingError::DuplicateRuHw {
                    id_hw: stave.id_hw,
                    first: *slot,
                    second: stave.id_sw,
                });
            }
            *slot = stave.id_sw;
        }

        Ok(Self {
            staves,
            ru_hw2sw,
            chip_to_stave,
            layer_first_stave,
            tier_staves,
            tier_chips,
        })
    }

    #[inline]
    pub fn staves(&self) -> &[StaveRecord] {
        &self.staves
    }

    #[inline]
    pub fn get(&self, ru_sw: u16) -> Option<&StaveRecord> {
        self.staves.get(ru_sw as usize)
    }

    #[inline]
    pub fn n_chips(&self) -> usize {
        self.chip_to_stave.len()
    }

    #[inline]
    pub fn n_layers(&self) -> usize {
        self.layer_first_stave.len() - 1
    }

    /// SW stave owning a global SW chip id.
    #[inline]
    pub fn stave_of_chip(&self, chip_sw: u32) -> Option<&StaveRecord> {
        let ru_sw = *self.chip_to_stave.get(chip_sw as usize)?;
        self.staves.get(ru_sw as usize)
    }

    /// SW RU id of a HW RU id, or None if no stave carries that address.
    #[inline]
    pub fn ru_sw_from_hw(&self, ru_hw: u16) -> Option<u16> {
        self.ru_hw2sw
            .get(ru_hw as usize)
            .copied()
            .filter(|&sw| sw != UNASSIGNED_RU)
    }

    /// SW stave ids of a layer.
    pub fn staves_in_layer(&self, layer: usize) -> Option<Range<u16>> {
        if layer >= self.n_layers() {
            return None;
        }
        Some(self.layer_first_stave[layer]..self.layer_first_stave[layer + 1])
    }

    #[inline]
    pub fn n_staves_on_tier(&self, tier: Tier) -> usize {
        self.tier_staves[tier.as_usize()]
    }

    #[inline]
    pub fn n_chips_on_tier(&self, tier: Tier) -> usize {
        self.tier_chips[tier.as_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::constants::{NCHIPS, NSTAVES};

    #[test]
    fn test_its_staves() {
        let memo = StavesMemo::initialize(&Topology::its()).unwrap();
        assert_eq!(memo.staves().len(), NSTAVES);
        assert_eq!(memo.n_chips(), NCHIPS);
        assert_eq!(memo.n_layers(), 7);
        assert_eq!(memo.staves_in_layer(0), Some(0..12));
        assert_eq!(memo.staves_in_layer(6), Some(144..192));
        assert_eq!(memo.staves_in_layer(7), None);
        assert_eq!(memo.n_staves_on_tier(Tier::Middle), 54);
        assert_eq!(memo.n_chips_on_tier(Tier::Outer), 90 * 196);
    }

    #[test]
    fn test_first_chip_ids_are_contiguous() {
        let memo = StavesMemo::initialize(&Topology::its()).unwrap();
        let staves = memo.staves();
        assert_eq!(staves[0].first_chip_id_sw, 0);
        for pair in staves.windows(2) {
            assert_eq!(pair[1].id_sw, pair[0].id_sw + 1);
            assert_eq!(pair[1].first_chip_id_sw, pair[0].chip_range().end);
        }
        // first middle stave comes after 48 inner staves of 9 chips
        assert_eq!(staves[48].tier, Tier::Middle);
        assert_eq!(staves[48].first_chip_id_sw, 432);
        assert_eq!(staves[48].layer, 3);
    }

    #[test]
    fn test_stave_of_chip() {
        let memo = StavesMemo::initialize(&Topology::its()).unwrap();
        assert_eq!(memo.stave_of_chip(0).unwrap().id_sw, 0);
        assert_eq!(memo.stave_of_chip(8).unwrap().id_sw, 0);
        assert_eq!(memo.stave_of_chip(9).unwrap().id_sw, 1);
        assert_eq!(memo.stave_of_chip(432).unwrap().id_sw, 48);
        assert_eq!(memo.stave_of_chip(NCHIPS as u32 - 1).unwrap().id_sw, 191);
        assert!(memo.stave_of_chip(NCHIPS as u32).is_none());
    }

    #[test]
    fn test_identity_ru_table() {
        let memo = StavesMemo::initialize(&Topology::its()).unwrap();
        for id in 0..NSTAVES as u16 {
            assert_eq!(memo.ru_sw_from_hw(id), Some(id));
        }
        assert_eq!(memo.ru_sw_from_hw(NSTAVES as u16), None);
        assert_eq!(memo.ru_sw_from_hw(UNASSIGNED_RU), None);
    }

    #[test]
    fn test_layer_table_disagreeing_with_declared_count() {
        let mut topology = Topology::its();
        topology.layers[6].staves += 1;
        assert!(matches!(
            StavesMemo::initialize(&topology),
            Err(MappingError::StaveCountMismatch {
                built: 193,
                declared: 192
            })
        ));
    }

    #[test]
    fn test_staves_moved_between_tiers() {
        let mut topology = Topology::its();
        topology.layers[4].staves -= 2;
        topology.layers[5].staves += 2;
        assert!(matches!(
            StavesMemo::initialize(&topology),
            Err(MappingError::TierStaveCountMismatch {
                tier: Tier::Middle,
                built: 52,
                declared: 54
            })
        ));
    }

    #[test]
    fn test_explicit_hw_ids() {
        let mut topology = Topology::its();
        // RU HW ids reversed and shifted: 0x100 + (191 - sw)
        topology.ru_hw_ids = Some((0..NSTAVES as u16).rev().map(|sw| 0x100 + sw).collect());
        let memo = StavesMemo::initialize(&topology).unwrap();
        assert_eq!(memo.get(0).unwrap().id_hw, 0x100 + 191);
        assert_eq!(memo.ru_sw_from_hw(0x100 + 191), Some(0));
        assert_eq!(memo.ru_sw_from_hw(0x100), Some(191));
        assert_eq!(memo.ru_sw_from_hw(0), None);
        assert_eq!(memo.ru_sw_from_hw(0xff), None);
    }

    #[test]
    fn test_duplicate_hw_ids() {
        let mut topology = Topology::its();
        let mut ids: Vec<u16> = (0..NSTAVES as u16).collect();
        ids[10] = 3;
        topology.ru_hw_ids = Some(ids);
        assert!(matches!(
            StavesMemo::initialize(&topology),
            Err(MappingError::DuplicateRuHw {
                id_hw: 3,
                first: 3,
                second: 10
            })
        ));
    }

    #[test]
    fn test_hw_id_overflow() {
        let mut topology = Topology::its();
        let mut ids: Vec<u16> = (0..NSTAVES as u16).collect();
        ids[0] = UNASSIGNED_RU;
        topology.ru_hw_ids = Some(ids);
        assert!(matches!(
            StavesMemo::initialize(&topology),
            Err(MappingError::RuHwOverflow { max_hw: 0xffff, .. })
        ));
    }

    #[test]
    fn test_stave_count_reaching_the_sentinel() {
        let mut topology = Topology::its();
        // 144 staves on layers 0..6 plus the last layer reach 0xffff
        topology.layers[6].staves = UNASSIGNED_RU - 144;
        assert!(matches!(
            StavesMemo::initialize(&topology),
            Err(MappingError::TooManyStaves { count: 0xffff })
        ));

        topology.layers[6].staves -= 1;
        assert!(!matches!(
            StavesMemo::initialize(&topology),
            Err(MappingError::TooManyStaves { .. })
        ));
    }

    #[test]
    fn test_hw_id_count_mismatch() {
        let mut topology = Topology::its();
        topology.ru_hw_ids = Some(vec![0, 1, 2]);
        assert!(matches!(
            StavesMemo::initialize(&topology),
            Err(MappingError::RuHwCount {
                given: 3,
                staves: 192
            })
        ));
    }
}
