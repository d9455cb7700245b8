// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Topology description consumed by the mapping builder.
//!
//! [`Topology::its`] returns the built-in detector geometry from
//! [`super::constants`]. Alternative geometries (test benches, future
//! hardware revisions) can be described in JSON and loaded with
//! [`Topology::load`]:
//!
//! ```json
//! {
//!   "tiers": [
//!     { "tier": "Inner", "layout": "dedicated", "chips_per_module": 9,
//!       "modules_per_stave": 1, "cables_per_stave": 9, "staves": 2,
//!       "chip_sw_to_hw": [0,1,2,3,4,5,6,7,8], "chip_hw_to_sw": [0,1,2,3,4,5,6,7,8],
//!       "gbt_header_flag": 32 },
//!     ...
//!   ],
//!   "layers": [ { "tier": "Inner", "staves": 2 }, ... ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::constants::{
    CABLES_PER_STAVE, CHIPS_PER_MODULE, CONNECTORS_PER_STAVE, GBT_HEADER_FLAG,
    MAX_CABLES_PER_STAVE, MAX_MODULES_PER_HALF_STAVE, MODULES_PER_STAVE, MODULE_CHIP_HW_TO_SW,
    MODULE_CHIP_SW_TO_HW, NLAYERS, NTIERS, STAVES_PER_LAYER, STAVES_PER_TIER, TIER_OF_LAYER,
    UNASSIGNED,
};
use super::tier::{CableLayout, Tier};
use crate::error::{MappingError, Result};

/// Constant wiring parameters of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTopology {
    pub tier: Tier,
    pub layout: CableLayout,
    pub chips_per_module: u8,
    pub modules_per_stave: u8,
    pub cables_per_stave: u8,
    /// Declared number of staves of this tier in the whole detector.
    pub staves: u16,
    /// Chip position on a module, SW sequential order to HW chip id.
    pub chip_sw_to_hw: Vec<u8>,
    /// Inverse of `chip_sw_to_hw`; unused HW ids hold [`UNASSIGNED`].
    pub chip_hw_to_sw: Vec<u8>,
    pub gbt_header_flag: u8,
}

impl TierTopology {
    /// Built-in constants for one tier of the ITS.
    pub fn its(tier: Tier) -> Self {
        let t = tier.as_usize();
        let (layout, chip_sw_to_hw, chip_hw_to_sw) = match tier {
            Tier::Inner => {
                let identity: Vec<u8> = (0..CHIPS_PER_MODULE[t]).collect();
                (CableLayout::Dedicated, identity.clone(), identity)
            }
            Tier::Middle | Tier::Outer => (
                CableLayout::Shared,
                MODULE_CHIP_SW_TO_HW.to_vec(),
                MODULE_CHIP_HW_TO_SW.to_vec(),
            ),
        };
        Self {
            tier,
            layout,
            chips_per_module: CHIPS_PER_MODULE[t],
            modules_per_stave: MODULES_PER_STAVE[t],
            cables_per_stave: CABLES_PER_STAVE[t],
            staves: STAVES_PER_TIER[t],
            chip_sw_to_hw,
            chip_hw_to_sw,
            gbt_header_flag: GBT_HEADER_FLAG[t],
        }
    }

    #[inline]
    pub fn chips_per_stave(&self) -> usize {
        self.chips_per_module as usize * self.modules_per_stave as usize
    }

    /// Modules on each half-stave (the whole stave for the dedicated layout).
    #[inline]
    pub fn modules_per_half_stave(&self) -> u8 {
        match self.layout {
            CableLayout::Dedicated => self.modules_per_stave,
            CableLayout::Shared => self.modules_per_stave / 2,
        }
    }

    #[inline]
    pub fn chips_per_cable(&self) -> usize {
        self.chips_per_stave() / self.cables_per_stave as usize
    }

    /// Check that the constants describe a buildable stave.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| MappingError::InvalidTier {
            tier: self.tier,
            reason,
        };
        let cpm = self.chips_per_module as usize;
        let mps = self.modules_per_stave as usize;

        if cpm == 0 || mps == 0 {
            return Err(invalid(format!(
                "empty stave ({cpm} chips/module, {mps} modules/stave)"
            )));
        }
        if self.chips_per_stave() >= UNASSIGNED as usize {
            return Err(invalid(format!(
                "{} chips per stave exceed the 8-bit chip id range",
                self.chips_per_stave()
            )));
        }
        self.validate_permutation()?;
        if !self.gbt_header_flag.is_power_of_two()
            || (self.gbt_header_flag as usize) < MAX_CABLES_PER_STAVE
        {
            return Err(invalid(format!(
                "GBT header flag {:#04x} must be a single bit above the cable field",
                self.gbt_header_flag
            )));
        }

        match self.layout {
            CableLayout::Dedicated => {
                if mps != 1 {
                    return Err(invalid(format!(
                        "dedicated cabling needs exactly one module per stave, got {mps}"
                    )));
                }
                if cpm > MAX_CABLES_PER_STAVE {
                    return Err(invalid(format!(
                        "{cpm} dedicated cables exceed the {MAX_CABLES_PER_STAVE}-cable stave mask"
                    )));
                }
                if self.cables_per_stave as usize != cpm {
                    return Err(invalid(format!(
                        "dedicated cabling needs one cable per chip: {} cables for {cpm} chips",
                        self.cables_per_stave
                    )));
                }
                // HW chip id is the cable id on a dedicated stave
                let identity = self.chip_hw_to_sw.len() == cpm
                    && self
                        .chip_sw_to_hw
                        .iter()
                        .enumerate()
                        .all(|(sw, &hw)| hw as usize == sw);
                if !identity {
                    return Err(invalid(
                        "dedicated cabling needs the identity chip permutation".into(),
                    ));
                }
            }
            CableLayout::Shared => {
                if cpm % 2 != 0 || mps % 2 != 0 {
                    return Err(invalid(format!(
                        "shared cabling splits modules and staves in halves: {cpm} chips/module, {mps} modules/stave"
                    )));
                }
                if mps / 2 > MAX_MODULES_PER_HALF_STAVE {
                    return Err(invalid(format!(
                        "{} modules per half-stave do not fit the {MAX_MODULES_PER_HALF_STAVE}-module cable field",
                        mps / 2
                    )));
                }
                let expected = CONNECTORS_PER_STAVE * mps / 2;
                if self.cables_per_stave as usize != expected {
                    return Err(invalid(format!(
                        "{} cables per stave, shared cabling wires {expected}",
                        self.cables_per_stave
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_permutation(&self) -> Result<()> {
        let invalid = |reason: String| MappingError::InvalidTier {
            tier: self.tier,
            reason,
        };
        let cpm = self.chips_per_module as usize;
        if self.chip_sw_to_hw.len() != cpm {
            return Err(invalid(format!(
                "chip SW->HW table has {} entries for {cpm} chips per module",
                self.chip_sw_to_hw.len()
            )));
        }
        for (sw, &hw) in self.chip_sw_to_hw.iter().enumerate() {
            if self.chip_hw_to_sw.get(hw as usize).copied() != Some(sw as u8) {
                return Err(invalid(format!(
                    "chip SW->HW maps {sw} to {hw}, which the HW->SW table does not map back"
                )));
            }
        }
        for (hw, &sw) in self.chip_hw_to_sw.iter().enumerate() {
            if sw == UNASSIGNED {
                continue;
            }
            if self.chip_sw_to_hw.get(sw as usize).copied() != Some(hw as u8) {
                return Err(invalid(format!(
                    "chip HW->SW maps {hw} to {sw}, which the SW->HW table does not map back"
                )));
            }
        }
        Ok(())
    }
}

/// One detector layer: how many staves, of which tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTopology {
    pub tier: Tier,
    pub staves: u16,
}

/// Complete wiring description of a detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// One entry per tier, in [`Tier::ALL`] order.
    pub tiers: [TierTopology; NTIERS],
    /// Layers, innermost first.
    pub layers: Vec<LayerTopology>,
    /// HW readout unit id of every stave in SW order. `None` means HW == SW.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ru_hw_ids: Option<Vec<u16>>,
}

impl Topology {
    /// The ALICE ITS geometry.
    pub fn its() -> Self {
        Self {
            tiers: Tier::ALL.map(TierTopology::its),
            layers: (0..NLAYERS)
                .map(|layer| LayerTopology {
                    tier: TIER_OF_LAYER[layer],
                    staves: STAVES_PER_LAYER[layer],
                })
                .collect(),
            ru_hw_ids: None,
        }
    }

    /// Parse a topology from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let topology: Topology = serde_json::from_str(json)?;
        topology.validate()?;
        Ok(topology)
    }

    /// Read a JSON topology file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded topology file");
        Self::from_json(&json)
    }

    /// Constants of the given tier.
    #[inline]
    pub fn tier(&self, tier: Tier) -> &TierTopology {
        &self.tiers[tier.as_usize()]
    }

    /// Sum of the per-tier declared stave counts.
    pub fn declared_staves(&self) -> usize {
        self.tiers.iter().map(|t| t.staves as usize).sum()
    }

    /// Structural checks that do not need the builder.
    pub fn validate(&self) -> Result<()> {
        for (index, (tier, expected)) in self.tiers.iter().zip(Tier::ALL).enumerate() {
            if tier.tier != expected {
                return Err(MappingError::TierOrder {
                    index,
                    expected,
                    found: tier.tier,
                });
            }
            tier.validate()?;
        }
        if self.layers.is_empty() {
            return Err(MappingError::InvalidLayers("no layers".into()));
        }
        if let Some(layer) = self.layers.iter().position(|l| l.staves == 0) {
            return Err(MappingError::InvalidLayers(format!(
                "layer {layer} has no staves"
            )));
        }
        if self.layers.len() > u8::MAX as usize {
            return Err(MappingError::InvalidLayers(format!(
                "{} layers exceed the layer id range",
                self.layers.len()
            )));
        }
        Ok(())
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::its()
    }
}
