// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Compile-time constants for the ALICE ITS geometry and HW address packing.
//!
//! The per-tier arrays are indexed by [`Tier::as_usize`]. Everything derived
//! from them (chips per stave, total chip count, ...) is computed by `const fn`
//! so that an inconsistent edit fails the build rather than the decoder.
//!
//! # Geometry
//!
//! | tier   | layers | staves | modules/stave | chips/module | cables/stave |
//! |--------|--------|--------|---------------|--------------|--------------|
//! | Inner  | 0-2    | 48     | 1             | 9            | 9            |
//! | Middle | 3-4    | 54     | 8             | 14           | 16           |
//! | Outer  | 5-6    | 90     | 14            | 14           | 28           |
//!
//! For a total of 192 staves and 24120 chips.

use super::tier::Tier;

/// Number of construction tiers.
pub const NTIERS: usize = 3;

/// Number of detector layers.
pub const NLAYERS: usize = 7;

/// Table value meaning "no chip/cable is wired to this HW address".
pub const UNASSIGNED: u8 = 0xff;

/// Table value meaning "no readout unit is wired to this HW address".
pub const UNASSIGNED_RU: u16 = 0xffff;

/// Size of a per-tier cable lookup table: the whole 8-bit HW cable space.
pub const CABLE_HW_SPACE: usize = 1 << 8;

/// Width of the module field in a shared-layout HW cable address.
///
/// `cable_hw = (connector << CABLE_MODULE_BITS) + (module_hw - 1)`. This is a
/// property of the readout firmware, not of the geometry.
pub const CABLE_MODULE_BITS: u32 = 3;

/// Largest number of modules a half-stave can have with the packing above.
pub const MAX_MODULES_PER_HALF_STAVE: usize = 1 << CABLE_MODULE_BITS;

/// Width of the per-stave cable bitmask; HW cable addresses stay below it.
///
/// GBT lane header flags sit on a bit at or above this width.
pub const MAX_CABLES_PER_STAVE: usize = 32;

/// Number of connectors per stave in the shared layout (2 half-staves x 2 module halves).
pub const CONNECTORS_PER_STAVE: usize = 4;

/// Staves per layer, innermost layer first.
pub const STAVES_PER_LAYER: [u16; NLAYERS] = [12, 16, 20, 24, 30, 42, 48];

/// Tier used by each layer.
pub const TIER_OF_LAYER: [Tier; NLAYERS] = [
    Tier::Inner,
    Tier::Inner,
    Tier::Inner,
    Tier::Middle,
    Tier::Middle,
    Tier::Outer,
    Tier::Outer,
];

pub const CHIPS_PER_MODULE: [u8; NTIERS] = [9, 14, 14];

pub const MODULES_PER_STAVE: [u8; NTIERS] = [1, 8, 14];

pub const CABLES_PER_STAVE: [u8; NTIERS] = [9, 16, 28];

/// Declared stave count per tier, kept independently of [`STAVES_PER_LAYER`]
/// so that the builder can cross-check the two.
pub const STAVES_PER_TIER: [u16; NTIERS] = [48, 54, 90];

/// Header flag OR-ed into the cable id of a GBT lane header.
pub const GBT_HEADER_FLAG: [u8; NTIERS] = [0x1 << 5, 0x1 << 6, 0x1 << 6];

/// Chip position on a middle/outer module: SW sequential order to HW chip id.
///
/// HW ids 0..6 sit on the master side, 8..14 on the slave side; 7 is unused.
pub const MODULE_CHIP_SW_TO_HW: [u8; 14] = [0, 1, 2, 3, 4, 5, 6, 8, 9, 10, 11, 12, 13, 14];

/// Inverse of [`MODULE_CHIP_SW_TO_HW`].
pub const MODULE_CHIP_HW_TO_SW: [u8; 15] = [
    0, 1, 2, 3, 4, 5, 6, UNASSIGNED, 7, 8, 9, 10, 11, 12, 13,
];

/// Chips on one stave of the given tier.
pub const fn chips_per_stave(tier: Tier) -> usize {
    let t = tier as usize;
    CHIPS_PER_MODULE[t] as usize * MODULES_PER_STAVE[t] as usize
}

/// Total number of staves (readout units), summed over layers.
pub const fn total_staves() -> usize {
    let mut total = 0;
    let mut layer = 0;
    while layer < NLAYERS {
        total += STAVES_PER_LAYER[layer] as usize;
        layer += 1;
    }
    total
}

/// Total number of chips in the detector.
pub const fn total_chips() -> usize {
    let mut total = 0;
    let mut layer = 0;
    while layer < NLAYERS {
        total += STAVES_PER_LAYER[layer] as usize * chips_per_stave(TIER_OF_LAYER[layer]);
        layer += 1;
    }
    total
}

const fn declared_staves() -> usize {
    let mut total = 0;
    let mut t = 0;
    while t < NTIERS {
        total += STAVES_PER_TIER[t] as usize;
        t += 1;
    }
    total
}

/// Number of chips sharing one cable on a stave of the given tier.
pub const fn chips_per_cable(tier: Tier) -> usize {
    chips_per_stave(tier) / CABLES_PER_STAVE[tier as usize] as usize
}

pub const NSTAVES: usize = total_staves();

pub const NCHIPS: usize = total_chips();

const _: () = assert!(
    declared_staves() == NSTAVES,
    "per-tier stave counts disagree with staves per layer"
);

const _: () = assert!(
    (((CONNECTORS_PER_STAVE - 1) << CABLE_MODULE_BITS) | (MAX_MODULES_PER_HALF_STAVE - 1))
        < MAX_CABLES_PER_STAVE,
    "shared cable addresses overflow the cable bitmask"
);

const _: () = assert!(NSTAVES < UNASSIGNED_RU as usize, "RU ids must stay below the sentinel");

const _: () = assert!(
    MODULES_PER_STAVE[Tier::Outer as usize] as usize / 2 <= MAX_MODULES_PER_HALF_STAVE,
    "outer half-stave does not fit the cable module field"
);
