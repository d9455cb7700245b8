// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Detector construction tiers.
//!
//! Staves come in a small fixed set of flavours. The innermost staves carry a
//! single module whose chips each own a readout cable; the middle and outer
//! staves are built from two half-staves of multi-chip modules whose chips
//! share cables.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, EnumString};

/// A detector construction tier.
///
/// The discriminant doubles as the index into every per-tier table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumCountMacro,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Tier {
    /// Innermost staves: one module, one cable per chip.
    Inner = 0,
    /// Middle staves: two half-staves, cables shared by half a module.
    Middle = 1,
    /// Outermost staves: same wiring as the middle tier, longer staves.
    Outer = 2,
}

impl Tier {
    /// All tiers in SW traversal order.
    pub const ALL: [Tier; 3] = [Tier::Inner, Tier::Middle, Tier::Outer];

    /// Get the tier as a usize (for array indexing).
    #[inline]
    pub fn as_usize(self) -> usize {
        self as usize
    }

    /// Look up a tier by its table index, returning None if out of range.
    pub fn try_from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// How the chips of a stave are wired to readout cables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CableLayout {
    /// Every chip has its own cable and is its own master.
    Dedicated,
    /// Each cable serves half a module; HW addresses pack connector and module.
    Shared,
}
