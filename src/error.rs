// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Construction-time errors.
//!
//! Every variant means the topology handed to [`crate::ChipMapping::new`] is
//! inconsistent, and no engine is built. Lookups of unassigned HW addresses
//! are not errors; they return `None`.

use std::path::PathBuf;

use crate::topology::Tier;

/// Result type for topology loading and mapping construction.
pub type Result<T> = std::result::Result<T, MappingError>;

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Tier tables must be listed in traversal order.
    #[error("tier table {index} describes the {found} tier, expected {expected}")]
    TierOrder {
        index: usize,
        expected: Tier,
        found: Tier,
    },

    /// A tier's constants cannot describe a stave.
    #[error("{tier} tier: {reason}")]
    InvalidTier { tier: Tier, reason: String },

    /// The topology has no layers, or a layer without staves.
    #[error("invalid layer table: {0}")]
    InvalidLayers(String),

    /// Pass 1 wired a different number of cables than the tier declares.
    #[error("{tier} tier: wired {built} distinct cables, expected {declared}")]
    CableCountMismatch {
        tier: Tier,
        built: usize,
        declared: usize,
    },

    /// Two chips of one stave claim the same HW address.
    #[error("{tier} tier: cable {cable_hw} chip {chip_on_module_hw} wired twice")]
    DuplicateChipAddress {
        tier: Tier,
        cable_hw: u8,
        chip_on_module_hw: u8,
    },

    /// The layer table produced a different number of staves for a tier than declared.
    #[error("{tier} tier: built {built} staves, topology declares {declared}")]
    TierStaveCountMismatch {
        tier: Tier,
        built: usize,
        declared: usize,
    },

    /// The layer table produced a different total number of staves than declared.
    #[error("built {built} staves, topology declares {declared}")]
    StaveCountMismatch { built: usize, declared: usize },

    /// Explicit RU HW ids were supplied but do not cover every stave.
    #[error("{given} readout unit HW ids supplied for {staves} staves")]
    RuHwCount { given: usize, staves: usize },

    /// Two staves claim the same RU HW id.
    #[error("readout unit HW id {id_hw} assigned to staves {first} and {second}")]
    DuplicateRuHw { id_hw: u16, first: u16, second: u16 },

    /// The largest RU HW id collides with the table sentinel.
    #[error("readout unit HW id {max_hw} does not fit the lookup table (limit {limit})")]
    RuHwOverflow { max_hw: u32, limit: u32 },

    /// More staves than the SW stave id width can count.
    #[error("{count} staves exceed the readout unit id range")]
    TooManyStaves { count: usize },

    #[error("cannot read topology file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed topology: {0}")]
    Parse(#[from] serde_json::Error),
}
