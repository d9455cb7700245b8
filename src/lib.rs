// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! HW <-> SW address mapping for a staved silicon pixel detector.
//!
//! The detector is built from layers of staves; each stave holds modules of
//! sensor chips read out over cables. Raw readout data addresses chips by
//! sparse, bit-packed HW ids (readout unit, cable, chip id on module), while
//! all downstream code works on dense sequential SW ids. This crate builds,
//! once, the lookup tables translating between the two.
//!
//! # Architecture
//!
//! ## Topology
//!
//! Constant wiring facts per tier (chips per module, modules and cables per
//! stave, the chip-on-module HW/SW permutation) and per layer (tier and stave
//! count). [`Topology::its`] gives the built-in ITS geometry.
//!
//! ## MEMO Data (Immutable)
//!
//! Computed in two passes from the topology:
//! 1. **Chips**: one stave's worth of chip records per tier, plus per-tier
//!    HW cable -> SW cable / first chip / module tables
//! 2. **Staves**: readout unit records in SW order, global chip numbering and
//!    the HW -> SW readout unit table
//!
//! ## Query API
//!
//! [`ChipMapping`] owns the MEMO data and answers O(1) queries. Lookups of HW
//! addresses return `None` for unwired addresses; out-of-range SW ids panic.
//! Construction errors are reported as [`MappingError`] and never leave a
//! partially built mapping behind.
//!
//! # Sharing
//!
//! The mapping is immutable after construction and `Send + Sync`: build it
//! once and hand `&ChipMapping` (or an `Arc`) to every decoder thread.

pub mod error;
pub mod mapping;
pub mod memo;
pub mod topology;

// Re-export commonly used types
pub use error::{MappingError, Result};
pub use mapping::{ChipLocation, ChipMapping};
pub use memo::{ChipRecord, StaveRecord};
pub use topology::{CableLayout, Tier, Topology, UNASSIGNED, UNASSIGNED_RU};
