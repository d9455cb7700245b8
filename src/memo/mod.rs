// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Tier 1: MEMO data (immutable, precomputed).
//!
//! The mapping builder runs in two passes:
//! - chips: per-tier chip records and HW cable lookup tables
//! - staves: stave records, global chip numbering and the RU lookup table
//!
//! Both are computed once from a [`crate::topology::Topology`] and never
//! change afterwards.

pub mod chips;
pub mod staves;

pub use chips::{ChipRecord, ChipsMemo};
pub use staves::{StaveRecord, StavesMemo};
