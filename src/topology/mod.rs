// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Detector topology: the constant wiring facts the mapping is built from.
//!
//! - Tier: construction class of a stave (Inner/Middle/Outer)
//! - CableLayout: dedicated or shared readout cables
//! - constants: built-in ITS geometry and HW address packing
//! - Topology: the runtime description handed to the builder

pub mod config;
pub mod constants;
pub mod tier;

// Re-export for convenience
pub use config::{LayerTopology, TierTopology, Topology};
pub use constants::{UNASSIGNED, UNASSIGNED_RU};
pub use tier::{CableLayout, Tier};
