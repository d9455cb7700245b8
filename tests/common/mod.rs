// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use chip_mapping::topology::{LayerTopology, TierTopology};
use chip_mapping::{Tier, Topology};

/// A small detector: 2 inner, 2 middle and 3 outer staves, with outer staves
/// of `outer_modules` modules (two half-staves of `outer_modules / 2`).
pub fn small_topology(outer_modules: u8) -> Topology {
    let mut outer = TierTopology::its(Tier::Outer);
    outer.modules_per_stave = outer_modules;
    outer.cables_per_stave = 2 * outer_modules;
    outer.staves = 3;

    let mut middle = TierTopology::its(Tier::Middle);
    middle.staves = 2;

    let mut inner = TierTopology::its(Tier::Inner);
    inner.staves = 2;

    Topology {
        tiers: [inner, middle, outer],
        layers: vec![
            LayerTopology {
                tier: Tier::Inner,
                staves: 2,
            },
            LayerTopology {
                tier: Tier::Middle,
                staves: 2,
            },
            LayerTopology {
                tier: Tier::Outer,
                staves: 1,
            },
            LayerTopology {
                tier: Tier::Outer,
                staves: 2,
            },
        ],
        ru_hw_ids: None,
    }
}
