// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Whole-detector checks of the built-in ITS mapping.
//!
//! These tests validate that the mapping:
//! - Numbers cables densely and bijectively within each tier
//! - Can re-derive SW coordinates from the recorded HW coordinates
//! - Keeps inner staves one chip per cable
//! - Numbers chips and staves monotonically across the detector
//! - Never confuses an unwired HW address with SW id 0

use std::collections::HashSet;

use chip_mapping::memo::chips::{shared_cable_sw, unpack_cable_hw};
use chip_mapping::{CableLayout, ChipMapping, Tier};

fn mapping() -> ChipMapping {
    ChipMapping::its().expect("ITS topology is consistent")
}

#[test]
fn test_cable_tables_are_bijective_per_tier() {
    let mapping = mapping();
    for tier in Tier::ALL {
        let mut seen = HashSet::new();
        for cable_hw in 0..=u8::MAX {
            if let Some(cable_sw) = mapping.cable_sw_from_hw(tier, cable_hw) {
                assert!(cable_sw < mapping.n_cables(tier), "{tier} cable {cable_hw}");
                assert!(seen.insert(cable_sw), "{tier}: SW cable {cable_sw} mapped twice");
            }
        }
        assert_eq!(seen.len(), mapping.n_cables(tier) as usize, "{tier}");
    }
}

#[test]
fn test_every_chip_cable_is_in_the_table() {
    let mapping = mapping();
    for tier in Tier::ALL {
        for record in mapping.tier(tier).records() {
            assert_eq!(
                mapping.cable_sw_from_hw(tier, record.cable_hw),
                Some(record.cable_sw)
            );
        }
    }
}

#[test]
fn test_hw_coordinates_round_trip() {
    let mapping = mapping();
    for tier in [Tier::Middle, Tier::Outer] {
        let memo = mapping.tier(tier);
        assert_eq!(memo.layout, CableLayout::Shared);
        let half_module = memo.chips_per_module() / 2;
        let modules_per_half_stave = memo.modules_per_half_stave();

        for record in memo.records() {
            let (connector, module_hw) = unpack_cable_hw(record.cable_hw);
            assert_eq!(module_hw, record.module_hw);

            let half_stave = connector >> 1;
            let module_sw = half_stave * modules_per_half_stave + module_hw - 1;
            assert_eq!(module_sw, record.module_sw);

            assert_eq!(
                shared_cable_sw(connector, module_hw, modules_per_half_stave),
                record.cable_sw
            );

            let chip_on_module_sw = mapping
                .chip_on_module_sw_from_hw(tier, record.chip_on_module_hw)
                .unwrap();
            assert_eq!(chip_on_module_sw, record.chip_on_module_sw);
            assert_eq!(chip_on_module_sw % half_module, record.chip_on_cable);
            assert_eq!(
                record.id,
                module_sw * memo.chips_per_module() + chip_on_module_sw
            );
        }
    }
}

#[test]
fn test_inner_tier_identity() {
    let mapping = mapping();
    for record in mapping.tier(Tier::Inner).records() {
        assert_eq!(record.cable_sw, record.id);
        assert_eq!(record.cable_hw, record.id);
        assert_eq!(record.chip_on_cable, 0);
    }
    let chip7 = mapping.tier(Tier::Inner).record(7).unwrap();
    assert_eq!(chip7.cable_hw, 7);
    assert_eq!(chip7.chip_on_cable, 0);
}

#[test]
fn test_shared_cables_serve_half_a_module() {
    let mapping = mapping();
    for tier in [Tier::Middle, Tier::Outer] {
        let memo = mapping.tier(tier);
        let half_module = memo.chips_per_module() / 2;
        let mut per_cable = vec![0usize; memo.n_cables() as usize];
        for record in memo.records() {
            assert!(record.chip_on_cable < half_module);
            per_cable[record.cable_sw as usize] += 1;
        }
        assert!(per_cable.iter().all(|&n| n == half_module as usize));
    }
}

#[test]
fn test_monotonic_global_numbering() {
    let mapping = mapping();
    let staves = mapping.staves();
    assert_eq!(staves[0].first_chip_id_sw, 0);
    for pair in staves.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        assert_eq!(next.id_sw, prev.id_sw + 1);
        assert!(next.layer >= prev.layer);
        assert_eq!(
            next.first_chip_id_sw,
            prev.first_chip_id_sw + mapping.chips_per_stave(prev.tier) as u32
        );
    }
    let last = staves.last().unwrap();
    assert_eq!(last.chip_range().end as usize, mapping.n_chips());

    // chip ids inside a stave follow the template order
    for chip_sw in 0..mapping.n_chips() as u32 {
        let location = mapping.locate_chip(chip_sw);
        assert_eq!(location.chip_sw(), chip_sw);
    }
}

#[test]
fn test_sentinel_discipline() {
    let mapping = mapping();
    for tier in Tier::ALL {
        let wired = mapping.cables_on_stave(tier);
        for cable_hw in 0..=u8::MAX {
            let is_wired = cable_hw < 32 && wired & (1 << cable_hw) != 0;
            assert_eq!(
                mapping.cable_sw_from_hw(tier, cable_hw).is_some(),
                is_wired,
                "{tier} cable {cable_hw}"
            );
        }
    }
    // HW cable 0 maps to SW 0; an unwired address must not
    assert_eq!(mapping.cable_sw_from_hw(Tier::Outer, 0), Some(0));
    assert_eq!(mapping.cable_sw_from_hw(Tier::Outer, 7), None);
    assert_eq!(mapping.ru_sw_from_hw(0), Some(0));
    for ru_hw in 192..=u16::MAX {
        assert_eq!(mapping.ru_sw_from_hw(ru_hw), None);
    }
}

#[test]
fn test_layers_and_tiers() {
    let mapping = mapping();
    let expected = [
        (Tier::Inner, 12),
        (Tier::Inner, 16),
        (Tier::Inner, 20),
        (Tier::Middle, 24),
        (Tier::Middle, 30),
        (Tier::Outer, 42),
        (Tier::Outer, 48),
    ];
    for (layer, (tier, count)) in expected.into_iter().enumerate() {
        let range = mapping.staves_in_layer(layer);
        assert_eq!(range.len(), count);
        for ru_sw in range {
            let stave = mapping.stave_info(ru_sw);
            assert_eq!(stave.layer as usize, layer);
            assert_eq!(stave.tier, tier);
            assert_eq!(stave.n_cables, mapping.n_cables(tier));
        }
    }
}
