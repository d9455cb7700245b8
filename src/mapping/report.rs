// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Human-readable dumps of the mapping, for manual verification.

use std::io::{self, Write};

use super::ChipMapping;
use crate::topology::Tier;

impl ChipMapping {
    /// Print every chip record, tier by tier, to stdout.
    pub fn print(&self) {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(err) = self.write_tables(&mut out) {
            tracing::warn!(%err, "could not print chip mapping");
        }
    }

    /// Write every chip record of one stave of each tier, in SW order.
    pub fn write_tables<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for tier in Tier::ALL {
            let memo = self.tier(tier);
            writeln!(out)?;
            writeln!(
                out,
                "{} tier: {} chips/stave, {} cables ({} chips/cable), cable mask {:#010x}",
                tier,
                memo.chips_per_stave(),
                memo.n_cables(),
                memo.chips_per_cable(),
                memo.cables_on_stave()
            )?;
            for record in memo.records() {
                writeln!(out, "{record}")?;
            }
        }
        Ok(())
    }

    /// Write per-tier and per-layer counts followed by every stave record.
    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{} layers, {} staves, {} chips",
            self.n_layers(),
            self.n_staves(),
            self.n_chips()
        )?;
        for tier in Tier::ALL {
            writeln!(
                out,
                "  {:6} {:3} staves {:6} chips",
                tier,
                self.n_staves_on_tier(tier),
                self.n_chips_on_tier(tier)
            )?;
        }
        for layer in 0..self.n_layers() {
            let range = self.staves_in_layer(layer);
            writeln!(out, "  layer {layer}: staves {}..{}", range.start, range.end)?;
        }
        for stave in self.staves() {
            writeln!(out, "{stave}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_tables_lists_every_template_chip() {
        let mapping = ChipMapping::its().unwrap();
        let mut out = Vec::new();
        mapping.write_tables(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let chip_lines = text.lines().filter(|l| l.starts_with("chip ")).count();
        assert_eq!(chip_lines, 9 + 112 + 196);
        assert!(text.contains("Inner tier: 9 chips/stave, 9 cables"));
        assert!(text.contains("cable mask 0x7f7f7f7f"));
        // SW order within the tier
        let inner = text.find("Inner tier").unwrap();
        let middle = text.find("Middle tier").unwrap();
        let outer = text.find("Outer tier").unwrap();
        assert!(inner < middle && middle < outer);
    }

    #[test]
    fn test_write_summary() {
        let mapping = ChipMapping::its().unwrap();
        let mut out = Vec::new();
        mapping.write_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("7 layers, 192 staves, 24120 chips"));
        assert!(text.contains("layer 6: staves 144..192"));
        assert_eq!(text.lines().filter(|l| l.starts_with("RU SW")).count(), 192);
    }
}
