// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! `chipmap`: build the chip mapping and inspect it from the command line.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chip_mapping::{ChipMapping, Tier, Topology};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "chipmap")]
#[command(version, about = "Inspect HW <-> SW chip address mapping tables", long_about = None)]
struct Cli {
    /// JSON topology file (default: built-in ITS geometry)
    #[arg(short, long, global = true)]
    topology: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump every chip record, tier by tier
    Print,
    /// Per-tier and per-layer counts, then every stave
    Summary,
    /// Coordinates of one chip, by global SW chip id
    Chip { id: u32 },
    /// SW cable of a HW cable address
    Cable { tier: Tier, cable_hw: u8 },
    /// SW readout unit of a HW readout unit id
    Ru { ru_hw: u16 },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let topology = match &cli.topology {
        Some(path) => Topology::load(path)
            .with_context(|| format!("loading topology {}", path.display()))?,
        None => Topology::its(),
    };
    let mapping = ChipMapping::new(&topology).context("building chip mapping")?;

    match cli.command {
        Commands::Print => mapping.print(),
        Commands::Summary => mapping.write_summary(&mut io::stdout().lock())?,
        Commands::Chip { id } => {
            let Some(chip) = mapping.try_chip_info(id) else {
                anyhow::bail!("no chip {id}: detector has {} chips", mapping.n_chips());
            };
            let stave = mapping.stave_of_chip(id);
            println!("{stave}");
            println!("{chip}");
        }
        Commands::Cable { tier, cable_hw } => match mapping.cable_sw_from_hw(tier, cable_hw) {
            Some(cable_sw) => {
                print!("{tier} cable HW {cable_hw} -> SW {cable_sw}");
                if let Some(first) = mapping.first_chip_on_cable_hw(tier, cable_hw) {
                    print!(", first chip HW {first}");
                }
                println!();
            }
            None => println!("{tier} cable HW {cable_hw} is not wired"),
        },
        Commands::Ru { ru_hw } => match mapping.ru_sw_from_hw(ru_hw) {
            Some(ru_sw) => println!("{}", mapping.stave_info(ru_sw)),
            None => println!("RU HW {ru_hw} is not wired"),
        },
    }
    Ok(())
}
