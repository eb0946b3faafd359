/*
 * Topology - Container Service Topology Builder
 * Copyright (C) 2025 Topology Authors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

//! Synthesis CLI
//!
//! Run `synth --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use topology::{TopologyBuilder, TopologyConfig};

#[derive(Parser)]
#[command(name = "synth")]
#[command(about = "Build and synthesize the service topology")]
#[command(version)]
struct Cli {
    /// Path to the topology configuration file
    #[arg(short, long, default_value = "config/topology.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the topology and write the synthesized template
    Synth {
        /// Write the template to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the topology and check every reference without emitting
    /// anything
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = TopologyConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Synth { output } => {
            let topology = TopologyBuilder::new(config)?.build()?;
            let template = topology.synthesize()?;
            let rendered = serde_json::to_string_pretty(&template)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), "template written");
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Validate => {
            let topology = TopologyBuilder::new(config)?.build()?;
            info!(
                resources = topology.graph().len(),
                outputs = topology.graph().outputs().len(),
                "topology is valid"
            );
        }
    }

    Ok(())
}
