use std::path::{Path, PathBuf};

use anyhow::Context;
use blockworld_common::{CellCoord, CellType};
use blockworld_kernel::{FlatWorldBuilder, World, WorldConfig};
use blockworld_render::{DebugTextRenderer, RenderView, Renderer, VisualMirror};
use blockworld_tools::WorldInspector;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blockworld-cli", about = "CLI tool for blockworld operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// World config (JSON). Defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Print the effective world config as JSON
    Config,
    /// Build a flat world, dig and cover a few cells, then run the clock
    Simulate {
        /// Simulated seconds to run
        #[arg(short, long, default_value = "15")]
        seconds: f64,
        /// Frames per simulated second fed to the tick accumulator
        #[arg(short, long, default_value = "60")]
        fps: u32,
        /// Override the config seed
        #[arg(long)]
        seed: Option<u64>,
        /// Layer (y) to draw at the end; defaults to the surface
        #[arg(short, long)]
        layer: Option<i32>,
    },
    /// Build a flat world and print what is at one cell
    Inspect { x: i32, y: i32, z: i32 },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WorldConfig> {
    let config = match path {
        Some(path) => WorldConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => WorldConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("blockworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", blockworld_render::crate_info());
            println!("tools: {}", blockworld_tools::crate_info());
            println!(
                "config: extent={:?} tick={}s seed={}",
                config.extent, config.tick_interval_secs, config.seed
            );
        }
        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
        }
        Commands::Simulate {
            seconds,
            fps,
            seed,
            layer,
        } => {
            let config = match seed {
                Some(seed) => config.with_seed(seed),
                None => config,
            };
            let builder = FlatWorldBuilder::new(config);
            let surface = builder.surface_height() as i32;
            let mut world = builder.build();
            let mut mirror = VisualMirror::new();
            world.dispatch_events(&mut mirror);
            println!("Built: {}", WorldInspector::summary(&world));

            dig_and_cover(&mut world, surface);
            world.dispatch_events(&mut mirror);
            println!("After edits: {}", WorldInspector::summary(&world));

            let fps = fps.max(1);
            let dt = 1.0 / fps as f64;
            let frames = (seconds.max(0.0) * fps as f64).round() as u64;
            let mut ticks = 0;
            for _ in 0..frames {
                ticks += world.advance(dt);
                world.dispatch_events(&mut mirror);
            }
            tracing::info!(frames, ticks, "simulation finished");

            println!("After {seconds}s: {}", WorldInspector::summary(&world));
            println!(
                "Mirror: visuals={} vegetation={} cell_changes={}",
                mirror.visual_count(),
                mirror.vegetation_count(),
                mirror.cell_changes()
            );
            let view = RenderView {
                layer: layer.unwrap_or(surface - 1),
                xray: false,
            };
            print!("{}", DebugTextRenderer::new().render(&world, &view));
        }
        Commands::Inspect { x, y, z } => {
            let world = FlatWorldBuilder::new(config).build();
            let coord = CellCoord::new(x, y, z);
            match WorldInspector::inspect_cell(&world, coord) {
                Some(info) => println!("{info}"),
                None => println!("Cell {coord} is outside the world"),
            }
        }
    }

    Ok(())
}

/// Dig a trench through the surface and drop a stone slab on the turf next
/// to it, so both regrowth and smothering play out.
fn dig_and_cover(world: &mut World, surface: i32) {
    let [sx, _, sz] = world.grid().extent();
    let mid_z = sz as i32 / 2;
    for x in 1..(sx as i32 - 1) {
        for depth in 1..=2 {
            let coord = CellCoord::new(x, surface - depth, mid_z);
            if let Err(err) = world.break_cell(coord) {
                tracing::debug!(%coord, %err, "could not dig");
            }
        }
    }
    for x in 1..(sx as i32 / 2) {
        world.place_cell(CellCoord::new(x, surface, mid_z + 2), CellType::Stone);
    }
}
