//! Docking Testbed
//!
//! Loads a TOML scene, runs it through the merge coordinator and prints the
//! merges that happened. Set `RUST_LOG=debug` for per-tick coordinator logs.

use clap::Parser;
use std::path::PathBuf;
use testbed::Scenario;
use tracing_subscriber::EnvFilter;

/// Docking Testbed
#[derive(Parser)]
#[command(name = "testbed")]
#[command(about = "Run a block docking scene and report the resulting merges")]
struct Args {
    /// Scene file (defaults to the bundled stack scene)
    scene: Option<PathBuf>,

    /// Override the number of ticks from the scene
    #[arg(long)]
    ticks: Option<u64>,

    /// Print the debug boxes of every surviving assembly
    #[arg(long)]
    boxes: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let scene = args.scene.unwrap_or_else(testbed::default_scene_path);
    let mut scenario = Scenario::load(&scene)?;
    if let Some(ticks) = args.ticks {
        scenario.ticks = ticks;
    }
    tracing::info!(
        "Loaded {} with {} assemblies",
        scene.display(),
        scenario.assemblies.len()
    );

    let report = scenario.run()?;
    print!("{}", report);

    if args.boxes {
        for survivor in &report.survivors {
            println!("{}:", survivor.name);
            for debug_box in &survivor.debug_boxes {
                println!(
                    "  {:<8} center {} color {}",
                    debug_box.kind, debug_box.center, debug_box.color
                );
            }
        }
    }

    Ok(())
}
