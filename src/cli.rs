use crate::config::load_config;
use crate::convert::convert_file;
use crate::layout::LayeredLayout;
use crate::layout_dump::write_layout_dump;
use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing_subscriber::EnvFilter;

/// Desktop draw.io executable launched by `--open`.
const DRAWIO_COMMAND: &str = "drawio";

#[derive(Parser, Debug)]
#[command(
    name = "lineage-drawio",
    version,
    about = "Export a dbt dependency graph to draw.io format"
)]
pub struct Args {
    /// Path to dbt manifest.json
    #[arg(short = 'p', long = "path")]
    pub path: PathBuf,

    /// Output file name
    #[arg(short = 'n', long = "name", default_value = "raw_graph.xml")]
    pub name: PathBuf,

    /// Config JSON5 file (canvas, placement, routing, theme)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Seed for edge anchor jitter; random when omitted
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Also write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Open the result in the draw.io desktop app
    #[arg(long = "open")]
    pub open: bool,

    /// More logging (debug)
    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet")]
    pub verbose: bool,

    /// Less logging (warnings only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Args {
    fn default_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.default_log_level());

    let config = load_config(args.config.as_deref()).context("could not load configuration")?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let diagram = convert_file(&args.path, &args.name, &LayeredLayout, &config, &mut rng)
        .with_context(|| format!("could not convert {}", args.path.display()))?;

    if let Some(dump_path) = args.dump_layout.as_deref() {
        write_layout_dump(dump_path, &diagram.layout, &diagram.graph)
            .with_context(|| format!("could not write layout dump {}", dump_path.display()))?;
        tracing::info!(path = %dump_path.display(), "saved layout dump");
    }

    if args.open {
        open_in_drawio(&args.name);
    }
    Ok(())
}

/// Launches the desktop editor on `path`. Failing to launch is not fatal;
/// the diagram is already on disk.
fn open_in_drawio(path: &Path) {
    match Command::new(DRAWIO_COMMAND).arg(path).spawn() {
        Ok(_) => tracing::info!(path = %path.display(), "opened diagram in draw.io"),
        Err(err) => tracing::warn!(%err, command = DRAWIO_COMMAND, "could not launch draw.io"),
    }
}
