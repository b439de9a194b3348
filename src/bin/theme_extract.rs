use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use theme_extract::{Options, extract_theme_bytes, remap_palette_bytes, shift_hue_bytes};

/// Extract a dominant-color palette from images and write the recolored result.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// JSON file with default options (k, max_iterations, sample_cap, max_samples)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of palette colors
    #[arg(short = 'k', long)]
    colors: Option<usize>,

    /// Maximum k-means iterations
    #[arg(short = 'i', long)]
    iterations: Option<usize>,

    /// Longest side of the working copy used for sampling
    #[arg(short = 's', long)]
    sample_cap: Option<u32>,

    /// Upper bound on stratified samples
    #[arg(long)]
    max_samples: Option<usize>,

    /// Seed for repeatable output
    #[arg(long)]
    seed: Option<u64>,

    /// Comma-separated list of hex colors to remap onto (skip extraction)
    #[arg(short = 'c', long)]
    palette: Option<String>,

    /// Rotate hues by this many degrees instead of extracting a palette
    #[arg(long, allow_negative_numbers = true, conflicts_with = "palette")]
    hue: Option<f32>,

    /// Output directory
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Output filename prefix (ignored when --out-dir supplied)
    #[arg(short = 'p', long, default_value = "themed_")]
    prefix: String,

    /// Print palettes as JSON instead of plain lines
    #[arg(long)]
    json: bool,
}

fn load_options(args: &Args) -> Result<Options> {
    let mut opts = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Options::default(),
    };
    if let Some(k) = args.colors {
        opts.k = k;
    }
    if let Some(n) = args.iterations {
        opts.max_iterations = n;
    }
    if let Some(cap) = args.sample_cap {
        opts.sample_cap = cap;
    }
    if let Some(n) = args.max_samples {
        opts.max_samples = n;
    }
    opts.validate()?;
    Ok(opts)
}

fn output_path(args: &Args, input: &Path) -> PathBuf {
    if let Some(dir) = &args.out_dir {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        dir.join(format!("{stem}.png"))
    } else {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let parent = input.parent().unwrap_or_else(|| Path::new(""));
        parent.join(format!("{}{}.png", args.prefix, stem))
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let opts = load_options(&args)?;

    let custom: Option<Vec<String>> = args
        .palette
        .as_ref()
        .map(|s| s.split(',').map(|x| x.trim().to_string()).collect());

    let mut report = Vec::new();
    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;

        let (png, palette) = match (&custom, args.hue) {
            (Some(hex), _) => (
                remap_palette_bytes(&bytes, hex.as_slice()).context("processing failed")?,
                Vec::new(),
            ),
            (None, Some(degrees)) => (
                shift_hue_bytes(&bytes, degrees).context("processing failed")?,
                Vec::new(),
            ),
            (None, None) => extract_theme_bytes(&bytes, &opts, args.seed).context("processing failed")?,
        };

        let out_path = output_path(&args, input);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, png)?;
        info!("saved {}", out_path.display());

        if args.json {
            let colors: Vec<_> = palette
                .iter()
                .map(|e| json!({ "hex": e.hex(), "weight": e.weight }))
                .collect();
            report.push(json!({
                "input": input.display().to_string(),
                "output": out_path.display().to_string(),
                "palette": colors,
            }));
        } else {
            println!("Saved → {}", out_path.display());
            for entry in &palette {
                println!("  {} ({})", entry.hex(), entry.weight);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
