//! CLI tool for overlap_fix - resolves overlapping workstations in a layout file
//!
//! Usage:
//!   overlap_fix_cli plan.xlsx                  # Writes plan.resolved.xlsx
//!   overlap_fix_cli plan.xlsx -o out.xlsx      # Writes out.xlsx
//!   overlap_fix_cli plan.csv                   # Prints name,x,y to stdout
//!   overlap_fix_cli plan.json --check          # Reports overlaps, no changes
//!
//! Set RUST_LOG=debug for per-pass progress.

#![allow(clippy::exit)]

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use overlap_fix::types::Floor;
use overlap_fix::{check_input, resolve_input, InputFormat, LayoutCheck, RunConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: overlap_fix_cli <input.(xlsx|csv|tsv|json)> [-o OUT] [--config FILE] \
[--sheet NAME] [--input-range A2:E10] [--output-range J2:K10] [--floor W H] \
[--max-iterations N] [--check]";

#[derive(Default)]
struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    sheet: Option<String>,
    input_range: Option<String>,
    output_range: Option<String>,
    floor: Option<Floor>,
    max_iterations: Option<usize>,
    check: bool,
}

fn main() {
    init_logging();

    let args = match parse_args(env::args().skip(1)) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    if let Err(msg) = run(&args) {
        eprintln!("Error: {msg}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn parse_args(mut it: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut input = None;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-o" | "--output" => args.output = Some(PathBuf::from(value(&mut it, &arg)?)),
            "--config" => args.config = Some(PathBuf::from(value(&mut it, &arg)?)),
            "--sheet" => args.sheet = Some(value(&mut it, &arg)?),
            "--input-range" => args.input_range = Some(value(&mut it, &arg)?),
            "--output-range" => args.output_range = Some(value(&mut it, &arg)?),
            "--floor" => {
                let width = number(&value(&mut it, &arg)?)?;
                let height = number(&value(&mut it, &arg)?)?;
                args.floor = Some(Floor::new(width, height));
            }
            "--max-iterations" => {
                let raw = value(&mut it, &arg)?;
                let n = raw
                    .parse()
                    .map_err(|_| format!("--max-iterations expects an integer, got '{raw}'"))?;
                args.max_iterations = Some(n);
            }
            "--check" => args.check = true,
            "-h" | "--help" => return Err("overlap_fix_cli: resolve overlapping workstations".into()),
            other if other.starts_with('-') => return Err(format!("unknown option '{other}'")),
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    return Err("only one input file may be given".into());
                }
            }
        }
    }

    args.input = input.ok_or("missing input file")?;
    Ok(args)
}

fn value(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    it.next().ok_or_else(|| format!("{flag} expects a value"))
}

fn number(raw: &str) -> Result<f64, String> {
    raw.parse()
        .map_err(|_| format!("--floor expects numbers, got '{raw}'"))
}

fn load_config(args: &Args) -> Result<RunConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            RunConfig::from_json_str(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => RunConfig::default(),
    };

    if let Some(sheet) = &args.sheet {
        config.sheet.clone_from(sheet);
    }
    if let Some(range) = &args.input_range {
        config.input_range.clone_from(range);
    }
    if let Some(range) = &args.output_range {
        config.output_range.clone_from(range);
    }
    if let Some(floor) = args.floor {
        config.floor = floor;
    }
    if let Some(n) = args.max_iterations {
        config.max_iterations = n;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), String> {
    let config = load_config(args)?;
    let format = InputFormat::from_path(&args.input).map_err(|e| e.to_string())?;
    let data =
        fs::read(&args.input).map_err(|e| format!("reading {}: {e}", args.input.display()))?;

    if args.check {
        let check = check_input(format, &data, &config).map_err(|e| e.to_string())?;
        print_check(&check);
        if !check.is_clean() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let resolved = resolve_input(format, &data, &config).map_err(|e| e.to_string())?;
    let report = resolved.summary.report;

    let output = args.output.clone().or_else(|| match format {
        InputFormat::Xlsx => Some(resolved_path(&args.input)),
        _ => None,
    });
    match output {
        Some(path) => {
            fs::write(&path, &resolved.output)
                .map_err(|e| format!("writing {}: {e}", path.display()))?;
            info!(path = %path.display(), "written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&resolved.output)
                .and_then(|()| stdout.flush())
                .map_err(|e| format!("writing stdout: {e}"))?;
        }
    }

    info!(
        passes = report.passes,
        corrections = report.corrections,
        "All overlaps resolved successfully"
    );
    Ok(())
}

fn resolved_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layout".into());
    input.with_file_name(format!("{stem}.resolved.xlsx"))
}

fn print_check(check: &LayoutCheck) {
    let name = |idx: usize| {
        check
            .stations
            .get(idx)
            .map_or("?", |ws| ws.name.as_str())
    };

    println!("{} workstations", check.stations.len());
    for &(a, b) in &check.overlaps {
        println!("overlap: '{}' and '{}'", name(a), name(b));
    }
    for &idx in &check.out_of_bounds {
        println!("out of bounds: '{}'", name(idx));
    }
    if check.is_clean() {
        println!("no overlaps, all within the floor");
    }
}
