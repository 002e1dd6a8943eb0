//! panicle-prune: CLI tool for pruning skeleton images.
//!
//! Reads a binary skeleton image, removes branches shorter than the
//! configured length together with isolated debris pixels, and prints
//! per-stage diagnostics. Useful for:
//!
//! - Cleaning skeletonized panicle images before measurement
//! - Tuning the minimum branch length for a dataset
//! - Measuring per-stage durations on large rasters
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin panicle-prune -- [OPTIONS] <INPUT>
//! ```
//!
//! Set `RUST_LOG=debug` for per-stage log lines.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use panicle_skeleton::diagnostics::{Clock, PruneDiagnostics};
use panicle_skeleton::{PruneConfig, codec};

/// Skeleton pruning with per-stage diagnostics.
///
/// Removes short spurious branches and isolated pixels from a one-pixel
/// wide binary skeleton image and reports what changed.
#[derive(Parser)]
#[command(name = "panicle-prune", version)]
struct Cli {
    /// Path to the input skeleton (8-bit grayscale PNG, BMP, ...).
    input: PathBuf,

    /// Write the pruned skeleton as PNG to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Branches with fewer pixels than this are removed.
    #[arg(long, default_value_t = PruneConfig::DEFAULT_MIN_BRANCH_LENGTH)]
    min_branch_length: usize,

    /// Marker value of skeleton pixels (1-255).
    #[arg(long, default_value_t = PruneConfig::DEFAULT_FOREGROUND, value_parser = clap::value_parser!(u8).range(1..))]
    foreground: u8,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full prune config as a JSON string.
    ///
    /// When provided, `--min-branch-length` and `--foreground` are
    /// ignored. Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`PruneConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PruneConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        PruneConfig {
            min_branch_length: cli.min_branch_length,
            foreground: cli.foreground,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let skeleton = match codec::decode_skeleton(&image_bytes) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.input.display(),
        image_bytes.len(),
        skeleton.width(),
        skeleton.height(),
    );
    eprintln!("Config: {config:?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match panicle_skeleton::prune_with_diagnostics(&skeleton, &config, &StdClock) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write the pruned skeleton on the first run only.
                if run == 0
                    && let Some(ref output) = cli.output
                {
                    let written = codec::encode_png(&staged.pruned)
                        .map_err(|e| e.to_string())
                        .and_then(|png| {
                            std::fs::write(output, &png)
                                .map(|()| png.len())
                                .map_err(|e| e.to_string())
                        });
                    match written {
                        Ok(len) => {
                            log::info!("pruned skeleton written to {}", output.display());
                            eprintln!("PNG written to {} ({len} bytes)", output.display());
                        }
                        Err(e) => {
                            eprintln!("Error writing PNG to {}: {e}", output.display());
                            return ExitCode::FAILURE;
                        }
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Prune error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PruneDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PruneDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Prepare", |d| d.prepare.duration),
        ("Classify", |d| d.classify.duration),
        ("Trace", |d| d.trace.duration),
        ("Prune", |d| d.prune.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("panicle-prune").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_library_config() {
        let cli = parse(&["in.png"]);
        assert_eq!(config_from_cli(&cli).unwrap(), PruneConfig::default());
        assert_eq!(cli.runs, 1);
        assert!(cli.output.is_none());
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&["in.png", "--min-branch-length", "4", "--foreground", "1", "-o", "out.png"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.min_branch_length, 4);
        assert_eq!(config.foreground, 1);
        assert_eq!(cli.output, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "in.png",
            "--min-branch-length",
            "4",
            "--config-json",
            r#"{"min_branch_length": 7}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.min_branch_length, 7);
        assert_eq!(config.foreground, PruneConfig::DEFAULT_FOREGROUND);
    }

    #[test]
    fn invalid_config_json_is_reported() {
        let cli = parse(&["in.png", "--config-json", "{not json"]);
        assert!(config_from_cli(&cli).unwrap_err().starts_with("Error parsing --config-json"));

        let cli = parse(&["in.png", "--config-json", r#"{"foreground": 0}"#]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn zero_runs_and_zero_marker_are_rejected() {
        let args = |extra: &[&'static str]| {
            std::iter::once("panicle-prune")
                .chain(["in.png"])
                .chain(extra.iter().copied())
                .collect::<Vec<_>>()
        };
        assert!(Cli::try_parse_from(args(&["--runs", "0"])).is_err());
        assert!(Cli::try_parse_from(args(&["--foreground", "0"])).is_err());
    }
}
