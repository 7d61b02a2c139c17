mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use img2laser::report::describe_brightness;
use img2laser::{convert, AnalysisReport, Config, ConversionOptions, Laser, Material};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

const IMAGE_EXTENSIONS: [&str; 9] = ["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff", "tga"];

#[derive(Serialize)]
struct FileReport {
    input: PathBuf,
    output: PathBuf,
    report: AnalysisReport,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = build_config(&cli)?;
    let options = ConversionOptions::from(&config);

    let inputs = collect_inputs(&cli.input)?;
    if inputs.is_empty() {
        bail!("No input images found");
    }
    let jobs = plan_outputs(&inputs, cli.output.as_deref(), &config.output_suffix)?;

    let start = Instant::now();
    let run = |(input, output): &(PathBuf, PathBuf)| -> Result<FileReport> {
        log::info!("Converting {} to {}", input.display(), output.display());
        let report = convert(input, output, &options)?;
        log::info!(
            "{}: {} ({}), gamma {:.2}, {} engraving",
            input.display(),
            report.image_type,
            report.gamma_effect,
            report.params.gamma,
            report.depth
        );
        log::debug!(
            "{}: brightness adjustments {}",
            input.display(),
            describe_brightness(&report.params.brightness)
        );
        Ok(FileReport {
            input: input.clone(),
            output: output.clone(),
            report,
        })
    };

    let results: Vec<Result<FileReport>> = if config.use_parallel && jobs.len() > 1 {
        jobs.par_iter().map(run).collect()
    } else {
        jobs.iter().map(run).collect()
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut failures = 0;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                log::error!("{:#}", e);
                failures += 1;
            }
        }
    }

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    log::info!(
        "Processed {} of {} images in {:.2}s",
        reports.len(),
        jobs.len(),
        start.elapsed().as_secs_f64()
    );

    if failures > 0 {
        bail!("{} of {} images failed", failures, jobs.len());
    }
    Ok(())
}

/// Configuration file (if any) with command line flags on top.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(key) = &cli.material {
        let material = Material::from_key(key);
        if !material.as_str().eq_ignore_ascii_case(key.trim()) {
            log::warn!("Unknown material '{}', using {}", key, material);
        }
        config.material = material;
    }
    if let Some(color) = cli.color {
        config.color = color;
    }
    if let Some(key) = &cli.laser {
        let laser = Laser::from_key(key);
        if laser.is_none() {
            log::warn!("Unknown laser '{}', no laser tuning", key);
        }
        config.laser = laser;
    }
    if let Some(gamma) = cli.gamma {
        config.gamma = Some(gamma);
    }

    config.validate()?;
    Ok(config)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
}

/// Expand directories into the images they contain.
fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            found.sort();
            log::info!("Found {} images in {}", found.len(), path.display());
            inputs.extend(found);
        } else if path.is_file() {
            inputs.push(path.clone());
        } else {
            bail!("Input not found: {}", path.display());
        }
    }
    Ok(inputs)
}

fn derived_name(input: &Path, suffix: &str, with_extension: bool) -> PathBuf {
    let mut stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    if with_extension {
        if let Some(ext) = input.extension() {
            stem = format!("{}_{}", stem, ext.to_string_lossy());
        }
    }
    PathBuf::from(format!("{}{}.png", stem, suffix))
}

/// Pair each input with its output path. A single input writes to
/// `--output` directly; several inputs treat it as a directory. Inputs that
/// would share an output name keep their extension in it; a remaining clash
/// is an error.
fn plan_outputs(
    inputs: &[PathBuf],
    output: Option<&Path>,
    suffix: &str,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    if let ([input], Some(out)) = (inputs, output) {
        if !out.is_dir() {
            return Ok(vec![(input.clone(), out.to_path_buf())]);
        }
    }

    if let Some(dir) = output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let target_dir = |input: &Path| {
        output
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default()
    };

    let mut uses: HashMap<PathBuf, usize> = HashMap::new();
    for input in inputs {
        *uses
            .entry(target_dir(input).join(derived_name(input, suffix, false)))
            .or_default() += 1;
    }

    let mut seen = HashSet::new();
    let mut jobs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let dir = target_dir(input);
        let plain = dir.join(derived_name(input, suffix, false));
        let target = if uses.get(&plain).copied().unwrap_or(0) > 1 {
            dir.join(derived_name(input, suffix, true))
        } else {
            plain
        };
        if !seen.insert(target.clone()) {
            bail!(
                "{} would overwrite the output of another input ({})",
                input.display(),
                target.display()
            );
        }
        jobs.push((input.clone(), target));
    }
    Ok(jobs)
}
