//! Command-line driver for the poptrace simulator.
//!
//! Runs a population for a number of years, samples during the recording
//! window, and writes the parameter document, the ancestor-closed pedigree
//! of the samples, and the demography table.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use poptrace::prelude::*;
use poptrace::report;
use rand::Rng;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "poptrace")]
#[command(author, version, about = "Pedigree-preserving population simulator", long_about = None)]
struct Cli {
    /// Initial population size
    #[arg(short = 'n', long, default_value_t = 1000)]
    popsize: usize,

    /// Number of years to simulate
    #[arg(short = 'y', long, default_value_t = 40)]
    years: u32,

    /// Sample during the last N years
    #[arg(short = 'l', long, default_value_t = 2)]
    last: u32,

    /// Per-stratum adult sampling rate
    #[arg(short = 's', long, default_value_t = 0.02)]
    sample: f64,

    /// RNG seed (default: drawn from system entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Parameter document in JSON (default: built-in rates)
    #[arg(short = 'i', long)]
    infile: Option<PathBuf>,

    /// Output directory (default: print pedigree to stdout)
    #[arg(short = 'o', long)]
    outdir: Option<PathBuf>,

    /// Print the default parameter document and exit
    #[arg(short = 'd', long)]
    default: bool,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.default {
        println!("{}", default_document()?);
        return Ok(());
    }

    let params = match &cli.infile {
        Some(path) => {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Params::from_reader(file).context("Invalid parameter document")?
        }
        None => Params::new(VitalRates::default()).context("Invalid built-in parameters")?,
    };

    let seed = cli.seed.unwrap_or_else(|| rand::rng().random());
    let scheme = SamplingScheme::Rate(cli.sample);
    let mut pop = Population::new(cli.popsize, seed, params);

    eprintln!(
        "poptrace: n={} years={} last={} sample={} seed={}",
        cli.popsize, cli.years, cli.last, cli.sample, seed
    );

    let pb = if cli.quiet {
        None
    } else {
        let pb = ProgressBar::new(cli.years as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} years")
                .context("Invalid progress template")?
                .progress_chars("#>-"),
        );
        Some(pb)
    };

    for year in 1..=cli.years {
        let recording = year + cli.last > cli.years;
        pop.step(recording.then_some(&scheme));
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    eprintln!(
        "poptrace: {} alive, {} archived",
        pop.size(),
        pop.archive().len()
    );

    let family = report::family_tsv(&pop.sample_family());
    match &cli.outdir {
        Some(outdir) => {
            fs::create_dir_all(outdir)
                .with_context(|| format!("Failed to create {}", outdir.display()))?;
            fs::write(outdir.join("config.json"), pop.params().to_json_string()?)?;
            fs::write(outdir.join("sample_family.tsv"), family)?;
            fs::write(
                outdir.join("demography.tsv"),
                report::demography_tsv(&pop.demography_records()),
            )?;
        }
        None => print!("{family}"),
    }
    Ok(())
}

/// The built-in parameter document, as printed by `--default`.
fn default_document() -> Result<String> {
    let params = Params::new(VitalRates::default()).context("Invalid built-in parameters")?;
    Ok(params.to_json_string()?)
}
