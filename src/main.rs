//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------
// mbias: methylation bias along read position, estimated
// from a random sample of reads in an indexed bam file

extern crate clap;
use std::time::Instant;

use anyhow::Context as _;
use clap::{value_t, App, Arg, ArgMatches};
use log::{error, info, warn, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod bias;
mod calls;
mod counts;
mod driver;
mod error;
#[cfg(feature = "plots")]
mod plot;
mod regions;
mod report;
mod store;

use crate::bias::BiasProfile;
use crate::calls::Context;
use crate::driver::{ProfileConfig, SamplingDriver, DEFAULT_READ_LENGTH, DEFAULT_TARGET_READS};
use crate::store::{AlignmentStore, BamStore, DEFAULT_CALL_TAG};

fn main() {
    let default_reads = DEFAULT_TARGET_READS.to_string();
    let default_readlen = DEFAULT_READ_LENGTH.to_string();
    let matches = App::new("mbias")
        .version("0.1")
        .author("Jared Simpson <jared.simpson@oicr.on.ca>")
        .about("Calculate methylation bias in read position")
        .arg(Arg::with_name("bam")
            .short("b")
            .long("bam")
            .takes_value(true)
            .required(true)
            .help("input bam file, must be indexed"))
        .arg(Arg::with_name("output")
            .short("o")
            .long("output")
            .takes_value(true)
            .required(true)
            .help("output file name"))
        .arg(Arg::with_name("nreads")
            .short("n")
            .long("nreads")
            .takes_value(true)
            .default_value(&default_reads)
            .help("number of reads to profile"))
        .arg(Arg::with_name("readlen")
            .short("r")
            .long("readlen")
            .takes_value(true)
            .default_value(&default_readlen)
            .help("read length"))
        .arg(Arg::with_name("tag")
            .short("t")
            .long("tag")
            .takes_value(true)
            .default_value(DEFAULT_CALL_TAG)
            .help("aux tag holding the per-base methylation call string"))
        .arg(Arg::with_name("seed")
            .short("s")
            .long("seed")
            .takes_value(true)
            .help("seed for the random number generator, for reproducible sampling"))
        .arg(Arg::with_name("plot")
            .short("p")
            .long("plot")
            .takes_value(false)
            .help("create plot"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .long("verbose")
            .takes_value(false)
            .help("print debug messages"))
        .get_matches();

    init_logging(matches.is_present("verbose"));

    if let Err(e) = run(&matches) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn config_from_matches(matches: &ArgMatches) -> anyhow::Result<ProfileConfig> {
    let seed = match matches.value_of("seed") {
        Some(_) => Some(value_t!(matches, "seed", u64)?),
        None => None,
    };
    Ok(ProfileConfig {
        target_reads: value_t!(matches, "nreads", usize)?,
        read_len: value_t!(matches, "readlen", usize)?,
        tag: matches.value_of("tag").unwrap_or(DEFAULT_CALL_TAG).to_string(),
        seed,
    })
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = config_from_matches(matches)?;
    let input_bam = matches.value_of("bam").unwrap();
    let output = matches.value_of("output").unwrap();

    info!(
        "profiling methylation bias with n:{} readlen:{} tag:{} on file {}",
        config.target_reads, config.read_len, config.tag, input_bam
    );

    let start = Instant::now();
    let mut store = BamStore::from_path(input_bam).with_context(|| format!("could not open {}", input_bam))?;
    info!("{} reference sequences in {}", store.references().len(), input_bam);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let sampling = SamplingDriver::new(&mut store, &config).run(&mut rng)?;
    if sampling.is_undersampled() {
        warn!(
            "only {} of {} requested reads were profiled, estimates will be less precise",
            sampling.reads_folded, sampling.reads_requested
        );
    }

    let profile = BiasProfile::compute(&sampling.counts);
    for ctx in Context::ALL.iter() {
        info!("{}: {} of {} positions with data", ctx, profile.covered_positions(*ctx), profile.read_len());
    }
    report::save_profile(&profile, output).with_context(|| format!("could not write {}", output))?;

    if matches.is_present("plot") {
        save_plot(&profile, output)?;
    }

    info!(
        "processed {} reads from {} coordinates in {:?}",
        sampling.reads_folded,
        sampling.coordinates_visited,
        start.elapsed()
    );
    Ok(())
}

#[cfg(feature = "plots")]
fn save_plot(profile: &BiasProfile, output: &str) -> anyhow::Result<()> {
    plot::save_plot(profile, output).context("could not write plot")?;
    Ok(())
}

#[cfg(not(feature = "plots"))]
fn save_plot(_profile: &BiasProfile, _output: &str) -> anyhow::Result<()> {
    warn!("mbias was built without the plots feature, skipping plot");
    Ok(())
}
