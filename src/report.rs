//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------
use std::fs::File;
use std::io::{BufWriter, Write};

use itertools::Itertools;
use log::info;

use crate::bias::BiasProfile;
use crate::calls::Context;
use crate::error::Result;

/// Written in place of a fraction at positions without calls
pub const NO_DATA: &str = "nan";

fn format_fraction(fraction: Option<f64>) -> String {
    match fraction {
        // Debug keeps the decimal point for whole numbers ("0.0", "1.0")
        Some(f) => format!("{:?}", f),
        None => NO_DATA.to_string(),
    }
}

/// Three tab-separated rows, mCG, mCHG and mCHH, one column per read position.
/// There is no newline after the last row.
pub fn write_profile<W: Write>(profile: &BiasProfile, out: &mut W) -> std::io::Result<()> {
    let rows = Context::ALL
        .iter()
        .map(|ctx| {
            std::iter::once(ctx.label().to_string())
                .chain(profile.fractions(*ctx).iter().map(|f| format_fraction(*f)))
                .join("\t")
        })
        .join("\n");
    out.write_all(rows.as_bytes())?;
    out.flush()
}

pub fn save_profile(profile: &BiasProfile, path: &str) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_profile(profile, &mut out)?;
    info!("wrote methylation bias profile to {}", path);
    Ok(())
}
