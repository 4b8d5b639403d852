//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------
use std::path::Path;

use log::info;
use plotly::common::{Mode, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::bias::BiasProfile;
use crate::calls::Context;
use crate::error::Result;

/// Plot location derived from the report path: same stem, `.html` extension
pub fn plot_path(output: &str) -> String {
    Path::new(output).with_extension("html").to_string_lossy().to_string()
}

/// Line plot of the three fraction curves against read position.
/// Positions without data are left as gaps.
pub fn bias_plot(profile: &BiasProfile) -> Plot {
    let positions: Vec<usize> = (0..profile.read_len()).collect();

    let mut plot = Plot::new();
    for ctx in Context::ALL.iter() {
        let trace = Scatter::new(positions.clone(), profile.fractions(*ctx).to_vec())
            .name(ctx.label())
            .mode(Mode::Lines);
        plot.add_trace(trace);
    }
    plot.set_layout(
        Layout::new()
            .title(Title::new("M-bias"))
            .x_axis(Axis::new().title(Title::new("Position")))
            .y_axis(Axis::new().title(Title::new("Methylation"))),
    );
    plot
}

pub fn save_plot(profile: &BiasProfile, output: &str) -> Result<String> {
    let path = plot_path(output);
    std::fs::write(&path, bias_plot(profile).to_html())?;
    info!("wrote methylation bias plot to {}", path);
    Ok(path)
}
