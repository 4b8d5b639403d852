//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------
use crate::calls::{CallIndicators, Context, N_SERIES};

/// Per-position call counts for the six context/state series
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCounts {
    series: [Vec<u64>; N_SERIES],
}

impl RawCounts {
    pub fn new(read_len: usize) -> Self {
        RawCounts { series: [(); N_SERIES].map(|_| vec![0u64; read_len]) }
    }

    pub fn read_len(&self) -> usize {
        self.series[0].len()
    }

    pub fn get(&self, context: Context, methylated: bool) -> &[u64] {
        &self.series[context.series(methylated)]
    }

    pub fn methylated(&self, context: Context) -> &[u64] {
        self.get(context, true)
    }

    pub fn unmethylated(&self, context: Context) -> &[u64] {
        self.get(context, false)
    }

    pub fn total_calls(&self) -> u64 {
        self.series.iter().flatten().sum()
    }
}

/// Accumulates decoded reads into a RawCounts owned for the length of one run
pub struct PositionAggregator {
    counts: RawCounts,
    reads_folded: usize,
}

impl PositionAggregator {
    pub fn new(read_len: usize) -> Self {
        PositionAggregator { counts: RawCounts::new(read_len), reads_folded: 0 }
    }

    pub fn fold(&mut self, indicators: &CallIndicators) {
        // the decoder always pads/truncates to read_len, anything else is a bug
        assert_eq!(
            indicators.len(),
            self.counts.read_len(),
            "indicator length does not match the configured read length"
        );

        for (counts, ind) in self.counts.series.iter_mut().zip(indicators.iter()) {
            for (c, &i) in counts.iter_mut().zip(ind.iter()) {
                *c += i as u64;
            }
        }
        self.reads_folded += 1;
    }

    pub fn reads_folded(&self) -> usize {
        self.reads_folded
    }

    pub fn counts(&self) -> &RawCounts {
        &self.counts
    }

    pub fn into_counts(self) -> RawCounts {
        self.counts
    }
}
