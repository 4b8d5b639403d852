//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------
use crate::calls::Context;
use crate::counts::RawCounts;

/// Methylated fraction per read position for CG, CHG and CHH.
///
/// `None` marks a position with no calls in that context, which is
/// distinct from `Some(0.0)` (calls seen, none methylated).
#[derive(Clone, Debug, PartialEq)]
pub struct BiasProfile {
    fractions: [Vec<Option<f64>>; 3],
}

fn fraction(methylated: u64, unmethylated: u64) -> Option<f64> {
    let total = methylated + unmethylated;
    if total == 0 {
        None
    } else {
        Some(methylated as f64 / total as f64)
    }
}

impl BiasProfile {
    pub fn compute(counts: &RawCounts) -> Self {
        let fractions = Context::ALL.map(|context| {
            counts
                .methylated(context)
                .iter()
                .zip(counts.unmethylated(context).iter())
                .map(|(&m, &u)| fraction(m, u))
                .collect::<Vec<_>>()
        });
        BiasProfile { fractions }
    }

    pub fn read_len(&self) -> usize {
        self.fractions[0].len()
    }

    pub fn fractions(&self, context: Context) -> &[Option<f64>] {
        &self.fractions[context.index()]
    }

    /// Number of positions with data, per context
    pub fn covered_positions(&self, context: Context) -> usize {
        self.fractions(context).iter().filter(|f| f.is_some()).count()
    }
}
