//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------

// Decoding of per-base methylation call strings (Bismark XM style)

use std::fmt;

/// Number of indicator/count series tracked per read position:
/// cg, mcg, chg, mchg, chh, mchh
pub const N_SERIES: usize = 6;

/// Sequence context of a called cytosine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    CG,
    CHG,
    CHH,
}

impl Context {
    pub const ALL: [Context; 3] = [Context::CG, Context::CHG, Context::CHH];

    pub fn index(self) -> usize {
        match self {
            Context::CG => 0,
            Context::CHG => 1,
            Context::CHH => 2,
        }
    }

    // slot of the (context, state) pair within the six series
    pub fn series(self, methylated: bool) -> usize {
        2 * self.index() + methylated as usize
    }

    /// Row label used in reports and plots
    pub fn label(self) -> &'static str {
        match self {
            Context::CG => "mCG",
            Context::CHG => "mCHG",
            Context::CHH => "mCHH",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One position of a methylation call string
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallSymbol {
    Call { context: Context, methylated: bool },
    // anything that is not a cytosine call: '.', 'u', 'U', 'h', 'H', ...
    Other,
}

impl CallSymbol {
    pub fn from_byte(b: u8) -> Self {
        let (context, methylated) = match b {
            b'x' => (Context::CG, false),
            b'X' => (Context::CG, true),
            b'y' => (Context::CHG, false),
            b'Y' => (Context::CHG, true),
            b'z' => (Context::CHH, false),
            b'Z' => (Context::CHH, true),
            _ => return CallSymbol::Other,
        };
        CallSymbol::Call { context, methylated }
    }

    pub fn series(self) -> Option<usize> {
        match self {
            CallSymbol::Call { context, methylated } => Some(context.series(methylated)),
            CallSymbol::Other => None,
        }
    }
}

/// Six 0/1 indicator sequences for a single read, all of the same length
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallIndicators {
    series: [Vec<u8>; N_SERIES],
}

impl CallIndicators {
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn get(&self, context: Context, methylated: bool) -> &[u8] {
        &self.series[context.series(methylated)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.series.iter().map(|s| s.as_slice())
    }
}

/// Decode a call string into indicator sequences of exactly `read_len` positions.
///
/// Short call strings (soft-clipped or short reads) are padded with zeros.
/// Calls beyond `read_len` are dropped. Unrecognised symbols contribute to no series.
pub fn decode_calls(calls: &[u8], read_len: usize) -> CallIndicators {
    let mut series = [(); N_SERIES].map(|_| vec![0u8; read_len]);
    for (position, &b) in calls.iter().take(read_len).enumerate() {
        if let Some(s) = CallSymbol::from_byte(b).series() {
            series[s][position] = 1;
        }
    }
    CallIndicators { series }
}
