//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------
use std::fmt;

use rand::Rng;

/// A reference sequence (chromosome) as listed in the alignment header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub length: u64,
}

/// Single-base, 0-based half-open interval [start, end) with end = start + 1
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
}

impl Coordinate {
    pub fn new(chromosome: &str, start: u64) -> Self {
        Coordinate { chromosome: chromosome.to_string(), start, end: start + 1 }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

/// Draws random single-base coordinates over a set of references.
///
/// A chromosome is picked uniformly from the list, then a position uniformly
/// within it. Coordinates are not de-duplicated.
pub struct RegionSampler {
    references: Vec<Reference>,
}

impl RegionSampler {
    /// Returns None if no reference has a position that could be drawn
    pub fn new(references: Vec<Reference>) -> Option<Self> {
        let references: Vec<Reference> = references.into_iter().filter(|r| r.length > 0).collect();
        if references.is_empty() {
            None
        } else {
            Some(RegionSampler { references })
        }
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Coordinate> {
        (0..n)
            .map(|_| {
                let reference = &self.references[rng.gen_range(0..self.references.len())];
                Coordinate::new(&reference.name, rng.gen_range(0..reference.length))
            })
            .collect()
    }
}
