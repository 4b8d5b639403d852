//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------

// Alignment store collaborator: anything that can list its
// references and return the reads overlapping a coordinate

use log::debug;
use rust_htslib::{bam, bam::Read, bam::record::Aux};

use crate::error::{MbiasError, Result};
use crate::regions::{Coordinate, Reference};

/// Bismark's per-base methylation call tag
pub const DEFAULT_CALL_TAG: &str = "XM";

pub trait AnnotatedRead {
    /// The methylation call string stored under `tag`, if the read carries one
    fn methylation_calls(&self, tag: &[u8]) -> Option<&[u8]>;
}

pub trait AlignmentStore {
    type Read: AnnotatedRead;

    /// Where the store was opened from, for diagnostics
    fn location(&self) -> String;
    fn has_index(&self) -> bool;
    fn references(&self) -> Vec<Reference>;
    fn fetch(&mut self, coordinate: &Coordinate) -> Result<Vec<Self::Read>>;
}

impl AnnotatedRead for bam::Record {
    fn methylation_calls(&self, tag: &[u8]) -> Option<&[u8]> {
        match self.aux(tag) {
            Ok(Aux::String(calls)) => Some(calls.as_bytes()),
            _ => None,
        }
    }
}

/// A coordinate-sorted BAM file, queried through its index
pub struct BamStore {
    path: String,
    references: Vec<Reference>,
    indexed: Option<bam::IndexedReader>,
}

impl BamStore {
    pub fn from_path(path: &str) -> Result<Self> {
        // the plain reader gives us the header even when there is no index
        let reader = bam::Reader::from_path(path)?;
        let header = reader.header();
        let references = (0..header.target_count())
            .map(|tid| Reference {
                name: String::from_utf8_lossy(header.tid2name(tid)).to_string(),
                length: header.target_len(tid).unwrap_or(0),
            })
            .collect();

        let indexed = match bam::IndexedReader::from_path(path) {
            Ok(r) => Some(r),
            Err(e) => {
                debug!("could not load index for {}: {}", path, e);
                None
            }
        };

        Ok(BamStore { path: path.to_string(), references, indexed })
    }
}

impl AlignmentStore for BamStore {
    type Read = bam::Record;

    fn location(&self) -> String {
        self.path.clone()
    }

    fn has_index(&self) -> bool {
        self.indexed.is_some()
    }

    fn references(&self) -> Vec<Reference> {
        self.references.clone()
    }

    fn fetch(&mut self, coordinate: &Coordinate) -> Result<Vec<bam::Record>> {
        let path = &self.path;
        let reader = self.indexed.as_mut().ok_or_else(|| MbiasError::MissingIndex { path: path.clone() })?;
        reader.fetch((coordinate.chromosome.as_str(), coordinate.start as i64, coordinate.end as i64))?;

        let mut reads = Vec::new();
        for r in reader.records() {
            reads.push(r?);
        }
        Ok(reads)
    }
}
