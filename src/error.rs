//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MbiasError {
    #[error("bam file {path} is not indexed (run samtools index)")]
    MissingIndex { path: String },
    #[error("bam file {path} has no reference sequences of positive length")]
    NoReferences { path: String },
    #[error("read length must be at least 1")]
    InvalidReadLength,
    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MbiasError>;
