//---------------------------------------------------------
// Copyright 2021 Ontario Institute for Cancer Research
// Written by Jared Simpson (jared.simpson@oicr.on.ca)
//---------------------------------------------------------

// Sampling driver: random coordinates -> reads -> position counts

use log::{debug, info, warn};
use rand::Rng;

use crate::calls::decode_calls;
use crate::counts::{PositionAggregator, RawCounts};
use crate::error::{MbiasError, Result};
use crate::regions::{Coordinate, RegionSampler};
use crate::store::{AlignmentStore, AnnotatedRead, DEFAULT_CALL_TAG};

/// Candidate coordinates drawn per requested read; many single-base
/// coordinates have no overlapping reads
pub const OVERSAMPLING_FACTOR: usize = 2;

pub const DEFAULT_TARGET_READS: usize = 500_000;
pub const DEFAULT_READ_LENGTH: usize = 116;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileConfig {
    pub target_reads: usize,
    pub read_len: usize,
    pub tag: String,
    pub seed: Option<u64>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            target_reads: DEFAULT_TARGET_READS,
            read_len: DEFAULT_READ_LENGTH,
            tag: DEFAULT_CALL_TAG.to_string(),
            seed: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingState {
    Sampling { remaining: usize },
    // target number of reads folded
    Done,
    // candidate coordinates ran out first
    Exhausted,
}

impl SamplingState {
    pub fn start(target_reads: usize) -> Self {
        if target_reads == 0 {
            SamplingState::Done
        } else {
            SamplingState::Sampling { remaining: target_reads }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SamplingState::Sampling { .. })
    }
}

/// Fold every annotated read fetched for one coordinate.
///
/// Each read carrying a call string counts toward the target; reads without
/// one are skipped. Stops in the middle of the reads once the target is hit.
pub fn process_coordinate<'r, R, I>(
    state: SamplingState,
    reads: I,
    tag: &[u8],
    aggregator: &mut PositionAggregator,
) -> SamplingState
where
    R: AnnotatedRead + 'r,
    I: IntoIterator<Item = &'r R>,
{
    let mut remaining = match state {
        SamplingState::Sampling { remaining } => remaining,
        terminal => return terminal,
    };

    let read_len = aggregator.counts().read_len();
    for read in reads {
        let calls = match read.methylation_calls(tag) {
            Some(calls) => calls,
            None => {
                debug!("skipping read without methylation call tag");
                continue;
            }
        };
        if calls.len() > read_len {
            debug!("truncating call string of length {} to {}", calls.len(), read_len);
        }

        aggregator.fold(&decode_calls(calls, read_len));
        remaining -= 1;
        if remaining == 0 {
            return SamplingState::Done;
        }
    }
    SamplingState::Sampling { remaining }
}

/// Summary of one sampling run
#[derive(Clone, Debug)]
pub struct SamplingRun {
    pub counts: RawCounts,
    pub state: SamplingState,
    pub reads_requested: usize,
    pub reads_folded: usize,
    pub coordinates_visited: usize,
}

impl SamplingRun {
    pub fn is_undersampled(&self) -> bool {
        self.state == SamplingState::Exhausted
    }
}

pub struct SamplingDriver<'a, S: AlignmentStore> {
    store: &'a mut S,
    config: &'a ProfileConfig,
}

impl<'a, S: AlignmentStore> SamplingDriver<'a, S> {
    pub fn new(store: &'a mut S, config: &'a ProfileConfig) -> Self {
        SamplingDriver { store, config }
    }

    /// Sample `OVERSAMPLING_FACTOR * target_reads` coordinates and fold their reads
    pub fn run<G: Rng + ?Sized>(&mut self, rng: &mut G) -> Result<SamplingRun> {
        self.check()?;
        let sampler = RegionSampler::new(self.store.references())
            .ok_or_else(|| MbiasError::NoReferences { path: self.store.location() })?;

        let n_coordinates = self.config.target_reads * OVERSAMPLING_FACTOR;
        let coordinates = sampler.sample(rng, n_coordinates);
        info!(
            "sampled {} coordinates over {} references",
            coordinates.len(),
            sampler.references().len()
        );
        self.run_coordinates(coordinates)
    }

    /// Fold reads overlapping the given coordinates, in order, until the
    /// target is reached or the coordinates are used up
    pub fn run_coordinates<I>(&mut self, coordinates: I) -> Result<SamplingRun>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        self.check()?;
        if self.config.read_len == 0 {
            return Err(MbiasError::InvalidReadLength);
        }

        let tag = self.config.tag.as_bytes();
        let mut aggregator = PositionAggregator::new(self.config.read_len);
        let mut state = SamplingState::start(self.config.target_reads);
        let mut coordinates_visited = 0;

        let mut coordinates = coordinates.into_iter();
        while !state.is_terminal() {
            state = match coordinates.next() {
                Some(coordinate) => {
                    let reads = self.store.fetch(&coordinate)?;
                    debug!("{}: {} reads", coordinate, reads.len());
                    coordinates_visited += 1;
                    process_coordinate(state, reads.iter(), tag, &mut aggregator)
                }
                None => SamplingState::Exhausted,
            };
        }

        let reads_folded = aggregator.reads_folded();
        if state == SamplingState::Exhausted {
            warn!(
                "candidate coordinates exhausted after {} of {} requested reads",
                reads_folded, self.config.target_reads
            );
        }
        info!(
            "sampling finished ({:?}): {} reads from {} coordinates, {} calls",
            state,
            reads_folded,
            coordinates_visited,
            aggregator.counts().total_calls()
        );

        Ok(SamplingRun {
            counts: aggregator.into_counts(),
            state,
            reads_requested: self.config.target_reads,
            reads_folded,
            coordinates_visited,
        })
    }

    fn check(&self) -> Result<()> {
        if self.store.has_index() {
            Ok(())
        } else {
            Err(MbiasError::MissingIndex { path: self.store.location() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bias::BiasProfile;
    use crate::calls::Context;
    use crate::regions::Reference;
    use crate::store::tests::{write_bam, TestBam};
    use crate::store::BamStore;
    use mockall::mock;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[derive(Clone, Debug)]
    pub struct FakeRead(Option<String>);

    impl AnnotatedRead for FakeRead {
        fn methylation_calls(&self, _tag: &[u8]) -> Option<&[u8]> {
            self.0.as_ref().map(|s| s.as_bytes())
        }
    }

    fn annotated(calls: &str) -> FakeRead {
        FakeRead(Some(calls.to_string()))
    }

    mock! {
        pub Store {}
        impl AlignmentStore for Store {
            type Read = FakeRead;
            fn location(&self) -> String;
            fn has_index(&self) -> bool;
            fn references(&self) -> Vec<Reference>;
            fn fetch(&mut self, coordinate: &Coordinate) -> Result<Vec<<Self as AlignmentStore>::Read>>;
        }
    }

    fn config(target_reads: usize, read_len: usize) -> ProfileConfig {
        ProfileConfig { target_reads, read_len, ..ProfileConfig::default() }
    }

    fn indexed_store() -> MockStore {
        let mut store = MockStore::new();
        store.expect_has_index().return_const(true);
        store.expect_location().return_const("mock.bam".to_string());
        store
            .expect_references()
            .returning(|| vec![Reference { name: "chr1".to_string(), length: 100 }]);
        store
    }

    fn coordinates(n: usize) -> Vec<Coordinate> {
        (0..n as u64).map(|i| Coordinate::new("chr1", i)).collect()
    }

    #[test]
    fn step_ignores_terminal_states() {
        let mut agg = PositionAggregator::new(4);
        let reads = vec![annotated("XXXX")];
        assert_eq!(process_coordinate(SamplingState::Done, reads.iter(), b"XM", &mut agg), SamplingState::Done);
        assert_eq!(
            process_coordinate(SamplingState::Exhausted, reads.iter(), b"XM", &mut agg),
            SamplingState::Exhausted
        );
        assert_eq!(agg.reads_folded(), 0);
    }

    #[test]
    fn step_folds_every_read_at_a_coordinate() {
        let mut agg = PositionAggregator::new(3);
        let reads = vec![annotated("X.."), annotated("x.."), annotated("X.Z")];
        let state = process_coordinate(SamplingState::Sampling { remaining: 10 }, reads.iter(), b"XM", &mut agg);
        assert_eq!(state, SamplingState::Sampling { remaining: 7 });
        assert_eq!(agg.counts().methylated(Context::CG), &[2, 0, 0]);
        assert_eq!(agg.counts().unmethylated(Context::CG), &[1, 0, 0]);
        assert_eq!(agg.counts().methylated(Context::CHH), &[0, 0, 1]);
    }

    #[test]
    fn step_stops_as_soon_as_target_is_reached() {
        let mut agg = PositionAggregator::new(2);
        let reads = vec![annotated("XX"), annotated("XX"), annotated("XX")];
        let state = process_coordinate(SamplingState::Sampling { remaining: 2 }, reads.iter(), b"XM", &mut agg);
        assert_eq!(state, SamplingState::Done);
        assert_eq!(agg.reads_folded(), 2);
        assert_eq!(agg.counts().methylated(Context::CG), &[2, 2]);
    }

    #[test]
    fn step_skips_reads_without_calls() {
        let mut agg = PositionAggregator::new(2);
        let reads = vec![FakeRead(None), annotated("zZ"), FakeRead(None)];
        let state = process_coordinate(SamplingState::Sampling { remaining: 5 }, reads.iter(), b"XM", &mut agg);
        assert_eq!(state, SamplingState::Sampling { remaining: 4 });
        assert_eq!(agg.reads_folded(), 1);
    }

    #[test]
    fn done_after_target_reads() {
        // nothing at the first four coordinates, one read at each of the next ones
        let mut store = indexed_store();
        let mut calls = 0;
        store.expect_fetch().times(7).returning(move |_| {
            calls += 1;
            if calls <= 4 {
                Ok(vec![])
            } else {
                Ok(vec![annotated("xX")])
            }
        });

        let config = config(3, 2);
        let run = SamplingDriver::new(&mut store, &config).run_coordinates(coordinates(10)).unwrap();
        assert_eq!(run.state, SamplingState::Done);
        assert_eq!(run.coordinates_visited, 7);
        assert_eq!(run.reads_folded, 3);
        assert!(!run.is_undersampled());
        assert_eq!(run.counts.unmethylated(Context::CG), &[3, 0]);
        assert_eq!(run.counts.methylated(Context::CG), &[0, 3]);
    }

    #[test]
    fn exhausted_when_no_reads_found() {
        let mut store = indexed_store();
        store.expect_fetch().times(10).returning(|_| Ok(vec![]));

        let config = config(5, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let run = SamplingDriver::new(&mut store, &config).run(&mut rng).unwrap();
        assert_eq!(run.state, SamplingState::Exhausted);
        assert!(run.is_undersampled());
        assert_eq!(run.coordinates_visited, 10);
        assert_eq!(run.reads_folded, 0);
        assert_eq!(run.counts, RawCounts::new(6));

        let profile = BiasProfile::compute(&run.counts);
        for ctx in Context::ALL.iter() {
            assert!(profile.fractions(*ctx).iter().all(|f| f.is_none()));
        }
    }

    #[test]
    fn exhausted_keeps_partial_counts() {
        let mut store = indexed_store();
        store.expect_fetch().times(4).returning(|c| {
            if c.start == 2 {
                Ok(vec![annotated("Y")])
            } else {
                Ok(vec![])
            }
        });

        let config = config(5, 1);
        let run = SamplingDriver::new(&mut store, &config).run_coordinates(coordinates(4)).unwrap();
        assert_eq!(run.state, SamplingState::Exhausted);
        assert_eq!(run.reads_folded, 1);
        assert_eq!(run.counts.methylated(Context::CHG), &[1]);
    }

    #[test]
    fn missing_index_fails_before_fetching() {
        let mut store = MockStore::new();
        store.expect_has_index().return_const(false);
        store.expect_location().return_const("unindexed.bam".to_string());
        store.expect_references().never();
        store.expect_fetch().never();

        let config = config(5, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        match SamplingDriver::new(&mut store, &config).run(&mut rng) {
            Err(MbiasError::MissingIndex { path }) => assert_eq!(path, "unindexed.bam"),
            other => panic!("expected MissingIndex, got {:?}", other.map(|r| r.state)),
        }
    }

    #[test]
    fn no_references() {
        let mut store = MockStore::new();
        store.expect_has_index().return_const(true);
        store.expect_location().return_const("empty.bam".to_string());
        store.expect_references().returning(Vec::new);
        store.expect_fetch().never();

        let config = config(5, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let result = SamplingDriver::new(&mut store, &config).run(&mut rng);
        assert!(matches!(result, Err(MbiasError::NoReferences { .. })));
    }

    #[test]
    fn zero_read_length_is_rejected() {
        let mut store = indexed_store();
        store.expect_fetch().never();
        let config = config(5, 0);
        let result = SamplingDriver::new(&mut store, &config).run_coordinates(coordinates(3));
        assert!(matches!(result, Err(MbiasError::InvalidReadLength)));
    }

    #[test]
    fn zero_target_is_done_immediately() {
        let mut store = indexed_store();
        store.expect_fetch().never();
        let config = config(0, 4);
        let run = SamplingDriver::new(&mut store, &config).run_coordinates(coordinates(3)).unwrap();
        assert_eq!(run.state, SamplingState::Done);
        assert_eq!(run.coordinates_visited, 0);
    }

    #[test]
    fn profile_from_indexed_bam() {
        let dir = tempfile::tempdir().unwrap();
        let input = TestBam { name: "chr1".to_string(), length: 10, reads: vec![(0, 10, Some("xXyYzZ...."))] };
        let path = write_bam(dir.path(), &input, true);

        let mut store = BamStore::from_path(&path).unwrap();
        let config = config(1, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let run = SamplingDriver::new(&mut store, &config).run(&mut rng).unwrap();

        // every position of the only chromosome is covered by the read
        assert_eq!(run.state, SamplingState::Done);
        assert_eq!(run.coordinates_visited, 1);
        assert_eq!(run.counts.unmethylated(Context::CG), &[1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(run.counts.methylated(Context::CHH), &[0, 0, 0, 0, 0, 1, 0, 0, 0, 0]);

        let profile = BiasProfile::compute(&run.counts);
        assert_eq!(profile.fractions(Context::CG)[0], Some(0.0));
        assert_eq!(profile.fractions(Context::CG)[1], Some(1.0));
        assert_eq!(profile.fractions(Context::CG)[2], None);
    }

    #[test]
    fn unindexed_bam_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = TestBam { name: "chr1".to_string(), length: 10, reads: vec![(0, 10, Some("xXyYzZ...."))] };
        let path = write_bam(dir.path(), &input, false);

        let mut store = BamStore::from_path(&path).unwrap();
        let config = config(1, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let result = SamplingDriver::new(&mut store, &config).run(&mut rng);
        assert!(matches!(result, Err(MbiasError::MissingIndex { .. })));
    }
}
