//! Bucket-restricted Hamming nearest-neighbour matching.

use crate::extract::Feature;
use crate::index::ReferenceIndex;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Matcher parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    /// Largest accepted Hamming distance (of 256 bits).
    pub max_hamming: u32,
}

impl Default for MatcherParams {
    fn default() -> Self {
        Self { max_hamming: 46 }
    }
}

/// Query feature `query_idx` matched to reference feature `train_idx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: u32,
    pub distance: u32,
}

/// One-way matcher against a borrowed reference index.
///
/// Each query feature matches at most once; a reference feature can be hit
/// by any number of queries.
#[derive(Clone, Copy, Debug)]
pub struct Matcher<'a> {
    index: &'a ReferenceIndex,
    max_hamming: u32,
}

impl<'a> Matcher<'a> {
    pub fn new(index: &'a ReferenceIndex, params: &MatcherParams) -> Self {
        Self {
            index,
            max_hamming: params.max_hamming,
        }
    }

    /// Best candidate from the query's own bucket, if close enough.
    ///
    /// Equal distances keep the candidate stored first in the bucket.
    pub fn match_feature(&self, query_idx: usize, query: &Feature) -> Option<Match> {
        let features = self.index.features();
        let mut best: Option<(u32, u32)> = None;
        for &train_idx in self.index.bucket(query.bucket) {
            let Some(train) = features.get(train_idx as usize) else {
                continue;
            };
            let d = query.descriptor.distance(&train.descriptor);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((train_idx, d));
            }
        }
        let (train_idx, distance) = best?;
        (distance <= self.max_hamming).then_some(Match {
            query_idx,
            train_idx,
            distance,
        })
    }

    /// Match every query feature; `query_idx` is the position in `queries`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(queries = queries.len()))
    )]
    pub fn match_all(&self, queries: &[Feature]) -> Vec<Match> {
        let matches: Vec<Match> = queries
            .iter()
            .enumerate()
            .filter_map(|(i, q)| self.match_feature(i, q))
            .collect();
        log::trace!("matched {}/{} features", matches.len(), queries.len());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TargetSize;
    use crate::Descriptor;

    fn feature(words: [u32; 8], bucket: u16) -> Feature {
        Feature {
            descriptor: Descriptor(words),
            x: 20,
            y: 20,
            bucket,
        }
    }

    /// Descriptor with the lowest `n` bits set.
    fn low_bits(n: usize) -> [u32; 8] {
        let mut d = Descriptor::default();
        for i in 0..n {
            d.set_bit(i);
        }
        d.0
    }

    fn index(features: Vec<Feature>) -> ReferenceIndex {
        ReferenceIndex::from_features(TargetSize { width: 100, height: 100 }, features)
            .expect("valid")
    }

    #[test]
    fn picks_minimum_within_bucket() {
        let idx = index(vec![
            feature(low_bits(10), 4),
            feature(low_bits(3), 4),
            feature(low_bits(0), 5), // closer, but in another bucket
        ]);
        let m = Matcher::new(&idx, &MatcherParams::default());
        let hit = m.match_feature(7, &feature(low_bits(0), 4)).expect("match");
        assert_eq!(hit, Match { query_idx: 7, train_idx: 1, distance: 3 });
    }

    #[test]
    fn ties_keep_lowest_stored_index() {
        let mut a = low_bits(0);
        a[0] = 0b11;
        let mut b = low_bits(0);
        b[1] = 0b11;
        let idx = index(vec![feature(b, 9), feature(a, 9)]);
        let m = Matcher::new(&idx, &MatcherParams::default());
        let hit = m.match_feature(0, &feature(low_bits(0), 9)).expect("match");
        assert_eq!(hit.train_idx, 0);
        assert_eq!(hit.distance, 2);
    }

    #[test]
    fn threshold_is_inclusive_and_never_exceeded() {
        let idx = index(vec![feature(low_bits(46), 1), feature(low_bits(47), 2)]);
        let m = Matcher::new(&idx, &MatcherParams::default());
        let q = low_bits(0);
        assert_eq!(m.match_feature(0, &feature(q, 1)).map(|h| h.distance), Some(46));
        assert!(m.match_feature(0, &feature(q, 2)).is_none());

        let queries: Vec<Feature> = (0..80).map(|n| feature(low_bits(n), 1)).collect();
        let all = m.match_all(&queries);
        assert!(all.iter().all(|h| h.distance <= 46));
        assert!(!all.is_empty());
    }

    #[test]
    fn empty_bucket_never_matches() {
        let idx = index(vec![feature(low_bits(0), 1)]);
        let m = Matcher::new(&idx, &MatcherParams::default());
        assert!(m.match_feature(0, &feature(low_bits(0), 2)).is_none());
    }

    #[test]
    fn many_queries_may_hit_one_reference() {
        let idx = index(vec![feature(low_bits(0), 3)]);
        let m = Matcher::new(&idx, &MatcherParams::default());
        let queries = vec![feature(low_bits(1), 3), feature(low_bits(2), 3)];
        let all = m.match_all(&queries);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|h| h.train_idx == 0));
        assert_eq!(all[1].query_idx, 1);
    }
}
