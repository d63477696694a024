//! Per-response binning into rating buckets or a satisfied/dissatisfied split.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analyzers::grade::Rating;
use crate::analyzers::neutral::NeutralSet;
use crate::analyzers::types::Distribution;
use crate::table::ResponseTable;

/// Responses at or above this value are positive in the binary split.
pub const POSITIVE_FROM: u8 = 4;
/// Responses at or below this value are negative in the binary split.
pub const NEGATIVE_UP_TO: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketMode {
    /// One bucket per non-neutral Likert value.
    #[default]
    FourWay,
    /// Positive (>= 4) against negative (<= 2).
    Binary,
}

/// Labels used for the binary split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryScheme {
    /// Puas / Tidak Puas
    #[default]
    Satisfaction,
    /// Faham / Tidak Faham
    Understanding,
}

impl BinaryScheme {
    pub fn positive_label(self) -> &'static str {
        match self {
            BinaryScheme::Satisfaction => "Puas",
            BinaryScheme::Understanding => "Faham",
        }
    }

    pub fn negative_label(self) -> &'static str {
        match self {
            BinaryScheme::Satisfaction => "Tidak Puas",
            BinaryScheme::Understanding => "Tidak Faham",
        }
    }
}

/// Count of responses per rating bucket.
///
/// Only the buckets whose Likert value is not neutral are present, so the
/// canonical neutral set `{3}` yields exactly four buckets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RatingCounts {
    counts: BTreeMap<Rating, usize>,
}

impl RatingCounts {
    /// Count for `rating`, or `None` if that bucket is not considered.
    pub fn get(&self, rating: Rating) -> Option<usize> {
        self.counts.get(&rating).copied()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Buckets in ascending rating order.
    pub fn iter(&self) -> impl Iterator<Item = (Rating, usize)> + '_ {
        self.counts.iter().map(|(rating, count)| (*rating, *count))
    }

    /// Adds `other` bucket-wise. Buckets missing on either side are kept.
    pub fn merge(&mut self, other: &RatingCounts) {
        for (rating, count) in other.iter() {
            *self.counts.entry(rating).or_default() += count;
        }
    }

    pub fn to_distribution(&self) -> Distribution {
        Distribution::from_counts(
            BucketMode::FourWay,
            self.iter().map(|(rating, count)| (rating.label().to_string(), count)),
        )
    }
}

/// Counts every present, non-neutral cell of `table` per Likert value.
///
/// Counting is over the whole table (rows and columns), not per row.
pub fn rating_counts(table: &ResponseTable, neutral: &NeutralSet) -> RatingCounts {
    let mut counts: BTreeMap<Rating, usize> = Rating::ALL
        .into_iter()
        .filter(|rating| !neutral.contains(&rating.likert_value()))
        .map(|rating| (rating, 0))
        .collect();

    for value in table.values() {
        if neutral.contains(&value) {
            continue;
        }
        if let Some(rating) = Rating::from_likert(value) {
            *counts.entry(rating).or_default() += 1;
        }
    }

    RatingCounts { counts }
}

/// Positive (>= 4) and negative (<= 2) response counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BinaryCounts {
    pub negative: usize,
    pub positive: usize,
}

impl BinaryCounts {
    pub fn total(&self) -> usize {
        self.negative + self.positive
    }

    pub fn merge(&mut self, other: &BinaryCounts) {
        self.negative += other.negative;
        self.positive += other.positive;
    }

    /// Negative bucket first, then positive.
    pub fn to_distribution(&self, scheme: BinaryScheme) -> Distribution {
        Distribution::from_counts(
            BucketMode::Binary,
            [
                (scheme.negative_label().to_string(), self.negative),
                (scheme.positive_label().to_string(), self.positive),
            ],
        )
    }
}

/// Splits present, non-neutral cells into positive and negative counts.
///
/// Value 3 falls in neither side.
pub fn binary_counts(table: &ResponseTable, neutral: &NeutralSet) -> BinaryCounts {
    table
        .values()
        .filter(|value| !neutral.contains(value))
        .fold(BinaryCounts::default(), |mut acc, value| {
            if value >= POSITIVE_FROM {
                acc.positive += 1;
            } else if value <= NEGATIVE_UP_TO {
                acc.negative += 1;
            }
            acc
        })
}
