use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::average::{GroupBy, averages, overall_average};
use crate::analyzers::bucket::{
    BinaryCounts, BinaryScheme, BucketMode, RatingCounts, binary_counts, rating_counts,
};
use crate::analyzers::grade::{categorize, fulfillment};
use crate::analyzers::neutral::{NeutralSet, count_neutral, default_neutral, exclude_neutral};
use crate::analyzers::types::{AggregateReport, Distribution};
use crate::analyzers::utility::pct;
use crate::table::ResponseTable;

/// Knobs of the aggregation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// Values left out of bucket counts. Averages always use every answer.
    pub neutral_values: NeutralSet,
    pub group_by: Option<GroupBy>,
    pub bucket_mode: BucketMode,
    pub binary_scheme: BinaryScheme,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            neutral_values: default_neutral(),
            group_by: None,
            bucket_mode: BucketMode::default(),
            binary_scheme: BinaryScheme::default(),
        }
    }
}

/// Bucket counts of one table in the configured mode, before percentages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tally {
    FourWay(RatingCounts),
    Binary(BinaryCounts),
}

impl Tally {
    pub fn from_table(table: &ResponseTable, options: &AggregateOptions) -> Self {
        let filtered = exclude_neutral(table, &options.neutral_values);
        match options.bucket_mode {
            BucketMode::FourWay => Tally::FourWay(rating_counts(&filtered, &options.neutral_values)),
            BucketMode::Binary => Tally::Binary(binary_counts(&filtered, &options.neutral_values)),
        }
    }

    pub fn total(&self) -> usize {
        match self {
            Tally::FourWay(counts) => counts.total(),
            Tally::Binary(counts) => counts.total(),
        }
    }

    /// Adds another tally of the same mode; a tally of the other mode is ignored.
    pub fn merge(&mut self, other: &Tally) {
        match (self, other) {
            (Tally::FourWay(a), Tally::FourWay(b)) => a.merge(b),
            (Tally::Binary(a), Tally::Binary(b)) => a.merge(b),
            _ => debug!("Skipping merge of tallies with different bucket modes"),
        }
    }

    pub fn to_distribution(&self, scheme: BinaryScheme) -> Distribution {
        match self {
            Tally::FourWay(counts) => counts.to_distribution(),
            Tally::Binary(counts) => counts.to_distribution(scheme),
        }
    }
}

/// Runs the whole pipeline on one table.
///
/// Neutral answers are excluded before binning, the distribution follows
/// `bucket_mode`, and averages are taken over every present answer with the
/// requested grouping. The result depends only on the inputs.
pub fn aggregate(table: &ResponseTable, options: &AggregateOptions) -> AggregateReport {
    let neutral = &options.neutral_values;
    let distribution = Tally::from_table(table, options).to_distribution(options.binary_scheme);
    let binary = binary_counts(&exclude_neutral(table, neutral), neutral);
    let overall = overall_average(table);

    debug!(
        respondents = table.row_count(),
        counted = distribution.total,
        "Aggregated response table"
    );

    AggregateReport {
        respondents: table.row_count(),
        responses: table.present_count(),
        neutral_excluded: count_neutral(table, neutral),
        distribution,
        satisfied_pct: pct(binary.positive, binary.total()),
        overall_average: overall,
        overall_rating: overall.map(categorize),
        fulfillment: overall.map(fulfillment),
        averages: averages(table, options.group_by),
    }
}

/// Sums the bucket counts of several tables, then derives percentages.
pub fn combine(tables: &[ResponseTable], options: &AggregateOptions) -> Distribution {
    let mut tallies = tables.iter().map(|t| Tally::from_table(t, options));
    let empty = || Tally::from_table(&ResponseTable::empty(), options);

    let mut combined = tallies.next().unwrap_or_else(empty);
    for tally in tallies {
        combined.merge(&tally);
    }
    combined.to_distribution(options.binary_scheme)
}

/// Mean over every present answer of several tables.
pub fn combined_average(tables: &[ResponseTable]) -> Option<f64> {
    let (sum, count) = tables
        .iter()
        .flat_map(ResponseTable::values)
        .fold((0u64, 0usize), |(sum, count), v| (sum + u64::from(v), count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Positive share over several tables (positive / (positive + negative)).
pub fn combined_satisfied_pct(tables: &[ResponseTable], neutral: &NeutralSet) -> f64 {
    let mut counts = BinaryCounts::default();
    for table in tables {
        counts.merge(&binary_counts(table, neutral));
    }
    pct(counts.positive, counts.total())
}
