//! Result tables handed to the renderer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::average::GroupBy;
use crate::analyzers::bucket::BucketMode;
use crate::analyzers::grade::{Fulfillment, GaugeRating, Rating};
use crate::analyzers::utility::pct;

/// One bucket of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketShare {
    pub label: String,
    pub count: usize,
    pub percentage: f64,
}

/// Bucket counts with their share of the distribution total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub mode: BucketMode,
    pub total: usize,
    pub buckets: Vec<BucketShare>,
}

impl Distribution {
    /// Derives percentages from counts. The total is the sum of these
    /// counts only; a zero total gives 0% for every bucket.
    pub fn from_counts<I>(mode: BucketMode, counts: I) -> Self
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let counts: Vec<(String, usize)> = counts.into_iter().collect();
        let total: usize = counts.iter().map(|(_, count)| count).sum();

        Distribution {
            mode,
            total,
            buckets: counts
                .into_iter()
                .map(|(label, count)| BucketShare {
                    label,
                    count,
                    percentage: pct(count, total),
                })
                .collect(),
        }
    }

    pub fn bucket(&self, label: &str) -> Option<&BucketShare> {
        self.buckets.iter().find(|b| b.label == label)
    }

    /// Percentage of `label`, 0.0 when the bucket is absent.
    pub fn percentage(&self, label: &str) -> f64 {
        self.bucket(label).map_or(0.0, |b| b.percentage)
    }
}

/// Mean score of one group, annotated with its rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageRow {
    pub respondent: Option<String>,
    pub category: Option<String>,
    pub question: Option<String>,
    /// Short column code (`a`, `b`, ...) for per-column rows.
    pub indicator: Option<String>,
    pub average: f64,
    pub responses: usize,
    pub rating: Rating,
    pub gauge: GaugeRating,
}

/// Average rows together with the grouping actually applied.
///
/// `group_by` is `None` for the per-column view, including when the
/// requested grouping was not available in the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageTable {
    pub group_by: Option<GroupBy>,
    pub rows: Vec<AverageRow>,
}

/// Everything the renderer needs for one response table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub respondents: usize,
    /// Present cells before neutral exclusion.
    pub responses: usize,
    pub neutral_excluded: usize,
    pub distribution: Distribution,
    /// Share of positive answers among positive + negative ones.
    pub satisfied_pct: f64,
    pub overall_average: Option<f64>,
    pub overall_rating: Option<Rating>,
    pub fulfillment: Option<Fulfillment>,
    pub averages: AverageTable,
}

/// Mean of the scores sharing one attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreGroup {
    pub group: String,
    pub average: f64,
    pub records: usize,
    pub rating: Rating,
    pub gauge: GaugeRating,
    pub fulfillment: Fulfillment,
}

/// Aggregate of a long-format score export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub score_column: String,
    /// `None` when no grouping was asked for or the column is absent.
    pub group_by: Option<String>,
    /// Rows left after filtering, scored or not.
    pub records: usize,
    pub overall_average: Option<f64>,
    pub overall_rating: Option<Rating>,
    pub fulfillment: Option<Fulfillment>,
    pub groups: Vec<ScoreGroup>,
}

/// Aggregate of one input file within a criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub label: String,
    pub path: String,
    pub report: AggregateReport,
    /// Per-group averages, for long-format score exports only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreReport>,
}

/// Combined result of all sources of one accreditation criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionReport {
    pub id: String,
    pub name: String,
    pub combined: Distribution,
    pub satisfied_pct: f64,
    pub overall_average: Option<f64>,
    pub overall_rating: Option<Rating>,
    /// Coarser rating of the overall average for the home-page gauge.
    pub gauge: Option<GaugeRating>,
    pub sources: Vec<SourceReport>,
}

/// Summary entry for the criteria index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    pub mode: BucketMode,
    pub total: usize,
    pub satisfied_pct: f64,
    pub overall_average: Option<f64>,
    pub overall_rating: Option<Rating>,
    pub gauge: Option<GaugeRating>,
}

/// Top-level index of all criteria, written as `index.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyIndex {
    pub generated_at: DateTime<Utc>,
    pub criteria: Vec<IndexEntry>,
}
