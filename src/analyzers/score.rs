//! Averages of long-format score exports.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::analyzers::grade::{categorize, fulfillment, gauge_rating};
use crate::analyzers::types::{ScoreGroup, ScoreReport};
use crate::analyzers::utility::mean;
use crate::scores::ScoreTable;

/// Mean score per value of `group_column`, groups in sorted order.
///
/// Rows without a numeric score are skipped, and so are groups left with
/// none. An unknown column yields no groups.
pub fn score_averages(table: &ScoreTable, group_column: &str) -> Vec<ScoreGroup> {
    if !table.has_attribute(group_column) {
        warn!(column = %group_column, "Score table has no such attribute, no groups");
        return Vec::new();
    }

    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (index, row) in table.rows().iter().enumerate() {
        let (Some(score), Some(group)) = (row.score, table.attribute(index, group_column)) else {
            continue;
        };
        groups.entry(group).or_default().push(score);
    }

    groups
        .into_iter()
        .filter_map(|(group, scores)| {
            let average = mean(&scores)?;
            Some(ScoreGroup {
                group: group.to_string(),
                average,
                records: scores.len(),
                rating: categorize(average),
                gauge: gauge_rating(average),
                fulfillment: fulfillment(average),
            })
        })
        .collect()
}

#[tracing::instrument(skip_all, fields(rows = table.len()))]
pub fn aggregate_scores(table: &ScoreTable, group_by: Option<&str>) -> ScoreReport {
    let scores: Vec<f64> = table.scores().collect();
    let overall_average = mean(&scores);

    let group_by = group_by.filter(|column| {
        let known = table.has_attribute(column);
        if !known {
            warn!(column = %column, "Score table has no such attribute, no groups");
        }
        known
    });
    let groups = group_by.map_or_else(Vec::new, |column| score_averages(table, column));

    debug!(
        scored = scores.len(),
        groups = groups.len(),
        "Scores aggregated"
    );

    ScoreReport {
        score_column: table.score_column().to_string(),
        group_by: group_by.map(String::from),
        records: table.len(),
        overall_average,
        overall_rating: overall_average.map(categorize),
        fulfillment: overall_average.map(fulfillment),
        groups,
    }
}
