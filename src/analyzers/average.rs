//! Mean scores, overall and per group.
//!
//! Missing cells never count: they are left out of both the sum and the
//! number of responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzers::grade::{categorize, gauge_rating};
use crate::analyzers::reshape::to_long;
use crate::analyzers::types::{AverageRow, AverageTable};
use crate::analyzers::utility::{indicator_code, mean};
use crate::table::ResponseTable;

/// Grouping key for [`averages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Respondent group (row attribute).
    Respondent,
    /// Category part of compound column labels.
    Category,
    /// Question part of the column labels, merged across categories.
    Question,
    CategoryQuestion,
    RespondentQuestion,
}

impl GroupBy {
    fn needs_respondents(self) -> bool {
        matches!(self, GroupBy::Respondent | GroupBy::RespondentQuestion)
    }

    fn needs_categories(self) -> bool {
        matches!(self, GroupBy::Category | GroupBy::CategoryQuestion)
    }
}

/// Mean of every present cell, `None` when there is none.
pub fn overall_average(table: &ResponseTable) -> Option<f64> {
    let (sum, count) = table
        .values()
        .fold((0u64, 0usize), |(sum, count), v| (sum + u64::from(v), count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Mean per column, in column order. Columns without any answer are skipped.
pub fn column_averages(table: &ResponseTable) -> Vec<AverageRow> {
    (0..table.column_count())
        .filter_map(|index| {
            let values: Vec<f64> = table.column_values(index).map(f64::from).collect();
            let average = mean(&values)?;
            let (category, question) = table.label_parts(index);
            Some(AverageRow {
                respondent: None,
                category: category.map(String::from),
                question: Some(question.to_string()),
                indicator: Some(indicator_code(index)),
                average,
                responses: values.len(),
                rating: categorize(average),
                gauge: gauge_rating(average),
            })
        })
        .collect()
}

/// Mean per group, groups in sorted key order.
///
/// Without a grouping, or when the table lacks the attribute the grouping
/// needs (no respondent column, no compound labels), the per-column view is
/// returned and [`AverageTable::group_by`] is `None`.
pub fn averages(table: &ResponseTable, group_by: Option<GroupBy>) -> AverageTable {
    let group_by = group_by.filter(|g| {
        if g.needs_respondents() && !table.has_respondents() {
            warn!(group_by = ?g, "No respondent column, falling back to per-question averages");
            return false;
        }
        if g.needs_categories() && !table.has_categories() {
            warn!(group_by = ?g, "No category labels, falling back to per-question averages");
            return false;
        }
        true
    });

    let Some(group_by) = group_by else {
        return AverageTable {
            group_by: None,
            rows: column_averages(table),
        };
    };

    type Key = (Option<String>, Option<String>, Option<String>);
    let mut groups: BTreeMap<Key, (u64, usize)> = BTreeMap::new();

    for record in to_long(table) {
        let Some(value) = record.value else {
            continue;
        };
        let key: Key = match group_by {
            GroupBy::Respondent => (record.respondent, None, None),
            GroupBy::Category => (None, record.category, None),
            GroupBy::Question => (None, None, Some(record.question)),
            GroupBy::CategoryQuestion => (None, record.category, Some(record.question)),
            GroupBy::RespondentQuestion => (record.respondent, None, Some(record.question)),
        };
        let entry = groups.entry(key).or_default();
        entry.0 += u64::from(value);
        entry.1 += 1;
    }

    let rows = groups
        .into_iter()
        .map(|((respondent, category, question), (sum, count))| {
            let average = sum as f64 / count as f64;
            AverageRow {
                respondent,
                category,
                question,
                indicator: None,
                average,
                responses: count,
                rating: categorize(average),
                gauge: gauge_rating(average),
            }
        })
        .collect();

    AverageTable {
        group_by: Some(group_by),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::grade::{GaugeRating, Rating};

    fn grouped_table() -> ResponseTable {
        ResponseTable::new(
            vec![
                "Pedagogik_a".into(),
                "Pedagogik_b".into(),
                "Kepegawaian_a".into(),
            ],
            vec![
                vec![Some(4), Some(5), Some(2)],
                vec![Some(2), None, Some(1)],
                vec![Some(5), Some(4), None],
            ],
        )
        .with_respondents(
            "Status",
            vec!["Dosen".into(), "Tendik".into(), "Dosen".into()],
        )
    }

    fn find<'a>(table: &'a AverageTable, pred: impl Fn(&AverageRow) -> bool) -> &'a AverageRow {
        table.rows.iter().find(|r| pred(r)).expect("row present")
    }

    #[test]
    fn test_overall_average_skips_missing() {
        // 4+5+2+2+1+5+4 = 23 over 7 answers
        let avg = overall_average(&grouped_table()).unwrap();
        assert!((avg - 23.0 / 7.0).abs() < 1e-9);
        assert_eq!(overall_average(&ResponseTable::empty()), None);
    }

    #[test]
    fn test_column_averages_carry_indicator_and_rating() {
        let rows = column_averages(&grouped_table());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].indicator.as_deref(), Some("a"));
        assert!((rows[0].average - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(rows[0].rating, Rating::Baik);
        assert_eq!(rows[1].responses, 2);
        assert_eq!(rows[1].rating, Rating::SangatBaik);
        assert_eq!(rows[2].category.as_deref(), Some("Kepegawaian"));
    }

    #[test]
    fn test_group_by_category() {
        let table = averages(&grouped_table(), Some(GroupBy::Category));
        assert_eq!(table.group_by, Some(GroupBy::Category));
        // sorted: Kepegawaian before Pedagogik
        assert_eq!(table.rows[0].category.as_deref(), Some("Kepegawaian"));
        assert!((table.rows[0].average - 1.5).abs() < 1e-9);
        assert_eq!(table.rows[0].rating, Rating::Kurang);
        assert_eq!(table.rows[0].gauge, GaugeRating::Cukup);
        assert_eq!(table.rows[1].gauge, GaugeRating::SangatBaik);
        assert!((table.rows[1].average - 4.0).abs() < 1e-9);
        assert_eq!(table.rows[1].responses, 5);
    }

    #[test]
    fn test_group_by_question_merges_categories() {
        let table = averages(&grouped_table(), Some(GroupBy::Question));
        let a = find(&table, |r| r.question.as_deref() == Some("a"));
        // 4,2,5 from Pedagogik_a plus 2,1 from Kepegawaian_a
        assert_eq!(a.responses, 5);
        assert!((a.average - 14.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_by_respondent_and_question() {
        let table = averages(&grouped_table(), Some(GroupBy::RespondentQuestion));
        let row = find(&table, |r| {
            r.respondent.as_deref() == Some("Dosen") && r.question.as_deref() == Some("b")
        });
        assert!((row.average - 4.5).abs() < 1e-9);
        assert_eq!(row.rating, Rating::SangatBaik);
    }

    #[test]
    fn test_group_by_category_question() {
        let table = averages(&grouped_table(), Some(GroupBy::CategoryQuestion));
        assert_eq!(table.rows.len(), 3);
        let row = find(&table, |r| {
            r.category.as_deref() == Some("Kepegawaian") && r.question.as_deref() == Some("a")
        });
        assert_eq!(row.responses, 2);
    }

    #[test]
    fn test_missing_respondent_column_falls_back() {
        let table = ResponseTable::new(vec!["q1".into()], vec![vec![Some(4)]]);
        let result = averages(&table, Some(GroupBy::Respondent));
        assert_eq!(result.group_by, None);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].indicator.as_deref(), Some("a"));
    }

    #[test]
    fn test_missing_categories_falls_back() {
        let table = ResponseTable::new(vec!["q1".into()], vec![vec![Some(4)]]);
        let result = averages(&table, Some(GroupBy::CategoryQuestion));
        assert_eq!(result.group_by, None);
    }

    #[test]
    fn test_empty_table_gives_no_rows() {
        let result = averages(&ResponseTable::empty(), Some(GroupBy::Question));
        assert!(result.rows.is_empty());
    }
}
