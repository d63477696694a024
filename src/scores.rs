//! Long-format score exports.
//!
//! Some evaluations are exported one row per rated item instead of one row
//! per respondent: attribute columns (academic year, lecturer, course,
//! competency) followed by an already averaged numeric score.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SurveyError};
use crate::parser::whole_likert;
use crate::table::ResponseTable;

/// Columns to read from a long-format export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreLoadOptions {
    pub score_column: String,
    /// Attribute columns kept for filtering and grouping, in this order.
    pub attribute_columns: Vec<String>,
}

/// One rated item: its attribute values and its score, if numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRow {
    pub values: Vec<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreTable {
    score_column: String,
    attributes: Vec<String>,
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    /// Rows are padded with empty values (or truncated) to the attribute count.
    pub fn new(score_column: &str, attributes: Vec<String>, rows: Vec<ScoreRow>) -> Self {
        let width = attributes.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.values.resize(width, String::new());
                row
            })
            .collect();

        Self {
            score_column: score_column.to_string(),
            attributes,
            rows,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn score_column(&self) -> &str {
        &self.score_column
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_index(name).is_some()
    }

    fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a == name)
    }

    /// Value of attribute `name` in `row`.
    pub fn attribute(&self, row: usize, name: &str) -> Option<&str> {
        let index = self.attribute_index(name)?;
        self.rows.get(row).map(|r| r.values[index].as_str())
    }

    /// Sorted, de-duplicated values of attribute `name`. Empty for an unknown column.
    pub fn options(&self, name: &str) -> Vec<String> {
        let Some(index) = self.attribute_index(name) else {
            return Vec::new();
        };
        let set: BTreeSet<&str> = self.rows.iter().map(|r| r.values[index].as_str()).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Keeps the rows whose value of attribute `name` satisfies `keep`.
    /// An unknown column keeps every row.
    pub fn select<F>(&self, name: &str, keep: F) -> ScoreTable
    where
        F: Fn(&str) -> bool,
    {
        let Some(index) = self.attribute_index(name) else {
            return self.clone();
        };
        ScoreTable {
            score_column: self.score_column.clone(),
            attributes: self.attributes.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(&r.values[index]))
                .cloned()
                .collect(),
        }
    }

    /// Every numeric score.
    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().filter_map(|r| r.score)
    }

    /// One-column response table of the scores that are whole Likert values,
    /// so the export can join the bucket counts of its criterion.
    pub fn to_response_table(&self) -> ResponseTable {
        if self.rows.is_empty() {
            return ResponseTable::empty();
        }
        ResponseTable::new(
            vec![self.score_column.clone()],
            self.rows
                .iter()
                .map(|r| vec![r.score.and_then(whole_likert)])
                .collect(),
        )
    }
}

/// A numeric score: trimmed, parsed as a finite number.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_scores(path: &Path, options: &ScoreLoadOptions) -> Result<ScoreTable> {
    let file = File::open(path).map_err(|source| SurveyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_scores(file, options, path)
}

/// Like [`load_scores`], but a failure is logged and yields an empty table.
pub fn load_scores_or_empty(path: &Path, options: &ScoreLoadOptions) -> ScoreTable {
    match load_scores(path, options) {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Score file not loaded, using empty table");
            ScoreTable::empty()
        }
    }
}

pub fn parse_scores<R: Read>(reader: R, options: &ScoreLoadOptions) -> Result<ScoreTable> {
    read_scores(reader, options, Path::new("<reader>"))
}

fn read_scores<R: Read>(reader: R, options: &ScoreLoadOptions, path: &Path) -> Result<ScoreTable> {
    let csv_err = |source: csv::Error| SurveyError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SurveyError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };

    let score_index = column(&options.score_column)?;
    let attribute_indices = options
        .attribute_columns
        .iter()
        .map(|name| column(name))
        .collect::<Result<Vec<usize>>>()?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        rows.push(ScoreRow {
            values: attribute_indices
                .iter()
                .map(|&i| record.get(i).unwrap_or("").to_string())
                .collect(),
            score: record.get(score_index).and_then(parse_score),
        });
    }

    let table = ScoreTable::new(&options.score_column, options.attribute_columns.clone(), rows);
    debug!(
        rows = table.len(),
        scored = table.scores().count(),
        "Score table loaded"
    );
    Ok(table)
}
