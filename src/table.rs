//! In-memory survey response table.
//!
//! One row per respondent, one column per question. Column labels may be
//! compound (`"<category><delimiter><question>"`) when the export had two
//! stacked header rows. Cells are Likert values in `1..=5` or absent.

use std::collections::BTreeSet;

/// Delimiter used to join two-row headers into a single label.
pub const DEFAULT_DELIMITER: &str = "_";

pub const LIKERT_MIN: u8 = 1;
pub const LIKERT_MAX: u8 = 5;

/// A cell value. `None` means missing, unparseable or excluded.
pub type Cell = Option<u8>;

/// Respondent attribute read from a dedicated column (e.g. "Dosen", "Tendik").
#[derive(Debug, Clone, PartialEq)]
struct Respondents {
    column: String,
    groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
    respondents: Option<Respondents>,
    delimiter: String,
}

impl Default for ResponseTable {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            respondents: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

impl ResponseTable {
    /// Builds a table; rows are padded with absent cells (or truncated) to
    /// the number of columns so the table is always rectangular.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        Self {
            columns,
            rows,
            ..Default::default()
        }
    }

    /// Table with no rows and no columns. Returned for load failures.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attaches the respondent attribute, one value per row.
    pub fn with_respondents(mut self, column: &str, mut groups: Vec<String>) -> Self {
        groups.resize(self.rows.len(), String::new());
        self.respondents = Some(Respondents {
            column: column.to_string(),
            groups,
        });
        self
    }

    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Every cell, row-major, including absent ones.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }

    /// Every present value, row-major.
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells().flatten()
    }

    pub fn present_count(&self) -> usize {
        self.values().count()
    }

    /// Present values of one column.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index).copied().flatten())
    }

    pub fn has_respondents(&self) -> bool {
        self.respondents.is_some()
    }

    pub fn respondent_column(&self) -> Option<&str> {
        self.respondents.as_ref().map(|r| r.column.as_str())
    }

    /// Respondent group of a row, when the table carries one.
    pub fn respondent(&self, row: usize) -> Option<&str> {
        self.respondents
            .as_ref()
            .and_then(|r| r.groups.get(row))
            .map(String::as_str)
    }

    /// Splits a column label into `(category, question)` on the first
    /// delimiter. Labels without the delimiter have no category.
    pub fn label_parts(&self, index: usize) -> (Option<&str>, &str) {
        let label = self.columns[index].as_str();
        split_label(label, &self.delimiter)
    }

    /// True when at least one column carries a compound label.
    pub fn has_categories(&self) -> bool {
        (0..self.columns.len()).any(|i| self.label_parts(i).0.is_some())
    }

    /// Sorted, de-duplicated categories found in the column labels.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = (0..self.columns.len())
            .filter_map(|i| self.label_parts(i).0)
            .collect();
        set.into_iter().map(String::from).collect()
    }

    /// Sorted, de-duplicated question parts of the column labels.
    pub fn questions(&self) -> Vec<String> {
        let set: BTreeSet<&str> = (0..self.columns.len())
            .map(|i| self.label_parts(i).1)
            .collect();
        set.into_iter().map(String::from).collect()
    }

    /// Sorted, de-duplicated respondent groups.
    pub fn respondent_groups(&self) -> Vec<String> {
        let Some(respondents) = &self.respondents else {
            return Vec::new();
        };
        let set: BTreeSet<&str> = respondents.groups.iter().map(String::as_str).collect();
        set.into_iter().map(String::from).collect()
    }

    /// Keeps the columns whose `(category, question)` satisfy `keep`.
    pub fn select_columns<F>(&self, keep: F) -> ResponseTable
    where
        F: Fn(Option<&str>, &str) -> bool,
    {
        let indices: Vec<usize> = (0..self.columns.len())
            .filter(|&i| {
                let (category, question) = self.label_parts(i);
                keep(category, question)
            })
            .collect();

        ResponseTable {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i]).collect())
                .collect(),
            respondents: self.respondents.clone(),
            delimiter: self.delimiter.clone(),
        }
    }

    /// Keeps the rows whose respondent group satisfies `keep`.
    pub fn select_rows<F>(&self, keep: F) -> ResponseTable
    where
        F: Fn(Option<&str>) -> bool,
    {
        let indices: Vec<usize> = (0..self.rows.len())
            .filter(|&i| keep(self.respondent(i)))
            .collect();

        ResponseTable {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            respondents: self.respondents.as_ref().map(|r| Respondents {
                column: r.column.clone(),
                groups: indices.iter().map(|&i| r.groups[i].clone()).collect(),
            }),
            delimiter: self.delimiter.clone(),
        }
    }

    /// Applies `f` to every cell, keeping the shape of the table.
    pub fn map_cells<F>(&self, f: F) -> ResponseTable
    where
        F: Fn(Cell) -> Cell,
    {
        ResponseTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(|&cell| f(cell)).collect())
                .collect(),
            respondents: self.respondents.clone(),
            delimiter: self.delimiter.clone(),
        }
    }
}

/// Splits `label` once on `delimiter`. An empty delimiter never splits.
pub fn split_label<'a>(label: &'a str, delimiter: &str) -> (Option<&'a str>, &'a str) {
    if delimiter.is_empty() {
        return (None, label);
    }
    match label.split_once(delimiter) {
        Some((category, question)) => (Some(category), question),
        None => (None, label),
    }
}
