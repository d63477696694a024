//! CSV loader for survey exports.
//!
//! Turns a spreadsheet export into a [`ResponseTable`]. Two stacked header
//! rows (category, question) are flattened into compound labels joined by
//! the configured delimiter.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Result, SurveyError};
use crate::table::{Cell, DEFAULT_DELIMITER, LIKERT_MAX, LIKERT_MIN, ResponseTable};

/// A labelled answer such as `"4 - Setuju"`.
static LABELLED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([1-5])\s*-").expect("label pattern is a valid regex"));

/// How a survey export is laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// 1 for plain question headers, 2 for category + question headers.
    pub header_rows: usize,
    /// Column holding the respondent group ("Status", "Jabatan", ...).
    pub respondent_column: Option<String>,
    /// Joins the two header rows into one label.
    pub delimiter: String,
    /// Columns dropped before aggregation (timestamps, names, ...).
    pub exclude_columns: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header_rows: 1,
            respondent_column: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            exclude_columns: Vec::new(),
        }
    }
}

/// Extracts a Likert value from a raw cell.
///
/// The trimmed cell must be a whole number in `1..=5` (`"4"`, `"4.0"`) or
/// start with one followed by a dash (`"4 - Setuju"`). Anything else,
/// including fractions, dates and blanks, is absent.
pub fn parse_cell(raw: &str) -> Cell {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<f64>() {
        return whole_likert(value);
    }
    let captures = LABELLED.captures(raw)?;
    captures[1].parse().ok()
}

/// `value` as a Likert answer when it is a whole number in `1..=5`.
pub fn whole_likert(value: f64) -> Cell {
    let in_range = (f64::from(LIKERT_MIN)..=f64::from(LIKERT_MAX)).contains(&value);
    (in_range && value.fract() == 0.0).then_some(value as u8)
}

/// Loads a survey export from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV or lacks
/// the expected header rows.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_responses(path: &Path, options: &LoadOptions) -> Result<ResponseTable> {
    let file = File::open(path).map_err(|source| SurveyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_table(file, options, path)
}

/// Like [`load_responses`], but a failure is logged and yields an empty table.
pub fn load_or_empty(path: &Path, options: &LoadOptions) -> ResponseTable {
    match load_responses(path, options) {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Survey file not loaded, using empty table");
            ResponseTable::empty()
        }
    }
}

/// Parses a survey export from any reader.
pub fn parse_responses<R: Read>(reader: R, options: &LoadOptions) -> Result<ResponseTable> {
    read_table(reader, options, Path::new("<reader>"))
}

fn read_table<R: Read>(reader: R, options: &LoadOptions, path: &Path) -> Result<ResponseTable> {
    if !(1..=2).contains(&options.header_rows) {
        return Err(SurveyError::UnsupportedHeaderRows(options.header_rows));
    }

    let csv_err = |source: csv::Error| SurveyError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = rdr.records();

    let mut headers = Vec::with_capacity(options.header_rows);
    for _ in 0..options.header_rows {
        match records.next() {
            Some(record) => headers.push(record.map_err(csv_err)?),
            None => {
                return Err(SurveyError::MissingHeader {
                    path: path.to_path_buf(),
                });
            }
        }
    }

    let body: Vec<csv::StringRecord> = records
        .collect::<std::result::Result<_, _>>()
        .map_err(csv_err)?;

    let labels = flatten_headers(&headers, &options.delimiter);
    let bottom = headers.last().cloned().unwrap_or_default();
    let matches = |index: usize, name: &str| {
        labels[index] == name || bottom.get(index).is_some_and(|cell| cell == name)
    };

    let respondent_index = options
        .respondent_column
        .as_deref()
        .and_then(|name| (0..labels.len()).find(|&i| matches(i, name)));

    if let (Some(name), None) = (&options.respondent_column, respondent_index) {
        warn!(column = %name, "Respondent column not found, rows will not be grouped");
    }

    let mut columns = Vec::new();
    let mut parsed: Vec<Vec<Cell>> = Vec::new();

    for index in 0..labels.len() {
        if Some(index) == respondent_index
            || options.exclude_columns.iter().any(|name| matches(index, name))
        {
            continue;
        }

        let raw: Vec<&str> = body.iter().map(|r| r.get(index).unwrap_or("")).collect();
        let cells: Vec<Cell> = raw.iter().map(|s| parse_cell(s)).collect();

        let has_text = raw.iter().any(|s| !s.is_empty());
        if has_text && cells.iter().all(Option::is_none) {
            debug!(column = %labels[index], "Dropping non-numeric column");
            continue;
        }

        columns.push(labels[index].clone());
        parsed.push(cells);
    }

    // column-major -> row-major
    let rows: Vec<Vec<Cell>> = (0..body.len())
        .map(|r| parsed.iter().map(|column| column[r]).collect())
        .collect();

    let mut table = ResponseTable::new(columns, rows).with_delimiter(&options.delimiter);

    if let (Some(index), Some(name)) = (respondent_index, &options.respondent_column) {
        let groups = body
            .iter()
            .map(|r| r.get(index).unwrap_or("").to_string())
            .collect();
        table = table.with_respondents(name, groups);
    }

    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        present = table.present_count(),
        "Survey table loaded"
    );

    Ok(table)
}

/// Builds one label per column from one or two header rows.
///
/// With two rows an empty category cell inherits the previous column's
/// category (merged cells in the source spreadsheet).
fn flatten_headers(headers: &[csv::StringRecord], delimiter: &str) -> Vec<String> {
    let width = headers.iter().map(csv::StringRecord::len).max().unwrap_or(0);

    match headers {
        [single] => (0..width)
            .map(|i| match single.get(i).unwrap_or("") {
                "" => format!("Unnamed: {i}"),
                label => label.to_string(),
            })
            .collect(),
        [top, bottom] => {
            let mut category = "";
            (0..width)
                .map(|i| {
                    let cell = top.get(i).unwrap_or("");
                    if !cell.is_empty() {
                        category = cell;
                    }
                    match (category, bottom.get(i).unwrap_or("")) {
                        ("", "") => format!("Unnamed: {i}"),
                        ("", question) => question.to_string(),
                        (category, "") => category.to_string(),
                        (category, question) => format!("{category}{delimiter}{question}"),
                    }
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_row_options() -> LoadOptions {
        LoadOptions {
            header_rows: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_cell_variants() {
        assert_eq!(parse_cell("4"), Some(4));
        assert_eq!(parse_cell(" 5 "), Some(5));
        assert_eq!(parse_cell("4 - Setuju"), Some(4));
        assert_eq!(parse_cell("2-Tidak Setuju"), Some(2));
        assert_eq!(parse_cell("3.0"), Some(3));
        assert_eq!(parse_cell("4.5"), None);
        assert_eq!(parse_cell("Sangat Baik (5)"), None);
        assert_eq!(parse_cell("1/2/2024 10:00:00"), None);
        assert_eq!(parse_cell("NaN"), None);
        assert_eq!(parse_cell(""), None);
        assert_eq!(parse_cell("Tidak tahu"), None);
        assert_eq!(parse_cell("0"), None);
        assert_eq!(parse_cell("7"), None);
        assert_eq!(parse_cell("2024-01-05"), None);
    }

    #[test]
    fn test_single_header_with_respondent_column() {
        let data = "Status,Q1,Q2\nDosen,4,5\nTendik,2,\n";
        let options = LoadOptions {
            respondent_column: Some("Status".to_string()),
            ..Default::default()
        };
        let table = parse_responses(data.as_bytes(), &options).unwrap();

        assert_eq!(table.columns(), &["Q1".to_string(), "Q2".to_string()]);
        assert_eq!(table.rows()[0], vec![Some(4), Some(5)]);
        assert_eq!(table.rows()[1], vec![Some(2), None]);
        assert_eq!(table.respondent(1), Some("Tendik"));
    }

    #[test]
    fn test_two_header_rows_are_flattened() {
        let data = "Pedagogik,,Kepegawaian\na,b,a\n4,5,1\n";
        let table = parse_responses(data.as_bytes(), &two_row_options()).unwrap();

        assert_eq!(
            table.columns(),
            &[
                "Pedagogik_a".to_string(),
                "Pedagogik_b".to_string(),
                "Kepegawaian_a".to_string()
            ]
        );
        assert_eq!(table.categories(), vec!["Kepegawaian", "Pedagogik"]);
    }

    #[test]
    fn test_text_and_excluded_columns_are_dropped() {
        let data = "Timestamp,Nama,Q1\n2024-01-05 10:00,Ani,4\n2024-01-06 11:00,Budi,2\n";
        let options = LoadOptions {
            exclude_columns: vec!["Timestamp".to_string()],
            ..Default::default()
        };
        let table = parse_responses(data.as_bytes(), &options).unwrap();
        assert_eq!(table.columns(), &["Q1".to_string()]);
    }

    #[test]
    fn test_timestamps_and_fractions_are_not_answers() {
        let data = "Timestamp,Q1,Q2\n1/2/2024 10:00:00,4.5,5\n1/3/2024 11:00:00,2,1\n";
        let table = parse_responses(data.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(table.columns(), &["Q1".to_string(), "Q2".to_string()]);
        assert_eq!(table.rows()[0], vec![None, Some(5)]);
        assert_eq!(table.rows()[1], vec![Some(2), Some(1)]);
        assert_eq!(table.present_count(), 3);
    }

    #[test]
    fn test_whole_likert() {
        assert_eq!(whole_likert(5.0), Some(5));
        assert_eq!(whole_likert(1.0), Some(1));
        assert_eq!(whole_likert(0.0), None);
        assert_eq!(whole_likert(3.25), None);
        assert_eq!(whole_likert(f64::NAN), None);
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let result = parse_responses("".as_bytes(), &two_row_options());
        assert!(matches!(result, Err(SurveyError::MissingHeader { .. })));
    }

    #[test]
    fn test_unsupported_header_rows() {
        let options = LoadOptions {
            header_rows: 3,
            ..Default::default()
        };
        let result = parse_responses("a\n1\n".as_bytes(), &options);
        assert!(matches!(result, Err(SurveyError::UnsupportedHeaderRows(3))));
    }

    #[test]
    fn test_load_or_empty_on_missing_file() {
        let table = load_or_empty(Path::new("does/not/exist.csv"), &LoadOptions::default());
        assert!(table.is_empty());
    }
}
