use serde::Serialize;

use crate::table::{Cell, ResponseTable};

/// One cell of a response table in long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub respondent: Option<String>,
    pub category: Option<String>,
    pub question: String,
    pub value: Cell,
}

/// Reshapes the wide table into one record per cell, column by column.
///
/// Compound labels are split on the table's delimiter into category and
/// question. Missing cells are kept as `None` records.
pub fn to_long(table: &ResponseTable) -> Vec<LongRecord> {
    let mut records = Vec::with_capacity(table.row_count() * table.column_count());

    for column in 0..table.column_count() {
        let (category, question) = table.label_parts(column);
        for (row, cells) in table.rows().iter().enumerate() {
            records.push(LongRecord {
                respondent: table.respondent(row).map(String::from),
                category: category.map(String::from),
                question: question.to_string(),
                value: cells[column],
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_record_per_cell() {
        let table = ResponseTable::new(
            vec!["Pedagogik_a".into(), "Pedagogik_a".into(), "b".into()],
            vec![vec![Some(4), Some(4), None], vec![Some(2), Some(5), Some(1)]],
        );
        let long = to_long(&table);

        assert_eq!(long.len(), 6);
        // duplicated labels and values survive
        assert_eq!(long[0].value, Some(4));
        assert_eq!(long[2].value, Some(4));
        assert_eq!(long[0].category.as_deref(), Some("Pedagogik"));
        assert_eq!(long[0].question, "a");
        assert_eq!(long[4].category, None);
        assert_eq!(long[4].question, "b");
        assert_eq!(long[4].value, None);
    }

    #[test]
    fn test_respondent_is_carried() {
        let table = ResponseTable::new(vec!["q".into()], vec![vec![Some(5)], vec![Some(1)]])
            .with_respondents("Status", vec!["Dosen".into(), "Mahasiswa".into()]);
        let long = to_long(&table);
        assert_eq!(long[1].respondent.as_deref(), Some("Mahasiswa"));
    }

    #[test]
    fn test_custom_delimiter() {
        let table = ResponseTable::new(vec!["Keuangan|q1".into()], vec![vec![Some(3)]])
            .with_delimiter("|");
        let long = to_long(&table);
        assert_eq!(long[0].category.as_deref(), Some("Keuangan"));
        assert_eq!(long[0].question, "q1");
    }
}
