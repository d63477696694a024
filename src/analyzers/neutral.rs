use std::collections::BTreeSet;

use tracing::debug;

use crate::table::ResponseTable;

/// Likert values treated as "no opinion" and left out of bucket counts.
pub type NeutralSet = BTreeSet<u8>;

/// The conventional neutral answer on a 1–5 scale.
pub const NEUTRAL_VALUE: u8 = 3;

pub fn default_neutral() -> NeutralSet {
    NeutralSet::from([NEUTRAL_VALUE])
}

/// Marks every cell whose value is in `neutral` as absent.
///
/// Exclusion is per cell: the other answers of the same respondent stay
/// countable. An empty set returns the table unchanged.
pub fn exclude_neutral(table: &ResponseTable, neutral: &NeutralSet) -> ResponseTable {
    if neutral.is_empty() {
        return table.clone();
    }

    let filtered = table.map_cells(|cell| cell.filter(|v| !neutral.contains(v)));
    debug!(
        excluded = count_neutral(table, neutral),
        remaining = filtered.present_count(),
        "Neutral answers excluded"
    );
    filtered
}

/// Number of present cells whose value is in `neutral`.
pub fn count_neutral(table: &ResponseTable, neutral: &NeutralSet) -> usize {
    table.values().filter(|v| neutral.contains(v)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ResponseTable {
        ResponseTable::new(
            vec!["q1".into(), "q2".into(), "q3".into()],
            vec![
                vec![Some(3), Some(4), Some(3)],
                vec![Some(1), None, Some(5)],
            ],
        )
    }

    #[test]
    fn test_exclusion_is_cell_wise() {
        let filtered = exclude_neutral(&table(), &default_neutral());
        assert_eq!(filtered.rows()[0], vec![None, Some(4), None]);
        assert_eq!(filtered.rows()[1], vec![Some(1), None, Some(5)]);
        assert_eq!(filtered.row_count(), 2);
    }

    #[test]
    fn test_empty_set_keeps_everything() {
        let filtered = exclude_neutral(&table(), &NeutralSet::new());
        assert_eq!(filtered, table());
    }

    #[test]
    fn test_count_neutral() {
        assert_eq!(count_neutral(&table(), &default_neutral()), 2);
        assert_eq!(count_neutral(&table(), &NeutralSet::from([1, 3])), 3);
        assert_eq!(count_neutral(&table(), &NeutralSet::new()), 0);
    }
}
