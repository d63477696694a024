//! Caller-owned filter selections.
//!
//! A dashboard view keeps one [`FilterState`] per page and passes it in; the
//! aggregation functions only ever see the already filtered table.
//!
//! Long-format score exports use a [`FilterChain`] instead: any number of
//! attribute filters, each offered the values left by the ones before it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scores::ScoreTable;
use crate::table::ResponseTable;

const ALL: &str = "All";

/// A single filter: everything, or one named value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// `None`, an empty string and "All" (any case) select everything.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Selection::All,
            Some(v) if v.eq_ignore_ascii_case(ALL) => Selection::All,
            Some(v) => Selection::Only(v.to_string()),
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => value == Some(wanted.as_str()),
        }
    }

    /// Falls back to [`Selection::All`] when the value is not one of `options`.
    pub fn resolve(&self, options: &[String]) -> Selection {
        match self {
            Selection::Only(wanted) if !options.contains(wanted) => {
                debug!(selection = %wanted, "Selection not available, using All");
                Selection::All
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(value) => f.write_str(value),
        }
    }
}

/// The values a view can offer for each filter, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub respondents: Vec<String>,
    pub categories: Vec<String>,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub respondent: Selection,
    pub category: Selection,
    pub question: Selection,
}

impl FilterState {
    /// Options offered for `table`. Questions are those left after the
    /// category selection, like a dependent drop-down.
    pub fn options(&self, table: &ResponseTable) -> FilterOptions {
        let category = self.category.resolve(&table.categories());
        let by_category = table.select_columns(|c, _| category.matches(c));

        FilterOptions {
            respondents: table.respondent_groups(),
            categories: table.categories(),
            questions: by_category.questions(),
        }
    }

    /// Replaces selections that are not available in `table` with "All".
    pub fn resolve(&self, table: &ResponseTable) -> FilterState {
        let options = self.options(table);
        FilterState {
            respondent: self.respondent.resolve(&options.respondents),
            category: self.category.resolve(&options.categories),
            question: self.question.resolve(&options.questions),
        }
    }

    /// Resolves the selections against `table` and returns the matching sub-table.
    pub fn apply(&self, table: &ResponseTable) -> ResponseTable {
        let state = self.resolve(table);
        let rows = if table.has_respondents() {
            table.select_rows(|r| state.respondent.matches(r))
        } else {
            table.clone()
        };
        rows.select_columns(|c, q| state.category.matches(c) && state.question.matches(Some(q)))
    }
}

/// One step of a [`FilterChain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub column: String,
    pub selection: Selection,
}

/// Values offered by one step, given the steps before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOptions {
    pub column: String,
    pub options: Vec<String>,
}

/// Filters over named attribute columns, applied in order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterChain {
    pub filters: Vec<AttributeFilter>,
}

impl FilterChain {
    /// A chain over `columns`, every step selecting "All".
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterChain {
            filters: columns
                .into_iter()
                .map(|column| AttributeFilter {
                    column: column.into(),
                    selection: Selection::All,
                })
                .collect(),
        }
    }

    /// Sets the selection of `column`, appending a step if it has none.
    pub fn select(mut self, column: &str, selection: Selection) -> Self {
        match self.filters.iter_mut().find(|f| f.column == column) {
            Some(filter) => filter.selection = selection,
            None => self.filters.push(AttributeFilter {
                column: column.to_string(),
                selection,
            }),
        }
        self
    }

    /// Walks the chain over `table`, yielding each step's options, its
    /// resolved selection and the rows left after it.
    fn walk(&self, table: &ScoreTable) -> (Vec<StepOptions>, Vec<AttributeFilter>, ScoreTable) {
        let mut current = table.clone();
        let mut offered = Vec::with_capacity(self.filters.len());
        let mut resolved = Vec::with_capacity(self.filters.len());

        for filter in &self.filters {
            let options = current.options(&filter.column);
            let selection = filter.selection.resolve(&options);
            if let Selection::Only(wanted) = &selection {
                current = current.select(&filter.column, |v| v == wanted);
            }
            offered.push(StepOptions {
                column: filter.column.clone(),
                options,
            });
            resolved.push(AttributeFilter {
                column: filter.column.clone(),
                selection,
            });
        }

        (offered, resolved, current)
    }

    /// Options of every step, each computed after the previous steps apply.
    pub fn options(&self, table: &ScoreTable) -> Vec<StepOptions> {
        self.walk(table).0
    }

    /// Replaces selections that are not offered at their step with "All".
    pub fn resolve(&self, table: &ScoreTable) -> FilterChain {
        FilterChain {
            filters: self.walk(table).1,
        }
    }

    pub fn apply(&self, table: &ScoreTable) -> ScoreTable {
        self.walk(table).2
    }
}
