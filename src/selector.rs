use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::record::{FilterField, SalesRecord, SalesTable};

/// Sidebar choices as they arrive in the query string
///
/// Each multi-select posts one repeated parameter per chosen value
/// (`city=Yangon&city=Mandalay`). A browser drops a multi-select with
/// nothing chosen, so the form also carries a hidden `applied` marker:
/// without it every field falls back to its default.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SelectionQuery {
    #[serde(default)]
    pub applied: Option<String>,
    #[serde(default)]
    pub city: Vec<String>,
    #[serde(default)]
    pub customer_type: Vec<String>,
    #[serde(default)]
    pub gender: Vec<String>,
    #[serde(default)]
    pub branch: Vec<String>,
    #[serde(default)]
    pub payment: Vec<String>,
}

impl SelectionQuery {
    pub fn values_for(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::City => &self.city,
            FilterField::CustomerType => &self.customer_type,
            FilterField::Gender => &self.gender,
            FilterField::Branch => &self.branch,
            FilterField::Payment => &self.payment,
        }
    }
}

/// The selected values of the five filter fields
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    chosen: BTreeMap<FilterField, BTreeSet<String>>,
}

impl Selection {
    /// Every distinct value of every field, the state of a fresh page
    pub fn all(table: &SalesTable) -> Self {
        let chosen = FilterField::ALL
            .iter()
            .map(|&field| (field, table.distinct_values(field).into_iter().collect()))
            .collect();

        Selection { chosen }
    }

    pub fn from_query(query: &SelectionQuery, table: &SalesTable) -> Self {
        if query.applied.is_none() {
            return Selection::all(table);
        }

        let chosen = FilterField::ALL
            .iter()
            .map(|&field| (field, query.values_for(field).iter().cloned().collect()))
            .collect();

        Selection { chosen }
    }

    /// Replace the chosen values of one field
    pub fn with<I, S>(mut self, field: FilterField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chosen
            .insert(field, values.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_selected(&self, field: FilterField, value: &str) -> bool {
        self.chosen
            .get(&field)
            .is_some_and(|values| values.contains(value))
    }

    /// A record passes when each of its five fields is selected
    pub fn matches(&self, record: &SalesRecord) -> bool {
        FilterField::ALL
            .iter()
            .all(|&field| self.is_selected(field, field.value_of(record)))
    }

    pub fn apply<'a>(&self, table: &'a SalesTable) -> Vec<&'a SalesRecord> {
        table
            .records
            .iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}
