use serde::Serialize;
use std::collections::HashSet;

/// A single sales transaction loaded from the workbook.
///
/// Records are immutable after load. `hour` is derived from `time` once,
/// when the row is read.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SalesRecord {
    pub city: String,
    pub customer_type: String,
    pub gender: String,
    pub branch: String,
    pub payment: String,
    pub product_line: String,
    pub total: f64,
    pub rating: f64,
    /// Time of day as `HH:MM:SS`
    pub time: String,
    /// Hour of day, 0..=23
    pub hour: u8,
}

/// The five columns a user can filter on from the sidebar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FilterField {
    City,
    CustomerType,
    Gender,
    Branch,
    Payment,
}

impl FilterField {
    /// Every filter field, in sidebar order
    pub const ALL: [FilterField; 5] = [
        FilterField::City,
        FilterField::CustomerType,
        FilterField::Gender,
        FilterField::Branch,
        FilterField::Payment,
    ];

    /// Header of the worksheet column holding this field
    pub fn header(self) -> &'static str {
        match self {
            FilterField::City => "City",
            FilterField::CustomerType => "Customer_type",
            FilterField::Gender => "Gender",
            FilterField::Branch => "Branch",
            FilterField::Payment => "Payment",
        }
    }

    /// Name of the repeated query parameter carrying the selection
    pub fn param(self) -> &'static str {
        match self {
            FilterField::City => "city",
            FilterField::CustomerType => "customer_type",
            FilterField::Gender => "gender",
            FilterField::Branch => "branch",
            FilterField::Payment => "payment",
        }
    }

    /// Sidebar label shown above the multi-select
    pub fn label(self) -> &'static str {
        match self {
            FilterField::City => "Select the City:",
            FilterField::CustomerType => "Select the Customer Type:",
            FilterField::Gender => "Select the Gender:",
            FilterField::Branch => "Select the Branch:",
            FilterField::Payment => "Select the Payment:",
        }
    }

    pub fn value_of(self, record: &SalesRecord) -> &str {
        match self {
            FilterField::City => &record.city,
            FilterField::CustomerType => &record.customer_type,
            FilterField::Gender => &record.gender,
            FilterField::Branch => &record.branch,
            FilterField::Payment => &record.payment,
        }
    }
}

/// The loaded window of the "Sales" worksheet.
///
/// Besides the typed records, the table keeps the header names of the
/// window and the raw text of the first few rows so the page can show the
/// data as it appears in the workbook.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SalesTable {
    pub headers: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub records: Vec<SalesRecord>,
}

impl SalesTable {
    pub fn new(headers: Vec<String>, preview: Vec<Vec<String>>, records: Vec<SalesRecord>) -> Self {
        SalesTable {
            headers,
            preview,
            records,
        }
    }

    /// Build a table from records alone, with no workbook preview
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        SalesTable {
            headers: Vec::new(),
            preview: Vec::new(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values of a filter column, in order of first appearance
    pub fn distinct_values(&self, field: FilterField) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut values = Vec::new();

        for record in &self.records {
            let value = field.value_of(record);
            if seen.insert(value) {
                values.push(value.to_string());
            }
        }

        values
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::SalesRecord;

    pub fn record(city: &str, product_line: &str, total: f64, rating: f64, time: &str) -> SalesRecord {
        let hour = time[..2].parse().unwrap();
        SalesRecord {
            city: city.to_string(),
            customer_type: "Member".to_string(),
            gender: "Female".to_string(),
            branch: match city {
                "Yangon" => "A",
                "Mandalay" => "B",
                _ => "C",
            }
            .to_string(),
            payment: "Cash".to_string(),
            product_line: product_line.to_string(),
            total,
            rating,
            time: time.to_string(),
            hour,
        }
    }

    /// Ten rows, six of them in Yangon
    pub fn ten_rows() -> Vec<SalesRecord> {
        vec![
            record("Yangon", "Health and beauty", 548.97, 9.1, "13:08:00"),
            record("Naypyitaw", "Electronic accessories", 80.22, 9.6, "10:29:00"),
            record("Yangon", "Home and lifestyle", 340.53, 7.4, "13:23:00"),
            record("Yangon", "Health and beauty", 489.05, 8.4, "20:33:00"),
            record("Yangon", "Sports and travel", 634.38, 5.3, "10:37:00"),
            record("Naypyitaw", "Electronic accessories", 627.62, 4.1, "18:30:00"),
            record("Yangon", "Electronic accessories", 433.69, 5.8, "14:36:00"),
            record("Naypyitaw", "Home and lifestyle", 772.38, 8.0, "11:38:00"),
            record("Yangon", "Health and beauty", 76.15, 7.2, "17:15:00"),
            record("Mandalay", "Food and beverages", 172.75, 5.9, "13:27:00"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_values_keep_first_appearance_order() {
        let table = SalesTable::from_records(fixtures::ten_rows());
        assert_eq!(
            table.distinct_values(FilterField::City),
            vec!["Yangon", "Naypyitaw", "Mandalay"]
        );
        assert_eq!(table.distinct_values(FilterField::Payment), vec!["Cash"]);
    }

    #[test]
    fn empty_table_has_no_distinct_values() {
        let table = SalesTable::default();
        assert!(table.is_empty());
        for field in FilterField::ALL {
            assert!(table.distinct_values(field).is_empty());
        }
    }
}
