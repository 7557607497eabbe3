use serde::Serialize;
use std::collections::BTreeMap;

use crate::record::SalesRecord;

/// Glyph repeated once per rating point in the star indicator
pub const STAR: &str = "⭐";

/// The three headline numbers of the dashboard
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Kpis {
    pub transactions: usize,
    pub total_sales: f64,
    /// Mean rating rounded to one decimal; `None` when nothing is selected
    pub average_rating: Option<f64>,
    /// Mean sale per transaction rounded to two decimals
    pub average_ticket: Option<f64>,
}

/// One bar of a grouped chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupedTotal {
    pub label: String,
    pub total: f64,
}

/// One bar of the hourly chart
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HourlyTotal {
    pub hour: u8,
    pub total: f64,
}

impl Kpis {
    pub fn compute(rows: &[&SalesRecord]) -> Self {
        let total_sales: f64 = rows.iter().map(|r| r.total).sum();
        let rating_sum: f64 = rows.iter().map(|r| r.rating).sum();

        Kpis {
            transactions: rows.len(),
            total_sales,
            average_rating: mean(rating_sum, rows.len()).map(|m| round_to(m, 1)),
            average_ticket: mean(total_sales, rows.len()).map(|m| round_to(m, 2)),
        }
    }

    /// Star glyphs for the rounded average rating, empty with no rating
    pub fn stars(&self) -> String {
        let count = self
            .average_rating
            .map(|r| r.round_ties_even().max(0.0) as usize)
            .unwrap_or(0);
        STAR.repeat(count)
    }

    /// `US $ 12,345`, total truncated to whole dollars
    pub fn total_sales_text(&self) -> String {
        format!("US $ {}", thousands(self.total_sales.trunc() as i64))
    }

    /// `7.0 ⭐⭐⭐⭐⭐⭐⭐`
    pub fn average_rating_text(&self) -> String {
        match self.average_rating {
            Some(rating) => format!("{:.1} {}", rating, self.stars()),
            None => "n/a".to_string(),
        }
    }

    /// `US $ 322.97`
    pub fn average_ticket_text(&self) -> String {
        match self.average_ticket {
            Some(ticket) => format!("US $ {:.2}", ticket),
            None => "US $ n/a".to_string(),
        }
    }
}

/// Everything the page and the JSON endpoint show for one selection
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub kpis: Kpis,
    pub sales_by_product_line: Vec<GroupedTotal>,
    pub sales_by_hour: Vec<HourlyTotal>,
}

impl Summary {
    pub fn compute(rows: &[&SalesRecord]) -> Self {
        Summary {
            kpis: Kpis::compute(rows),
            sales_by_product_line: sales_by_product_line(rows),
            sales_by_hour: sales_by_hour(rows),
        }
    }
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

// Halves go to the even neighbour
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// Format an integer with comma thousands separators
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Sum of `Total` per product line, smallest first
///
/// Lines with equal totals stay in name order.
pub fn sales_by_product_line(rows: &[&SalesRecord]) -> Vec<GroupedTotal> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        *groups.entry(row.product_line.as_str()).or_insert(0.0) += row.total;
    }

    let mut totals: Vec<GroupedTotal> = groups
        .into_iter()
        .map(|(label, total)| GroupedTotal {
            label: label.to_string(),
            total,
        })
        .collect();
    totals.sort_by(|a, b| a.total.total_cmp(&b.total));
    totals
}

/// Sum of `Total` per hour of day, for the hours that have sales
pub fn sales_by_hour(rows: &[&SalesRecord]) -> Vec<HourlyTotal> {
    let mut groups: BTreeMap<u8, f64> = BTreeMap::new();
    for row in rows {
        *groups.entry(row.hour).or_insert(0.0) += row.total;
    }

    groups
        .into_iter()
        .map(|(hour, total)| HourlyTotal { hour, total })
        .collect()
}
