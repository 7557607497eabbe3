#![cfg(feature = "web")]
use handlebars::Handlebars;
use lazy_static::lazy_static;
use serde_json::json;

use crate::DashboardResult;
use crate::aggregator::Summary;
use crate::graph::{GraphOptions, hourly_chart, product_line_chart};
use crate::record::{FilterField, SalesTable};
use crate::selector::Selection;

pub const PAGE_TITLE: &str = "Sales Dashboard";
pub const PAGE_ICON: &str = "📊";
pub const DESCRIPTION: &str = "Add description here. Introduce what this app does and how \
    incredibly it can help in exploring the sales data features interactively. Enjoy 🎉";

const DASHBOARD_TEMPLATE: &str = "dashboard";

// Most visible rows of a multi-select before it scrolls
const MAX_SELECT_SIZE: usize = 6;

lazy_static! {
    static ref TEMPLATES: Result<Handlebars<'static>, String> = {
        let mut registry = Handlebars::new();
        registry
            .register_template_string(DASHBOARD_TEMPLATE, include_str!("./static/dashboard.hbs"))
            .map(move |_| registry)
            .map_err(|e| e.to_string())
    };
}

/// Static pieces of the page that come from configuration
#[derive(Clone, Debug)]
pub struct PageAssets {
    /// Stylesheet inlined verbatim into the page
    pub stylesheet: String,
    pub contact_form_action: String,
    pub contact_image_url: String,
}

/// Render the whole dashboard for one selection
///
/// Filters the table, aggregates the selected rows, draws both charts and
/// fills the page template. Every value coming from the workbook is HTML
/// escaped by the template; only the stylesheet and the chart SVGs are
/// inserted as-is.
pub fn render_dashboard(
    table: &SalesTable,
    selection: &Selection,
    assets: &PageAssets,
) -> DashboardResult<String> {
    let rows = selection.apply(table);
    let summary = Summary::compute(&rows);

    let hourly = hourly_chart(&summary.sales_by_hour, &GraphOptions::hourly())?;
    let product_line = product_line_chart(&summary.sales_by_product_line, &GraphOptions::product_line())?;

    let filters: Vec<serde_json::Value> = FilterField::ALL
        .iter()
        .map(|&field| {
            let options: Vec<serde_json::Value> = table
                .distinct_values(field)
                .into_iter()
                .map(|value| {
                    let selected = selection.is_selected(field, &value);
                    json!({ "value": value, "selected": selected })
                })
                .collect();

            json!({
                "param": field.param(),
                "label": field.label(),
                "size": options.len().clamp(1, MAX_SELECT_SIZE),
                "options": options,
            })
        })
        .collect();

    let context = json!({
        "page_title": PAGE_TITLE,
        "page_icon": PAGE_ICON,
        "stylesheet": assets.stylesheet,
        "description": DESCRIPTION,
        "filters": filters,
        "preview": {
            "headers": table.headers,
            "rows": table.preview,
        },
        "kpis": {
            "total_sales": summary.kpis.total_sales_text(),
            "average_rating": summary.kpis.average_rating_text(),
            "average_ticket": summary.kpis.average_ticket_text(),
        },
        "charts": {
            "hourly": hourly,
            "product_line": product_line,
        },
        "contact": {
            "action": assets.contact_form_action,
            "image_url": assets.contact_image_url,
        },
    });

    let templates = TEMPLATES.as_ref().map_err(|e| format!("Invalid page template: {}", e))?;
    let html = templates.render(DASHBOARD_TEMPLATE, &context)?;
    Ok(html)
}
