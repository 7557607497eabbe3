/*!
# Sales Dashboard

A browser-based dashboard for exploring supermarket sales records, built in Rust.

## Overview

The dashboard reads a fixed window of the "Sales" worksheet of an Excel
workbook, lets the user narrow the records with five sidebar multi-selects
(city, customer type, gender, branch, payment), and shows three key
performance indicators together with two bar charts of the selected sales.
A static contact form posting to a hosted form service closes the page.

## Architecture

Every page request runs the same three stages from scratch. Only the
loaded table is kept between requests.

### Loader
- Reads 17 columns (B to R) below three skipped title rows, up to 1000 records
- Derives the hour of day from the `Time` column
- Memoizes the table for the life of the process, with no invalidation

### Selector
- Five multi-selects, each defaulting to every distinct value of its column
- A record passes when all five of its fields are selected
- An empty selection in any field selects nothing

### Aggregator and Renderer
- Total sales, average rating with a star indicator, average sale per transaction
- Sales by product line (horizontal bars, smallest first)
- Sales by hour (vertical bars, in hour order)
- Page assembled from a handlebars template with inline SVG charts

## Modules

- **record**: Sales record, filter fields and the loaded table
- **config**: Sheet window, server settings and command line handling
- **loader**: Workbook reading, time parsing and the dataset cache
- **selector**: Sidebar selection and the row filter
- **aggregator**: KPIs and grouped totals
- **graph**: SVG bar charts
- **page**: HTML page rendering
- **app**: Routing and request handling

## REST API Endpoints

- `/` - The dashboard page; takes the sidebar selection as query parameters
- `/api/summary` - KPIs and grouped totals as JSON for the same selection
- `/charts/product_line.svg`, `/charts/hourly.svg` - The charts on their own
- `/static/{file}` - Files from the static directory
*/

pub mod aggregator;
pub mod config;
pub mod loader;
pub mod record;
pub mod selector;

pub mod app;
pub mod graph;
pub mod page;

/// Error type shared by every fallible operation of the dashboard
pub type DashboardError = Box<dyn std::error::Error + Send + Sync>;

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Re-export the data path to make it easier to use
pub use aggregator::*;
pub use loader::*;
pub use record::*;
pub use selector::*;
