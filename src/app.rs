#![cfg(feature = "web")]
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::Query;
use log::{error, info, warn};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::aggregator::Summary;
use crate::config::DashboardConfig;
use crate::graph::{GraphOptions, hourly_chart, product_line_chart};
use crate::loader::DatasetCache;
use crate::page::{PageAssets, render_dashboard};
use crate::record::SalesTable;
use crate::selector::{Selection, SelectionQuery};
use crate::{DashboardError, DashboardResult};

pub struct AppState {
    dataset: DatasetCache,
    assets: PageAssets,
}

impl AppState {
    pub fn new(dataset: DatasetCache, assets: PageAssets) -> Self {
        AppState { dataset, assets }
    }
}

pub async fn run(config: DashboardConfig) -> DashboardResult<()> {
    let stylesheet = std::fs::read_to_string(&config.stylesheet).map_err(|e| {
        format!(
            "Failed to read stylesheet {}: {}",
            config.stylesheet.display(),
            e
        )
    })?;

    let app_state = Arc::new(AppState::new(
        DatasetCache::new(config.data_file.clone(), config.window.clone()),
        PageAssets {
            stylesheet,
            contact_form_action: config.contact_form_action.clone(),
            contact_image_url: config.contact_image_url.clone(),
        },
    ));

    // Load eagerly so a broken workbook is reported at startup; pages keep
    // retrying until a load succeeds
    if let Err(e) = load_table(&app_state).await {
        warn!("Sales data not available yet: {}", e);
    }

    let app = router(app_state, &config.static_dir);

    // Start server
    let listener = TcpListener::bind(config.bind_address).await?;
    info!("Listening on http://{}", config.bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the dashboard router
pub fn router(app_state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/summary", get(get_summary))
        .route("/charts/product_line.svg", get(serve_product_line_chart))
        .route("/charts/hourly.svg", get(serve_hourly_chart))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(middleware::from_fn(log_request))
        .with_state(app_state)
}

/// One `info!` line per request: method, path, status and elapsed time
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

async fn serve_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> Response {
    let rendered = load_table(&state).await.and_then(|table| {
        let selection = Selection::from_query(&query, &table);
        render_dashboard(&table, &selection, &state.assets)
    });

    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => failure("render dashboard", e),
    }
}

async fn get_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> Response {
    match summarize(&state, &query).await {
        Ok((rows_loaded, summary)) => Json(json!({
            "rows_loaded": rows_loaded,
            "rows_selected": summary.kpis.transactions,
            "kpis": summary.kpis,
            "sales_by_product_line": summary.sales_by_product_line,
            "sales_by_hour": summary.sales_by_hour,
        }))
        .into_response(),
        Err(e) => failure("compute summary", e),
    }
}

async fn serve_product_line_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> Response {
    let svg = summarize(&state, &query).await.and_then(|(_, summary)| {
        product_line_chart(&summary.sales_by_product_line, &GraphOptions::product_line())
    });
    svg_response(svg)
}

async fn serve_hourly_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SelectionQuery>,
) -> Response {
    let svg = summarize(&state, &query)
        .await
        .and_then(|(_, summary)| hourly_chart(&summary.sales_by_hour, &GraphOptions::hourly()));
    svg_response(svg)
}

/// Fetch the table, reading the workbook on the blocking pool when it is
/// not cached yet
async fn load_table(state: &Arc<AppState>) -> DashboardResult<Arc<SalesTable>> {
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || state.dataset.get())
        .await
        .map_err(|e| format!("Dataset load task failed: {}", e))?
}

async fn summarize(
    state: &Arc<AppState>,
    query: &SelectionQuery,
) -> DashboardResult<(usize, Summary)> {
    let table = load_table(state).await?;
    let selection = Selection::from_query(query, &table);
    let rows = selection.apply(&table);
    Ok((table.len(), Summary::compute(&rows)))
}

fn svg_response(svg: DashboardResult<String>) -> Response {
    match svg {
        Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => failure("draw chart", e),
    }
}

fn failure(action: &str, e: DashboardError) -> Response {
    error!("Failed to {}: {}", action, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {}: {}", action, e),
    )
        .into_response()
}
