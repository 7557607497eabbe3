use sales_dashboard::app;
use sales_dashboard::config::DashboardConfig;
use std::env;

/// Main entry point for the dashboard server
///
/// Positional arguments, both optional:
/// * `data_file` - Workbook to load (default `data/supermarkt_sales.xlsx`)
/// * `bind_address` - Address to listen on (default `127.0.0.1:3000`)
///
/// Logging goes through `env_logger` at `info` unless `RUST_LOG` says
/// otherwise.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::from_args(env::args().skip(1));
    log::info!(
        "Starting sales dashboard with data from {}",
        config.data_file.display()
    );

    app::run(config).await
}
