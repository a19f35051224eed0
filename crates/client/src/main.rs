//! `chartboard-refresh` -- re-run every widget query of a saved dashboard.
//!
//! Loads the dashboard from the data-modeling service, executes each
//! widget's synthesized query, and writes the refreshed datasets back.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default   | Description                         |
//! |------------------------|----------|-----------|-------------------------------------|
//! | `DATA_MODEL_API_URL`   | yes      | --        | Base URL of the data-modeling API   |
//! | `DASHBOARD_ID`         | yes      | --        | Dashboard to refresh                |
//! | `API_TOKEN`            | no       | --        | Bearer token                        |
//! | `REQUEST_TIMEOUT_SECS` | no       | `30`      | Per-request timeout                 |
//! | `NUMERIC_MODE`         | no       | `precise` | `precise` or `truncate`             |

use std::sync::Arc;

use chartboard_client::api::DataModelApi;
use chartboard_client::config::ClientConfig;
use chartboard_client::events::NoticeBus;
use chartboard_client::session::DashboardSession;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chartboard_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let dashboard_id: i64 = std::env::var("DASHBOARD_ID")
        .unwrap_or_else(|_| {
            tracing::error!("DASHBOARD_ID environment variable is required");
            std::process::exit(1);
        })
        .parse()
        .unwrap_or_else(|_| {
            tracing::error!("DASHBOARD_ID must be a valid integer");
            std::process::exit(1);
        });

    let api = DataModelApi::from_config(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    tracing::info!(
        dashboard_id,
        api_url = %api.api_url(),
        numeric_mode = ?config.numeric_mode,
        "Starting chartboard-refresh",
    );

    let notices = Arc::new(NoticeBus::default());
    let mut session = match DashboardSession::open(api, notices, dashboard_id, config.canvas).await {
        Ok(session) => session.with_numeric_mode(config.numeric_mode),
        Err(e) => {
            tracing::error!(dashboard_id, error = %e, "Failed to open dashboard");
            std::process::exit(1);
        }
    };

    let summary = session.refresh_all().await;

    if let Err(e) = session.save().await {
        tracing::error!(dashboard_id, error = %e, "Failed to store refreshed dashboard");
        std::process::exit(1);
    }

    if summary.failed > 0 {
        tracing::warn!(failed = summary.failed, "Some widgets kept their previous data");
        std::process::exit(2);
    }
}
