//! `dashd`: the Dash robot HTTP bridge daemon.
//!
//! Builds one robot session at startup, attempts the initial connection, and
//! serves the control surface. Without a vendor Bluetooth transport linked in
//! the daemon runs against the call-logging mock driver, which keeps the web
//! frontend fully exercisable on a desk with no robot present.

use dash_robot::driver::MockDriver;
use dash_robot::robot::RobotSession;
use dash_robot::server::{build_router, AppState};
use dash_robot::DEFAULT_BT_ADDRESS;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bt_address =
        std::env::var("DASH_BT_ADDRESS").unwrap_or_else(|_| DEFAULT_BT_ADDRESS.to_string());
    let bind_addr = std::env::var("DASH_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    info!(%bt_address, "starting dash bridge");
    let mut session = RobotSession::new(Box::new(MockDriver::new(bt_address)));
    if let Err(err) = session.connect().await {
        // The facade retries on the first incoming request, same as before.
        warn!(%err, "initial robot connection failed");
    }

    let app = build_router(AppState::new(session));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(%bind_addr, "dash bridge listening");
    axum::serve(listener, app).await?;
    Ok(())
}
