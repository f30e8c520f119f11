// Local stand-in for the OnlyCNCs admin API
// Run with: cargo run -p cnc_sim

use std::error::Error;
use std::net::SocketAddr;

use cnc_sim::{demo_state, serve};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("SIM_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(16010);
    let mut state = demo_state();
    if let Ok(token) = std::env::var("SIM_TOKEN") {
        info!("Requiring an Authorization token");
        state.require_token(Some(&token));
    }

    serve(SocketAddr::from(([127, 0, 0, 1], port)), state).await?;
    Ok(())
}
