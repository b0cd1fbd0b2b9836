use anyhow::Result;
use tracing_subscriber::EnvFilter;

use fibu::api::TokenStore;
use fibu::tui;

const DEFAULT_API_URL: &str = "https://localhost:8443";

fn main() -> Result<()> {
    if std::env::var("ENV").ok().as_deref() != Some("prod") {
        dotenvy::dotenv().ok();
    }
    // Logs go to stderr so the alternate screen stays clean; enable
    // with RUST_LOG=fibu=debug.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let base_url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FIBU_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let store = TokenStore::from_env();
    let rt = tokio::runtime::Runtime::new()?;

    tui::ui::run(&rt, base_url, store)
}
