use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port: u16 = std::env::var("QUILLBOARD_HTTP_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(7878);
    let db_folder = std::env::var("QUILLBOARD_DB_FOLDER").unwrap_or_else(|_| "data".to_string());

    // The signing secret has no default; startup fails when it is unset or empty.
    let secret = std::env::var("QUILLBOARD_JWT_SECRET")
        .context("QUILLBOARD_JWT_SECRET must be set to a non-empty signing secret")?;
    let sessions = quillboard::identity::SessionManager::new(&secret)?;

    info!(
        target: "quillboard",
        "quillboard starting: RUST_LOG='{}', http_port={}, db_root='{}'",
        rust_log, http_port, db_folder
    );

    quillboard::server::run_with_config(http_port, &db_folder, sessions).await
}
