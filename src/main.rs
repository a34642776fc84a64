//! docxfill server binary
//!
//! アップロード → マッピング → 一括レンダリング → アーカイブの
//! パイプラインをHTTPで提供するサーバー。

use docxfill::config::ServerConfig;
use docxfill::run::RunStore;
use docxfill::server::{app, AppState};
use docxfill::RendererBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let store = RunStore::new(&config.workdir)?;
    let renderer = RendererBuilder::new().build()?;
    let state = AppState::new(store, renderer);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        workdir = %config.workdir.display(),
        "docxfill listening"
    );

    axum::serve(listener, app(state, config.max_upload_bytes)).await?;

    Ok(())
}
