//! Server Module
//!
//! HTTPルーティングと共有状態を定義するモジュール。
//! ルート構成は§外部インターフェースの4ルートのみで、リクエスト間で
//! 共有される可変状態はファイルシステム（`RunStore`）だけです。

pub(crate) mod handlers;
mod pages;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::builder::Renderer;
use crate::run::RunStore;

pub use handlers::ErrorResponse;

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    /// 実行ストア
    pub(crate) store: Arc<RunStore>,

    /// レンダラー（設定のみを保持、リクエスト間で共有可能）
    pub(crate) renderer: Arc<Renderer>,
}

impl AppState {
    /// 新しい共有状態を生成
    pub fn new(store: RunStore, renderer: Renderer) -> Self {
        Self {
            store: Arc::new(store),
            renderer: Arc::new(renderer),
        }
    }
}

/// アプリケーションのルーターを構築
///
/// # ルート
///
/// - `GET /` - アップロードページ
/// - `POST /upload` - ファイルのアップロード（multipart）
/// - `GET /templater` - マッピングページ（クエリ: `run`）
/// - `POST /process` - 一括レンダリングとアーカイブのダウンロード（JSON）
///
/// # 引数
///
/// * `state` - 共有状態
/// * `max_upload_bytes` - アップロード本文の最大サイズ
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/templater", get(handlers::templater))
        .route("/process", post(handlers::process))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
