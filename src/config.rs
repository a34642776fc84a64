//! Config Module
//!
//! サーバーの起動設定。環境変数でデフォルト値を上書きできます。

use std::path::PathBuf;

/// サーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 待ち受けアドレス（環境変数: `DOCXFILL_BIND`）
    pub bind_addr: String,

    /// 作業ディレクトリのルート（環境変数: `DOCXFILL_WORKDIR`）
    pub workdir: PathBuf,

    /// アップロード本文の最大サイズ（バイト、環境変数: `DOCXFILL_MAX_UPLOAD_BYTES`）
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            workdir: PathBuf::from("workdir"),
            max_upload_bytes: 33_554_432, // 32MB
        }
    }
}

impl ServerConfig {
    /// 環境変数から設定を読み込む（未設定の項目はデフォルト値）
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            bind_addr: std::env::var("DOCXFILL_BIND").unwrap_or(default.bind_addr),
            workdir: std::env::var("DOCXFILL_WORKDIR")
                .map(PathBuf::from)
                .unwrap_or(default.workdir),
            max_upload_bytes: std::env::var("DOCXFILL_MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_bytes),
        }
    }
}
