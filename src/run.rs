//! Run Module
//!
//! 1回のアップロード〜アーカイブのライフサイクル（実行）の識別子と、
//! ディスク上のレイアウトを管理するモジュール。
//!
//! クライアントには不透明な実行トークンのみを渡し、ファイルシステムの
//! パスは一切公開しません。トークンからパスへの解決はサーバー内部で
//! `RunStore`が行います。
//!
//! # ディスクレイアウト
//!
//! ```text
//! <root>/
//!   <run-id>/
//!     template/<アップロードされたテンプレート名>
//!     data/<アップロードされたデータファイル名>
//!     output/<語幹>.docx ...
//!   <run-id>.zip
//! ```
//!
//! 実行と成果物の自動削除は行いません。

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::error::DocxFillError;
use crate::security::{sanitize_file_name, validate_run_token};

/// プロセス内で単調増加するカウンター
///
/// 同一秒内の連続アップロードでも識別子が衝突しないことを保証します。
static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 実行識別子
///
/// `YYYYMMDDHHMMSS-NNNN`形式（UTC秒精度のタイムスタンプ + プロセス内
/// カウンター）。クライアントに渡される不透明トークンそのものです。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunId(String);

impl RunId {
    /// 新しい実行識別子を生成
    pub fn generate() -> Self {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let counter = RUN_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{:04}", timestamp, counter))
    }

    /// 識別子の文字列表現
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 実行ストア
///
/// 作業ディレクトリのルートを保持し、実行の作成とトークン解決を
/// 提供します。各実行のディレクトリは、そのトークンを持つリクエスト
/// だけが読み書きします。
#[derive(Debug)]
pub struct RunStore {
    /// 作業ディレクトリのルート
    root: PathBuf,
}

impl RunStore {
    /// 実行ストアを開く（ルートディレクトリがなければ作成）
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, DocxFillError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// 新しい実行を作成
    ///
    /// 実行ディレクトリと`template/`・`data/`サブディレクトリを作成します。
    /// 同一識別子のディレクトリが既に存在する場合は失敗します。
    pub fn create_run(&self) -> Result<Run, DocxFillError> {
        let id = RunId::generate();
        let dir = self.root.join(id.as_str());

        fs::create_dir(&dir)?;
        fs::create_dir(dir.join("template"))?;
        fs::create_dir(dir.join("data"))?;

        Ok(Run {
            id: id.0,
            dir,
        })
    }

    /// 実行トークンを既存の実行に解決
    ///
    /// # 戻り値
    ///
    /// * `Ok(Run)` - トークンが既存の実行ディレクトリに解決できた場合
    /// * `Err(DocxFillError::SecurityViolation)` - トークンの文法が不正な場合
    /// * `Err(DocxFillError::RunNotFound)` - 実行ディレクトリが存在しない場合
    pub fn resolve(&self, token: &str) -> Result<Run, DocxFillError> {
        validate_run_token(token).map_err(|e| {
            DocxFillError::SecurityViolation(format!("Invalid run token: {}", e))
        })?;

        let dir = self.root.join(token);
        if !dir.is_dir() {
            return Err(DocxFillError::RunNotFound {
                run: token.to_string(),
            });
        }

        Ok(Run {
            id: token.to_string(),
            dir,
        })
    }

    /// 実行のアーカイブパス（`<root>/<run-id>.zip`）
    ///
    /// 実行識別子が一意なため、繰り返しの実行でアーカイブ名が
    /// 衝突することはありません。
    pub fn archive_path(&self, run: &Run) -> PathBuf {
        self.root.join(format!("{}.zip", run.id))
    }
}

/// 1つの実行
///
/// 実行識別子と実行ディレクトリを保持し、アップロードの保存と
/// 保存済みファイルの解決を提供します。
#[derive(Debug)]
pub struct Run {
    id: String,
    dir: PathBuf,
}

impl Run {
    /// 実行識別子（クライアントに渡すトークン）
    pub fn id(&self) -> &str {
        &self.id
    }

    /// アップロードされたテンプレートを保存
    ///
    /// ファイル名は無害化され、元の名前の最終コンポーネントが保たれます。
    pub fn save_template(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DocxFillError> {
        self.save_into("template", file_name, bytes)
    }

    /// アップロードされたデータファイルを保存
    pub fn save_data(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DocxFillError> {
        self.save_into("data", file_name, bytes)
    }

    fn save_into(
        &self,
        subdir: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, DocxFillError> {
        let name = sanitize_file_name(file_name).ok_or_else(|| {
            DocxFillError::Upload(format!("Invalid uploaded file name: '{}'", file_name))
        })?;

        let path = self.dir.join(subdir).join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// 保存済みテンプレートのパス
    pub fn template_path(&self) -> Result<PathBuf, DocxFillError> {
        self.single_file("template")
    }

    /// 保存済みデータファイルのパス
    pub fn data_path(&self) -> Result<PathBuf, DocxFillError> {
        self.single_file("data")
    }

    /// 出力ディレクトリのパス（なければ作成）
    pub fn output_dir(&self) -> Result<PathBuf, DocxFillError> {
        let dir = self.dir.join("output");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// サブディレクトリ内の唯一のファイルを返す
    fn single_file(&self, subdir: &str) -> Result<PathBuf, DocxFillError> {
        let dir = self.dir.join(subdir);
        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.path())
            .collect();
        files.sort();

        files.into_iter().next().ok_or_else(|| {
            DocxFillError::Upload(format!(
                "Run '{}' has no uploaded file under '{}'",
                self.id, subdir
            ))
        })
    }
}
