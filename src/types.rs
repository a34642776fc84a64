//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::collections::BTreeMap;
use std::path::PathBuf;

/// プレースホルダ名から列名への対応表
///
/// キーはテンプレートのプレースホルダ名、値はデータファイルの列名。
/// `BTreeMap`のため、キーは一意かつ辞書順で安定しています。
/// `/process`リクエストのJSON本文からそのままデシリアライズされます。
pub type Mapping = BTreeMap<String, String>;

/// テンプレートとデータファイルの内容調査結果
///
/// マッピングUIに表示するための、プレースホルダ名と列名の一覧。
/// どちらも辞書順にソート済みで、入力ファイル内の出現順に依存しません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// テンプレート内のプレースホルダ名（ソート済み、重複なし）
    pub placeholders: Vec<String>,

    /// データファイルの列名（ソート済み）
    pub columns: Vec<String>,
}

/// 1行のレンダリング失敗の詳細
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// 失敗した行のインデックス（0始まり、ヘッダー行を除く）
    pub row: usize,

    /// その行の出力ファイル名の語幹
    pub file_stem: String,

    /// 失敗理由（ユーザー向けメッセージ）
    pub reason: String,
}

/// 一括レンダリングの結果レポート
///
/// 行ごとの成功・失敗を集約したもの。`FailurePolicy::Partial`の場合、
/// 失敗があってもこのレポートが返され、成功分のみがアーカイブされます。
#[derive(Debug, Clone, Default)]
pub struct RenderReport {
    /// 書き込みに成功した出力ドキュメントのパス（行順）
    pub documents: Vec<PathBuf>,

    /// 失敗した行の一覧（行順）
    pub failures: Vec<RowFailure>,
}

impl RenderReport {
    /// すべての行が成功したかどうか
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// 処理した全行数
    pub fn total(&self) -> usize {
        self.documents.len() + self.failures.len()
    }
}
