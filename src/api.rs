//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

/// マッピングされていないプレースホルダの処理方針
///
/// テンプレートに出現するが、コンテキスト（マッピング）に値がない
/// プレースホルダをどう扱うかを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnmappedPolicy {
    /// プレースホルダ構文をそのまま出力に残す（デフォルト）
    ///
    /// `{{name}}`がそのまま出力ドキュメントに現れるため、
    /// マッピング漏れが成果物から目視で検出できます。
    KeepLiteral,

    /// 空文字列に置換する
    ///
    /// 出力にはプレースホルダの痕跡が残りません。
    Blank,

    /// その行のレンダリングを失敗させる
    ///
    /// `DocxFillError::UnmappedPlaceholder`が行の失敗理由として記録されます。
    Fail,
}

/// 行の失敗に対するアーカイブ方針
///
/// 一括レンダリングで一部の行が失敗した場合に、アーカイブを
/// どう扱うかを指定します。行の処理自体は常に独立しており、
/// 1行の失敗が残りの行の処理を中断することはありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FailurePolicy {
    /// 失敗行が1つでもあれば一括全体を失敗させる（デフォルト）
    ///
    /// アーカイブは作成されず、`DocxFillError::BatchFailed`が
    /// 失敗行の一覧とともに返されます。
    Strict,

    /// 成功した行のみをアーカイブし、失敗行はレポートで報告する
    Partial,
}

/// 日付セルの出力形式
///
/// データファイルの日付セルを置換値に変換する際の出力形式を指定します。
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DateFormat {
    /// ISO 8601形式（YYYY-MM-DD）
    ///
    /// 例: `2026-08-05`
    Iso8601,

    /// カスタム形式（chrono互換フォーマット文字列）
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use docxfill::{RendererBuilder, DateFormat};
    ///
    /// # fn main() -> Result<(), docxfill::DocxFillError> {
    /// let renderer = RendererBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%d.%m.%Y".to_string()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    Custom(String),
}
