//! Builder Module
//!
//! Fluent Builder APIを提供し、`Renderer`インスタンスを段階的に構築する。

use std::path::Path;

use crate::api::{DateFormat, FailurePolicy, UnmappedPolicy};
use crate::docx::DocxTemplate;
use crate::error::DocxFillError;
use crate::formatter::CellFormatter;
use crate::render;
use crate::sheet::DataTable;
use crate::types::{Inspection, Mapping, RenderReport};

/// レンダリング処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct RenderConfig {
    /// 行識別子として使用する列名
    pub identifier_column: String,

    /// マッピングされていないプレースホルダの処理方針
    pub unmapped_policy: UnmappedPolicy,

    /// 行の失敗に対するアーカイブ方針
    pub failure_policy: FailurePolicy,

    /// 日付セルの出力形式
    pub date_format: DateFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            identifier_column: "file_name".to_string(),
            unmapped_policy: UnmappedPolicy::KeepLiteral,
            failure_policy: FailurePolicy::Strict,
            date_format: DateFormat::Iso8601,
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Renderer`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみを
/// オーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use docxfill::{RendererBuilder, FailurePolicy, UnmappedPolicy};
///
/// # fn main() -> Result<(), docxfill::DocxFillError> {
/// let renderer = RendererBuilder::new()
///     .with_unmapped_policy(UnmappedPolicy::Blank)
///     .with_failure_policy(FailurePolicy::Partial)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RendererBuilder {
    /// 内部設定（構築中）
    config: RenderConfig,
}

impl Default for RendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 行識別子の列名: `file_name`
    /// - 未マッピングのプレースホルダ: リテラルのまま残す
    /// - 失敗方針: 1行でも失敗したら一括全体を失敗させる
    /// - 日付形式: ISO 8601 (YYYY-MM-DD)
    pub fn new() -> Self {
        Self {
            config: RenderConfig::default(),
        }
    }

    /// 行識別子として使用する列名を指定する
    ///
    /// この列が存在しない場合、0始まりの行インデックスが識別子になります。
    pub fn with_identifier_column(mut self, column: impl Into<String>) -> Self {
        self.config.identifier_column = column.into();
        self
    }

    /// マッピングされていないプレースホルダの処理方針を指定する
    pub fn with_unmapped_policy(mut self, policy: UnmappedPolicy) -> Self {
        self.config.unmapped_policy = policy;
        self
    }

    /// 行の失敗に対するアーカイブ方針を指定する
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// 日付セルの出力形式を指定する
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use docxfill::{RendererBuilder, DateFormat};
    ///
    /// // ISO 8601形式（デフォルト）
    /// let builder = RendererBuilder::new()
    ///     .with_date_format(DateFormat::Iso8601);
    ///
    /// // カスタム形式
    /// let builder = RendererBuilder::new()
    ///     .with_date_format(DateFormat::Custom("%d.%m.%Y".to_string()));
    /// ```
    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.config.date_format = format;
        self
    }

    /// 設定を検証し、`Renderer`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Renderer)`: 設定が有効な場合、Rendererインスタンス
    /// * `Err(DocxFillError::Config)`: 設定が無効な場合
    ///   * 行識別子の列名が空
    ///   * カスタム日付形式が不正な書式文字列
    pub fn build(self) -> Result<Renderer, DocxFillError> {
        // 1. 行識別子の列名の検証
        if self.config.identifier_column.is_empty() {
            return Err(DocxFillError::Config(
                "Identifier column name must not be empty".to_string(),
            ));
        }

        // 2. カスタム日付形式の検証
        if let DateFormat::Custom(ref format_str) = self.config.date_format {
            use chrono::format::{Item, StrftimeItems};

            let has_error = StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error));
            if has_error {
                return Err(DocxFillError::Config(format!(
                    "Invalid date format string: '{}'",
                    format_str
                )));
            }
        }

        // 3. Rendererインスタンス生成
        Ok(Renderer::new(self.config))
    }
}

/// 一括レンダリングのファサード
///
/// テンプレートの内容調査と、データ行ごとの一括レンダリングの
/// メインエントリーポイントです。`RendererBuilder`を使用して構築された
/// 設定に基づいて処理を実行します。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::collections::BTreeMap;
/// use docxfill::RendererBuilder;
///
/// # fn main() -> Result<(), docxfill::DocxFillError> {
/// let renderer = RendererBuilder::new().build()?;
///
/// let inspection = renderer.inspect("letter.docx".as_ref(), "clients.xlsx".as_ref())?;
/// println!("placeholders: {:?}", inspection.placeholders);
///
/// let mut mapping = BTreeMap::new();
/// mapping.insert("name".to_string(), "client".to_string());
/// let report = renderer.render_batch(
///     "letter.docx".as_ref(),
///     "clients.xlsx".as_ref(),
///     &mapping,
///     "output".as_ref(),
/// )?;
/// println!("{} documents rendered", report.documents.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Renderer {
    /// レンダリング設定
    config: RenderConfig,

    /// セルフォーマッター
    formatter: CellFormatter,
}

impl Renderer {
    pub(crate) fn new(config: RenderConfig) -> Self {
        Self {
            formatter: CellFormatter::new(config.date_format.clone()),
            config,
        }
    }

    /// テンプレートとデータファイルの内容を調査する
    ///
    /// マッピングUIに表示するための、プレースホルダ名と列名の一覧を
    /// 返します。どちらも辞書順にソート済みで、入力ファイル内の出現順に
    /// 依存しません。
    ///
    /// # 戻り値
    ///
    /// * `Ok(Inspection)` - 調査結果
    /// * `Err(DocxFillError)` - どちらかのファイルが開けない、または
    ///   解析できない場合（部分的な結果は返されません）
    pub fn inspect(
        &self,
        template_path: &Path,
        data_path: &Path,
    ) -> Result<Inspection, DocxFillError> {
        let template = DocxTemplate::open(template_path)?;
        let placeholders = template.placeholders()?;

        let table = DataTable::load(data_path, &self.formatter)?;
        let mut columns = table.columns.clone();
        columns.sort();

        Ok(Inspection {
            placeholders,
            columns,
        })
    }

    /// データ行ごとにテンプレートをレンダリングする
    ///
    /// # 処理フロー
    ///
    /// 1. テンプレートとデータファイルの読み込み
    /// 2. マッピングの事前検証（失敗時は何も書き込まずにエラー）
    /// 3. 行ごとの独立なレンダリングと書き込み
    /// 4. 失敗方針の適用
    ///
    /// `FailurePolicy::Strict`（デフォルト）では、1行でも失敗すると
    /// `DocxFillError::BatchFailed`が失敗行の一覧とともに返されます。
    /// `FailurePolicy::Partial`では、失敗があってもレポートが返され、
    /// 成功した行の出力だけが残ります。
    pub fn render_batch(
        &self,
        template_path: &Path,
        data_path: &Path,
        mapping: &Mapping,
        out_dir: &Path,
    ) -> Result<RenderReport, DocxFillError> {
        let template = DocxTemplate::open(template_path)?;
        let table = DataTable::load(data_path, &self.formatter)?;

        let report = render::render_batch(
            &template,
            &table,
            mapping,
            out_dir,
            &self.config.identifier_column,
            self.config.unmapped_policy,
        )?;

        match self.config.failure_policy {
            FailurePolicy::Strict if !report.is_complete() => Err(DocxFillError::BatchFailed {
                failed: report.failures.len(),
                total: report.total(),
                failures: report.failures,
            }),
            _ => Ok(report),
        }
    }
}
