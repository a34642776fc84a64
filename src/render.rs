//! Render Module
//!
//! 一括レンダリングの実装モジュール。
//! マッピングの事前検証の後、データ行を1行ずつ独立に処理します。
//! 1行の失敗は記録されるだけで、残りの行の処理は継続されます。

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::api::UnmappedPolicy;
use crate::docx::DocxTemplate;
use crate::error::DocxFillError;
use crate::security::sanitize_file_stem;
use crate::sheet::DataTable;
use crate::types::{Mapping, RenderReport, RowFailure};

/// マッピングの事前検証
///
/// 一括レンダリングを開始する前に、マッピングの全エントリを検証します。
///
/// - すべてのキーはテンプレートのプレースホルダでなければならない
/// - すべての値はデータファイルの列名でなければならない
///
/// 検証に失敗した場合、ファイルは1つも書き込まれません。
pub(crate) fn validate_mapping(
    mapping: &Mapping,
    placeholders: &[String],
    columns: &[String],
) -> Result<(), DocxFillError> {
    let placeholder_set: BTreeSet<&str> = placeholders.iter().map(String::as_str).collect();

    for (placeholder, column) in mapping {
        if !placeholder_set.contains(placeholder.as_str()) {
            return Err(DocxFillError::UnknownPlaceholder {
                placeholder: placeholder.clone(),
            });
        }
        if !columns.iter().any(|c| c == column) {
            return Err(DocxFillError::MissingColumn {
                placeholder: placeholder.clone(),
                column: column.clone(),
            });
        }
    }

    Ok(())
}

/// データ行ごとにテンプレートをレンダリングして出力ディレクトリに書き込む
///
/// # 処理フロー
///
/// 1. マッピングの事前検証（失敗時は何も書き込まずにエラー）
/// 2. 出力ディレクトリの作成
/// 3. 各行について独立に: コンテキスト構築 → テンプレートの新鮮な
///    コピーに置換 → `<語幹>.docx`として書き込み
///
/// 行の処理順はデータファイルの行順に従い、並列化は行いません。
/// 行識別子は`identifier_column`列の表示値、列が存在しない場合は
/// 0始まりの行インデックスです。
pub(crate) fn render_batch(
    template: &DocxTemplate,
    table: &DataTable,
    mapping: &Mapping,
    out_dir: &Path,
    identifier_column: &str,
    unmapped_policy: UnmappedPolicy,
) -> Result<RenderReport, DocxFillError> {
    // 1. 事前検証（出力ディレクトリの作成よりも前）
    let placeholders = template.placeholders()?;
    validate_mapping(mapping, &placeholders, &table.columns)?;

    // 2. 出力ディレクトリの作成
    fs::create_dir_all(out_dir)?;

    // 3. 列インデックスの解決（検証済みのため常に成功する）
    let mut column_indices: Vec<(&str, usize)> = Vec::with_capacity(mapping.len());
    for (placeholder, column) in mapping {
        let idx = table
            .column_index(column)
            .ok_or_else(|| DocxFillError::MissingColumn {
                placeholder: placeholder.clone(),
                column: column.clone(),
            })?;
        column_indices.push((placeholder.as_str(), idx));
    }

    let id_column = table.column_index(identifier_column);
    let mut report = RenderReport::default();

    // 4. 行ごとの独立なレンダリング
    for (row_index, row) in table.rows.iter().enumerate() {
        let raw_stem = match id_column {
            Some(idx) => row.get(idx).cloned().unwrap_or_default(),
            None => row_index.to_string(),
        };
        let file_stem = sanitize_file_stem(&raw_stem, row_index);

        match render_row(template, row, &column_indices, unmapped_policy) {
            Ok(bytes) => {
                let path = out_dir.join(format!("{}.docx", file_stem));
                match fs::write(&path, bytes) {
                    Ok(()) => report.documents.push(path),
                    Err(e) => {
                        warn!(row = row_index, stem = %file_stem, "failed to write document: {}", e);
                        report.failures.push(RowFailure {
                            row: row_index,
                            file_stem,
                            reason: DocxFillError::Io(e).to_string(),
                        });
                    }
                }
            }
            Err(e) => {
                warn!(row = row_index, stem = %file_stem, "failed to render row: {}", e);
                report.failures.push(RowFailure {
                    row: row_index,
                    file_stem,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// 1行分のコンテキストを構築してレンダリング
fn render_row(
    template: &DocxTemplate,
    row: &[String],
    column_indices: &[(&str, usize)],
    unmapped_policy: UnmappedPolicy,
) -> Result<Vec<u8>, DocxFillError> {
    let mut context = BTreeMap::new();
    for (placeholder, idx) in column_indices {
        let value = row.get(*idx).cloned().unwrap_or_default();
        context.insert((*placeholder).to_string(), value);
    }

    template.render(&context, unmapped_policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, &str)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_mapping_accepts_covered_mapping() {
        let result = validate_mapping(
            &mapping(&[("name", "client"), ("amount", "value")]),
            &strings(&["amount", "name"]),
            &strings(&["client", "value"]),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_mapping_rejects_unknown_placeholder() {
        let result = validate_mapping(
            &mapping(&[("ghost", "client")]),
            &strings(&["name"]),
            &strings(&["client"]),
        );
        match result {
            Err(DocxFillError::UnknownPlaceholder { placeholder }) => {
                assert_eq!(placeholder, "ghost");
            }
            _ => panic!("Expected UnknownPlaceholder error"),
        }
    }

    #[test]
    fn test_validate_mapping_rejects_missing_column() {
        let result = validate_mapping(
            &mapping(&[("name", "missing")]),
            &strings(&["name"]),
            &strings(&["client"]),
        );
        match result {
            Err(DocxFillError::MissingColumn {
                placeholder,
                column,
            }) => {
                assert_eq!(placeholder, "name");
                assert_eq!(column, "missing");
            }
            _ => panic!("Expected MissingColumn error"),
        }
    }

    #[test]
    fn test_validate_mapping_accepts_partial_coverage() {
        // マッピングがプレースホルダの一部しか覆わないのは検証エラーではない
        // （未解決プレースホルダの扱いはUnmappedPolicyが決める）
        let result = validate_mapping(
            &mapping(&[("name", "client")]),
            &strings(&["amount", "name"]),
            &strings(&["client", "value"]),
        );
        assert!(result.is_ok());
    }
}
