//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

use crate::types::RowFailure;

/// docxfillクレート全体で使用するエラー型
///
/// このエラー型は、テンプレートの読み込み、データファイルの解析、
/// 一括レンダリング、アーカイブ作成中に発生するすべてのエラーを
/// 統一的に扱うために使用されます。
///
/// # エラーの種類
///
/// - `Io`: I/O操作中に発生したエラー（ファイル読み込み失敗など）
/// - `Sheet`: データファイルの解析中に発生したエラー（calamine由来）
/// - `Zip`: DOCXコンテナまたはアーカイブの解析・生成エラー
/// - `Xml`: テンプレートXMLの解析・書き込みエラー
/// - `Config`: 設定の検証に失敗したエラー
/// - `MissingColumn` / `UnknownPlaceholder`: マッピングの事前検証エラー
/// - `BatchFailed`: 一括レンダリングで1行以上が失敗したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use docxfill::DocxFillError;
/// use std::fs::File;
///
/// fn read_template(path: &str) -> Result<(), DocxFillError> {
///     let file = File::open(path)?;  // Ioエラーが自動的に変換される
///     // ... 処理 ...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum DocxFillError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// データファイルの解析中に発生したエラー
    ///
    /// calamineクレートがスプレッドシートを解析する際に発生したエラーです。
    /// ファイル形式が不正、破損したファイルなどが原因となります。
    ///
    /// `#[from]`属性により、`calamine::Error`から自動的に変換されます。
    #[error("Failed to parse data file: {0}")]
    Sheet(#[from] calamine::Error),

    /// ZIPアーカイブの解析・生成エラー
    ///
    /// DOCXファイル（ZIPアーカイブ）の読み込み、またはアーカイブの
    /// 書き込み中に発生したエラーです。
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// テンプレートXMLの解析・書き込みエラー
    #[error("Template XML error: {0}")]
    Xml(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `RendererBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。例えば、カスタム日付形式が不正な場合などです。
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃、ファイルサイズ制限などの
    /// セキュリティ制限に違反した場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 実行トークンが既存の実行ディレクトリに解決できないエラー
    #[error("Run '{run}' not found")]
    RunNotFound {
        /// クライアントから渡された実行トークン
        run: String,
    },

    /// アップロード処理のエラー（フィールド欠落、不正なmultipart本文など）
    #[error("Upload error: {0}")]
    Upload(String),

    /// マッピングのキーがテンプレートのプレースホルダに存在しないエラー
    ///
    /// 一括レンダリングの事前検証で検出されます。行の処理は開始されません。
    #[error("Mapping key '{placeholder}' is not a placeholder of the template")]
    UnknownPlaceholder {
        /// 問題のマッピングキー
        placeholder: String,
    },

    /// マッピングが参照する列がデータファイルに存在しないエラー
    ///
    /// 一括レンダリングの事前検証で検出されます。ファイルは1つも書き込まれません。
    #[error("Mapped column '{column}' (for placeholder '{placeholder}') does not exist in the data file")]
    MissingColumn {
        /// 列を参照しているプレースホルダ
        placeholder: String,
        /// 存在しない列名
        column: String,
    },

    /// コンテキストに値がないプレースホルダを検出したエラー
    ///
    /// `UnmappedPolicy::Fail`が設定されている場合のみ発生します。
    #[error("Placeholder '{placeholder}' has no mapped value")]
    UnmappedPlaceholder {
        /// 値が解決できなかったプレースホルダ
        placeholder: String,
    },

    /// 一括レンダリングで1行以上が失敗したエラー
    ///
    /// `FailurePolicy::Strict`の場合、失敗した行があるとアーカイブは
    /// 作成されず、このエラーが失敗行の一覧とともに返されます。
    #[error("{failed} of {total} rows failed to render")]
    BatchFailed {
        /// 失敗した行数
        failed: usize,
        /// 全行数
        total: usize,
        /// 各失敗行の詳細
        failures: Vec<RowFailure>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    // Ioエラーのテスト
    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: DocxFillError = io_err.into();

        match error {
            DocxFillError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
                assert_eq!(e.to_string(), "File not found");
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let error: DocxFillError = io_err.into();

        let error_msg = error.to_string();
        assert!(error_msg.contains("IO error"));
        assert!(error_msg.contains("Permission denied"));
    }

    // Sheetエラーのテスト
    #[test]
    fn test_sheet_error() {
        let parse_err = calamine::Error::Msg("Invalid file format");
        let error: DocxFillError = parse_err.into();

        match error {
            DocxFillError::Sheet(e) => match e {
                calamine::Error::Msg(msg) => {
                    assert_eq!(msg, "Invalid file format");
                }
                _ => panic!("Expected Msg variant"),
            },
            _ => panic!("Expected Sheet error"),
        }
    }

    // 事前検証エラーのテスト
    #[test]
    fn test_missing_column_display() {
        let error = DocxFillError::MissingColumn {
            placeholder: "amount".to_string(),
            column: "value".to_string(),
        };

        let error_msg = error.to_string();
        assert!(error_msg.contains("'value'"));
        assert!(error_msg.contains("'amount'"));
        assert!(error_msg.contains("does not exist"));
    }

    #[test]
    fn test_batch_failed_display() {
        let error = DocxFillError::BatchFailed {
            failed: 2,
            total: 5,
            failures: vec![],
        };

        assert_eq!(error.to_string(), "2 of 5 rows failed to render");
    }

    // エラー変換のテスト（?演算子の動作確認）
    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), DocxFillError> {
            let _file = std::fs::File::open("nonexistent_template.docx")?;
            Ok(())
        }

        let result = io_operation();
        assert!(result.is_err());

        match result {
            Err(DocxFillError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    // エラーメッセージのフォーマット確認
    #[test]
    fn test_all_error_formats() {
        // Io
        let io_err: DocxFillError = io::Error::other("test io").into();
        assert!(io_err.to_string().starts_with("IO error"));

        // Sheet
        let sheet_err: DocxFillError = calamine::Error::Msg("test parse").into();
        assert!(sheet_err.to_string().starts_with("Failed to parse data file"));

        // Zip
        let zip_err = DocxFillError::Zip("test zip".to_string());
        assert!(zip_err.to_string().starts_with("ZIP archive error"));

        // Config
        let config_err = DocxFillError::Config("test config".to_string());
        assert!(config_err.to_string().starts_with("Configuration error"));

        // RunNotFound
        let run_err = DocxFillError::RunNotFound {
            run: "20260101000000-0000".to_string(),
        };
        assert!(run_err.to_string().contains("20260101000000-0000"));

        // UnknownPlaceholder
        let key_err = DocxFillError::UnknownPlaceholder {
            placeholder: "ghost".to_string(),
        };
        assert!(key_err.to_string().contains("'ghost'"));
    }
}
