//! Sheet Module
//!
//! calamineを使用したデータファイル解析のモジュール。
//! 最初のワークシートを行指向のテーブルとして読み込みます。
//! 1行目をヘッダー行（列名）、2行目以降をデータ行として扱います。

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Reader};

use crate::error::DocxFillError;
use crate::formatter::CellFormatter;
use crate::security::SecurityConfig;

/// 行指向のデータテーブル
///
/// データファイルの最初のシートを、列名の順序付きリストと
/// 表示文字列化された行のリストとして保持します。
/// セル値の文字列化は読み込み時に`CellFormatter`で行われます。
#[derive(Debug, Clone)]
pub struct DataTable {
    /// 列名（ファイル内の出現順）
    pub columns: Vec<String>,

    /// データ行（ファイル内の行順）。各行の長さは`columns`と一致します。
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// ファイルパスからデータテーブルを読み込む
    pub(crate) fn load(path: &Path, formatter: &CellFormatter) -> Result<Self, DocxFillError> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(buffer, formatter)
    }

    /// バイト列からデータテーブルを読み込む
    ///
    /// ファイル形式はcalamineの自動判別に従います（XLSX/XLS/ODS）。
    ///
    /// # 戻り値
    ///
    /// * `Ok(DataTable)` - 読み込みに成功した場合
    /// * `Err(DocxFillError::Sheet)` - スプレッドシートとして解析できない場合
    /// * `Err(DocxFillError::SecurityViolation)` - 入力サイズ制限に違反した場合
    pub(crate) fn from_bytes(
        bytes: Vec<u8>,
        formatter: &CellFormatter,
    ) -> Result<Self, DocxFillError> {
        let security_config = SecurityConfig::default();

        // セキュリティチェック: 入力ファイルサイズの上限
        if bytes.len() as u64 > security_config.max_input_file_size {
            return Err(DocxFillError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes.len(),
                security_config.max_input_file_size
            )));
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

        // 最初のシートのみを対象とする
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(DocxFillError::Sheet(calamine::Error::Msg(
                "Workbook contains no sheets",
            )))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut range_rows = range.rows();

        // 1. ヘッダー行の抽出（空のヘッダーセルは位置名で補完）
        let columns = match range_rows.next() {
            Some(header_row) => header_row
                .iter()
                .enumerate()
                .map(|(idx, cell)| {
                    let name = formatter.format_cell(cell)?;
                    if name.is_empty() {
                        Ok(format!("column_{}", idx))
                    } else {
                        Ok(name)
                    }
                })
                .collect::<Result<Vec<String>, DocxFillError>>()?,
            None => Vec::new(),
        };

        // 2. データ行の文字列化
        let mut rows = Vec::new();
        for row in range_rows {
            let values = row
                .iter()
                .map(|cell| formatter.format_cell(cell))
                .collect::<Result<Vec<String>, DocxFillError>>()?;
            rows.push(values);
        }

        Ok(Self { columns, rows })
    }

    /// 列名から列インデックスを取得（最初の一致）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }
}
