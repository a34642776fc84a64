//! Formatter Module
//!
//! セル値を置換値（文字列）に変換するモジュール。
//! 数値・日付・論理値の表示形式をここで一元的に決定します。

use calamine::Data;
use chrono::{Duration, NaiveDate};

use crate::api::DateFormat;
use crate::error::DocxFillError;

/// セルフォーマッター
///
/// データファイルのセル値を、テンプレートへの置換値として使う
/// 表示文字列に変換します。
#[derive(Debug, Clone)]
pub(crate) struct CellFormatter {
    /// 日付セルの出力形式
    date_format: DateFormat,
}

impl CellFormatter {
    /// 新しいCellFormatterインスタンスを生成
    pub fn new(date_format: DateFormat) -> Self {
        Self { date_format }
    }

    /// セル値を置換値にフォーマット
    ///
    /// # 引数
    ///
    /// * `cell` - calamineのセルデータ
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - フォーマット済み文字列（空セルは空文字列）
    /// * `Err(DocxFillError)` - 日付変換に失敗した場合
    pub fn format_cell(&self, cell: &Data) -> Result<String, DocxFillError> {
        let formatted = match cell {
            Data::Int(i) => i.to_string(),
            Data::Float(f) => format_number(*f),
            Data::String(s) => s.clone(),
            Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Data::DateTime(dt) => self.format_serial_date(dt.as_f64())?,
            Data::DateTimeIso(s) => s.clone(),
            Data::DurationIso(s) => s.clone(),
            Data::Error(e) => format!("{:?}", e),
            Data::Empty => String::new(),
        };

        Ok(formatted)
    }

    /// Excelのシリアル日付値をフォーマット
    ///
    /// # エポックシステム
    ///
    /// 1900年システム（1899年12月30日起算）として処理します。
    /// Excelの1900年うるう年バグにより、1900年2月以前のシリアル値は
    /// 1日ずれますが、1900年3月1日以降はこのエポックで正確です。
    /// 1904年エポック（Mac版Excel）は未対応で、常に1900年システムとして
    /// 解釈されます。
    fn format_serial_date(&self, serial_value: f64) -> Result<String, DocxFillError> {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
            .ok_or_else(|| DocxFillError::Config("Invalid epoch date".to_string()))?;

        let days = serial_value.floor() as i64;
        let date = epoch
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| {
                DocxFillError::Config(format!(
                    "Date calculation overflow: serial_value={}",
                    serial_value
                ))
            })?;

        // 小数部は時刻（1.0 = 24時間）。丸めで24:00:00になった場合は翌日に繰り上げる
        let mut date = date;
        let mut day_seconds = (serial_value.fract() * 86_400.0).round() as u32;
        if day_seconds >= 86_400 {
            date = date
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| {
                    DocxFillError::Config(format!(
                        "Date calculation overflow: serial_value={}",
                        serial_value
                    ))
                })?;
            day_seconds = 0;
        }
        let datetime = date
            .and_hms_opt(
                day_seconds / 3600,
                (day_seconds % 3600) / 60,
                day_seconds % 60,
            )
            .ok_or_else(|| {
                DocxFillError::Config(format!(
                    "Invalid time of day: serial_value={}",
                    serial_value
                ))
            })?;

        let formatted = match &self.date_format {
            DateFormat::Iso8601 => {
                if day_seconds == 0 {
                    datetime.format("%Y-%m-%d").to_string()
                } else {
                    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            DateFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        };

        Ok(formatted)
    }
}

/// 数値を置換値にフォーマット
///
/// 整数値の浮動小数点数（Excelの数値セルは常にf64）は小数点なしで
/// 出力します（例: `10.0` -> `10`）。それ以外は`to_string()`に従います。
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
