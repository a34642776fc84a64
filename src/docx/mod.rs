//! Template Module
//!
//! DOCXテンプレートの読み込み、プレースホルダ抽出、レンダリングを提供する
//! モジュール。DOCXファイルはXMLパートを含むZIPアーカイブであり、
//! 本文（`word/document.xml`）とヘッダー・フッターのテキストノードに
//! 現れる`{{name}}`トークンを置換対象として扱います。

mod placeholder;

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::api::UnmappedPolicy;
use crate::error::DocxFillError;
use crate::security::{validate_zip_path, SecurityConfig};

/// 置換対象のXMLパートかどうかを判定
///
/// 本文に加えて、docxtpl系のテンプレートと同様にヘッダー・フッターも
/// 置換対象に含めます。
fn is_template_part(name: &str) -> bool {
    name == "word/document.xml"
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

/// DOCXテンプレート
///
/// 読み込んだテンプレートのZIPエントリをメモリ上に保持し、
/// プレースホルダの抽出と行ごとのレンダリングを提供します。
/// `render`は保持しているエントリを変更せず、毎回新しいDOCXの
/// バイト列を生成します（テンプレートの新鮮なコピーからの置換）。
///
/// # 使用例
///
/// ```rust,no_run
/// use std::collections::BTreeMap;
/// use docxfill::{DocxTemplate, UnmappedPolicy};
///
/// # fn main() -> Result<(), docxfill::DocxFillError> {
/// let template = DocxTemplate::open("letter.docx".as_ref())?;
/// let placeholders = template.placeholders()?;
///
/// let mut context = BTreeMap::new();
/// context.insert("name".to_string(), "Alice".to_string());
/// let rendered: Vec<u8> = template.render(&context, UnmappedPolicy::KeepLiteral)?;
/// # Ok(())
/// # }
/// ```
pub struct DocxTemplate {
    /// ZIPエントリ（名前、内容）を元のアーカイブ順で保持
    entries: Vec<(String, Vec<u8>)>,
}

impl DocxTemplate {
    /// ファイルパスからテンプレートを読み込む
    pub fn open(path: &Path) -> Result<Self, DocxFillError> {
        let mut file = File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Self::from_bytes(buffer)
    }

    /// バイト列からテンプレートを読み込む
    ///
    /// ZIPアーカイブとして展開し、セキュリティチェック（入力サイズ、
    /// エントリ数、エントリパス、展開後サイズ）を適用した上で、
    /// すべてのエントリをメモリに保持します。
    ///
    /// # 戻り値
    ///
    /// * `Ok(DocxTemplate)` - 読み込みに成功した場合
    /// * `Err(DocxFillError::Zip)` - ZIPアーカイブとして解析できない場合
    /// * `Err(DocxFillError::SecurityViolation)` - セキュリティ制限に違反した場合
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DocxFillError> {
        let security_config = SecurityConfig::default();

        // セキュリティチェック: 入力ファイルサイズの上限
        if bytes.len() as u64 > security_config.max_input_file_size {
            return Err(DocxFillError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                bytes.len(),
                security_config.max_input_file_size
            )));
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocxFillError::Zip(format!("{}", e)))?;

        // セキュリティチェック: ファイル数の上限
        if archive.len() > security_config.max_file_count {
            return Err(DocxFillError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                archive.len(),
                security_config.max_file_count
            )));
        }

        let mut total_decompressed_size = 0u64;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| DocxFillError::Zip(format!("{}", e)))?;

            // パストラバーサル対策
            let name = entry.name().to_string();
            validate_zip_path(&name).map_err(|e| {
                DocxFillError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;

            // ファイルサイズチェック
            let entry_size = entry.size();
            if entry_size > security_config.max_file_size {
                return Err(DocxFillError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    name, entry_size, security_config.max_file_size
                )));
            }

            // 展開後のサイズ累計をチェック
            total_decompressed_size = total_decompressed_size
                .checked_add(entry_size)
                .ok_or_else(|| {
                    DocxFillError::SecurityViolation(
                        "Total decompressed size calculation overflow".to_string(),
                    )
                })?;

            if total_decompressed_size > security_config.max_decompressed_size {
                return Err(DocxFillError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total_decompressed_size, security_config.max_decompressed_size
                )));
            }

            if entry.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(entry_size as usize);
            entry.read_to_end(&mut data)?;
            entries.push((name, data));
        }

        Ok(Self { entries })
    }

    /// テンプレート内のプレースホルダ名をすべて抽出
    ///
    /// すべての置換対象パート（本文、ヘッダー、フッター）を走査し、
    /// 一意な名前を辞書順で返します。
    ///
    /// # 注意
    ///
    /// プレースホルダは1つのXMLテキストノード内に収まっている必要が
    /// あります。複数のランに分断されたトークンは認識されません。
    pub fn placeholders(&self) -> Result<Vec<String>, DocxFillError> {
        let mut names = BTreeSet::new();

        for (name, data) in &self.entries {
            if is_template_part(name) {
                collect_placeholders(data, &mut names)?;
            }
        }

        Ok(names.into_iter().collect())
    }

    /// コンテキストを置換した新しいDOCXバイト列を生成
    ///
    /// 置換対象パートはXMLイベント単位で書き換え、それ以外のエントリは
    /// バイト列のままコピーします。XML構造（要素、属性、宣言）は
    /// 変更されません。
    ///
    /// # 引数
    ///
    /// * `context` - プレースホルダ名から置換値へのマップ
    /// * `policy` - コンテキストに値がないプレースホルダの処理方針
    pub fn render(
        &self,
        context: &BTreeMap<String, String>,
        policy: UnmappedPolicy,
    ) -> Result<Vec<u8>, DocxFillError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.entries {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| DocxFillError::Zip(format!("{}", e)))?;

            if is_template_part(name) {
                let transformed = substitute_part(data, context, policy)?;
                writer.write_all(&transformed)?;
            } else {
                writer.write_all(data)?;
            }
        }

        let cursor = writer
            .finish()
            .map_err(|e| DocxFillError::Zip(format!("{}", e)))?;
        Ok(cursor.into_inner())
    }
}

/// XMLパートのテキストノードからプレースホルダ名を収集
fn collect_placeholders(
    xml: &[u8],
    names: &mut BTreeSet<String>,
) -> Result<(), DocxFillError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| DocxFillError::Xml(format!("XML text error: {}", e)))?;
                for name in placeholder::scan_text(&text) {
                    names.insert(name);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(DocxFillError::Xml(format!("XML parse error: {}", e)));
            }
        }
        buf.clear();
    }

    Ok(())
}

/// XMLパートのテキストノードを置換して書き出す
///
/// テキストイベント以外（要素、属性、宣言、コメント）はそのまま
/// 透過させます。空白の有意性を保つため、テキストのトリムは行いません。
fn substitute_part(
    xml: &[u8],
    context: &BTreeMap<String, String>,
    policy: UnmappedPolicy,
) -> Result<Vec<u8>, DocxFillError> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| DocxFillError::Xml(format!("XML text error: {}", e)))?;
                if text.contains(placeholder::OPEN) {
                    let replaced = placeholder::substitute(&text, context, policy)?;
                    writer
                        .write_event(Event::Text(BytesText::new(&replaced)))
                        .map_err(|e| DocxFillError::Xml(format!("XML write error: {}", e)))?;
                } else {
                    writer
                        .write_event(Event::Text(e.into_owned()))
                        .map_err(|e| DocxFillError::Xml(format!("XML write error: {}", e)))?;
                }
            }
            Ok(Event::Eof) => break,
            Ok(event) => {
                writer
                    .write_event(event.into_owned())
                    .map_err(|e| DocxFillError::Xml(format!("XML write error: {}", e)))?;
            }
            Err(e) => {
                return Err(DocxFillError::Xml(format!("XML parse error: {}", e)));
            }
        }
        buf.clear();
    }

    Ok(writer.into_inner().into_inner())
}
