//! Placeholder Scanner Module
//!
//! テンプレートのテキストノード内の`{{name}}`トークンを走査・置換する
//! モジュール。トークン名は識別子（`[A-Za-z_][A-Za-z0-9_]*`）で、
//! 波括弧内の前後空白は無視されます。

use std::collections::BTreeMap;

use crate::api::UnmappedPolicy;
use crate::error::DocxFillError;

/// プレースホルダの開始デリミタ
pub(crate) const OPEN: &str = "{{";

/// プレースホルダの終了デリミタ
const CLOSE: &str = "}}";

/// トークン内部を検証し、有効ならプレースホルダ名を返す
///
/// 前後の空白を取り除いた上で、識別子文法に一致するかを確認します。
/// 一致しない内容（空、記号、途中に空白など）はトークンとして扱われず、
/// リテラルテキストのまま残ります。
fn parse_token(inner: &str) -> Option<&str> {
    let name = inner.trim();
    let mut chars = name.chars();

    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some(name)
}

/// テキスト中のプレースホルダ名をすべて収集
///
/// 出現順で返します（重複あり）。重複除去とソートは呼び出し側の責務です。
pub(crate) fn scan_text(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut pos = 0;

    while let Some(found) = text[pos..].find(OPEN) {
        let start = pos + found;
        let after_open = start + OPEN.len();

        let Some(end_rel) = text[after_open..].find(CLOSE) else {
            break;
        };
        let end = after_open + end_rel;

        match parse_token(&text[after_open..end]) {
            Some(name) => {
                names.push(name.to_string());
                pos = end + CLOSE.len();
            }
            None => {
                // 不正なトークンはリテラル扱いで、1文字進めて再走査
                pos = start + 1;
            }
        }
    }

    names
}

/// テキスト中のプレースホルダをコンテキストの値で置換
///
/// # 引数
///
/// * `text` - 置換対象のテキスト（XMLテキストノードのアンエスケープ済み内容）
/// * `context` - プレースホルダ名から置換値へのマップ
/// * `policy` - コンテキストに値がないプレースホルダの処理方針
///
/// # 戻り値
///
/// * `Ok(String)` - 置換後のテキスト
/// * `Err(DocxFillError::UnmappedPlaceholder)` - `UnmappedPolicy::Fail`で
///   未解決のプレースホルダを検出した場合
pub(crate) fn substitute(
    text: &str,
    context: &BTreeMap<String, String>,
    policy: UnmappedPolicy,
) -> Result<String, DocxFillError> {
    let mut result = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some(found) = text[pos..].find(OPEN) {
        let start = pos + found;
        let after_open = start + OPEN.len();

        let Some(end_rel) = text[after_open..].find(CLOSE) else {
            break;
        };
        let end = after_open + end_rel;

        match parse_token(&text[after_open..end]) {
            Some(name) => {
                result.push_str(&text[pos..start]);
                match context.get(name) {
                    Some(value) => result.push_str(value),
                    None => match policy {
                        UnmappedPolicy::KeepLiteral => {
                            result.push_str(&text[start..end + CLOSE.len()]);
                        }
                        UnmappedPolicy::Blank => {}
                        UnmappedPolicy::Fail => {
                            return Err(DocxFillError::UnmappedPlaceholder {
                                placeholder: name.to_string(),
                            });
                        }
                    },
                }
                pos = end + CLOSE.len();
            }
            None => {
                result.push_str(&text[pos..=start]);
                pos = start + 1;
            }
        }
    }

    result.push_str(&text[pos..]);
    Ok(result)
}
