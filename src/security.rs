//! Security Module
//!
//! セキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃、不正な実行トークンなどへの対策を提供します。

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 256MB (268_435_456 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 64MB (67_108_864 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 128MB (134_217_728 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 268_435_456, // 256MB
            max_file_count: 10_000,
            max_file_size: 67_108_864,          // 64MB
            max_input_file_size: 134_217_728,   // 128MB
        }
    }
}

/// ZIPエントリパスの検証
///
/// パストラバーサル攻撃を防ぐため、DOCXコンテナ内のエントリパスを検証します。
///
/// # 引数
///
/// * `path` - 検証するエントリパス
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    // 空のパスは拒否
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // 絶対パスを拒否（Windows形式の`C:\`やUnix形式の`/`で始まるパス）
    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    // `..`を含むパスを拒否（ディレクトリトラバーサル攻撃）
    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    // `\`を含むパスを拒否（Windows形式のパスセパレータ）
    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}

/// 実行トークンの検証
///
/// クライアントから渡された実行トークンをディレクトリ名として使用する前に
/// 検証します。トークンは`RunId::generate`が生成する文法
/// （ASCII数字とハイフンのみ、先頭と末尾は数字）に一致しなければなりません。
///
/// # 戻り値
///
/// * `Ok(())` - トークンが安全な場合
/// * `Err(String)` - トークンが不正な場合
pub(crate) fn validate_run_token(token: &str) -> Result<(), String> {
    if token.is_empty() {
        return Err("Empty run token is not allowed".to_string());
    }

    if token.len() > 64 {
        return Err(format!("Run token too long: {} chars", token.len()));
    }

    if !token.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(format!("Run token contains invalid characters: {}", token));
    }

    // 先頭・末尾のハイフンは生成文法に現れない
    if token.starts_with('-') || token.ends_with('-') {
        return Err(format!("Malformed run token: {}", token));
    }

    Ok(())
}

/// アップロードされたファイル名の無害化
///
/// ディレクトリ成分を取り除き、制御文字とパスセパレータを除去した
/// 最終コンポーネントを返します。
///
/// # 戻り値
///
/// * `Some(String)` - 無害化後のファイル名
/// * `None` - 無害化の結果ファイル名が空になった場合
pub(crate) fn sanitize_file_name(name: &str) -> Option<String> {
    // パスセパレータで分割し、最後の空でない成分を採用
    let component = name
        .rsplit(|c| c == '/' || c == '\\')
        .find(|part: &&str| !part.is_empty())?;

    let cleaned: String = component
        .chars()
        .filter(|c| !c.is_control())
        .collect();

    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// 出力ファイル名の語幹の無害化
///
/// 行識別子の値を出力ファイルの語幹として使えるように無害化します。
/// 英数字、`-`、`_`、`.`、空白以外の文字は除去されます。
/// 無害化の結果が空になった場合は、行インデックスにフォールバックします。
///
/// # 引数
///
/// * `raw` - 行識別子の表示値
/// * `row_index` - フォールバック用の行インデックス（0始まり）
pub(crate) fn sanitize_file_stem(raw: &str, row_index: usize) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .collect();

    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        return row_index.to_string();
    }

    // ファイル名の異常な長大化を防ぐ
    trimmed.chars().take(100).collect()
}
