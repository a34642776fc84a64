//! Archive Module
//!
//! 出力ディレクトリ内の生成ドキュメントを1つのZIPアーカイブに
//! まとめるモジュール。すべての行のレンダリングが完了した後に
//! 一度だけ呼び出されます（逐次的なアーカイブ追記は行いません）。

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::DocxFillError;

/// 出力ディレクトリの内容をZIPアーカイブとして書き出す
///
/// ディレクトリ直下の通常ファイルのみを対象とし、サブディレクトリは
/// 含めません（出力レイアウトはフラット）。エントリ順はファイル名の
/// 辞書順で決定的です。
///
/// # 引数
///
/// * `output_dir` - 生成ドキュメントが入った出力ディレクトリ
/// * `archive_path` - 書き出すアーカイブのパス（既存の場合は上書き）
///
/// # 戻り値
///
/// * `Ok(usize)` - アーカイブに含めたエントリ数
/// * `Err(DocxFillError)` - I/OまたはZIP書き込みに失敗した場合
pub fn write_archive(output_dir: &Path, archive_path: &Path) -> Result<usize, DocxFillError> {
    let mut entries: Vec<_> = fs::read_dir(output_dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut count = 0;
    for entry in entries {
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        writer
            .start_file(name, options)
            .map_err(|e| DocxFillError::Zip(format!("{}", e)))?;

        let mut reader = BufReader::new(File::open(entry.path())?);
        io::copy(&mut reader, &mut writer)?;
        count += 1;
    }

    writer
        .finish()
        .map_err(|e| DocxFillError::Zip(format!("{}", e)))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_archive_contains_exactly_the_directory_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0.docx"), b"first").unwrap();
        fs::write(dir.path().join("1.docx"), b"second").unwrap();

        let archive_path = dir.path().join("out.zip");
        let count = write_archive(dir.path(), &archive_path).unwrap();
        // アーカイブ自身はエントリに含まれない（書き込み前に一覧を確定）
        assert_eq!(count, 2);

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["0.docx".to_string(), "1.docx".to_string()]);

        let mut content = String::new();
        archive
            .by_name("0.docx")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first");
    }

    #[test]
    fn test_empty_directory_archives_zero_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("out.zip");
        let count = write_archive(dir.path(), &archive_path).unwrap();
        assert_eq!(count, 0);
        assert!(archive_path.is_file());
    }

    #[test]
    fn test_subdirectories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0.docx"), b"doc").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("x.docx"), b"nested").unwrap();

        let archive_path = dir.path().join("out.zip");
        let count = write_archive(dir.path(), &archive_path).unwrap();
        assert_eq!(count, 1);
    }
}
